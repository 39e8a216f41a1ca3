//! Standalone benefit ranking
//!
//! Simple mode skips atomic decomposition: each candidate is probed alone, its
//! benefit is the workload cost reduction against no index, and candidates are
//! picked by descending benefit. On one table a narrower index whose columns
//! are all covered by a picked index is left out, and a picked narrower index
//! is replaced by a wider one covering it.

use super::{AtomicConfigSet, CandidateSet, IndexId, Workload};
use crate::error::{Error, Result};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RankedCandidates {
    pub baseline_cost: f64,
    /// Every candidate with its benefit, best first
    pub ranked: Vec<(IndexId, f64)>,
    /// Non-overlapping picks, best first, at most the index budget
    pub picked: Vec<IndexId>,
}

pub struct BenefitRanking<'a> {
    workload: &'a Workload,
    atomics: &'a AtomicConfigSet,
    max_index_num: usize,
}

impl<'a> BenefitRanking<'a> {
    pub fn new(workload: &'a Workload, atomics: &'a AtomicConfigSet, max_index_num: usize) -> Self {
        Self {
            workload,
            atomics,
            max_index_num,
        }
    }

    /// Probed workload cost under atomic config `position`
    fn probed_cost(&self, position: usize) -> Result<f64> {
        let mut total = 0.0;
        for (i, query) in self.workload.queries.iter().enumerate() {
            if query.is_dropped() {
                continue;
            }
            total += query.cost(position).ok_or_else(|| {
                Error::inconsistent(Some(i), Some(position), "cost list out of range")
            })?;
        }
        Ok(total)
    }

    /// Fill in each candidate's benefit and pick the non-overlapping best
    pub fn rank(&self, candidates: &mut CandidateSet) -> Result<RankedCandidates> {
        let baseline_cost = self.probed_cost(0)?;

        let mut ranked = Vec::with_capacity(candidates.len());
        for id in candidates.ids().collect::<Vec<_>>() {
            let position = self.atomics.singleton_position(id).ok_or_else(|| {
                Error::inconsistent(None, None, format!("index {} was never probed alone", id))
            })?;
            let benefit = baseline_cost - self.probed_cost(position)?;
            candidates.set_benefit(id, benefit);
            ranked.push((id, benefit));
        }
        // stable: equal benefits keep candidate order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut picked: Vec<IndexId> = Vec::new();
        for &(id, benefit) in &ranked {
            if benefit <= 0.0 {
                break;
            }
            let Some(index) = candidates.get(id) else {
                continue;
            };
            let columns: HashSet<&str> = index.columns.iter().map(String::as_str).collect();

            let mut keep = true;
            let mut superseded = Vec::new();
            for &prev_id in picked.iter().rev() {
                let Some(prev) = candidates.get(prev_id) else {
                    continue;
                };
                if prev.table != index.table {
                    continue;
                }
                let prev_columns: HashSet<&str> = prev.columns.iter().map(String::as_str).collect();
                if prev_columns.len() < columns.len() && prev_columns.is_subset(&columns) {
                    superseded.push(prev_id);
                }
                if columns.is_subset(&prev_columns) {
                    keep = false;
                    break;
                }
            }

            picked.retain(|p| !superseded.contains(p));
            if keep {
                debug!(index = %index, benefit, "Candidate picked");
                picked.push(id);
            }
        }
        picked.truncate(self.max_index_num);

        Ok(RankedCandidates {
            baseline_cost,
            ranked,
            picked,
        })
    }
}
