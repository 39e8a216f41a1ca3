//! Forward greedy index selection
//!
//! Each round tries every untried candidate on top of the committed
//! configuration and keeps the one with the lowest inferred workload cost, as
//! long as that cost is strictly below the committed one. Ties go to the
//! candidate that comes first in candidate order.

use super::{CandidateSet, CostInference, IndexId};
use crate::error::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// One committed greedy step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreedyRound {
    pub round: usize,
    pub index: IndexId,
    pub table: String,
    pub columns: Vec<String>,
    /// Committed workload cost after this round
    pub cost: f64,
    /// Reduction against the previous committed cost
    pub improvement: f64,
}

#[derive(Debug, Clone)]
pub struct GreedySelection {
    pub selected: Vec<IndexId>,
    pub baseline_cost: f64,
    pub final_cost: f64,
    pub trace: Vec<GreedyRound>,
}

pub struct GreedySelector<'a> {
    inference: &'a CostInference<'a>,
    candidates: &'a CandidateSet,
    max_index_num: usize,
}

impl<'a> GreedySelector<'a> {
    pub fn new(inference: &'a CostInference<'a>, candidates: &'a CandidateSet, max_index_num: usize) -> Self {
        Self {
            inference,
            candidates,
            max_index_num,
        }
    }

    pub fn select(&self) -> Result<GreedySelection> {
        let baseline_cost = self.inference.baseline_cost()?;
        let mut committed = baseline_cost;
        let mut selected: Vec<IndexId> = Vec::new();
        let mut tried: HashSet<IndexId> = HashSet::new();
        let mut trace = Vec::new();

        while selected.len() < self.max_index_num {
            let remaining: Vec<IndexId> = self.candidates.ids().filter(|id| !tried.contains(id)).collect();
            if remaining.is_empty() {
                break;
            }

            // Evaluated in parallel, collected in candidate order
            let costs = remaining
                .par_iter()
                .map(|id| {
                    let mut config = selected.clone();
                    config.push(*id);
                    self.inference.workload_cost(&config)
                })
                .collect::<Result<Vec<f64>>>()?;

            let mut best: Option<(IndexId, f64)> = None;
            for (id, cost) in remaining.iter().zip(costs) {
                if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best = Some((*id, cost));
                }
            }

            let Some((id, cost)) = best else {
                break;
            };
            if cost >= committed {
                debug!(round = trace.len() + 1, best = cost, committed, "No improving candidate left");
                break;
            }

            let index = self.candidates.get(id).ok_or_else(|| {
                Error::inconsistent(None, None, format!("unknown candidate index {}", id))
            })?;
            let round = GreedyRound {
                round: trace.len() + 1,
                index: id,
                table: index.table.clone(),
                columns: index.columns.clone(),
                cost,
                improvement: committed - cost,
            };
            debug!(
                round = round.round,
                index = %index,
                cost,
                improvement = round.improvement,
                "Greedy round committed"
            );

            committed = cost;
            selected.push(id);
            tried.insert(id);
            trace.push(round);
        }

        Ok(GreedySelection {
            selected,
            baseline_cost,
            final_cost: committed,
            trace,
        })
    }
}
