//! Workload cost inference from atomic config costs
//!
//! The cost of a configuration is never probed directly. A query's selection
//! cost is the cheapest cost it showed under any atomic config contained in
//! the configuration. Statements that maintain indexes (insert, delete) also
//! pay, for every index of the configuration, the extra cost they showed under
//! that index alone.

use super::{AtomicConfigSet, IndexId, Workload};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Inferred cost of one query under one configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryCost {
    pub query: usize,
    pub selection: f64,
    pub maintenance: f64,
}

impl QueryCost {
    pub fn total(&self) -> f64 {
        self.selection + self.maintenance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub total: f64,
    /// Surviving queries only, in workload order
    pub queries: Vec<QueryCost>,
}

pub struct CostInference<'a> {
    workload: &'a Workload,
    atomics: &'a AtomicConfigSet,
}

impl<'a> CostInference<'a> {
    pub fn new(workload: &'a Workload, atomics: &'a AtomicConfigSet) -> Self {
        Self { workload, atomics }
    }

    pub fn atomics(&self) -> &AtomicConfigSet {
        self.atomics
    }

    /// Total inferred workload cost of `config`
    pub fn workload_cost(&self, config: &[IndexId]) -> Result<f64> {
        let covering = self.covering(config)?;
        let mut total = 0.0;
        for (i, query) in self.workload.queries.iter().enumerate() {
            if query.is_dropped() {
                continue;
            }
            total += self.selection(i, &covering)?;
            if query.statement.pays_index_maintenance() {
                total += self.maintenance(i, config)?;
            }
        }
        Ok(total)
    }

    /// Inferred cost of the empty configuration
    pub fn baseline_cost(&self) -> Result<f64> {
        self.workload_cost(&[])
    }

    /// Per-query breakdown of `config`
    pub fn infer(&self, config: &[IndexId]) -> Result<CostBreakdown> {
        let covering = self.covering(config)?;
        let mut queries = Vec::with_capacity(self.workload.len());

        for (i, query) in self.workload.queries.iter().enumerate() {
            if query.is_dropped() {
                continue;
            }
            let maintenance = if query.statement.pays_index_maintenance() {
                self.maintenance(i, config)?
            } else {
                0.0
            };
            queries.push(QueryCost {
                query: i,
                selection: self.selection(i, &covering)?,
                maintenance,
            });
        }

        Ok(CostBreakdown {
            total: queries.iter().map(QueryCost::total).sum(),
            queries,
        })
    }

    /// Selection cost of query `query` under `config`, without maintenance
    pub fn query_selection_cost(&self, query: usize, config: &[IndexId]) -> Result<f64> {
        let covering = self.covering(config)?;
        self.selection(query, &covering)
    }

    fn covering(&self, config: &[IndexId]) -> Result<Vec<usize>> {
        let covering = self.atomics.covering(config);
        if covering.is_empty() {
            return Err(Error::inconsistent(
                None,
                None,
                format!("no atomic config is contained in a config of {} indexes", config.len()),
            ));
        }
        Ok(covering)
    }

    fn selection(&self, query: usize, covering: &[usize]) -> Result<f64> {
        let item = self.workload.queries.get(query).ok_or_else(|| {
            Error::inconsistent(Some(query), None, "query is outside the workload")
        })?;

        let mut best = f64::INFINITY;
        for &pos in covering {
            let cost = item.cost(pos).ok_or_else(|| {
                Error::inconsistent(
                    Some(query),
                    Some(pos),
                    format!("cost list holds only {} entries", item.cost_list().len()),
                )
            })?;
            best = best.min(cost);
        }
        Ok(best)
    }

    /// Sum of `cost(single index) - cost(no index)` over `config`
    ///
    /// Charged for every index, whether or not it sits on the written table.
    fn maintenance(&self, query: usize, config: &[IndexId]) -> Result<f64> {
        let item = &self.workload.queries[query];
        let baseline = item.baseline_cost().ok_or_else(|| {
            Error::inconsistent(Some(query), Some(0), "baseline cost missing")
        })?;

        let mut penalty = 0.0;
        for id in config {
            let pos = self.atomics.singleton_position(*id).ok_or_else(|| {
                Error::inconsistent(
                    Some(query),
                    None,
                    format!("index {} was never probed alone", id),
                )
            })?;
            let single = item.cost(pos).ok_or_else(|| {
                Error::inconsistent(Some(query), Some(pos), "cost list out of range")
            })?;
            penalty += single - baseline;
        }
        Ok(penalty)
    }
}
