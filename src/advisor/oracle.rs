//! Cost oracle boundary
//!
//! The optimization core never talks to a database directly. A concrete driver
//! implements [`CostOracle`]; the core wraps it in an [`OracleClient`] that adds
//! per-call deadlines, a bounded retry and bounded probe concurrency.

use super::{IndexItem, Statement, Workload};
use crate::config::AdvisorConfig;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Ordered column list of one suggested index
pub type ColumnGroup = Vec<String>;

/// Suggested or accepted column groups per table
pub type TableColumnGroups = BTreeMap<String, Vec<ColumnGroup>>;

/// Capability interface of the database planner
#[async_trait]
pub trait CostOracle: Send + Sync {
    /// One estimated cost per statement, in order; `None` when the statement
    /// produced no plan. An empty `hypothetical` slice means no extra indexes.
    async fn estimate_cost(
        &self,
        statements: &[Statement],
        hypothetical: &[IndexItem],
    ) -> Result<Vec<Option<f64>>>;

    /// Column groups per table suggested by the what-if advisor
    async fn advise_indexes(&self, statement: &Statement) -> Result<TableColumnGroups>;

    /// The subset of `hypothetical` the planner actually chose for `statement`
    async fn check_index_usage(
        &self,
        statement: &Statement,
        hypothetical: &[IndexItem],
    ) -> Result<TableColumnGroups>;
}

#[async_trait]
impl<T: CostOracle + ?Sized> CostOracle for std::sync::Arc<T> {
    async fn estimate_cost(
        &self,
        statements: &[Statement],
        hypothetical: &[IndexItem],
    ) -> Result<Vec<Option<f64>>> {
        (**self).estimate_cost(statements, hypothetical).await
    }

    async fn advise_indexes(&self, statement: &Statement) -> Result<TableColumnGroups> {
        (**self).advise_indexes(statement).await
    }

    async fn check_index_usage(
        &self,
        statement: &Statement,
        hypothetical: &[IndexItem],
    ) -> Result<TableColumnGroups> {
        (**self).check_index_usage(statement, hypothetical).await
    }
}

/// Flatten table groups into hypothetical index items, preserving order
pub fn groups_to_indexes(groups: &TableColumnGroups) -> Vec<IndexItem> {
    groups
        .iter()
        .flat_map(|(table, columns)| {
            columns
                .iter()
                .filter(|group| !group.is_empty())
                .map(move |group| IndexItem::new(table.clone(), group.clone()))
        })
        .collect()
}

/// Oracle wrapper used by every pipeline stage
pub struct OracleClient<'a, O: CostOracle + ?Sized> {
    oracle: &'a O,
    policy: RetryPolicy,
    workers: usize,
}

impl<'a, O: CostOracle + ?Sized> OracleClient<'a, O> {
    pub fn new(oracle: &'a O, config: &AdvisorConfig) -> Self {
        Self {
            oracle,
            policy: config.retry_policy(),
            workers: config.probe_workers.max(1),
        }
    }

    pub fn with_policy(oracle: &'a O, policy: RetryPolicy, workers: usize) -> Self {
        Self {
            oracle,
            policy,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn estimate(
        &self,
        statements: &[Statement],
        hypothetical: &[IndexItem],
    ) -> Result<Vec<Option<f64>>> {
        self.policy
            .execute_async("estimate_cost", || {
                self.oracle.estimate_cost(statements, hypothetical)
            })
            .await
    }

    pub async fn advise(&self, statement: &Statement) -> Result<TableColumnGroups> {
        self.policy
            .execute_async("advise_indexes", || self.oracle.advise_indexes(statement))
            .await
    }

    /// Validate `groups` against the planner and keep only the ones it used
    ///
    /// The result preserves the order of `groups`; anything the checker reports
    /// that was not proposed is ignored.
    pub async fn accepted_groups(
        &self,
        statement: &Statement,
        groups: &TableColumnGroups,
    ) -> Result<TableColumnGroups> {
        let hypothetical = groups_to_indexes(groups);
        if hypothetical.is_empty() {
            return Ok(TableColumnGroups::new());
        }

        let used = self
            .policy
            .execute_async("check_index_usage", || {
                self.oracle.check_index_usage(statement, &hypothetical)
            })
            .await?;

        let mut accepted = TableColumnGroups::new();
        for index in &hypothetical {
            let chosen = used
                .get(&index.table)
                .map(|cols| cols.contains(&index.columns))
                .unwrap_or(false);
            if !chosen {
                continue;
            }
            let entry = accepted.entry(index.table.clone()).or_default();
            if !entry.contains(&index.columns) {
                entry.push(index.columns.clone());
            }
        }
        Ok(accepted)
    }

    /// Probe the whole workload once per configuration
    ///
    /// `configs[k]` is probed for position `k`: every surviving query gets its
    /// frequency-weighted cost appended at `cost_list[k]`. Probes run
    /// concurrently up to the worker bound; results are consumed in submission
    /// order so positions never interleave. A statement without a plan is
    /// dropped from further consideration.
    pub async fn probe_configs(&self, workload: &mut Workload, configs: &[Vec<IndexItem>]) -> Result<()> {
        let statements = workload.statements();
        let statements = &statements;

        let mut probes = stream::iter(configs.iter().enumerate())
            .map(|(position, config)| async move {
                (position, self.estimate(statements, config).await)
            })
            .buffered(self.workers);

        while let Some((position, result)) = probes.next().await {
            let costs = result?;
            if costs.len() != workload.len() {
                return Err(Error::inconsistent(
                    None,
                    Some(position),
                    format!(
                        "oracle returned {} costs for {} statements",
                        costs.len(),
                        workload.len()
                    ),
                ));
            }

            for (i, (query, cost)) in workload.queries.iter_mut().zip(costs).enumerate() {
                if query.is_dropped() {
                    continue;
                }
                match cost {
                    Some(cost) if cost.is_finite() && cost >= 0.0 => {
                        query.record_cost(i, position, cost * query.statement.frequency())?;
                    }
                    _ => {
                        let err = Error::MalformedProbeResult {
                            statement: i,
                            atomic_config: position,
                        };
                        warn!(
                            error = %err,
                            kind = ?query.statement.kind(),
                            statement = query.statement.text(),
                            "Dropping statement"
                        );
                        query.drop_from_consideration();
                    }
                }
            }
            debug!(atomic_config = position, indexes = configs[position].len(), "Probe complete");
        }

        if workload.queries.iter().all(|q| q.is_dropped()) && !workload.is_empty() {
            warn!("Every statement was dropped; no cost information is left");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::ReplayOracle;
    use std::time::Duration;

    fn client(oracle: &ReplayOracle) -> OracleClient<'_, ReplayOracle> {
        let policy = RetryPolicy {
            max_attempts: 1,
            call_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        OracleClient::with_policy(oracle, policy, 2)
    }

    #[tokio::test]
    async fn test_accepted_groups_keep_only_used_proposals() {
        let oracle = ReplayOracle::builder()
            .baseline("SELECT * FROM t WHERE a = 1 AND b = 2", 100.0)
            .usable("SELECT * FROM t WHERE a = 1 AND b = 2", "t", &["a"])
            .usable("SELECT * FROM t WHERE a = 1 AND b = 2", "u", &["z"])
            .build();
        let statement = Statement::new("SELECT * FROM t WHERE a = 1 AND b = 2", 1.0);

        let mut groups = TableColumnGroups::new();
        groups.insert(
            "t".to_string(),
            vec![vec!["a".to_string()], vec!["b".to_string()]],
        );

        let accepted = client(&oracle).accepted_groups(&statement, &groups).await.unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted["t"], vec![vec!["a".to_string()]]);
    }

    #[tokio::test]
    async fn test_probe_configs_weights_by_frequency_and_drops_unplanned() {
        let oracle = ReplayOracle::builder()
            .baseline("SELECT * FROM t WHERE a = 1", 100.0)
            .cost("SELECT * FROM t WHERE a = 1", &[IndexItem::new("t", ["a"])], 10.0)
            .build();

        let mut workload = Workload::from_statements([
            Statement::new("SELECT * FROM t WHERE a = 1", 3.0),
            Statement::new("SELECT * FROM unknown", 1.0),
        ]);
        let configs = vec![Vec::new(), vec![IndexItem::new("t", ["a"])]];

        client(&oracle).probe_configs(&mut workload, &configs).await.unwrap();

        assert_eq!(workload.queries[0].cost_list(), &[300.0, 30.0]);
        assert!(workload.queries[1].is_dropped());
        assert_eq!(workload.dropped(), vec![1]);
    }
}
