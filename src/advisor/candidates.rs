//! Candidate index generation
//!
//! Every read statement is sent to the what-if advisor. Its suggestions are
//! validated against the planner and only indexes the plan actually uses are
//! kept. In iterative mode accepted indexes are widened one column at a time
//! with the other indexable columns of the same table and re-validated.

use super::{CandidateSet, CostOracle, IndexItem, OracleClient, Statement, TableColumnGroups, Workload};
use crate::config::AdvisorConfig;
use crate::error::Result;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Indexable columns per table, in suggestion order without repeats
pub fn indexable_columns(groups: &TableColumnGroups) -> BTreeMap<String, Vec<String>> {
    let mut columns: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (table, table_groups) in groups {
        let entry = columns.entry(table.clone()).or_default();
        for column in table_groups.iter().flatten() {
            if !entry.contains(column) {
                entry.push(column.clone());
            }
        }
    }
    columns
}

pub struct CandidateGenerator<'c, 'a, O: CostOracle + ?Sized> {
    client: &'c OracleClient<'a, O>,
    max_index_columns: usize,
    iterative: bool,
}

impl<'c, 'a, O: CostOracle + ?Sized> CandidateGenerator<'c, 'a, O> {
    pub fn new(client: &'c OracleClient<'a, O>, config: &AdvisorConfig) -> Self {
        Self {
            client,
            max_index_columns: config.max_index_columns,
            iterative: config.iterative_mode,
        }
    }

    /// Populate each query's valid indexes and return the deduplicated candidates
    pub async fn generate(&self, workload: &mut Workload) -> Result<CandidateSet> {
        let statements = workload.statements();
        let statements = &statements;

        let mut per_query = stream::iter(0..statements.len())
            .filter(|&i| futures::future::ready(statements[i].is_read_candidate()))
            .map(|i| async move { (i, self.accepted_for(&statements[i]).await) })
            .buffered(self.client.workers());

        let mut candidates = CandidateSet::new();
        while let Some((i, accepted)) = per_query.next().await {
            let accepted = accepted?;
            let query = &mut workload.queries[i];

            for (table, groups) in accepted {
                for columns in groups {
                    let index = IndexItem::new(table.clone(), columns);
                    let label = index.to_string();
                    let (id, is_new) = candidates.insert(index);
                    query.add_valid_index(id);
                    if is_new {
                        info!(query = i, index = %label, "Candidate index");
                    }
                }
            }
        }

        Ok(candidates)
    }

    async fn accepted_for(&self, statement: &Statement) -> Result<TableColumnGroups> {
        let advice = self.client.advise(statement).await?;
        if advice.is_empty() {
            return Ok(advice);
        }

        if self.iterative {
            self.extend_iteratively(statement, &advice).await
        } else {
            self.client.accepted_groups(statement, &advice).await
        }
    }

    /// Start from single-column indexes and widen the accepted ones
    ///
    /// Round `w` extends every accepted group of width `w` for `w` up to the
    /// column cap, so a cap-width group is widened once more. The loop stops
    /// early when a round adds nothing.
    async fn extend_iteratively(
        &self,
        statement: &Statement,
        advice: &TableColumnGroups,
    ) -> Result<TableColumnGroups> {
        let indexable = indexable_columns(advice);
        let singles: TableColumnGroups = indexable
            .iter()
            .map(|(table, columns)| {
                (
                    table.clone(),
                    columns.iter().map(|c| vec![c.clone()]).collect(),
                )
            })
            .collect();

        let mut valid = self.client.accepted_groups(statement, &singles).await?;

        for width in 1..=self.max_index_columns {
            let mut extended = valid.clone();
            let mut changed = false;

            for (table, groups) in &valid {
                let Some(columns) = indexable.get(table) else {
                    continue;
                };
                let target = extended.entry(table.clone()).or_default();
                for group in groups.iter().filter(|g| g.len() == width) {
                    for column in columns.iter().filter(|c| !group.contains(c)) {
                        let mut wider = group.clone();
                        wider.push(column.clone());
                        if !target.contains(&wider) {
                            target.push(wider);
                            changed = true;
                        }
                    }
                }
            }

            if !changed {
                break;
            }
            debug!(width = width + 1, statement = statement.text(), "Re-validating widened indexes");
            valid = self.client.accepted_groups(statement, &extended).await?;
        }

        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::{IndexId, ReplayOracle};
    use crate::config::ConfigBuilder;

    const Q1: &str = "SELECT * FROM t WHERE a = 1 AND b = 2";
    const Q2: &str = "SELECT * FROM t WHERE a = 3";
    const W: &str = "DELETE FROM t WHERE a = 1";

    fn workload() -> Workload {
        Workload::from_statements([
            Statement::new(Q1, 1.0),
            Statement::new(Q2, 1.0),
            Statement::new(W, 1.0),
        ])
    }

    #[tokio::test]
    async fn test_simple_mode_shares_candidates_across_queries() {
        let oracle = ReplayOracle::builder()
            .advice(Q1, "t", &["a", "b"])
            .advice(Q1, "t", &["a"])
            .usable(Q1, "t", &["a", "b"])
            .usable(Q1, "t", &["a"])
            .advice(Q2, "t", &["a"])
            .usable(Q2, "t", &["a"])
            .advice(W, "t", &["a"])
            .usable(W, "t", &["a"])
            .build();
        let config = AdvisorConfig::default();
        let client = OracleClient::new(&oracle, &config);

        let mut workload = workload();
        let candidates = CandidateGenerator::new(&client, &config)
            .generate(&mut workload)
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(workload.queries[0].valid_indexes, vec![IndexId(0), IndexId(1)]);
        assert_eq!(workload.queries[1].valid_indexes, vec![IndexId(1)]);
        // writes never reach the advisor
        assert!(workload.queries[2].valid_indexes.is_empty());
        assert_eq!(candidates.get(IndexId(0)).unwrap().columns, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_iterative_mode_widens_accepted_indexes() {
        let oracle = ReplayOracle::builder()
            .advice(Q1, "t", &["a", "b"])
            .usable(Q1, "t", &["a"])
            .usable(Q1, "t", &["a", "b"])
            .build();
        let config = ConfigBuilder::new().iterative(true).build().unwrap();
        let client = OracleClient::new(&oracle, &config);

        let mut workload = Workload::from_statements([Statement::new(Q1, 1.0)]);
        let candidates = CandidateGenerator::new(&client, &config)
            .generate(&mut workload)
            .await
            .unwrap();

        let found: Vec<String> = candidates.iter().map(|(_, index)| index.to_string()).collect();
        assert_eq!(found, vec!["t(a)".to_string(), "t(a,b)".to_string()]);
    }

    #[tokio::test]
    async fn test_cap_width_group_is_extended_once() {
        let oracle = ReplayOracle::builder()
            .advice(Q1, "t", &["a", "b", "c", "d"])
            .usable(Q1, "t", &["a"])
            .usable(Q1, "t", &["a", "b"])
            .usable(Q1, "t", &["a", "b", "c"])
            .usable(Q1, "t", &["a", "b", "c", "d"])
            .build();
        let config = ConfigBuilder::new()
            .iterative(true)
            .max_index_columns(2)
            .build()
            .unwrap();
        let client = OracleClient::new(&oracle, &config);

        let mut workload = Workload::from_statements([Statement::new(Q1, 1.0)]);
        let candidates = CandidateGenerator::new(&client, &config)
            .generate(&mut workload)
            .await
            .unwrap();

        let widest = candidates.iter().map(|(_, index)| index.width()).max();
        assert_eq!(widest, Some(3));
        assert!(candidates
            .find("t", &["a".to_string(), "b".to_string(), "c".to_string()])
            .is_some());
    }

    #[tokio::test]
    async fn test_default_cap_reaches_six_columns() {
        let columns = ["a", "b", "c", "d", "e", "f"];
        let mut builder = ReplayOracle::builder().advice(Q1, "t", &columns);
        for width in 1..=columns.len() {
            builder = builder.usable(Q1, "t", &columns[..width]);
        }
        let oracle = builder.build();
        let config = ConfigBuilder::new().iterative(true).build().unwrap();
        let client = OracleClient::new(&oracle, &config);

        let mut workload = Workload::from_statements([Statement::new(Q1, 1.0)]);
        let candidates = CandidateGenerator::new(&client, &config)
            .generate(&mut workload)
            .await
            .unwrap();

        let widest = candidates.iter().map(|(_, index)| index.width()).max();
        assert_eq!(widest, Some(6));
    }

    #[test]
    fn test_indexable_columns_flatten_without_repeats() {
        let mut groups = TableColumnGroups::new();
        groups.insert(
            "t".to_string(),
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["b".to_string(), "c".to_string()],
            ],
        );
        assert_eq!(indexable_columns(&groups)["t"], vec!["a", "b", "c"]);
    }
}
