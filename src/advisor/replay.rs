//! Offline replay oracle
//!
//! Answers cost, advice and usage questions from a recorded JSON fixture
//! instead of a live planner. Useful to re-run a recommendation without a
//! database and to script planner behaviour in tests.
//!
//! Fixture layout, keyed by exact statement text:
//!
//! ```json
//! {
//!   "statements": {
//!     "SELECT * FROM t WHERE a = 1": {
//!       "baseline": 100.0,
//!       "advice": { "t": [["a"]] },
//!       "usable": [{ "table": "t", "columns": ["a"] }],
//!       "costs": [{ "indexes": [{ "table": "t", "columns": ["a"] }], "cost": 10.0 }]
//!     }
//!   }
//! }
//! ```

use super::{CostOracle, IndexItem, Statement, TableColumnGroups};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    pub table: String,
    pub columns: Vec<String>,
}

impl IndexSpec {
    fn matches(&self, index: &IndexItem) -> bool {
        index.same_index(&self.table, &self.columns)
    }
}

impl From<&IndexItem> for IndexSpec {
    fn from(index: &IndexItem) -> Self {
        Self {
            table: index.table.clone(),
            columns: index.columns.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEntry {
    pub indexes: Vec<IndexSpec>,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementFixture {
    /// Cost with no hypothetical index; absent means the statement has no plan
    pub baseline: Option<f64>,
    pub advice: TableColumnGroups,
    pub usable: Vec<IndexSpec>,
    pub costs: Vec<CostEntry>,
}

impl StatementFixture {
    /// Exact entry first, then the cheapest recorded subset, then the baseline
    fn cost_under(&self, hypothetical: &[IndexItem]) -> Option<f64> {
        let baseline = self.baseline?;

        let contained = |entry: &CostEntry| {
            entry
                .indexes
                .iter()
                .all(|spec| hypothetical.iter().any(|index| spec.matches(index)))
        };

        if let Some(exact) = self
            .costs
            .iter()
            .find(|entry| entry.indexes.len() == hypothetical.len() && contained(entry))
        {
            return Some(exact.cost);
        }

        let cheapest_subset = self
            .costs
            .iter()
            .filter(|entry| !entry.indexes.is_empty() && contained(entry))
            .map(|entry| entry.cost)
            .fold(None, |best: Option<f64>, cost| {
                Some(best.map_or(cost, |b| b.min(cost)))
            });

        Some(cheapest_subset.unwrap_or(baseline))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayFixture {
    pub statements: HashMap<String, StatementFixture>,
}

/// [`CostOracle`] backed by a [`ReplayFixture`]
#[derive(Debug, Clone, Default)]
pub struct ReplayOracle {
    fixture: ReplayFixture,
}

impl ReplayOracle {
    pub fn new(fixture: ReplayFixture) -> Self {
        Self { fixture }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let fixture: ReplayFixture = serde_json::from_str(&content)?;
        Ok(Self::new(fixture))
    }

    pub fn builder() -> ReplayOracleBuilder {
        ReplayOracleBuilder::default()
    }

    pub fn fixture(&self) -> &ReplayFixture {
        &self.fixture
    }
}

#[async_trait]
impl CostOracle for ReplayOracle {
    async fn estimate_cost(
        &self,
        statements: &[Statement],
        hypothetical: &[IndexItem],
    ) -> Result<Vec<Option<f64>>> {
        Ok(statements
            .iter()
            .map(|statement| {
                self.fixture
                    .statements
                    .get(statement.text())
                    .and_then(|fixture| fixture.cost_under(hypothetical))
            })
            .collect())
    }

    async fn advise_indexes(&self, statement: &Statement) -> Result<TableColumnGroups> {
        Ok(self
            .fixture
            .statements
            .get(statement.text())
            .map(|fixture| fixture.advice.clone())
            .unwrap_or_default())
    }

    async fn check_index_usage(
        &self,
        statement: &Statement,
        hypothetical: &[IndexItem],
    ) -> Result<TableColumnGroups> {
        let mut used = TableColumnGroups::new();
        if let Some(fixture) = self.fixture.statements.get(statement.text()) {
            for index in hypothetical {
                if fixture.usable.iter().any(|spec| spec.matches(index)) {
                    used.entry(index.table.clone())
                        .or_default()
                        .push(index.columns.clone());
                }
            }
        }
        Ok(used)
    }
}

/// Programmatic construction of a replay fixture
#[derive(Debug, Default)]
pub struct ReplayOracleBuilder {
    fixture: ReplayFixture,
}

impl ReplayOracleBuilder {
    fn statement(&mut self, sql: &str) -> &mut StatementFixture {
        self.fixture.statements.entry(sql.to_string()).or_default()
    }

    pub fn baseline(mut self, sql: &str, cost: f64) -> Self {
        self.statement(sql).baseline = Some(cost);
        self
    }

    pub fn advice(mut self, sql: &str, table: &str, columns: &[&str]) -> Self {
        self.statement(sql)
            .advice
            .entry(table.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn usable(mut self, sql: &str, table: &str, columns: &[&str]) -> Self {
        self.statement(sql).usable.push(IndexSpec {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn cost(mut self, sql: &str, indexes: &[IndexItem], cost: f64) -> Self {
        self.statement(sql).costs.push(CostEntry {
            indexes: indexes.iter().map(IndexSpec::from).collect(),
            cost,
        });
        self
    }

    pub fn build(self) -> ReplayOracle {
        ReplayOracle::new(self.fixture)
    }
}
