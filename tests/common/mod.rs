#![allow(dead_code)]

use async_trait::async_trait;
use lightning_advisor::advisor::TableColumnGroups;
use lightning_advisor::{AdvisorConfig, CostOracle, Error, IndexItem, ReplayOracle, Result, Statement};
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub estimate: usize,
    pub advise: usize,
    pub check: usize,
}

/// Replay oracle that records how often each capability was used
pub struct CountingOracle {
    inner: ReplayOracle,
    calls: Mutex<CallCounts>,
}

impl CountingOracle {
    pub fn new(inner: ReplayOracle) -> Self {
        Self {
            inner,
            calls: Mutex::new(CallCounts::default()),
        }
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock()
    }
}

#[async_trait]
impl CostOracle for CountingOracle {
    async fn estimate_cost(&self, statements: &[Statement], hypothetical: &[IndexItem]) -> Result<Vec<Option<f64>>> {
        self.calls.lock().estimate += 1;
        self.inner.estimate_cost(statements, hypothetical).await
    }

    async fn advise_indexes(&self, statement: &Statement) -> Result<TableColumnGroups> {
        self.calls.lock().advise += 1;
        self.inner.advise_indexes(statement).await
    }

    async fn check_index_usage(&self, statement: &Statement, hypothetical: &[IndexItem]) -> Result<TableColumnGroups> {
        self.calls.lock().check += 1;
        self.inner.check_index_usage(statement, hypothetical).await
    }
}

/// How the estimator misbehaves
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Every estimate fails with a transport error
    Unavailable,
    /// The first estimate fails, later ones succeed
    FlakyOnce,
    /// Every estimate takes longer than this
    Slow(Duration),
}

/// Replay oracle whose estimator fails in a scripted way
pub struct FaultyOracle {
    inner: ReplayOracle,
    fault: Fault,
    attempts: Mutex<usize>,
}

impl FaultyOracle {
    pub fn new(inner: ReplayOracle, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            attempts: Mutex::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

#[async_trait]
impl CostOracle for FaultyOracle {
    async fn estimate_cost(&self, statements: &[Statement], hypothetical: &[IndexItem]) -> Result<Vec<Option<f64>>> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            *attempts += 1;
            *attempts
        };

        match self.fault {
            Fault::Unavailable => Err(Error::OracleUnavailable {
                operation: "estimate_cost".to_string(),
                reason: "connection refused".to_string(),
            }),
            Fault::FlakyOnce if attempt == 1 => Err(Error::OracleUnavailable {
                operation: "estimate_cost".to_string(),
                reason: "connection reset".to_string(),
            }),
            Fault::FlakyOnce => self.inner.estimate_cost(statements, hypothetical).await,
            Fault::Slow(delay) => {
                tokio::time::sleep(delay).await;
                self.inner.estimate_cost(statements, hypothetical).await
            }
        }
    }

    async fn advise_indexes(&self, statement: &Statement) -> Result<TableColumnGroups> {
        self.inner.advise_indexes(statement).await
    }

    async fn check_index_usage(&self, statement: &Statement, hypothetical: &[IndexItem]) -> Result<TableColumnGroups> {
        self.inner.check_index_usage(statement, hypothetical).await
    }
}

pub const SELECT_A: &str = "SELECT * FROM t WHERE a=1";
pub const DELETE_A: &str = "DELETE FROM t WHERE a=1";

/// Select 100 -> 10 and delete 50 -> 55 under `t(a)`
pub fn scenario_oracle() -> ReplayOracle {
    ReplayOracle::builder()
        .baseline(SELECT_A, 100.0)
        .advice(SELECT_A, "t", &["a"])
        .usable(SELECT_A, "t", &["a"])
        .cost(SELECT_A, &[IndexItem::new("t", ["a"])], 10.0)
        .baseline(DELETE_A, 50.0)
        .cost(DELETE_A, &[IndexItem::new("t", ["a"])], 55.0)
        .build()
}

/// Fast, single-attempt configuration for tests
pub fn test_config(iterative: bool) -> AdvisorConfig {
    AdvisorConfig {
        iterative_mode: iterative,
        probe_retries: 0,
        probe_timeout_ms: 2_000,
        seed: Some(42),
        ..AdvisorConfig::default()
    }
}

/// Replay oracle whose no-index estimate finishes after every other estimate
pub struct SkewedOracle {
    inner: ReplayOracle,
    baseline_delay: Duration,
    other_delay: Duration,
}

impl SkewedOracle {
    pub fn new(inner: ReplayOracle, baseline_delay: Duration, other_delay: Duration) -> Self {
        Self {
            inner,
            baseline_delay,
            other_delay,
        }
    }
}

#[async_trait]
impl CostOracle for SkewedOracle {
    async fn estimate_cost(&self, statements: &[Statement], hypothetical: &[IndexItem]) -> Result<Vec<Option<f64>>> {
        let delay = if hypothetical.is_empty() {
            self.baseline_delay
        } else {
            self.other_delay
        };
        tokio::time::sleep(delay).await;
        self.inner.estimate_cost(statements, hypothetical).await
    }

    async fn advise_indexes(&self, statement: &Statement) -> Result<TableColumnGroups> {
        self.inner.advise_indexes(statement).await
    }

    async fn check_index_usage(&self, statement: &Statement, hypothetical: &[IndexItem]) -> Result<TableColumnGroups> {
        self.inner.check_index_usage(statement, hypothetical).await
    }
}
