pub mod advisor;
pub mod config;
pub mod error;
pub mod logging;
pub mod retry;

pub use advisor::{
    load_workload, AtomicConfig, AtomicConfigBuilder, AtomicConfigSet, BenefitRanking,
    CandidateGenerator, CandidateSet, CostInference, CostOracle, GreedyRound, GreedySelector,
    IndexAdvisor, IndexId, IndexItem, OracleClient, Outcome, QueryItem, Recommendation,
    RecommendedIndex, ReplayOracle, Statement, StatementKind, Strategy, TableColumnGroups,
    Workload, WorkloadCompressor,
};
pub use config::{AdvisorConfig, ConfigBuilder};
pub use error::{Error, Result};
