//! Workload-driven Index Advisor
//!
//! This module recommends a near-optimal set of secondary indexes for a SQL
//! workload without building any real index:
//! - Compresses the raw statement log into weighted representative samples
//! - Asks the what-if advisor for candidate indexes and validates their usage
//! - Decomposes candidate combinations into a minimal set of atomic configs
//! - Infers the workload cost of any configuration from the atomic costs
//! - Greedily grows the configuration that reduces workload cost the most
//!
//! The database planner is only reached through the [`CostOracle`] trait.

use crate::config::AdvisorConfig;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;
use std::time::Instant;
use tracing::{info, warn};

pub mod atomic;
pub mod candidates;
pub mod cost_inference;
pub mod greedy;
pub mod oracle;
pub mod ranking;
pub mod replay;
pub mod workload;

pub use atomic::*;
pub use candidates::*;
pub use cost_inference::*;
pub use greedy::*;
pub use oracle::*;
pub use ranking::*;
pub use replay::*;
pub use workload::*;

/// Normalized SQL text plus its occurrence weight
///
/// Produced once by the compressor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    text: String,
    frequency: f64,
}

/// Leading verb of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl Statement {
    pub fn new(text: impl Into<String>, frequency: f64) -> Self {
        Self {
            text: text.into(),
            frequency,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn kind(&self) -> StatementKind {
        let first = self
            .text
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|word| !word.is_empty())
            .unwrap_or("")
            .to_ascii_lowercase();

        match first.as_str() {
            "select" | "with" => StatementKind::Select,
            "insert" => StatementKind::Insert,
            "update" => StatementKind::Update,
            "delete" => StatementKind::Delete,
            _ => StatementKind::Other,
        }
    }

    /// Only statements that read through a select are worth asking the advisor about
    pub fn is_read_candidate(&self) -> bool {
        contains_keyword(&self.text, "select")
    }

    /// Statements that pay index maintenance in the inferred cost
    pub fn pays_index_maintenance(&self) -> bool {
        contains_keyword(&self.text, "insert") || contains_keyword(&self.text, "delete")
    }
}

/// Case-insensitive whole-word keyword search
pub fn contains_keyword(sql: &str, keyword: &str) -> bool {
    let lower = sql.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    lower.match_indices(keyword).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = start == 0 || !is_word(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_word(bytes[end]);
        before_ok && after_ok
    })
}

/// Position of an index inside the [`CandidateSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexId(pub usize);

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Candidate index identified by table and ordered column list
///
/// Equality and hashing use `(table, columns)` only; `(a,b)` and `(b,a)` differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexItem {
    pub table: String,
    pub columns: Vec<String>,
    /// Standalone workload cost reduction, filled in by the benefit ranking
    #[serde(default)]
    pub benefit: f64,
}

impl IndexItem {
    pub fn new<S: Into<String>>(table: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            benefit: 0.0,
        }
    }

    /// Build from the comma-joined column form, e.g. `"a, b"`
    pub fn from_joined(table: impl Into<String>, columns: &str) -> Self {
        Self::new(
            table,
            columns
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>(),
        )
    }

    pub fn columns_joined(&self) -> String {
        self.columns.join(",")
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn same_index(&self, table: &str, columns: &[String]) -> bool {
        self.table == table && self.columns == columns
    }

    /// Name the planner reports for the hypothetical version of this index
    pub fn hypothetical_name(&self) -> String {
        let mut parts = Vec::with_capacity(self.columns.len() + 1);
        parts.push(self.table.as_str());
        parts.extend(self.columns.iter().map(String::as_str));
        parts.join("_")
    }

    pub fn create_statement(&self, ordinal: usize) -> String {
        format!(
            "CREATE INDEX ind{} ON {}({});",
            ordinal,
            self.table,
            self.columns_joined()
        )
    }
}

impl PartialEq for IndexItem {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.columns == other.columns
    }
}

impl Eq for IndexItem {}

impl std::hash::Hash for IndexItem {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.columns.hash(state);
    }
}

impl fmt::Display for IndexItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.table, self.columns_joined())
    }
}

/// Deduplicated candidate indexes shared by every query that can use them
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    indexes: Vec<IndexItem>,
    lookup: HashMap<(String, Vec<String>), IndexId>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an index, returning its id and whether it was new
    pub fn insert(&mut self, index: IndexItem) -> (IndexId, bool) {
        let key = (index.table.clone(), index.columns.clone());
        if let Some(id) = self.lookup.get(&key) {
            return (*id, false);
        }

        let id = IndexId(self.indexes.len());
        self.indexes.push(index);
        self.lookup.insert(key, id);
        (id, true)
    }

    pub fn find(&self, table: &str, columns: &[String]) -> Option<IndexId> {
        self.lookup
            .get(&(table.to_string(), columns.to_vec()))
            .copied()
    }

    pub fn get(&self, id: IndexId) -> Option<&IndexItem> {
        self.indexes.get(id.0)
    }

    /// Resolve ids into index items, failing on an id this set never issued
    pub fn resolve(&self, ids: &[IndexId]) -> Result<Vec<IndexItem>> {
        ids.iter()
            .map(|id| {
                self.get(*id).cloned().ok_or_else(|| {
                    Error::inconsistent(None, None, format!("unknown candidate index {}", id))
                })
            })
            .collect()
    }

    pub fn set_benefit(&mut self, id: IndexId, benefit: f64) {
        if let Some(index) = self.indexes.get_mut(id.0) {
            index.benefit = benefit;
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = IndexId> + '_ {
        (0..self.indexes.len()).map(IndexId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndexId, &IndexItem)> + '_ {
        self.indexes.iter().enumerate().map(|(i, index)| (IndexId(i), index))
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

/// A statement of the compressed workload together with its per-config costs
#[derive(Debug, Clone)]
pub struct QueryItem {
    pub statement: Statement,
    /// Candidate indexes accepted for this query, in discovery order
    pub valid_indexes: Vec<IndexId>,
    /// `cost_list[k]` is the frequency-weighted cost under atomic config `k`
    cost_list: Vec<f64>,
    /// Set once the oracle failed to plan this statement
    dropped: bool,
}

impl QueryItem {
    pub fn new(statement: Statement) -> Self {
        Self {
            statement,
            valid_indexes: Vec::new(),
            cost_list: Vec::new(),
            dropped: false,
        }
    }

    pub fn add_valid_index(&mut self, id: IndexId) {
        if !self.valid_indexes.contains(&id) {
            self.valid_indexes.push(id);
        }
    }

    /// Append the cost for atomic config `position`; positions must arrive in order
    pub fn record_cost(&mut self, query: usize, position: usize, cost: f64) -> Result<()> {
        if position != self.cost_list.len() {
            return Err(Error::inconsistent(
                Some(query),
                Some(position),
                format!("cost list holds {} entries", self.cost_list.len()),
            ));
        }
        self.cost_list.push(cost);
        Ok(())
    }

    pub fn cost(&self, position: usize) -> Option<f64> {
        self.cost_list.get(position).copied()
    }

    pub fn cost_list(&self) -> &[f64] {
        &self.cost_list
    }

    pub fn baseline_cost(&self) -> Option<f64> {
        self.cost(0)
    }

    pub fn drop_from_consideration(&mut self) {
        self.dropped = true;
    }

    pub fn is_dropped(&self) -> bool {
        self.dropped
    }
}

/// Ordered compressed workload; positions are stable for the whole run
#[derive(Debug, Clone, Default)]
pub struct Workload {
    pub queries: Vec<QueryItem>,
}

impl Workload {
    pub fn new(queries: Vec<QueryItem>) -> Self {
        Self { queries }
    }

    pub fn from_statements(statements: impl IntoIterator<Item = Statement>) -> Self {
        Self::new(statements.into_iter().map(QueryItem::new).collect())
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.queries.iter().map(|q| q.statement.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Positions of statements dropped after a failed probe
    pub fn dropped(&self) -> Vec<usize> {
        self.queries
            .iter()
            .enumerate()
            .filter(|(_, q)| q.is_dropped())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn total_frequency(&self) -> f64 {
        self.queries.iter().map(|q| q.statement.frequency()).sum()
    }
}

/// Hypothetical-index combination whose cost is measured by the oracle
///
/// Ids are kept sorted so that equality is multiset equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AtomicConfig {
    indexes: SmallVec<[IndexId; 4]>,
}

impl AtomicConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = IndexId>) -> Self {
        let mut indexes: SmallVec<[IndexId; 4]> = ids.into_iter().collect();
        indexes.sort_unstable();
        indexes.dedup();
        Self { indexes }
    }

    pub fn ids(&self) -> &[IndexId] {
        &self.indexes
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn singleton(&self) -> Option<IndexId> {
        match self.indexes.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

/// Which selection path produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Atomic decomposition plus greedy selection
    Greedy,
    /// Standalone benefit ranking with overlap filtering
    BenefitRanking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Recommended,
    /// Candidate generation yielded nothing; not an error
    NoCandidates,
    /// Candidates exist but none lowers the workload cost
    NoImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedIndex {
    pub table: String,
    pub columns: Vec<String>,
    /// Cost reduction credited to this index when it was picked
    pub benefit: f64,
}

impl RecommendedIndex {
    pub fn create_statement(&self, ordinal: usize) -> String {
        IndexItem::new(self.table.clone(), self.columns.clone()).create_statement(ordinal)
    }
}

/// Final advisor output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub strategy: Strategy,
    pub outcome: Outcome,
    pub indexes: Vec<RecommendedIndex>,
    pub baseline_cost: Option<f64>,
    pub estimated_cost: Option<f64>,
    pub candidate_count: usize,
    pub atomic_config_count: usize,
    pub dropped_statements: Vec<usize>,
    /// Committed cost per greedy round; empty for the benefit ranking
    pub greedy_trace: Vec<GreedyRound>,
    /// Every candidate with its standalone benefit, best first; empty for greedy
    pub ranked_candidates: Vec<RecommendedIndex>,
    pub elapsed_ms: u64,
}

impl Recommendation {
    fn empty(strategy: Strategy, outcome: Outcome) -> Self {
        Self {
            strategy,
            outcome,
            indexes: Vec::new(),
            baseline_cost: None,
            estimated_cost: None,
            candidate_count: 0,
            atomic_config_count: 0,
            dropped_statements: Vec::new(),
            greedy_trace: Vec::new(),
            ranked_candidates: Vec::new(),
            elapsed_ms: 0,
        }
    }

    pub fn create_statements(&self) -> Vec<String> {
        self.indexes
            .iter()
            .enumerate()
            .map(|(i, index)| index.create_statement(i))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

/// Run the CPU-bound greedy search on the blocking pool
async fn select_off_runtime(
    workload: Workload,
    atomics: AtomicConfigSet,
    candidates: CandidateSet,
    max_index_num: usize,
) -> Result<GreedySelection> {
    tokio::task::spawn_blocking(move || {
        let inference = CostInference::new(&workload, &atomics);
        GreedySelector::new(&inference, &candidates, max_index_num).select()
    })
    .await
    .map_err(|e| Error::Task(format!("greedy selection: {}", e)))?
}

/// Pipeline entry point: compress, generate candidates, probe, select
pub struct IndexAdvisor<O: CostOracle> {
    oracle: O,
    config: AdvisorConfig,
}

impl<O: CostOracle> IndexAdvisor<O> {
    pub fn new(oracle: O, config: AdvisorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { oracle, config })
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Compress a raw statement log and recommend indexes for it
    pub async fn recommend_from_log<R: BufRead>(&self, reader: R) -> Result<Recommendation> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let raw = load_workload(reader)?;
        let workload = WorkloadCompressor::new(self.config.sample_size).compress(&raw, &mut rng);
        info!(
            raw_statements = raw.len(),
            samples = workload.len(),
            "Workload compressed"
        );
        self.recommend(workload).await
    }

    /// Recommend indexes for an already compressed workload
    pub async fn recommend(&self, mut workload: Workload) -> Result<Recommendation> {
        let started = Instant::now();
        let strategy = if self.config.iterative_mode {
            Strategy::Greedy
        } else {
            Strategy::BenefitRanking
        };
        let client = OracleClient::new(&self.oracle, &self.config);

        info!(queries = workload.len(), ?strategy, "Generating candidate indexes");
        let mut candidates = CandidateGenerator::new(&client, &self.config)
            .generate(&mut workload)
            .await?;

        if candidates.is_empty() {
            info!("No candidate indexes generated");
            let mut recommendation = Recommendation::empty(strategy, Outcome::NoCandidates);
            recommendation.elapsed_ms = started.elapsed().as_millis() as u64;
            return Ok(recommendation);
        }

        info!(candidates = candidates.len(), "Determining optimal indexes");
        let mut recommendation = match strategy {
            Strategy::Greedy => self.select_greedy(&client, &mut workload, &candidates).await?,
            Strategy::BenefitRanking => {
                self.select_by_benefit(&client, &mut workload, &mut candidates)
                    .await?
            }
        };

        recommendation.candidate_count = candidates.len();
        recommendation.dropped_statements = workload.dropped();
        recommendation.elapsed_ms = started.elapsed().as_millis() as u64;
        if !recommendation.dropped_statements.is_empty() {
            warn!(
                dropped = recommendation.dropped_statements.len(),
                "Statements without a usable plan were left out"
            );
        }
        info!(
            recommended = recommendation.indexes.len(),
            baseline_cost = ?recommendation.baseline_cost,
            estimated_cost = ?recommendation.estimated_cost,
            "Index recommendation complete"
        );
        Ok(recommendation)
    }

    async fn select_greedy(
        &self,
        client: &OracleClient<'_, O>,
        workload: &mut Workload,
        candidates: &CandidateSet,
    ) -> Result<Recommendation> {
        let atomics = AtomicConfigBuilder::new(candidates, &self.config).build(workload)?;
        info!(atomic_configs = atomics.len(), "Atomic configs enumerated");

        probe_atomic_configs(client, workload, candidates, &atomics).await?;

        let atomic_config_count = atomics.len();
        let selection = select_off_runtime(
            workload.clone(),
            atomics,
            candidates.clone(),
            self.config.max_index_num,
        )
        .await?;

        let mut recommendation = Recommendation::empty(Strategy::Greedy, Outcome::Recommended);
        recommendation.atomic_config_count = atomic_config_count;
        recommendation.baseline_cost = Some(selection.baseline_cost);
        recommendation.estimated_cost = Some(selection.final_cost);
        recommendation.indexes = selection
            .trace
            .iter()
            .map(|round| RecommendedIndex {
                table: round.table.clone(),
                columns: round.columns.clone(),
                benefit: round.improvement,
            })
            .collect();
        recommendation.greedy_trace = selection.trace;
        if recommendation.indexes.is_empty() {
            recommendation.outcome = Outcome::NoImprovement;
        }
        Ok(recommendation)
    }

    async fn select_by_benefit(
        &self,
        client: &OracleClient<'_, O>,
        workload: &mut Workload,
        candidates: &mut CandidateSet,
    ) -> Result<Recommendation> {
        let atomics = AtomicConfigSet::with_singletons(candidates);
        probe_atomic_configs(client, workload, candidates, &atomics).await?;

        let ranking = BenefitRanking::new(workload, &atomics, self.config.max_index_num);
        let ranked = ranking.rank(candidates)?;

        let mut recommendation = Recommendation::empty(Strategy::BenefitRanking, Outcome::Recommended);
        recommendation.atomic_config_count = atomics.len();
        recommendation.baseline_cost = Some(ranked.baseline_cost);
        let describe = |id: &IndexId| {
            candidates.get(*id).map(|index| RecommendedIndex {
                table: index.table.clone(),
                columns: index.columns.clone(),
                benefit: index.benefit,
            })
        };
        recommendation.indexes = ranked.picked.iter().filter_map(describe).collect();
        recommendation.ranked_candidates = ranked
            .ranked
            .iter()
            .filter_map(|(id, _)| describe(id))
            .collect();
        if recommendation.indexes.is_empty() {
            recommendation.outcome = Outcome::NoImprovement;
        }
        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_classification() {
        let select = Statement::new("SELECT * FROM t WHERE a = 1", 1.0);
        assert_eq!(select.kind(), StatementKind::Select);
        assert!(select.is_read_candidate());
        assert!(!select.pays_index_maintenance());

        let delete = Statement::new("delete from t where a = 1", 1.0);
        assert_eq!(delete.kind(), StatementKind::Delete);
        assert!(delete.pays_index_maintenance());

        let update = Statement::new("UPDATE t SET b = 2 WHERE a = 1", 1.0);
        assert_eq!(update.kind(), StatementKind::Update);
        assert!(!update.pays_index_maintenance());

        let insert_select = Statement::new("INSERT INTO t SELECT * FROM s", 1.0);
        assert!(insert_select.is_read_candidate());
        assert!(insert_select.pays_index_maintenance());
    }

    #[test]
    fn test_keyword_is_whole_word() {
        assert!(contains_keyword("x; SELECT 1", "select"));
        assert!(!contains_keyword("SELECTED_ITEMS", "select"));
        assert!(!contains_keyword("undelete_log", "delete"));
    }

    #[test]
    fn test_index_item_equality_ignores_benefit_and_respects_order() {
        let mut a = IndexItem::new("t", ["a", "b"]);
        a.benefit = 10.0;
        let b = IndexItem::from_joined("t", "a, b");
        let reversed = IndexItem::new("t", ["b", "a"]);

        assert_eq!(a, b);
        assert_ne!(a, reversed);
        assert_eq!(a.hypothetical_name(), "t_a_b");
        assert_eq!(a.create_statement(3), "CREATE INDEX ind3 ON t(a,b);");
        assert_eq!(a.to_string(), "t(a,b)");
    }

    #[test]
    fn test_candidate_set_deduplicates() {
        let mut set = CandidateSet::new();
        let (first, new_first) = set.insert(IndexItem::new("t", ["a"]));
        let (again, new_again) = set.insert(IndexItem::new("t", ["a"]));
        let (other, _) = set.insert(IndexItem::new("u", ["a"]));

        assert!(new_first);
        assert!(!new_again);
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(set.len(), 2);
        assert_eq!(set.find("u", &["a".to_string()]), Some(other));
        assert!(set.resolve(&[IndexId(9)]).is_err());
    }

    #[test]
    fn test_cost_list_is_append_only() {
        let mut query = QueryItem::new(Statement::new("SELECT 1", 1.0));
        query.record_cost(0, 0, 100.0).unwrap();
        query.record_cost(0, 1, 80.0).unwrap();

        let err = query.record_cost(0, 3, 70.0).unwrap_err();
        assert!(matches!(
            err,
            Error::InconsistentState { query: Some(0), atomic_config: Some(3), .. }
        ));
        assert_eq!(query.cost_list(), &[100.0, 80.0]);
    }

    #[test]
    fn test_atomic_config_is_multiset_keyed() {
        let a = AtomicConfig::from_ids([IndexId(2), IndexId(0)]);
        let b = AtomicConfig::from_ids([IndexId(0), IndexId(2)]);
        assert_eq!(a, b);
        assert_eq!(a.singleton(), None);
        assert_eq!(AtomicConfig::from_ids([IndexId(4)]).singleton(), Some(IndexId(4)));
        assert!(AtomicConfig::empty().is_empty());
    }

    #[test]
    fn test_recommendation_renders_create_statements() {
        let mut recommendation = Recommendation::empty(Strategy::Greedy, Outcome::Recommended);
        recommendation.indexes.push(RecommendedIndex {
            table: "orders".to_string(),
            columns: vec!["customer_id".to_string(), "created_at".to_string()],
            benefit: 12.5,
        });
        assert_eq!(
            recommendation.create_statements(),
            vec!["CREATE INDEX ind0 ON orders(customer_id,created_at);".to_string()]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_greedy_runs_on_blocking_pool() {
        let mut candidates = CandidateSet::new();
        let (a, _) = candidates.insert(IndexItem::new("t", ["a"]));
        let (b, _) = candidates.insert(IndexItem::new("t", ["b"]));

        let mut query = QueryItem::new(Statement::new("SELECT * FROM t WHERE a = 1", 1.0));
        query.add_valid_index(a);
        query.add_valid_index(b);
        let mut workload = Workload::new(vec![query]);
        let atomics = AtomicConfigBuilder::with_caps(&candidates, 2, 2)
            .build(&workload)
            .unwrap();
        // empty, {b}, {a}, {a,b}
        for (pos, cost) in [100.0, 70.0, 40.0, 35.0].into_iter().enumerate() {
            workload.queries[0].record_cost(0, pos, cost).unwrap();
        }

        let inference = CostInference::new(&workload, &atomics);
        let direct = GreedySelector::new(&inference, &candidates, 10).select().unwrap();

        let offloaded = select_off_runtime(workload.clone(), atomics.clone(), candidates.clone(), 10)
            .await
            .unwrap();
        assert_eq!(offloaded.selected, direct.selected);
        assert_eq!(offloaded.selected, vec![a, b]);
        assert_eq!(offloaded.final_cost, 35.0);
        assert_eq!(offloaded.trace, direct.trace);
    }
}
