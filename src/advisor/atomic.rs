//! Atomic configuration enumeration
//!
//! Instead of probing the planner for every subset of candidates, each query's
//! valid indexes are expanded into the subsets that respect the per-probe caps
//! (distinct tables, indexes on one table). Subsets are merged across queries
//! and probed once each; every larger configuration is inferred from them.

use super::{AtomicConfig, CandidateSet, CostOracle, IndexId, OracleClient, Workload};
use crate::config::AdvisorConfig;
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::debug;

/// Globally numbered atomic configs; position 0 is always the empty config
#[derive(Debug, Clone)]
pub struct AtomicConfigSet {
    configs: Vec<AtomicConfig>,
    positions: HashMap<AtomicConfig, usize>,
    singletons: HashMap<IndexId, usize>,
}

impl Default for AtomicConfigSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicConfigSet {
    pub fn new() -> Self {
        let mut set = Self {
            configs: Vec::new(),
            positions: HashMap::new(),
            singletons: HashMap::new(),
        };
        set.insert(AtomicConfig::empty());
        set
    }

    /// Empty config plus one singleton per candidate, in candidate order
    pub fn with_singletons(candidates: &CandidateSet) -> Self {
        let mut set = Self::new();
        for id in candidates.ids() {
            set.insert(AtomicConfig::from_ids([id]));
        }
        set
    }

    /// Insert a config, returning its position and whether it was new
    pub fn insert(&mut self, config: AtomicConfig) -> (usize, bool) {
        if let Some(&pos) = self.positions.get(&config) {
            return (pos, false);
        }

        let pos = self.configs.len();
        if let Some(id) = config.singleton() {
            self.singletons.insert(id, pos);
        }
        self.positions.insert(config.clone(), pos);
        self.configs.push(config);
        (pos, true)
    }

    pub fn get(&self, position: usize) -> Option<&AtomicConfig> {
        self.configs.get(position)
    }

    pub fn position(&self, config: &AtomicConfig) -> Option<usize> {
        self.positions.get(config).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtomicConfig> {
        self.configs.iter()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Position of the config holding exactly `id`
    pub fn singleton_position(&self, id: IndexId) -> Option<usize> {
        self.singletons.get(&id).copied()
    }

    /// Positions of every atomic config contained in `ids`
    pub fn covering(&self, ids: &[IndexId]) -> Vec<usize> {
        self.configs
            .iter()
            .enumerate()
            .filter(|(_, config)| config.len() <= ids.len())
            .filter(|(_, config)| config.ids().iter().all(|id| ids.contains(id)))
            .map(|(pos, _)| pos)
            .collect()
    }
}

/// Enumerates the capped subsets of every query's valid indexes
pub struct AtomicConfigBuilder<'a> {
    candidates: &'a CandidateSet,
    max_tables: usize,
    max_per_table: usize,
}

impl<'a> AtomicConfigBuilder<'a> {
    pub fn new(candidates: &'a CandidateSet, config: &AdvisorConfig) -> Self {
        Self::with_caps(
            candidates,
            config.max_tables_per_atomic,
            config.max_indexes_per_table,
        )
    }

    pub fn with_caps(candidates: &'a CandidateSet, max_tables: usize, max_per_table: usize) -> Self {
        Self {
            candidates,
            max_tables: max_tables.max(1),
            max_per_table: max_per_table.max(1),
        }
    }

    pub fn build(&self, workload: &Workload) -> Result<AtomicConfigSet> {
        let mut set = AtomicConfigSet::new();

        for (i, query) in workload.queries.iter().enumerate() {
            if query.is_dropped() || query.valid_indexes.is_empty() {
                continue;
            }
            let subsets = self.enumerate(&query.valid_indexes)?;
            let mut added = 0;
            for subset in subsets {
                if set.insert(subset).1 {
                    added += 1;
                }
            }
            debug!(query = i, added, total = set.len(), "Atomic configs merged");
        }

        match set.get(0) {
            Some(first) if first.is_empty() => Ok(set),
            _ => Err(Error::inconsistent(
                None,
                Some(0),
                "the empty atomic config was not generated first",
            )),
        }
    }

    /// Every subset of `indexes` within the caps, excluded branch first
    ///
    /// Walks the include/exclude tree with an explicit stack. A branch that
    /// breaks a cap is cut at once: adding indexes never lowers a count.
    pub fn enumerate(&self, indexes: &[IndexId]) -> Result<Vec<AtomicConfig>> {
        let tables: Vec<&str> = indexes
            .iter()
            .map(|id| {
                self.candidates
                    .get(*id)
                    .map(|index| index.table.as_str())
                    .ok_or_else(|| {
                        Error::inconsistent(None, None, format!("unknown candidate index {}", id))
                    })
            })
            .collect::<Result<_>>()?;

        let mut subsets = Vec::new();
        let mut stack: Vec<(usize, SmallVec<[usize; 4]>)> = vec![(0, SmallVec::new())];

        while let Some((next, chosen)) = stack.pop() {
            if next == indexes.len() {
                subsets.push(AtomicConfig::from_ids(chosen.iter().map(|&k| indexes[k])));
                continue;
            }

            if self.fits(&tables, &chosen, next) {
                let mut with = chosen.clone();
                with.push(next);
                stack.push((next + 1, with));
            }
            stack.push((next + 1, chosen));
        }

        Ok(subsets)
    }

    fn fits(&self, tables: &[&str], chosen: &[usize], candidate: usize) -> bool {
        let table = tables[candidate];
        let same_table = chosen.iter().filter(|&&k| tables[k] == table).count();
        if same_table + 1 > self.max_per_table {
            return false;
        }

        let mut distinct: SmallVec<[&str; 4]> = SmallVec::new();
        for &k in chosen.iter().chain(std::iter::once(&candidate)) {
            if !distinct.contains(&tables[k]) {
                distinct.push(tables[k]);
            }
        }
        distinct.len() <= self.max_tables
    }
}

/// Probe the whole workload under every atomic config, in position order
pub async fn probe_atomic_configs<O: CostOracle + ?Sized>(
    client: &OracleClient<'_, O>,
    workload: &mut Workload,
    candidates: &CandidateSet,
    atomics: &AtomicConfigSet,
) -> Result<()> {
    let configs = atomics
        .iter()
        .map(|config| candidates.resolve(config.ids()))
        .collect::<Result<Vec<_>>>()?;

    client.probe_configs(workload, &configs).await
}
