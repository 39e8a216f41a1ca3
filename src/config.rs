//! Run-level configuration for the index advisor
//!
//! The configuration is passed explicitly into [`crate::IndexAdvisor`]; there is
//! no process-wide state. Sources are layered the usual way: defaults, then an
//! optional JSON file, then `LIGHTNING_ADVISOR_*` environment variables, then
//! command line flags (applied by the CLI).

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MAX_INDEX_NUM: usize = 10;
pub const DEFAULT_MAX_INDEX_COLUMNS: usize = 5;
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Hard ceiling on index width; the planner rejects wider keys anyway.
const MAX_SUPPORTED_INDEX_COLUMNS: usize = 32;

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Maximum number of recommended indexes (greedy rounds)
    pub max_index_num: usize,
    /// Widest accepted index that iterative mode still extends by one column
    pub max_index_columns: usize,
    /// Representative statements kept per query template
    pub sample_size: usize,
    /// Iterative candidate extension plus atomic-config greedy selection
    pub iterative_mode: bool,
    /// Atomic config enumeration cap: distinct tables per config
    pub max_tables_per_atomic: usize,
    /// Atomic config enumeration cap: indexes on one table per config
    pub max_indexes_per_table: usize,
    /// Concurrent oracle probes
    pub probe_workers: usize,
    pub probe_timeout_ms: u64,
    /// Extra attempts after a transient oracle failure
    pub probe_retries: u32,
    /// Seed for the reservoir sampler; random when absent
    pub seed: Option<u64>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            max_index_num: DEFAULT_MAX_INDEX_NUM,
            max_index_columns: DEFAULT_MAX_INDEX_COLUMNS,
            sample_size: DEFAULT_SAMPLE_SIZE,
            iterative_mode: false,
            max_tables_per_atomic: 2,
            max_indexes_per_table: 2,
            probe_workers: 4,
            probe_timeout_ms: 30_000,
            probe_retries: 1,
            seed: None,
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        let format = ConfigFormat::from_extension(path)
            .ok_or_else(|| Error::Config(format!("Unknown configuration format: {}", path.display())))?;

        let config = Self::parse(&content, format)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| Error::Config(format!("JSON parse error: {}", e))),
        }
    }

    /// Override fields from `LIGHTNING_ADVISOR_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse_var<T: std::str::FromStr>(key: &str, raw: String) -> Result<T> {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, raw)))
        }

        if let Some(v) = lookup("LIGHTNING_ADVISOR_MAX_INDEX_NUM") {
            self.max_index_num = parse_var("LIGHTNING_ADVISOR_MAX_INDEX_NUM", v)?;
        }
        if let Some(v) = lookup("LIGHTNING_ADVISOR_MAX_INDEX_COLUMNS") {
            self.max_index_columns = parse_var("LIGHTNING_ADVISOR_MAX_INDEX_COLUMNS", v)?;
        }
        if let Some(v) = lookup("LIGHTNING_ADVISOR_SAMPLE_SIZE") {
            self.sample_size = parse_var("LIGHTNING_ADVISOR_SAMPLE_SIZE", v)?;
        }
        if let Some(v) = lookup("LIGHTNING_ADVISOR_ITERATIVE") {
            self.iterative_mode = parse_var("LIGHTNING_ADVISOR_ITERATIVE", v)?;
        }
        if let Some(v) = lookup("LIGHTNING_ADVISOR_PROBE_WORKERS") {
            self.probe_workers = parse_var("LIGHTNING_ADVISOR_PROBE_WORKERS", v)?;
        }
        if let Some(v) = lookup("LIGHTNING_ADVISOR_PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = parse_var("LIGHTNING_ADVISOR_PROBE_TIMEOUT_MS", v)?;
        }
        if let Some(v) = lookup("LIGHTNING_ADVISOR_PROBE_RETRIES") {
            self.probe_retries = parse_var("LIGHTNING_ADVISOR_PROBE_RETRIES", v)?;
        }
        if let Some(v) = lookup("LIGHTNING_ADVISOR_MAX_TABLES_PER_ATOMIC") {
            self.max_tables_per_atomic = parse_var("LIGHTNING_ADVISOR_MAX_TABLES_PER_ATOMIC", v)?;
        }
        if let Some(v) = lookup("LIGHTNING_ADVISOR_MAX_INDEXES_PER_TABLE") {
            self.max_indexes_per_table = parse_var("LIGHTNING_ADVISOR_MAX_INDEXES_PER_TABLE", v)?;
        }
        if let Some(v) = lookup("LIGHTNING_ADVISOR_SEED") {
            self.seed = Some(parse_var("LIGHTNING_ADVISOR_SEED", v)?);
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_index_num == 0 {
            return Err(Error::Config("max_index_num must be greater than 0".into()));
        }

        if self.max_index_columns == 0 || self.max_index_columns > MAX_SUPPORTED_INDEX_COLUMNS {
            return Err(Error::Config(format!(
                "max_index_columns must be between 1 and {}",
                MAX_SUPPORTED_INDEX_COLUMNS
            )));
        }

        if self.sample_size == 0 {
            return Err(Error::Config("sample_size must be greater than 0".into()));
        }

        if self.max_tables_per_atomic == 0 || self.max_indexes_per_table == 0 {
            return Err(Error::Config(
                "atomic config caps must allow at least one index".into(),
            ));
        }

        if self.probe_workers == 0 {
            return Err(Error::Config("probe_workers must be at least 1".into()));
        }

        if self.probe_timeout_ms == 0 {
            return Err(Error::Config("probe_timeout_ms must be greater than 0".into()));
        }

        Ok(())
    }

    /// Retry policy applied to every oracle call
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::for_probes(self.probe_retries, Duration::from_millis(self.probe_timeout_ms))
    }
}

/// Fluent construction of an [`AdvisorConfig`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: AdvisorConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_index_num(mut self, max: usize) -> Self {
        self.config.max_index_num = max;
        self
    }

    pub fn max_index_columns(mut self, max: usize) -> Self {
        self.config.max_index_columns = max;
        self
    }

    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    pub fn iterative(mut self, enabled: bool) -> Self {
        self.config.iterative_mode = enabled;
        self
    }

    pub fn probe_workers(mut self, workers: usize) -> Self {
        self.config.probe_workers = workers;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<AdvisorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AdvisorConfig::default();
        assert_eq!(config.max_index_num, 10);
        assert_eq!(config.max_index_columns, 5);
        assert_eq!(config.sample_size, 5);
        assert!(!config.iterative_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .max_index_num(3)
            .iterative(true)
            .seed(7)
            .build()
            .unwrap();

        assert_eq!(config.max_index_num, 3);
        assert!(config.iterative_mode);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_config_validation() {
        assert!(ConfigBuilder::new().max_index_num(0).build().is_err());
        assert!(ConfigBuilder::new().sample_size(0).build().is_err());
        assert!(ConfigBuilder::new().max_index_columns(64).build().is_err());
        assert!(ConfigBuilder::new().probe_workers(0).build().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AdvisorConfig::parse(r#"{"max_index_num": 4}"#, ConfigFormat::Json).unwrap();
        assert_eq!(config.max_index_num, 4);
        assert_eq!(config.sample_size, DEFAULT_SAMPLE_SIZE);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"iterative_mode": true, "probe_workers": 2}}"#).unwrap();

        let config = AdvisorConfig::from_file(file.path()).unwrap();
        assert!(config.iterative_mode);
        assert_eq!(config.probe_workers, 2);

        let other = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(AdvisorConfig::from_file(other.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LIGHTNING_ADVISOR_MAX_INDEX_NUM", "7"),
            ("LIGHTNING_ADVISOR_ITERATIVE", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = AdvisorConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.max_index_num, 7);
        assert!(config.iterative_mode);

        let mut config = AdvisorConfig::default();
        let err = config
            .apply_overrides(|key| (key == "LIGHTNING_ADVISOR_SAMPLE_SIZE").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_probe_and_atomic_cap_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LIGHTNING_ADVISOR_PROBE_RETRIES", "4"),
            ("LIGHTNING_ADVISOR_MAX_TABLES_PER_ATOMIC", "3"),
            ("LIGHTNING_ADVISOR_MAX_INDEXES_PER_TABLE", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = AdvisorConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.probe_retries, 4);
        assert_eq!(config.max_tables_per_atomic, 3);
        assert_eq!(config.max_indexes_per_table, 1);
        config.validate().unwrap();
    }
}
