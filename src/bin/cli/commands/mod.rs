//! CLI command modules
//!
//! - recommend: full index recommendation against a planner fixture
//! - compress: workload compression only
//! - config: effective configuration

pub mod compress;
pub mod config;
pub mod recommend;

use crate::cli::utils::{parse_opt, validate_max_index_num, validate_sample_size, validate_workers, CliError, CliResult};
use clap::{Arg, ArgMatches, Command};
use lightning_advisor::AdvisorConfig;
use std::path::Path;

/// Arguments that tune the advisor configuration
pub fn with_config_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("config")
                .help("JSON configuration file")
                .long("config")
                .short('c')
                .value_name("FILE"),
        )
        .arg(
            Arg::new("iterative")
                .help("Iterative candidate extension with atomic-config greedy selection")
                .long("iterative")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-index-num")
                .help("Maximum number of recommended indexes")
                .long("max-index-num")
                .value_name("N"),
        )
        .arg(
            Arg::new("max-index-columns")
                .help("Maximum number of columns per index")
                .long("max-index-columns")
                .value_name("N"),
        )
        .arg(
            Arg::new("sample-size")
                .help("Representative statements kept per template")
                .long("sample-size")
                .value_name("N"),
        )
        .arg(
            Arg::new("workers")
                .help("Concurrent oracle probes")
                .long("workers")
                .value_name("N"),
        )
        .arg(
            Arg::new("timeout-ms")
                .help("Deadline for a single oracle call")
                .long("timeout-ms")
                .value_name("MS"),
        )
        .arg(
            Arg::new("seed")
                .help("Seed for reproducible sampling")
                .long("seed")
                .value_name("SEED"),
        )
}

/// Defaults, then the config file, then environment, then flags
pub fn effective_config(matches: &ArgMatches) -> CliResult<AdvisorConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => AdvisorConfig::from_file(Path::new(path)).map_err(CliError::from)?,
        None => AdvisorConfig::default(),
    };
    config.apply_env_overrides().map_err(CliError::from)?;

    if matches.get_flag("iterative") {
        config.iterative_mode = true;
    }
    if let Some(n) = parse_opt::<usize>(matches, "max-index-num")? {
        config.max_index_num = validate_max_index_num(n)?;
    }
    if let Some(n) = parse_opt::<usize>(matches, "max-index-columns")? {
        config.max_index_columns = n;
    }
    if let Some(n) = parse_opt::<usize>(matches, "sample-size")? {
        config.sample_size = validate_sample_size(n)?;
    }
    if let Some(n) = parse_opt::<usize>(matches, "workers")? {
        config.probe_workers = validate_workers(n)?;
    }
    if let Some(ms) = parse_opt::<u64>(matches, "timeout-ms")? {
        config.probe_timeout_ms = ms;
    }
    if let Some(seed) = parse_opt::<u64>(matches, "seed")? {
        config.seed = Some(seed);
    }

    config.validate().map_err(CliError::from)?;
    Ok(config)
}
