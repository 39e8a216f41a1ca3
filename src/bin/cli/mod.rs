//! Lightning Advisor CLI
//!
//! Command line surface over the index advisor library.
//!
//! # Output Formats
//!
//! - `text` (default): human-readable report
//! - `json`: machine-readable output for scripting
//!
//! Logs always go to stderr; `--log-level` sets the default filter and
//! `RUST_LOG` overrides it. `--quiet` suppresses informational messages.

pub mod commands;
pub mod utils;

use clap::{Arg, Command};
use tracing::Level;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}. Use 'text' or 'json'.", s)),
        }
    }
}

/// Global CLI options that apply to all commands
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub log_level: Level,
}

impl GlobalOptions {
    pub fn from_matches(matches: &clap::ArgMatches) -> Self {
        let output_format = matches
            .get_one::<String>("format")
            .map(|s| s.parse().unwrap_or_default())
            .unwrap_or_default();

        let quiet = matches.get_flag("quiet");

        let log_level = matches
            .get_one::<String>("log-level")
            .and_then(|s| lightning_advisor::logging::parse_level(s))
            .unwrap_or(if quiet { Level::ERROR } else { Level::WARN });

        GlobalOptions {
            output_format,
            quiet,
            log_level,
        }
    }

    pub fn is_json(&self) -> bool {
        self.output_format == OutputFormat::Json
    }

    /// Informational text is printed only in quiet-less text mode
    pub fn chatty(&self) -> bool {
        !self.is_json() && !self.quiet
    }
}

/// Build the CLI command structure
pub fn build_cli() -> Command {
    Command::new("lightning-advisor")
        .about("Workload-driven index advisor")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("format")
                .help("Output format: text (default) or json")
                .short('o')
                .long("format")
                .global(true)
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("quiet")
                .help("Suppress informational output (errors still shown)")
                .short('q')
                .long("quiet")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .help("Log level on stderr")
                .long("log-level")
                .global(true)
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-json")
                .help("Emit logs as JSON lines")
                .long("log-json")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(commands::recommend::recommend_command())
        .subcommand(commands::compress::compress_command())
        .subcommand(commands::config::config_command())
}

/// Dispatch to appropriate command handler
pub fn run(matches: clap::ArgMatches) -> utils::CliResult<()> {
    match matches.subcommand() {
        Some(("recommend", sub)) => commands::recommend::run_recommend(sub),
        Some(("compress", sub)) => commands::compress::run_compress(sub),
        Some(("config", sub)) => commands::config::run_config(sub),
        _ => Err(Box::new(utils::CliError::Usage(
            "Unknown command. Use --help for available commands.".to_string(),
        ))),
    }
}
