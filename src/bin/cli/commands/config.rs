//! Effective configuration command

use clap::{ArgMatches, Command};

use super::{effective_config, with_config_args};
use crate::cli::utils::{print_separator, CliResult, JsonOutput};
use crate::cli::GlobalOptions;

/// Build the 'config' subcommand
pub fn config_command() -> Command {
    with_config_args(Command::new("config").about("Print the effective advisor configuration"))
}

/// Execute the 'config' command
pub fn run_config(matches: &ArgMatches) -> CliResult<()> {
    let global = GlobalOptions::from_matches(matches);
    let config = effective_config(matches)?;

    if global.is_json() {
        let mut output = JsonOutput::new();
        output.status(true);
        output.add_value("config", &config);
        output.print();
        return Ok(());
    }

    if !global.quiet {
        println!("Effective configuration");
        print_separator(40);
    }
    println!("  max_index_num:         {}", config.max_index_num);
    println!("  max_index_columns:     {}", config.max_index_columns);
    println!("  sample_size:           {}", config.sample_size);
    println!("  iterative_mode:        {}", config.iterative_mode);
    println!("  max_tables_per_atomic: {}", config.max_tables_per_atomic);
    println!("  max_indexes_per_table: {}", config.max_indexes_per_table);
    println!("  probe_workers:         {}", config.probe_workers);
    println!("  probe_timeout_ms:      {}", config.probe_timeout_ms);
    println!("  probe_retries:         {}", config.probe_retries);
    match config.seed {
        Some(seed) => println!("  seed:                  {}", seed),
        None => println!("  seed:                  random"),
    }
    Ok(())
}
