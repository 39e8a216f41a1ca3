//! Workload compression command

use clap::{Arg, ArgMatches, Command};
use lightning_advisor::advisor::{load_workload, WorkloadCompressor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufReader;

use crate::cli::utils::{
    parse_opt, print_header, print_success, required, validate_file_exists, validate_sample_size,
    CliError, CliResult, JsonOutput,
};
use crate::cli::GlobalOptions;

/// Build the 'compress' subcommand
pub fn compress_command() -> Command {
    Command::new("compress")
        .about("Group a statement log into weighted templates")
        .arg(
            Arg::new("workload")
                .help("File with one SQL statement per line")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("sample-size")
                .help("Representative statements kept per template")
                .long("sample-size")
                .default_value("5"),
        )
        .arg(
            Arg::new("seed")
                .help("Seed for reproducible sampling")
                .long("seed"),
        )
}

/// Execute the 'compress' command
pub fn run_compress(matches: &ArgMatches) -> CliResult<()> {
    let global = GlobalOptions::from_matches(matches);
    let path = required(matches, "workload")?;
    let sample_size = validate_sample_size(parse_opt::<usize>(matches, "sample-size")?.unwrap_or(5))?;
    let seed = parse_opt::<u64>(matches, "seed")?;

    validate_file_exists(path)?;
    let reader = BufReader::new(File::open(path).map_err(CliError::from)?);
    let raw = load_workload(reader).map_err(CliError::from)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let groups = WorkloadCompressor::new(sample_size).group_templates(&raw, &mut rng);
    let statements: u64 = raw.iter().map(|(_, count)| count).sum();

    if global.is_json() {
        let templates: Vec<serde_json::Value> = groups
            .iter()
            .map(|group| {
                serde_json::json!({
                    "template": group.template,
                    "total": group.total,
                    "frequency": group.total as f64 / sample_size as f64,
                    "samples": group.samples,
                })
            })
            .collect();

        let mut output = JsonOutput::new();
        output.status(true);
        output.add_uint("statements", statements);
        output.add_uint("distinct_statements", raw.len() as u64);
        output.add_value("templates", &templates);
        output.print();
        return Ok(());
    }

    if !global.quiet {
        print_header("Workload compression");
    }
    for group in &groups {
        println!("{}  (total {})", group.template, group.total);
        for sample in &group.samples {
            println!("    {}", sample);
        }
    }
    if !global.quiet {
        print_success(&format!(
            "{} statements, {} distinct, {} templates",
            statements,
            raw.len(),
            groups.len()
        ));
    }
    Ok(())
}
