//! Index recommendation command

use clap::{Arg, ArgMatches, Command};
use lightning_advisor::{IndexAdvisor, Outcome, ReplayOracle};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{effective_config, with_config_args};
use crate::cli::utils::{
    print_info, print_recommendation, print_warning, required, validate_file_exists, CliError,
    CliResult, JsonOutput,
};
use crate::cli::GlobalOptions;

/// Build the 'recommend' subcommand
pub fn recommend_command() -> Command {
    with_config_args(
        Command::new("recommend")
            .about("Recommend indexes for a statement log")
            .arg(
                Arg::new("workload")
                    .help("File with one SQL statement per line")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("fixture")
                    .help("Recorded planner answers (JSON) used as the cost oracle")
                    .long("fixture")
                    .short('f')
                    .value_name("FILE")
                    .required(true),
            ),
    )
}

/// Execute the 'recommend' command
pub fn run_recommend(matches: &ArgMatches) -> CliResult<()> {
    let global = GlobalOptions::from_matches(matches);
    let workload_path = required(matches, "workload")?;
    let fixture_path = required(matches, "fixture")?;

    validate_file_exists(workload_path)?;
    validate_file_exists(fixture_path)?;
    let config = effective_config(matches)?;
    let iterative = config.iterative_mode;

    let oracle = ReplayOracle::from_file(Path::new(fixture_path)).map_err(CliError::from)?;
    let advisor = IndexAdvisor::new(oracle, config).map_err(CliError::from)?;
    let reader = BufReader::new(File::open(workload_path).map_err(CliError::from)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::from)?;
    let recommendation = runtime
        .block_on(advisor.recommend_from_log(reader))
        .map_err(CliError::from)?;

    if global.is_json() {
        let mut output = JsonOutput::new();
        output.status(true);
        output.add_str("workload", workload_path);
        output.add_bool("iterative", iterative);
        output.add_string_array("create_statements", &recommendation.create_statements());
        output.add_value("recommendation", &recommendation);
        output.print();
        return Ok(());
    }

    match recommendation.outcome {
        Outcome::NoCandidates => {
            if !global.quiet {
                print_info("No candidate indexes generated!");
            }
        }
        Outcome::NoImprovement => {
            if !global.quiet {
                print_info("No index lowers the estimated workload cost");
            }
        }
        Outcome::Recommended => {
            if global.quiet {
                for statement in recommendation.create_statements() {
                    println!("{}", statement);
                }
            } else {
                print_recommendation(&recommendation);
            }
        }
    }

    if global.chatty() && !recommendation.dropped_statements.is_empty() {
        print_warning(&format!(
            "{} statement(s) had no usable plan and were left out",
            recommendation.dropped_statements.len()
        ));
    }

    Ok(())
}
