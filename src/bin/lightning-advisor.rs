mod cli;

use cli::utils::{exit_codes, CliError};
use cli::GlobalOptions;

/// Lightning Advisor
///
/// Recommends secondary indexes for a SQL statement log:
/// - `recommend`: full pipeline against a recorded planner fixture
/// - `compress`: show the compressed workload only
/// - `config`: print the effective configuration
fn main() {
    let matches = cli::build_cli().get_matches();

    let global = GlobalOptions::from_matches(&matches);
    lightning_advisor::logging::init_logging(global.log_level, matches.get_flag("log-json"));

    if let Err(e) = cli::run(matches) {
        let code = e
            .downcast_ref::<CliError>()
            .map(CliError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);

        if global.is_json() {
            cli::utils::json_error(&e.to_string()).print();
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(code);
    }
}
