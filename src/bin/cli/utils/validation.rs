//! Input validation utilities for CLI commands
//!
//! Consistent validation of command line values with clear error messages.

use super::CliError;
use clap::ArgMatches;
use std::path::Path;
use std::str::FromStr;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Validation limits for CLI operations
pub mod limits {
    /// Largest recommendation budget accepted on the command line
    pub const MAX_INDEX_NUM: usize = 1_000;
    /// Largest reservoir per template
    pub const MAX_SAMPLE_SIZE: usize = 10_000;
    /// Concurrent oracle probes
    pub const MAX_WORKERS: usize = 256;
}

/// Parse an optional typed argument
pub fn parse_opt<T: FromStr>(matches: &ArgMatches, name: &str) -> CliResult<Option<T>> {
    match matches.get_one::<String>(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Box::new(CliError::Validation(format!("{} must be a non-negative number, got '{}'", name, raw))) as Box<dyn std::error::Error>),
    }
}

/// Fetch a required positional argument
pub fn required<'a>(matches: &'a ArgMatches, name: &str) -> CliResult<&'a String> {
    matches
        .get_one::<String>(name)
        .ok_or_else(|| Box::new(CliError::Usage(format!("{} argument is required", name))) as Box<dyn std::error::Error>)
}

/// Validate that an input file exists and is a regular file
pub fn validate_file_exists(path: &str) -> CliResult<()> {
    let p = Path::new(path);
    if !p.exists() {
        return Err(Box::new(CliError::NotFound(path.to_string())));
    }
    if !p.is_file() {
        return Err(Box::new(CliError::Validation(format!("{} is not a file", path))));
    }
    Ok(())
}

fn validate_range(name: &str, value: usize, max: usize) -> CliResult<usize> {
    if value == 0 {
        return Err(Box::new(CliError::Validation(format!("{} must be at least 1", name))));
    }
    if value > max {
        return Err(Box::new(CliError::Validation(format!("{} cannot exceed {}", name, max))));
    }
    Ok(value)
}

pub fn validate_max_index_num(value: usize) -> CliResult<usize> {
    validate_range("max-index-num", value, limits::MAX_INDEX_NUM)
}

pub fn validate_sample_size(value: usize) -> CliResult<usize> {
    validate_range("sample-size", value, limits::MAX_SAMPLE_SIZE)
}

pub fn validate_workers(value: usize) -> CliResult<usize> {
    validate_range("workers", value, limits::MAX_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert!(validate_max_index_num(0).is_err());
        assert_eq!(validate_max_index_num(10).unwrap(), 10);
        assert!(validate_sample_size(limits::MAX_SAMPLE_SIZE + 1).is_err());
        assert!(validate_workers(4).is_ok());
    }

    #[test]
    fn test_validate_file_exists() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(validate_file_exists(file.path().to_str().unwrap()).is_ok());

        let dir = tempfile::tempdir().unwrap();
        assert!(validate_file_exists(dir.path().to_str().unwrap()).is_err());

        let err = validate_file_exists("/definitely/not/here.sql").unwrap_err();
        let cli = err.downcast_ref::<CliError>().unwrap();
        assert!(matches!(cli, CliError::NotFound(_)));
    }
}
