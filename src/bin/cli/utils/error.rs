//! CLI error handling utilities
//!
//! Maps advisor failures onto user-facing messages and process exit codes.

#![allow(dead_code)]

use std::fmt;

/// CLI exit codes for different error categories
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    /// Invalid command line usage
    pub const USAGE_ERROR: i32 = 2;
    /// Input file not found
    pub const NOT_FOUND: i32 = 3;
    pub const VALIDATION_ERROR: i32 = 5;
    pub const IO_ERROR: i32 = 7;
    /// Configuration could not be loaded or is invalid
    pub const CONFIG_ERROR: i32 = 8;
    /// Cost oracle unreachable or timed out
    pub const ORACLE_ERROR: i32 = 9;
    /// Internal consistency violation in the advisor
    pub const INTERNAL_ERROR: i32 = 99;
}

/// CLI-specific error type with user-friendly messages
#[derive(Debug)]
pub enum CliError {
    Usage(String),
    NotFound(String),
    Validation(String),
    Io(String),
    Config(String),
    Oracle(String),
    Internal(String),
}

impl CliError {
    /// Get the appropriate exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exit_codes::USAGE_ERROR,
            CliError::NotFound(_) => exit_codes::NOT_FOUND,
            CliError::Validation(_) => exit_codes::VALIDATION_ERROR,
            CliError::Io(_) => exit_codes::IO_ERROR,
            CliError::Config(_) => exit_codes::CONFIG_ERROR,
            CliError::Oracle(_) => exit_codes::ORACLE_ERROR,
            CliError::Internal(_) => exit_codes::INTERNAL_ERROR,
        }
    }

    /// Short error category name for logging
    pub fn category(&self) -> &'static str {
        match self {
            CliError::Usage(_) => "USAGE",
            CliError::NotFound(_) => "NOT_FOUND",
            CliError::Validation(_) => "VALIDATION",
            CliError::Io(_) => "IO",
            CliError::Config(_) => "CONFIG",
            CliError::Oracle(_) => "ORACLE",
            CliError::Internal(_) => "INTERNAL",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "Usage error: {}", msg),
            CliError::NotFound(path) => write!(f, "File not found: {}", path),
            CliError::Validation(msg) => write!(f, "Validation error: {}", msg),
            CliError::Io(msg) => write!(f, "IO error: {}", msg),
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::Oracle(msg) => write!(f, "{}. Check the planner connection or fixture.", msg),
            CliError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => CliError::NotFound(err.to_string()),
            _ => CliError::Io(err.to_string()),
        }
    }
}

impl From<lightning_advisor::Error> for CliError {
    fn from(err: lightning_advisor::Error) -> Self {
        use lightning_advisor::Error;

        let msg = err.to_string();
        match err {
            Error::Io(io) => io.into(),
            Error::Config(_) | Error::Json(_) | Error::Parse(_) => CliError::Config(msg),
            Error::OracleUnavailable { .. } | Error::Timeout { .. } => CliError::Oracle(msg),
            Error::InconsistentState { .. } | Error::MalformedProbeResult { .. } | Error::Task(_) => {
                CliError::Internal(msg)
            }
        }
    }
}

impl From<&str> for CliError {
    fn from(msg: &str) -> Self {
        CliError::Validation(msg.to_string())
    }
}

impl From<String> for CliError {
    fn from(msg: String) -> Self {
        CliError::Validation(msg)
    }
}
