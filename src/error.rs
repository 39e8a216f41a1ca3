use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Transport-level failure talking to the cost/what-if oracle.
    #[error("Cost oracle unavailable during {operation}: {reason}")]
    OracleUnavailable { operation: String, reason: String },

    #[error("Cost oracle call '{operation}' timed out after {timeout_ms} ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// The enumeration and the inference phase went out of sync.
    #[error("Inconsistent advisor state (query: {query:?}, atomic config: {atomic_config:?}): {description}")]
    InconsistentState {
        query: Option<usize>,
        atomic_config: Option<usize>,
        description: String,
    },

    /// A blocking worker panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Oracle produced no usable plan for statement {statement} under atomic config {atomic_config}")]
    MalformedProbeResult { statement: usize, atomic_config: usize },
}

impl Error {
    pub fn error_code(&self) -> i32 {
        match self {
            Error::Io(_) => -1,
            Error::Json(_) => -2,
            Error::Config(_) => -13,
            Error::Parse(_) => -43,
            Error::OracleUnavailable { .. } => -55,
            Error::Timeout { .. } => -15,
            Error::InconsistentState { .. } => -75,
            Error::MalformedProbeResult { .. } => -62,
            Error::Task(_) => -90,
        }
    }

    /// Transient failures worth one more attempt against the oracle.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. } | Error::OracleUnavailable { .. }
        )
    }

    /// Errors that abort the whole run; no partial recommendation is produced.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::MalformedProbeResult { .. })
    }

    pub(crate) fn inconsistent(
        query: Option<usize>,
        atomic_config: Option<usize>,
        description: impl Into<String>,
    ) -> Self {
        Error::InconsistentState {
            query,
            atomic_config,
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent_state_carries_context() {
        let err = Error::inconsistent(Some(3), Some(7), "cost list too short");
        let msg = err.to_string();
        assert!(msg.contains("Some(3)"));
        assert!(msg.contains("Some(7)"));
        assert!(msg.contains("cost list too short"));
        assert_eq!(err.error_code(), -75);
    }

    #[test]
    fn test_recoverability() {
        let timeout = Error::Timeout {
            operation: "estimate_cost".to_string(),
            timeout_ms: 10,
        };
        assert!(timeout.is_recoverable());
        assert!(timeout.is_fatal());

        let dropped = Error::MalformedProbeResult {
            statement: 1,
            atomic_config: 0,
        };
        assert!(!dropped.is_recoverable());
        assert!(!dropped.is_fatal());

        assert!(!Error::Config("bad".to_string()).is_recoverable());
    }

    #[test]
    fn test_background_task_failure_aborts() {
        let err = Error::Task("greedy selection: task panicked".to_string());
        assert!(err.is_fatal());
        assert!(!err.is_recoverable());
        assert_eq!(err.error_code(), -90);
        assert!(err.to_string().contains("task panicked"));
    }
}
