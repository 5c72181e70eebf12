//! Error types for dcsim

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dcsim
#[derive(Error, Debug)]
pub enum DcsimError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed line in one of the input files
    #[error("Parse error in {path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Algorithm name not among the known policies
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Simulation still had work when the tick limit was reached
    #[error("Tick limit of {0} reached with jobs still pending")]
    TickLimit(u64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for dcsim operations
pub type DcsimResult<T> = Result<T, DcsimError>;

impl From<serde_json::Error> for DcsimError {
    fn from(err: serde_json::Error) -> Self {
        DcsimError::Serialization(err.to_string())
    }
}

impl DcsimError {
    /// Build a parse error for `path` at 1-based `line`
    pub fn parse(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        DcsimError::Parse {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DcsimError::Config("missing power_cap".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing power_cap");
    }

    #[test]
    fn test_parse_error_display() {
        let err = DcsimError::parse("inputs/jobs.txt", 3, "expected 5 fields");
        assert_eq!(
            err.to_string(),
            "Parse error in inputs/jobs.txt:3: expected 5 fields"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DcsimError = io_err.into();
        assert!(matches!(err, DcsimError::Io(_)));
    }
}
