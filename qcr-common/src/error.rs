//! Common error types for QCR

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for QCR operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across QCR crates
#[derive(Error, Debug)]
pub enum Error {
    /// A solution input is not a recognized minimization result
    #[error("Invalid input for '{param}': {reason}")]
    InvalidInput { param: String, reason: String },

    /// A parameter required by another supplied parameter is absent
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// Requested CnPn label is not present in the intermediate solution
    #[error("Unknown intermediate label: {0}")]
    UnknownLabel(String),

    /// No writer is available for the requested export target
    #[error("Export unavailable: {0}")]
    ExportUnavailable(String),

    /// Writing the export file failed
    #[error("Failed to write {}: {reason}", path.display())]
    ExportWrite { path: PathBuf, reason: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an [`Error::InvalidInput`] for the named parameter
    pub fn invalid_input(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            param: param.into(),
            reason: reason.into(),
        }
    }
}
