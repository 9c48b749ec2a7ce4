//! CLI error type.

use graphlog_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The log file does not exist.
    #[error("log file not found: {}", .0.display())]
    LogNotFound(PathBuf),

    /// Verification found problems.
    #[error("log verification failed with {0} problem(s)")]
    VerificationFailed(usize),

    /// Unknown `--format` value.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// Core library error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Manifest serialization failed.
    #[error("manifest encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type of CLI commands.
pub type CliResult<T> = Result<T, CliError>;
