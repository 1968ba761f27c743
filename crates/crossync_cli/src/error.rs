//! CLI error type.

use crossync_core::{StoreError, SyncError};
use crossync_server::ServerError;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// A command-line argument could not be parsed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Coordinator error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Service error.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// JSON output error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
