//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The SQLite engine reported a failure.
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The database configuration file could not be parsed.
    #[error("invalid database config: {0}")]
    Config(#[from] serde_json::Error),

    /// Persisted state is inconsistent.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}
