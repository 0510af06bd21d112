//! Error types for lookup execution.

use oxide_json_core::JsonLookupError;
use thiserror::Error;

/// Errors raised while running JSON lookups against SQLite.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The lookup could not be compiled for SQLite.
    #[error("lookup error: {0}")]
    Lookup(#[from] JsonLookupError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document is not valid JSON.
    #[error("stored document is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias for lookup execution.
pub type Result<T> = std::result::Result<T, QueryError>;
