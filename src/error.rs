//! # Error Handling Module
//!
//! Structured error types for all dictdb operations.
//!
//! The wrapper this crate replaces caught database errors, printed them and
//! returned nothing, leaving callers unable to distinguish failure from
//! success. Here every operation surfaces a typed [`DbError`] instead;
//! whether to log it is the caller's decision.

use thiserror::Error;

/// Result type alias for dictdb operations
pub type DbResult<T> = Result<T, DbError>;

/// Error type covering every dictdb operation
#[derive(Error, Debug)]
pub enum DbError {
    /// Database connection or statement execution errors
    #[error("Database error: {0}")]
    Database(String),

    /// JSON parsing or serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid table or column name
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Bulk insert called with no rows
    #[error("Empty batch: insert_many requires at least one row")]
    EmptyBatch,

    /// Invalid payload structure (non-object JSON, empty change set, ragged frame)
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Convert rusqlite errors to DbError
impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        DbError::Database(err.to_string())
    }
}
