//! Error types for the SQLite backend

use quire_core::EngineError;
use thiserror::Error;

/// SQLite backend error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// The database could not be opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement rejected before execution
    #[error("Query error: {0}")]
    Query(String),

    /// The connection was closed by teardown
    #[error("Connection closed")]
    Closed,

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations
pub type SqliteResult<T> = Result<T, SqliteError>;

impl From<SqliteError> for EngineError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Connection(msg) => Self::BackendUnavailable(msg),
            SqliteError::Closed => Self::BackendUnavailable("sqlite connection closed".to_string()),
            SqliteError::Query(msg) => Self::Backend(msg),
            SqliteError::Rusqlite(e) => Self::Backend(e.to_string()),
        }
    }
}
