//! Engine error taxonomy
//!
//! Every failure the engine can report is one of these variants. The result
//! normalizer turns them into failure envelopes; none escape `run_query`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error raised by the gatekeeper, an evaluator, or a backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No backend could be resolved, or the backend was torn down
    #[error("BackendUnavailable: {0}")]
    BackendUnavailable(String),

    /// Gatekeeper rejection; `rule` names the failed check
    #[error("InvalidQuery: {reason} (rule: {rule})")]
    InvalidQuery { rule: String, reason: String },

    #[error("NoSuchTable: no table named '{0}'")]
    NoSuchTable(String),

    #[error("NoSuchColumn: no column named '{0}'")]
    NoSuchColumn(String),

    #[error("NoSuchLabel: no node carries label '{0}'")]
    NoSuchLabel(String),

    /// Statement text that does not parse; `token` is the first unrecognized token
    #[error("SyntaxError: unrecognized token '{token}' ({detail})")]
    SyntaxError { token: String, detail: String },

    /// Graph statement that parses but matches no supported shape
    #[error("UnsupportedPattern: {0}")]
    UnsupportedPattern(String),

    /// Malformed aggregate clause
    #[error("AggregateError: {0}")]
    AggregateError(String),

    /// Failure reported by the backend's own driver (I/O, timeouts, SQL errors)
    #[error("BackendError: {0}")]
    Backend(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Serializable tag naming an [`EngineError`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    BackendUnavailable,
    InvalidQuery,
    NoSuchTable,
    NoSuchColumn,
    NoSuchLabel,
    SyntaxError,
    UnsupportedPattern,
    AggregateError,
    Backend,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            EngineError::InvalidQuery { .. } => ErrorKind::InvalidQuery,
            EngineError::NoSuchTable(_) => ErrorKind::NoSuchTable,
            EngineError::NoSuchColumn(_) => ErrorKind::NoSuchColumn,
            EngineError::NoSuchLabel(_) => ErrorKind::NoSuchLabel,
            EngineError::SyntaxError { .. } => ErrorKind::SyntaxError,
            EngineError::UnsupportedPattern(_) => ErrorKind::UnsupportedPattern,
            EngineError::AggregateError(_) => ErrorKind::AggregateError,
            EngineError::Backend(_) => ErrorKind::Backend,
        }
    }

    pub fn invalid_query(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidQuery {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    pub fn syntax(token: impl Into<String>, detail: impl Into<String>) -> Self {
        EngineError::SyntaxError {
            token: token.into(),
            detail: detail.into(),
        }
    }
}
