//! Read-only SQLite backend for quire
//!
//! Opens an existing database file with `SQLITE_OPEN_READ_ONLY` and
//! `PRAGMA query_only`, so even a statement that slipped past the
//! gatekeeper cannot write. Queries run on the blocking pool.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_sqlite::{SqliteBackend, SqliteConfig};
//! use quire_core::Backend;
//!
//! let backend = SqliteBackend::open(SqliteConfig::new("./library.db"))?;
//! let rows = backend.execute("SELECT title FROM books").await?;
//! ```

pub mod backend;
pub mod config;
pub mod connection;
pub mod error;

// Re-exports
pub use backend::SqliteBackend;
pub use config::SqliteConfig;
pub use connection::SqliteReader;
pub use error::{SqliteError, SqliteResult};
