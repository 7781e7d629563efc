//! Read-only SQLite connection
//!
//! One connection behind a mutex. The slot is an `Option` so [`close`]
//! can drop the handle in place while other owners still hold the reader;
//! every later call sees [`SqliteError::Closed`].
//!
//! [`close`]: SqliteReader::close

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};
use parking_lot::Mutex;
use quire_core::{RawRows, Row, Value};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Thread-safe read-only connection wrapper
pub struct SqliteReader {
    conn: Mutex<Option<Connection>>,
    config: SqliteConfig,
}

impl SqliteReader {
    /// Open an existing database file without write access
    pub fn open(config: SqliteConfig) -> SqliteResult<Self> {
        info!(path = ?config.path, "Opening SQLite database read-only");

        if !config.path.is_file() {
            return Err(SqliteError::Connection(format!(
                "database file not found: {}",
                config.path.display()
            )));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&config.path, flags)
            .map_err(|e| SqliteError::Connection(e.to_string()))?;

        let reader = Self {
            conn: Mutex::new(Some(conn)),
            config,
        };
        reader.restrict_session()?;
        Ok(reader)
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Borrow the open handle; `Closed` once [`close`](Self::close) ran
    fn handle<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        let guard = self.conn.lock();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(SqliteError::Closed),
        }
    }

    /// Apply the lock timeout and cache size, then switch the session to `query_only`
    fn restrict_session(&self) -> SqliteResult<()> {
        self.handle(|conn| {
            debug!(
                busy_timeout_ms = self.config.busy_timeout_ms,
                cache_size = self.config.cache_size,
                "Restricting SQLite session to reads"
            );
            conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;
            conn.execute_batch("PRAGMA query_only = ON;")?;
            conn.execute_batch(&format!("PRAGMA cache_size = {};", self.config.cache_size))?;
            Ok(())
        })
    }

    /// Run one read-only statement and collect every row
    pub fn query(&self, sql: &str) -> SqliteResult<RawRows> {
        self.handle(|conn| {
            let mut stmt = conn.prepare(sql)?;
            if !stmt.readonly() {
                return Err(SqliteError::Query(
                    "statement would modify the database".to_string(),
                ));
            }

            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();

            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Row::with_capacity(columns.len());
                for (idx, name) in columns.iter().enumerate() {
                    record.push(name.clone(), to_value(row.get_ref(idx)?));
                }
                out.push(record);
            }

            debug!(rows = out.len(), "SQLite query complete");
            Ok(RawRows::from_rows(columns, out))
        })
    }

    /// Drop the connection. Safe to call more than once.
    pub fn close(&self) {
        let Some(conn) = self.conn.lock().take() else {
            return;
        };
        if let Err((_, e)) = conn.close() {
            warn!(error = %e, "SQLite connection did not close cleanly");
        } else {
            info!(path = ?self.config.path, "SQLite connection closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}

/// Blobs are rendered as lowercase hex text
fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(hex::encode(bytes)),
    }
}
