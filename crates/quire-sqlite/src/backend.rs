//! [`Backend`] implementation over a read-only SQLite file

use crate::config::SqliteConfig;
use crate::connection::SqliteReader;
use crate::error::SqliteResult;
use async_trait::async_trait;
use quire_core::{Backend, Dialect, EngineError, EngineResult, RawRows};
use std::sync::Arc;

/// Native relational backend
pub struct SqliteBackend {
    reader: Arc<SqliteReader>,
}

impl SqliteBackend {
    pub fn open(config: SqliteConfig) -> SqliteResult<Self> {
        Ok(Self {
            reader: Arc::new(SqliteReader::open(config)?),
        })
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sql
    }

    async fn execute(&self, statement: &str) -> EngineResult<RawRows> {
        if self.reader.is_closed() {
            return Err(EngineError::BackendUnavailable(
                "sqlite backend was torn down".to_string(),
            ));
        }

        let reader = Arc::clone(&self.reader);
        let sql = statement.to_string();
        tokio::task::spawn_blocking(move || reader.query(&sql))
            .await
            .map_err(|e| EngineError::Backend(format!("sqlite query task failed: {}", e)))?
            .map_err(EngineError::from)
    }

    fn teardown(&self) {
        self.reader.close();
    }
}
