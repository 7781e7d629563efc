//! In-memory backend over an immutable [`Dataset`]

use async_trait::async_trait;
use parking_lot::RwLock;
use quire_core::{Backend, Dataset, Dialect, EngineError, EngineResult, RawRows};
use quire_query::{GraphEvaluator, RelationalEvaluator};
use std::sync::Arc;
use tracing::debug;

/// Answers statements with the dialect's evaluator.
///
/// Used for the built-in seed and for JSON dataset files.
pub struct DatasetBackend {
    name: String,
    dialect: Dialect,
    dataset: RwLock<Option<Arc<Dataset>>>,
}

impl DatasetBackend {
    pub fn new(name: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            name: name.into(),
            dialect: dataset.dialect(),
            dataset: RwLock::new(Some(Arc::new(dataset))),
        }
    }

    fn dataset(&self) -> EngineResult<Arc<Dataset>> {
        self.dataset.read().clone().ok_or_else(|| {
            EngineError::BackendUnavailable(format!("{} backend was torn down", self.name))
        })
    }
}

#[async_trait]
impl Backend for DatasetBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, statement: &str) -> EngineResult<RawRows> {
        let dataset = self.dataset()?;
        debug!(backend = %self.name, "Evaluating against in-memory dataset");
        match dataset.as_ref() {
            Dataset::Relational(tables) => RelationalEvaluator::new(tables)
                .execute(statement)
                .map(|out| out.into_raw()),
            Dataset::Graph(graph) => GraphEvaluator::new(graph).execute(statement),
        }
    }

    fn teardown(&self) {
        if self.dataset.write().take().is_some() {
            debug!(backend = %self.name, "Dataset released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use quire_core::{ErrorKind, Value};

    #[tokio::test]
    async fn test_canary_and_teardown() {
        let backend = DatasetBackend::new("builtin", seed::dataset(Dialect::Sql).unwrap());
        assert_eq!(backend.dialect(), Dialect::Sql);

        let rows = backend.execute("SELECT 1").await.unwrap();
        assert_eq!(rows.first_scalar(), Some(&Value::Integer(1)));

        backend.teardown();
        backend.teardown();
        let err = backend.execute("SELECT 1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_graph_dataset() {
        let backend = DatasetBackend::new("builtin", seed::dataset(Dialect::Cypher).unwrap());
        let rows = backend
            .execute("MATCH (p:Person) RETURN count(p)")
            .await
            .unwrap();
        assert_eq!(rows.first_scalar(), Some(&Value::Integer(3)));
    }
}
