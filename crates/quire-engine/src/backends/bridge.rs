//! Host-integration bridges
//!
//! A host application may already hold a live connection for a dialect and
//! lend it to the engine. The engine wraps it in [`BridgeBackend`]; tearing
//! the wrapper down only detaches from the host's backend.

use async_trait::async_trait;
use parking_lot::RwLock;
use quire_core::{Backend, Dialect, EngineError, EngineResult, RawRows};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Bridges the host has registered, at most one per dialect
#[derive(Clone, Default)]
pub struct BridgeRegistry {
    bridges: Arc<RwLock<HashMap<Dialect, Arc<dyn Backend>>>>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the bridge for the backend's dialect
    pub fn register(&self, backend: Arc<dyn Backend>) {
        let dialect = backend.dialect();
        debug!(%dialect, bridge = backend.name(), "Bridge registered");
        self.bridges.write().insert(dialect, backend);
    }

    pub fn unregister(&self, dialect: Dialect) -> Option<Arc<dyn Backend>> {
        self.bridges.write().remove(&dialect)
    }

    pub fn get(&self, dialect: Dialect) -> Option<Arc<dyn Backend>> {
        self.bridges.read().get(&dialect).cloned()
    }
}

/// Borrowed handle to a host bridge
pub struct BridgeBackend {
    name: String,
    dialect: Dialect,
    inner: RwLock<Option<Arc<dyn Backend>>>,
}

impl BridgeBackend {
    pub fn attach(inner: Arc<dyn Backend>) -> Self {
        Self {
            name: format!("bridge:{}", inner.name()),
            dialect: inner.dialect(),
            inner: RwLock::new(Some(inner)),
        }
    }
}

#[async_trait]
impl Backend for BridgeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, statement: &str) -> EngineResult<RawRows> {
        let inner = self.inner.read().clone().ok_or_else(|| {
            EngineError::BackendUnavailable(format!("{} was detached", self.name))
        })?;
        inner.execute(statement).await
    }

    /// Detach without tearing down the host's backend
    fn teardown(&self) {
        if self.inner.write().take().is_some() {
            debug!(bridge = %self.name, "Detached from host bridge");
        }
    }
}
