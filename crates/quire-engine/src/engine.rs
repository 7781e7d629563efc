//! The query engine entry point

use crate::backends::BridgeRegistry;
use crate::normalize;
use crate::resolver::{ResolvedBackend, Resolver, Strategy};
use quire_config::EngineConfig;
use quire_core::{Dialect, EngineError, QueryResult};
use quire_query::gate;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Owns one resolved backend per dialect and runs statements against them.
///
/// A dialect whose resolution failed stays unavailable until
/// [`reconfigure`](Self::reconfigure); every call for it short-circuits to a
/// `BackendUnavailable` envelope.
pub struct QueryEngine {
    config: EngineConfig,
    resolver: Resolver,
    backends: HashMap<Dialect, Result<ResolvedBackend, EngineError>>,
}

impl QueryEngine {
    /// Resolve both dialects with no host bridges registered
    pub async fn initialize(config: EngineConfig) -> Self {
        Self::with_bridges(config, BridgeRegistry::new()).await
    }

    /// Resolve both dialects, preferring the given host bridges
    pub async fn with_bridges(config: EngineConfig, bridges: BridgeRegistry) -> Self {
        let mut engine = Self {
            config,
            resolver: Resolver::new(bridges),
            backends: HashMap::new(),
        };
        engine.resolve_all().await;
        engine
    }

    async fn resolve_all(&mut self) {
        for dialect in [Dialect::Sql, Dialect::Cypher] {
            let resolved = self
                .resolver
                .resolve(dialect, self.config.dialect(dialect))
                .await;
            self.backends.insert(dialect, resolved);
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bridges(&self) -> &BridgeRegistry {
        self.resolver.bridges()
    }

    /// Strategy that produced the dialect's backend, if one resolved
    pub fn strategy(&self, dialect: Dialect) -> Option<Strategy> {
        match self.backends.get(&dialect) {
            Some(Ok(resolved)) => Some(resolved.strategy()),
            _ => None,
        }
    }

    pub fn backend_name(&self, dialect: Dialect) -> Option<&str> {
        match self.backends.get(&dialect) {
            Some(Ok(resolved)) => Some(resolved.name()),
            _ => None,
        }
    }

    /// Gate, execute and normalize one statement. Never fails.
    pub async fn run_query(
        &self,
        dialect: Dialect,
        statement: &str,
        context: serde_json::Value,
    ) -> QueryResult {
        let started = Instant::now();

        let backend = match self.backends.get(&dialect) {
            Some(Ok(resolved)) => resolved.backend(),
            Some(Err(e)) => {
                debug!(%dialect, "Backend unavailable, short-circuiting");
                return normalize::failure(dialect, statement, e, started, context);
            }
            None => {
                let e = EngineError::BackendUnavailable(format!("{} was never resolved", dialect));
                return normalize::failure(dialect, statement, &e, started, context);
            }
        };

        let outcome = match gate::check(dialect, statement) {
            Ok(()) => backend.execute(statement).await,
            Err(e) => Err(e),
        };

        let result = normalize::normalize(dialect, statement, outcome, started, context);
        debug!(
            %dialect,
            backend = backend.name(),
            execution_id = %result.execution_id,
            success = result.success,
            rows = result.row_count(),
            elapsed_ms = result.execution_time_ms,
            "Query finished"
        );
        result
    }

    /// Tear down every backend, then resolve again under the new settings
    pub async fn reconfigure(&mut self, config: EngineConfig) {
        info!("Reconfiguring query engine");
        self.teardown();
        self.config = config;
        self.resolve_all().await;
    }

    fn teardown(&mut self) {
        for (dialect, slot) in self.backends.drain() {
            if let Ok(resolved) = slot {
                debug!(%dialect, backend = resolved.name(), "Tearing down backend");
                resolved.teardown();
            }
        }
    }
}

impl Drop for QueryEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}
