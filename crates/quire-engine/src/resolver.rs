//! Backend resolution
//!
//! Each dialect gets its backend from an ordered list of strategies:
//!
//! 1. [`Strategy::Bridge`]: a backend the host registered for the dialect
//! 2. [`Strategy::Native`]: a direct connection to the configured target
//! 3. [`Strategy::Builtin`]: the fixed seed dataset
//!
//! Every candidate must answer the dialect's canary with the integer `1`
//! before it is accepted. A failed strategy is logged and the next one is
//! tried; only when the list is exhausted does resolution fail.

use crate::backends::{BridgeBackend, BridgeRegistry, DatasetBackend};
use crate::seed;
use quire_config::DialectConfig;
use quire_core::{Backend, Dataset, Dialect, EngineError, EngineResult, TargetDescriptor, Value};
use quire_sqlite::{SqliteBackend, SqliteConfig};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Backend connection strategy, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Host-registered bridge
    Bridge,
    /// Native driver connection to the configured target
    Native,
    /// Built-in seed dataset
    Builtin,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Bridge => "bridge",
            Strategy::Native => "native",
            Strategy::Builtin => "builtin",
        })
    }
}

/// A backend that passed its canary, with the strategy that produced it
pub struct ResolvedBackend {
    strategy: Strategy,
    backend: Arc<dyn Backend>,
}

impl ResolvedBackend {
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    pub fn teardown(&self) {
        self.backend.teardown();
    }
}

impl fmt::Debug for ResolvedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBackend")
            .field("strategy", &self.strategy)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Walks the strategy list for a dialect
#[derive(Clone, Default)]
pub struct Resolver {
    bridges: BridgeRegistry,
}

impl Resolver {
    pub fn new(bridges: BridgeRegistry) -> Self {
        Self { bridges }
    }

    pub fn bridges(&self) -> &BridgeRegistry {
        &self.bridges
    }

    /// Strategies enabled by the settings, in the order they are tried
    pub fn strategies(&self, dialect: Dialect, settings: &DialectConfig) -> Vec<Strategy> {
        let mut strategies = Vec::with_capacity(3);
        if settings.use_bridge && self.bridges.get(dialect).is_some() {
            strategies.push(Strategy::Bridge);
        }
        if settings.target.is_some() {
            strategies.push(Strategy::Native);
        }
        if settings.fallback_to_builtin {
            strategies.push(Strategy::Builtin);
        }
        strategies
    }

    /// Resolve a health-checked backend for the dialect
    pub async fn resolve(
        &self,
        dialect: Dialect,
        settings: &DialectConfig,
    ) -> EngineResult<ResolvedBackend> {
        let strategies = self.strategies(dialect, settings);
        if strategies.is_empty() {
            error!(%dialect, "No backend strategy is enabled");
            return Err(EngineError::BackendUnavailable(format!(
                "no backend strategy is enabled for {}",
                dialect
            )));
        }

        let mut failures = Vec::with_capacity(strategies.len());
        for strategy in strategies {
            debug!(%dialect, %strategy, "Trying backend strategy");
            match self.attempt(dialect, strategy, settings).await {
                Ok(backend) => {
                    info!(%dialect, %strategy, backend = backend.name(), "Backend resolved");
                    return Ok(ResolvedBackend { strategy, backend });
                }
                Err(e) => {
                    warn!(%dialect, %strategy, error = %e, "Backend strategy failed");
                    failures.push(format!("{}: {}", strategy, e));
                }
            }
        }

        error!(%dialect, failures = failures.len(), "All backend strategies failed");
        Err(EngineError::BackendUnavailable(format!(
            "no usable {} backend ({})",
            dialect,
            failures.join("; ")
        )))
    }

    async fn attempt(
        &self,
        dialect: Dialect,
        strategy: Strategy,
        settings: &DialectConfig,
    ) -> EngineResult<Arc<dyn Backend>> {
        let backend = self.open(dialect, strategy, settings).await?;
        if let Err(e) = canary(backend.as_ref()).await {
            backend.teardown();
            return Err(e);
        }
        Ok(backend)
    }

    async fn open(
        &self,
        dialect: Dialect,
        strategy: Strategy,
        settings: &DialectConfig,
    ) -> EngineResult<Arc<dyn Backend>> {
        match strategy {
            Strategy::Bridge => {
                let host = self.bridges.get(dialect).ok_or_else(|| {
                    EngineError::BackendUnavailable("no bridge registered".to_string())
                })?;
                Ok(Arc::new(BridgeBackend::attach(host)))
            }
            Strategy::Native => {
                let raw = settings.target.as_deref().ok_or_else(|| {
                    EngineError::BackendUnavailable("no target configured".to_string())
                })?;
                let descriptor = TargetDescriptor::parse(dialect, raw).map_err(|e| {
                    EngineError::BackendUnavailable(format!("invalid target: {}", e))
                })?;
                open_native(descriptor).await
            }
            Strategy::Builtin => {
                let dataset = seed::dataset(dialect)
                    .map_err(|e| EngineError::Backend(format!("seed dataset: {}", e)))?;
                Ok(Arc::new(DatasetBackend::new("builtin", dataset)))
            }
        }
    }
}

async fn open_native(descriptor: TargetDescriptor) -> EngineResult<Arc<dyn Backend>> {
    match descriptor {
        TargetDescriptor::Path(path) if is_json(&path) => {
            let json = tokio::fs::read_to_string(&path).await.map_err(|e| {
                EngineError::BackendUnavailable(format!("{}: {}", path.display(), e))
            })?;
            let dataset = Dataset::from_json_str(Dialect::Sql, &json)
                .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;
            Ok(Arc::new(DatasetBackend::new("json", dataset)))
        }
        TargetDescriptor::Path(path) => {
            let backend = SqliteBackend::open(SqliteConfig::new(path))?;
            Ok(Arc::new(backend))
        }
        #[cfg(feature = "neo4j")]
        TargetDescriptor::Graph(target) => {
            let backend = crate::backends::BoltBackend::connect(&target).await?;
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "neo4j"))]
        TargetDescriptor::Graph(target) => Err(EngineError::BackendUnavailable(format!(
            "bolt driver not compiled in, cannot reach {}",
            target.address()
        ))),
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// The canary must come back as the scalar integer 1
async fn canary(backend: &dyn Backend) -> EngineResult<()> {
    let statement = backend.dialect().canary();
    let rows = backend.execute(statement).await?;
    match rows.first_scalar() {
        Some(Value::Integer(1)) => Ok(()),
        other => Err(EngineError::BackendUnavailable(format!(
            "canary '{}' returned {}",
            statement,
            other.map_or_else(|| "no rows".to_string(), |v| format!("{:?}", v))
        ))),
    }
}
