//! Query engine for quire
//!
//! Resolves one backend per dialect, runs gated statements against it, and
//! normalizes every outcome into a [`QueryResult`](quire_core::QueryResult).
//!
//! ```rust,no_run
//! use quire_config::EngineConfig;
//! use quire_core::Dialect;
//! use quire_engine::QueryEngine;
//!
//! # async fn demo() {
//! let engine = QueryEngine::initialize(EngineConfig::default()).await;
//! let result = engine
//!     .run_query(Dialect::Sql, "SELECT title FROM books LIMIT 1", serde_json::Value::Null)
//!     .await;
//! assert!(result.success);
//! # }
//! ```

pub mod backends;
pub mod engine;
pub mod normalize;
pub mod resolver;
pub mod seed;

pub use backends::{BridgeBackend, BridgeRegistry, DatasetBackend};
pub use engine::QueryEngine;
pub use resolver::{ResolvedBackend, Resolver, Strategy};
