//! Backend implementations produced by the resolver

#[cfg(feature = "neo4j")]
mod bolt;
mod bridge;
mod dataset;

#[cfg(feature = "neo4j")]
pub use bolt::BoltBackend;
pub use bridge::{BridgeBackend, BridgeRegistry};
pub use dataset::DatasetBackend;
