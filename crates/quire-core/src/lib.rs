//! Shared model for the quire query engine
//!
//! Everything the gatekeeper, the evaluators, the backends and the result
//! normalizer exchange lives here:
//!
//! - **Values**: [`Value`] scalars with a total ordering
//! - **Rows and records**: [`Row`] (scalars) and [`Record`] (entity cells)
//! - **Entities**: [`GraphNode`], [`GraphRelationship`] and the [`Cell`] union
//! - **Datasets**: immutable [`Dataset`]s served by in-memory backends
//! - **Envelope**: the unified [`QueryResult`] returned for every invocation
//! - **Backends**: the [`Backend`] trait every connection strategy implements
//!
//! ## Usage
//!
//! ```rust
//! use quire_core::{Row, Table, Value};
//!
//! let mut row = Row::new();
//! row.push("id", Value::Integer(1));
//! row.push("title", Value::from("Dune"));
//!
//! let table = Table::new("books", vec![row]);
//! assert_eq!(table.columns(), &["id".to_string(), "title".to_string()]);
//! ```

pub mod backend;
pub mod dataset;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod result;
pub mod row;
pub mod value;

pub use backend::{Backend, Dialect, RawRows};
pub use dataset::{Dataset, DatasetError, DatasetResult, GraphDataset, RelationalDataset, Table};
pub use descriptor::{DescriptorError, GraphTarget, TargetDescriptor};
pub use entity::{Cell, GraphNode, GraphRelationship};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use result::{GraphData, GraphPayload, Payload, QueryResult, QueryType, TabularPayload};
pub use row::{Record, Row};
pub use value::Value;
