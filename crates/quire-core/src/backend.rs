//! Backend abstraction
//!
//! A backend is a live, health-checked handle that executes statement text
//! against one dataset. Every connection strategy (host bridge, native
//! driver, built-in dataset) produces a `Box<dyn Backend>`.

use crate::entity::{Cell, GraphNode};
use crate::error::EngineResult;
use crate::row::{Record, Row};
use crate::value::Value;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which query language a statement is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Relational dialect (SELECT statements over tables)
    Sql,
    /// Graph dialect (MATCH/RETURN/SHOW statements over nodes)
    Cypher,
}

impl Dialect {
    /// Fixed statement used to verify a freshly opened backend
    pub fn canary(&self) -> &'static str {
        match self {
            Dialect::Sql => "SELECT 1",
            Dialect::Cypher => "RETURN 1",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sql => "sql",
            Dialect::Cypher => "cypher",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" | "sqlite" | "relational" => Ok(Dialect::Sql),
            "cypher" | "neo4j" | "graph" => Ok(Dialect::Cypher),
            other => Err(format!("unknown dialect '{}'", other)),
        }
    }
}

/// Rows as returned by a backend, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRows {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    /// Nodes the matched pattern bound for the emitted records, returned or not
    pub matched_nodes: Vec<GraphNode>,
}

impl RawRows {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            columns,
            records,
            matched_nodes: Vec::new(),
        }
    }

    /// Build from scalar rows
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self::new(
            columns,
            rows.into_iter().map(|r| r.map_values(Cell::Scalar)).collect(),
        )
    }

    pub fn with_matched_nodes(mut self, nodes: Vec<GraphNode>) -> Self {
        self.matched_nodes = nodes;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first column of the first record, if it is a scalar
    pub fn first_scalar(&self) -> Option<&Value> {
        self.records
            .first()
            .and_then(|r| r.values().next())
            .and_then(Cell::as_scalar)
    }
}

/// A handle capable of executing statement text against one dataset.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable name, used in logs and diagnostics
    fn name(&self) -> &str;

    /// The dialect this backend answers
    fn dialect(&self) -> Dialect;

    /// Execute a statement that has already passed the gatekeeper
    async fn execute(&self, statement: &str) -> EngineResult<RawRows>;

    /// Release the handle.
    ///
    /// Must be idempotent and safe on a handle that never finished
    /// initializing. Executing after teardown yields `BackendUnavailable`.
    fn teardown(&self);
}
