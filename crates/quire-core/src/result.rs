//! The unified result envelope
//!
//! Both dialects return a [`QueryResult`]: a fixed header (success flag,
//! execution id, timing, error) plus exactly one payload variant. Rendering
//! collaborators switch on the payload, never on the dialect.

use crate::entity::{Cell, GraphNode, GraphRelationship};
use crate::error::ErrorKind;
use crate::row::{Record, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Advisory classification of a graph statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    Read,
    Write,
    Schema,
}

/// Table-shaped payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabularPayload {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
}

/// Nodes and relationships touched by a graph result, deduplicated by id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
}

impl GraphData {
    /// Collect every entity cell of the records, first occurrence wins.
    ///
    /// Endpoints of collected relationships are filled in from `matched`,
    /// the nodes the pattern bound, even when they were not returned. An
    /// endpoint outside the matched pattern stays a raw id reference.
    /// Returns `None` when no record holds a node or relationship.
    pub fn from_records(records: &[Record], matched: &[GraphNode]) -> Option<Self> {
        let mut data = GraphData::default();
        let mut node_ids = HashSet::new();
        let mut rel_ids = HashSet::new();

        for cell in records.iter().flat_map(|r| r.values()) {
            match cell {
                Cell::Node(node) => {
                    if node_ids.insert(node.id.clone()) {
                        data.nodes.push(node.clone());
                    }
                }
                Cell::Relationship(rel) => {
                    if rel_ids.insert(rel.id.clone()) {
                        data.relationships.push(rel.clone());
                    }
                }
                Cell::Scalar(_) => {}
            }
        }

        let endpoints: Vec<&str> = data
            .relationships
            .iter()
            .flat_map(|r| [r.start.as_str(), r.end.as_str()])
            .collect();
        for id in endpoints {
            if node_ids.contains(id) {
                continue;
            }
            if let Some(node) = matched.iter().find(|n| n.id == id) {
                node_ids.insert(node.id.clone());
                data.nodes.push(node.clone());
            }
        }

        if data.nodes.is_empty() && data.relationships.is_empty() {
            None
        } else {
            Some(data)
        }
    }
}

/// Graph-shaped payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphData>,
    pub query_type: QueryType,
}

impl Default for GraphPayload {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            records: Vec::new(),
            graph: None,
            query_type: QueryType::Read,
        }
    }
}

/// Exactly one payload per envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "payload", rename_all = "lowercase")]
pub enum Payload {
    Tabular(TabularPayload),
    Graph(GraphPayload),
}

impl Payload {
    /// Number of rows or records carried
    pub fn len(&self) -> usize {
        match self {
            Payload::Tabular(t) => t.row_count,
            Payload::Graph(g) => g.records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The envelope returned for every invocation, success or failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub success: bool,
    pub execution_id: Uuid,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Caller-supplied passthrough data, never inspected by the engine
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub context: serde_json::Value,
    #[serde(flatten)]
    pub payload: Payload,
}

impl QueryResult {
    pub fn tabular(&self) -> Option<&TabularPayload> {
        match &self.payload {
            Payload::Tabular(t) => Some(t),
            Payload::Graph(_) => None,
        }
    }

    pub fn graph(&self) -> Option<&GraphPayload> {
        match &self.payload {
            Payload::Graph(g) => Some(g),
            Payload::Tabular(_) => None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.payload.len()
    }
}
