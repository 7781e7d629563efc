//! Immutable datasets served by in-memory backends
//!
//! A dataset is built once, validated, and then only ever read. Relational
//! datasets hold named tables; graph datasets hold nodes and relationships
//! whose endpoints are checked at construction time.

use crate::backend::Dialect;
use crate::entity::{GraphNode, GraphRelationship};
use crate::row::Row;
use crate::value::Value;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Errors raised while building or loading a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate table name: {0}")]
    DuplicateTable(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Duplicate relationship id: {0}")]
    DuplicateRelationship(String),

    #[error("Relationship {relationship} references missing node {node}")]
    DanglingEndpoint { relationship: String, node: String },
}

/// Result type for dataset construction
pub type DatasetResult<T> = Result<T, DatasetError>;

/// A named table whose rows share one ordered column set.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table from rows.
    ///
    /// The column list is the union of the rows' columns in first-seen
    /// order. Every row is rewritten to that column order, with Null for
    /// columns it lacks, so all rows have the same arity.
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.columns() {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }

        let rows: Vec<Row> = rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                    .collect::<Row>()
            })
            .collect();

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// A set of uniquely named tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationalDataset {
    tables: Vec<Table>,
}

impl RelationalDataset {
    pub fn new(tables: Vec<Table>) -> DatasetResult<Self> {
        let mut seen = HashSet::new();
        for table in &tables {
            if !seen.insert(table.name().to_ascii_lowercase()) {
                return Err(DatasetError::DuplicateTable(table.name().to_string()));
            }
        }
        Ok(Self { tables })
    }

    /// Look up a table by name, ignoring ASCII case
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }
}

/// Nodes and relationships with verified endpoints
#[derive(Debug, Clone, Default)]
pub struct GraphDataset {
    nodes: Vec<GraphNode>,
    relationships: Vec<GraphRelationship>,
    node_index: HashMap<String, usize>,
}

impl GraphDataset {
    pub fn new(
        nodes: Vec<GraphNode>,
        relationships: Vec<GraphRelationship>,
    ) -> DatasetResult<Self> {
        let mut node_index = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if node_index.insert(node.id.clone(), idx).is_some() {
                return Err(DatasetError::DuplicateNode(node.id.clone()));
            }
        }

        let mut rel_ids = HashSet::with_capacity(relationships.len());
        for rel in &relationships {
            if !rel_ids.insert(rel.id.as_str()) {
                return Err(DatasetError::DuplicateRelationship(rel.id.clone()));
            }
            for endpoint in [&rel.start, &rel.end] {
                if !node_index.contains_key(endpoint) {
                    return Err(DatasetError::DanglingEndpoint {
                        relationship: rel.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }

        Ok(Self {
            nodes,
            relationships,
            node_index,
        })
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[GraphRelationship] {
        &self.relationships
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Distinct labels carried by any node, sorted
    pub fn labels(&self) -> BTreeSet<&str> {
        self.nodes
            .iter()
            .flat_map(|n| n.labels.iter().map(String::as_str))
            .collect()
    }

    /// Distinct relationship types, sorted
    pub fn relationship_types(&self) -> BTreeSet<&str> {
        self.relationships
            .iter()
            .map(|r| r.rel_type.as_str())
            .collect()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.nodes.iter().any(|n| n.has_label(label))
    }
}

/// The data an in-memory backend answers queries from
#[derive(Debug, Clone)]
pub enum Dataset {
    Relational(RelationalDataset),
    Graph(GraphDataset),
}

#[derive(Deserialize)]
struct RelationalFile {
    tables: Row<Vec<Row>>,
}

#[derive(Deserialize)]
struct GraphFile {
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default)]
    relationships: Vec<GraphRelationship>,
}

impl Dataset {
    /// The query dialect this dataset answers
    pub fn dialect(&self) -> Dialect {
        match self {
            Dataset::Relational(_) => Dialect::Sql,
            Dataset::Graph(_) => Dialect::Cypher,
        }
    }

    /// Parse a dataset document for the given dialect.
    ///
    /// Relational: `{"tables": {"books": [{...}, ...]}}`.
    /// Graph: `{"nodes": [...], "relationships": [...]}`.
    pub fn from_json_str(dialect: Dialect, json: &str) -> DatasetResult<Self> {
        match dialect {
            Dialect::Sql => {
                let file: RelationalFile = serde_json::from_str(json)?;
                let tables = file
                    .tables
                    .into_iter()
                    .map(|(name, rows)| Table::new(name, rows))
                    .collect();
                Ok(Dataset::Relational(RelationalDataset::new(tables)?))
            }
            Dialect::Cypher => {
                let file: GraphFile = serde_json::from_str(json)?;
                Ok(Dataset::Graph(GraphDataset::new(
                    file.nodes,
                    file.relationships,
                )?))
            }
        }
    }

    /// Load a dataset document from disk
    pub fn load_json(dialect: Dialect, path: impl AsRef<Path>) -> DatasetResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(dialect, &json)
    }
}
