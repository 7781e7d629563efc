//! Graph entities and the cell union used in result records

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A node in a graph dataset.
///
/// Labels are a set: order does not matter and duplicates collapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labels: BTreeSet::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRelationship {
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Id of the start node
    pub start: String,
    /// Id of the end node
    pub end: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl GraphRelationship {
    pub fn new(
        id: impl Into<String>,
        rel_type: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.into(),
            start: start.into(),
            end: end.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// One cell of a result record.
///
/// Dispatch on the variant instead of guessing from the shape of a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Scalar(Value),
    Node(GraphNode),
    Relationship(GraphRelationship),
}

impl Cell {
    /// Scalar view of the cell; entities collapse to their id
    pub fn to_scalar(&self) -> Value {
        match self {
            Cell::Scalar(v) => v.clone(),
            Cell::Node(n) => Value::Text(n.id.clone()),
            Cell::Relationship(r) => Value::Text(r.id.clone()),
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Cell::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for Cell {
    fn from(v: Value) -> Self {
        Cell::Scalar(v)
    }
}

impl From<GraphNode> for Cell {
    fn from(n: GraphNode) -> Self {
        Cell::Node(n)
    }
}

impl From<GraphRelationship> for Cell {
    fn from(r: GraphRelationship) -> Self {
        Cell::Relationship(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_collapse_duplicates() {
        let node = GraphNode::new("p1")
            .with_label("Person")
            .with_label("Person")
            .with_label("Employee");

        assert_eq!(node.labels.len(), 2);
        assert!(node.has_label("Employee"));
    }

    #[test]
    fn test_relationship_serializes_type_field() {
        let rel = GraphRelationship::new("r1", "WORKS_FOR", "p1", "c1").with_property("since", 2019);
        let json = serde_json::to_value(&rel).unwrap();

        assert_eq!(json["type"], "WORKS_FOR");
        assert_eq!(json["start"], "p1");
        assert_eq!(json["properties"]["since"], 2019);
    }

    #[test]
    fn test_cell_to_scalar() {
        let cell = Cell::from(GraphNode::new("c1"));
        assert_eq!(cell.to_scalar(), Value::from("c1"));
        assert!(cell.as_scalar().is_none());
    }
}
