//! Native graph backend over Bolt (`neo4j` feature)

use async_trait::async_trait;
use neo4rs::{query, BoltList, BoltMap, BoltType, Graph};
use parking_lot::RwLock;
use quire_core::{
    Backend, Cell, Dialect, EngineError, EngineResult, GraphNode, GraphRelationship, GraphTarget,
    RawRows, Record, Value,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub struct BoltBackend {
    address: String,
    graph: RwLock<Option<Graph>>,
}

impl BoltBackend {
    pub async fn connect(target: &GraphTarget) -> EngineResult<Self> {
        let address = target.address();
        info!(%address, "Connecting to graph database");
        let graph = Graph::new(&address, &target.user, &target.password)
            .await
            .map_err(|e| EngineError::BackendUnavailable(format!("{}: {}", address, e)))?;
        Ok(Self {
            address,
            graph: RwLock::new(Some(graph)),
        })
    }
}

#[async_trait]
impl Backend for BoltBackend {
    fn name(&self) -> &str {
        "bolt"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Cypher
    }

    async fn execute(&self, statement: &str) -> EngineResult<RawRows> {
        let graph = self.graph.read().clone().ok_or_else(|| {
            EngineError::BackendUnavailable("bolt backend was torn down".to_string())
        })?;

        let mut stream = graph
            .execute(query(statement))
            .await
            .map_err(|e| EngineError::Backend(e.to_string()))?;

        let mut columns: Vec<String> = Vec::new();
        let mut records = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| EngineError::Backend(e.to_string()))?
        {
            let keys: Vec<String> = row.keys().into_iter().map(|k| k.value.to_string()).collect();
            if columns.is_empty() {
                columns = keys.clone();
            }
            let mut record = Record::with_capacity(keys.len());
            for key in keys {
                let value: BoltType = row
                    .get(&key)
                    .map_err(|e| EngineError::Backend(format!("column {}: {}", key, e)))?;
                record.push(key, to_cell(value));
            }
            records.push(record);
        }

        debug!(address = %self.address, records = records.len(), "Bolt query complete");
        Ok(RawRows::new(columns, records))
    }

    fn teardown(&self) {
        if self.graph.write().take().is_some() {
            info!(address = %self.address, "Graph connection released");
        }
    }
}

fn to_cell(value: BoltType) -> Cell {
    match value {
        BoltType::Node(node) => Cell::Node(GraphNode {
            id: node.id.value.to_string(),
            labels: node
                .labels
                .value
                .into_iter()
                .filter_map(|l| match l {
                    BoltType::String(s) => Some(s.value),
                    _ => None,
                })
                .collect(),
            properties: to_properties(node.properties),
        }),
        BoltType::Relation(rel) => Cell::Relationship(GraphRelationship {
            id: rel.id.value.to_string(),
            rel_type: rel.typ.value,
            start: rel.start_node_id.value.to_string(),
            end: rel.end_node_id.value.to_string(),
            properties: to_properties(rel.properties),
        }),
        other => Cell::Scalar(to_value(other)),
    }
}

fn to_properties(map: BoltMap) -> BTreeMap<String, Value> {
    map.value
        .into_iter()
        .map(|(k, v)| (k.value, to_value(v)))
        .collect()
}

/// Lists and maps have no scalar counterpart and are rendered as text
fn to_value(value: BoltType) -> Value {
    match value {
        BoltType::Null(_) => Value::Null,
        BoltType::Boolean(b) => Value::Boolean(b.value),
        BoltType::Integer(i) => Value::Integer(i.value),
        BoltType::Float(f) => Value::Float(f.value),
        BoltType::String(s) => Value::Text(s.value),
        BoltType::List(list) => Value::Text(list_text(list)),
        other => Value::Text(format!("{:?}", other)),
    }
}

fn list_text(list: BoltList) -> String {
    let items: Vec<String> = list
        .value
        .into_iter()
        .map(|v| to_value(v).to_string())
        .collect();
    format!("[{}]", items.join(", "))
}
