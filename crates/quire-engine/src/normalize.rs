//! Result normalization
//!
//! The only place backend output and engine errors become a
//! [`QueryResult`]. Nothing past this point returns `Err`.

use quire_core::{
    Dialect, EngineError, EngineResult, GraphData, GraphPayload, Payload, QueryResult, RawRows,
    Row, TabularPayload,
};
use quire_query::classify_query;
use std::time::Instant;
use uuid::Uuid;

/// Wrap the outcome of one invocation
pub fn normalize(
    dialect: Dialect,
    statement: &str,
    outcome: EngineResult<RawRows>,
    started: Instant,
    context: serde_json::Value,
) -> QueryResult {
    match outcome {
        Ok(rows) => success(dialect, statement, rows, started, context),
        Err(e) => failure(dialect, statement, &e, started, context),
    }
}

pub fn success(
    dialect: Dialect,
    statement: &str,
    rows: RawRows,
    started: Instant,
    context: serde_json::Value,
) -> QueryResult {
    let payload = match dialect {
        Dialect::Sql => {
            let RawRows { columns, records, .. } = rows;
            let rows: Vec<Row> = records
                .into_iter()
                .map(|r| r.map_values(|cell| cell.to_scalar()))
                .collect();
            Payload::Tabular(TabularPayload {
                columns,
                row_count: rows.len(),
                rows,
            })
        }
        Dialect::Cypher => Payload::Graph(GraphPayload {
            graph: GraphData::from_records(&rows.records, &rows.matched_nodes),
            columns: rows.columns,
            records: rows.records,
            query_type: classify_query(statement),
        }),
    };
    envelope(true, None, payload, started, context)
}

pub fn failure(
    dialect: Dialect,
    statement: &str,
    error: &EngineError,
    started: Instant,
    context: serde_json::Value,
) -> QueryResult {
    let payload = match dialect {
        Dialect::Sql => Payload::Tabular(TabularPayload::default()),
        Dialect::Cypher => Payload::Graph(GraphPayload {
            query_type: classify_query(statement),
            ..GraphPayload::default()
        }),
    };
    envelope(false, Some(error), payload, started, context)
}

fn envelope(
    success: bool,
    error: Option<&EngineError>,
    payload: Payload,
    started: Instant,
    context: serde_json::Value,
) -> QueryResult {
    QueryResult {
        success,
        execution_id: Uuid::new_v4(),
        execution_time_ms: started.elapsed().as_millis() as u64,
        error: error.map(|e| e.to_string()),
        error_kind: error.map(EngineError::kind),
        context,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::{Cell, ErrorKind, GraphNode, QueryType, Record, Value};
    use serde_json::json;

    #[test]
    fn test_tabular_success() {
        let rows = RawRows::from_rows(
            vec!["id".to_string()],
            vec![
                Row::new().with("id", Value::Integer(3)),
                Row::new().with("id", Value::Integer(1)),
            ],
        );
        let result = success(Dialect::Sql, "SELECT id FROM books", rows, Instant::now(), json!(null));

        assert!(result.success);
        let table = result.tabular().unwrap();
        assert_eq!(table.columns, vec!["id"]);
        assert_eq!(table.row_count, 2);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_graph_success_collects_entities() {
        let node = Cell::Node(GraphNode::new("p1").with_label("Person"));
        let rows = RawRows::new(
            vec!["p".to_string()],
            vec![Record::new().with("p", node.clone()), Record::new().with("p", node)],
        );
        let result = success(Dialect::Cypher, "MATCH (p) RETURN p", rows, Instant::now(), json!(null));

        let graph = result.graph().unwrap();
        assert_eq!(graph.records.len(), 2);
        assert_eq!(graph.graph.as_ref().unwrap().nodes.len(), 1);
        assert_eq!(graph.query_type, QueryType::Read);
    }

    #[test]
    fn test_failure_keeps_dialect_shape_and_context() {
        let context = json!({"block": 7, "source": "notes.md"});
        let err = EngineError::NoSuchTable("nonexistent_table".to_string());
        let result = failure(Dialect::Sql, "SELECT * FROM nonexistent_table", &err, Instant::now(), context.clone());

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::NoSuchTable));
        assert!(result.error.as_deref().unwrap().starts_with("NoSuchTable"));
        assert_eq!(result.tabular().unwrap().row_count, 0);
        assert_eq!(result.context, context);
    }

    #[test]
    fn test_graph_failure_is_classified() {
        let err = EngineError::invalid_query("write-keyword", "write keyword CREATE");
        let result = failure(Dialect::Cypher, "CREATE (n)", &err, Instant::now(), json!(null));
        let graph = result.graph().unwrap();
        assert!(graph.records.is_empty());
        assert!(graph.graph.is_none());
        assert_eq!(graph.query_type, QueryType::Write);
    }
}
