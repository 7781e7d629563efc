//! Envelope rendering

use comfy_table::{presets::UTF8_FULL, Table};
use quire_core::{Payload, QueryResult};

/// Pretty JSON, exactly as a presentation layer would receive it
pub fn render_json(result: &QueryResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Human-readable table plus a one-line summary.
///
/// Entity cells render as their id; the JSON form carries the full entity.
pub fn render_table(result: &QueryResult) -> String {
    if !result.success {
        return format!(
            "error: {}",
            result.error.as_deref().unwrap_or("query failed")
        );
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    match &result.payload {
        Payload::Tabular(tabular) => {
            table.set_header(tabular.columns.clone());
            for row in &tabular.rows {
                table.add_row(row.values().map(|v| v.to_string()).collect::<Vec<_>>());
            }
        }
        Payload::Graph(graph) => {
            table.set_header(graph.columns.clone());
            for record in &graph.records {
                table.add_row(
                    record
                        .values()
                        .map(|cell| cell.to_scalar().to_string())
                        .collect::<Vec<_>>(),
                );
            }
        }
    }

    let noun = match result.row_count() {
        1 => "row",
        _ => "rows",
    };
    format!(
        "{}\n{} {} ({} ms)",
        table,
        result.row_count(),
        noun,
        result.execution_time_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::{
        Cell, ErrorKind, GraphNode, GraphPayload, QueryType, Record, Row, TabularPayload, Value,
    };
    use uuid::Uuid;

    fn envelope(payload: Payload) -> QueryResult {
        QueryResult {
            success: true,
            execution_id: Uuid::nil(),
            execution_time_ms: 1,
            error: None,
            error_kind: None,
            context: serde_json::Value::Null,
            payload,
        }
    }

    #[test]
    fn test_tabular_table() {
        let result = envelope(Payload::Tabular(TabularPayload {
            columns: vec!["title".into(), "rating".into()],
            rows: vec![Row::new()
                .with("title", Value::from("Dune"))
                .with("rating", Value::Float(4.5))],
            row_count: 1,
        }));

        let text = render_table(&result);
        assert!(text.contains("title"));
        assert!(text.contains("Dune"));
        assert!(text.ends_with("1 row (1 ms)"));
    }

    #[test]
    fn test_graph_cells_render_by_id() {
        let result = envelope(Payload::Graph(GraphPayload {
            columns: vec!["p".into()],
            records: vec![Record::new().with("p", Cell::Node(GraphNode::new("p1")))],
            graph: None,
            query_type: QueryType::Read,
        }));
        assert!(render_table(&result).contains("p1"));
    }

    #[test]
    fn test_failure_prints_error() {
        let mut result = envelope(Payload::Tabular(TabularPayload::default()));
        result.success = false;
        result.error = Some("NoSuchTable: no table named 'x'".into());
        result.error_kind = Some(ErrorKind::NoSuchTable);

        assert_eq!(render_table(&result), "error: NoSuchTable: no table named 'x'");
        assert!(render_json(&result).unwrap().contains("\"errorKind\": \"NoSuchTable\""));
    }
}
