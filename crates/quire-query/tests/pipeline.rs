//! Gate, parse and evaluate over datasets loaded from JSON documents

use quire_core::{Dataset, Dialect, EngineError, ErrorKind, QueryType, RawRows, Value};
use quire_query::{check, classify_query, GraphEvaluator, RelationalEvaluator, TableOutput};
use test_case::test_case;

const LIBRARY: &str = r#"{"tables": {
    "loans": [
        {"id": 1, "member": "ana", "days": 12, "returned": true, "due": "2020-01-01T00:00:00Z"},
        {"id": 2, "member": "ben", "days": 30, "returned": false, "due": "2020-02-15T00:00:00Z"},
        {"id": 3, "member": "ana", "days": 7},
        {"id": 4, "member": "cy", "days": 21, "returned": true}
    ]
}}"#;

const NETWORK: &str = r#"{
    "nodes": [
        {"id": "s1", "labels": ["Service"], "properties": {"name": "api", "replicas": 3}},
        {"id": "s2", "labels": ["Service"], "properties": {"name": "worker", "replicas": 1}},
        {"id": "d1", "labels": ["Database", "Storage"], "properties": {"name": "pg"}}
    ],
    "relationships": [
        {"id": "e1", "type": "CALLS", "start": "s1", "end": "s2", "properties": {}},
        {"id": "e2", "type": "READS", "start": "s1", "end": "d1", "properties": {"pool": 10}},
        {"id": "e3", "type": "READS", "start": "s2", "end": "d1", "properties": {"pool": 4}}
    ]
}"#;

fn run_sql(text: &str) -> Result<TableOutput, EngineError> {
    let Dataset::Relational(tables) = Dataset::from_json_str(Dialect::Sql, LIBRARY).unwrap() else {
        unreachable!()
    };
    check(Dialect::Sql, text)?;
    RelationalEvaluator::new(&tables).execute(text)
}

fn run_cypher(text: &str) -> Result<RawRows, EngineError> {
    let Dataset::Graph(graph) = Dataset::from_json_str(Dialect::Cypher, NETWORK).unwrap() else {
        unreachable!()
    };
    check(Dialect::Cypher, text)?;
    GraphEvaluator::new(&graph).execute(text)
}

#[test]
fn test_missing_keys_are_null() {
    let out = run_sql("SELECT id, returned FROM loans WHERE member = 'ana'").unwrap();
    assert_eq!(out.rows.len(), 2);
    assert_eq!(out.rows[1].get("returned"), Some(&Value::Null));
}

#[test]
fn test_average_days_per_member() {
    let out = run_sql("SELECT member, AVG(days) AS avg_days FROM loans GROUP BY member ORDER BY avg_days DESC LIMIT 1").unwrap();
    assert_eq!(out.columns, vec!["member", "avg_days"]);
    assert_eq!(out.rows[0].get("member"), Some(&Value::from("ben")));
    assert_eq!(out.rows[0].get("avg_days"), Some(&Value::Float(30.0)));
}

#[test]
fn test_date_strings_filter_by_text_literal() {
    let out = run_sql("SELECT id, due FROM loans WHERE due = '2020-01-01T00:00:00Z'").unwrap();
    assert_eq!(out.rows.len(), 1);
    assert_eq!(out.rows[0].get("id"), Some(&Value::Integer(1)));

    let out = run_sql("SELECT id FROM loans WHERE due = '2020-02-15'").unwrap();
    assert_eq!(out.rows.len(), 1);
    assert_eq!(out.rows[0].get("id"), Some(&Value::Integer(2)));
}

#[test]
fn test_literal_inside_string_passes_gate() {
    let out = run_sql("SELECT id FROM loans WHERE member = 'drop table loans'").unwrap();
    assert!(out.rows.is_empty());
}

#[test_case("SELECT * FROM loans -- all", ErrorKind::InvalidQuery ; "comment")]
#[test_case("SELECT * FROM fines", ErrorKind::NoSuchTable ; "unknown table")]
#[test_case("SELECT fine FROM loans", ErrorKind::NoSuchColumn ; "unknown column")]
#[test_case("SELECT member, days FROM loans GROUP BY member", ErrorKind::AggregateError ; "ungrouped column")]
#[test_case("SELECT * FORM loans", ErrorKind::SyntaxError ; "misspelled keyword")]
fn test_sql_failures(text: &str, kind: ErrorKind) {
    assert_eq!(run_sql(text).unwrap_err().kind(), kind);
}

#[test]
fn test_multi_label_node_scan() {
    let rows = run_cypher("MATCH (s:Storage) RETURN s.name").unwrap();
    assert_eq!(rows.first_scalar(), Some(&Value::from("pg")));
}

#[test]
fn test_reverse_traversal_count() {
    let rows = run_cypher("MATCH (d:Database)<-[r:READS]-(s:Service) RETURN count(*)").unwrap();
    assert_eq!(rows.first_scalar(), Some(&Value::Integer(2)));
}

#[test]
fn test_relationship_property() {
    let rows = run_cypher("MATCH (s:Service {name: 'api'})-[r:READS]->(d) RETURN r.pool").unwrap();
    assert_eq!(rows.first_scalar(), Some(&Value::Integer(10)));
}

#[test_case("MATCH (a)-[:CALLS]->(b)-[:READS]->(c) RETURN a", ErrorKind::UnsupportedPattern ; "multi hop")]
#[test_case("MATCH (s:Queue) RETURN s", ErrorKind::NoSuchLabel ; "unknown label")]
#[test_case("MATCH (s:Service) RETURN s, count(s)", ErrorKind::AggregateError ; "mixed count")]
#[test_case("CALL dbms.components()", ErrorKind::InvalidQuery ; "admin call")]
#[test_case("MATCH (s:Service) MERGE (s)-[:CALLS]->(s)", ErrorKind::InvalidQuery ; "merge")]
fn test_cypher_failures(text: &str, kind: ErrorKind) {
    assert_eq!(run_cypher(text).unwrap_err().kind(), kind);
}

#[test]
fn test_classification_is_advisory() {
    assert_eq!(classify_query("MATCH (n) RETURN n.name AS 'set'"), QueryType::Read);
    assert_eq!(classify_query("SHOW RELATIONSHIP TYPES"), QueryType::Schema);
}
