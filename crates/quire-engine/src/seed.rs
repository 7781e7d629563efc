//! Fixed datasets served by the built-in backend

use chrono::{DateTime, NaiveDate, Utc};
use quire_core::{
    Dataset, DatasetResult, Dialect, GraphDataset, GraphNode, GraphRelationship,
    RelationalDataset, Row, Table, Value,
};

fn date(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn book(id: i64, title: &str, author: &str, rating: f64, published: Option<DateTime<Utc>>) -> Row {
    Row::new()
        .with("id", Value::Integer(id))
        .with("title", Value::from(title))
        .with("author", Value::from(author))
        .with("rating", Value::Float(rating))
        .with("published", Value::from(published))
}

fn author(name: &str, country: &str, born: i64) -> Row {
    Row::new()
        .with("name", Value::from(name))
        .with("country", Value::from(country))
        .with("born", Value::Integer(born))
}

/// `books` and `authors`
pub fn relational() -> DatasetResult<RelationalDataset> {
    let books = Table::new(
        "books",
        vec![
            book(1, "The Quiet Index", "Author A", 4.5, date(2019, 3, 14)),
            book(2, "Margins and Footnotes", "Author B", 3.8, date(2021, 9, 1)),
            book(3, "A Grammar of Tables", "Author A", 4.8, date(2020, 6, 30)),
        ],
    );
    let authors = Table::new(
        "authors",
        vec![
            author("Author A", "United Kingdom", 1971),
            author("Author B", "Canada", 1984),
        ],
    );
    RelationalDataset::new(vec![books, authors])
}

/// People, the company they work for, and where it is located
pub fn graph() -> DatasetResult<GraphDataset> {
    let nodes = vec![
        GraphNode::new("p1")
            .with_label("Person")
            .with_property("name", "Alice")
            .with_property("age", 34),
        GraphNode::new("p2")
            .with_label("Person")
            .with_property("name", "Bob")
            .with_property("age", 29),
        GraphNode::new("p3")
            .with_label("Person")
            .with_property("name", "Chen")
            .with_property("age", 41),
        GraphNode::new("c1")
            .with_label("Company")
            .with_property("name", "Acme")
            .with_property("founded", 2004),
        GraphNode::new("l1")
            .with_label("City")
            .with_property("name", "Lisbon")
            .with_property("population", 545_000),
    ];
    let relationships = vec![
        GraphRelationship::new("r1", "WORKS_FOR", "p1", "c1").with_property("since", 2019),
        GraphRelationship::new("r2", "KNOWS", "p1", "p2"),
        GraphRelationship::new("r3", "KNOWS", "p2", "p3"),
        GraphRelationship::new("r4", "LOCATED_IN", "c1", "l1"),
    ];
    GraphDataset::new(nodes, relationships)
}

/// The seed dataset for a dialect
pub fn dataset(dialect: Dialect) -> DatasetResult<Dataset> {
    Ok(match dialect {
        Dialect::Sql => Dataset::Relational(relational()?),
        Dialect::Cypher => Dataset::Graph(graph()?),
    })
}
