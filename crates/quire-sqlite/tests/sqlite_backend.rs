//! Backend-level behaviour against a real database file

use quire_core::{Backend, Dialect, ErrorKind, Value};
use quire_sqlite::{SqliteBackend, SqliteConfig};
use rusqlite::Connection;
use tempfile::TempDir;

fn create_library(dir: &TempDir) -> SqliteConfig {
    let path = dir.path().join("library.db");
    let conn = Connection::open(&path).expect("create database");
    conn.execute_batch(
        "CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT, author TEXT, rating REAL);
         INSERT INTO books VALUES (1, 'Dune', 'Herbert', 4.5);
         INSERT INTO books VALUES (2, 'Emma', 'Austen', 3.9);
         INSERT INTO books VALUES (3, 'Solaris', 'Lem', 4.0);",
    )
    .expect("seed database");
    SqliteConfig::new(path)
}

#[tokio::test]
async fn test_canary_and_select() {
    let dir = TempDir::new().unwrap();
    let backend = SqliteBackend::open(create_library(&dir)).unwrap();

    assert_eq!(backend.dialect(), Dialect::Sql);
    let canary = backend.execute(Dialect::Sql.canary()).await.unwrap();
    assert_eq!(canary.first_scalar(), Some(&Value::Integer(1)));

    let rows = backend
        .execute("SELECT title FROM books WHERE rating >= 4 ORDER BY rating DESC")
        .await
        .unwrap();
    assert_eq!(rows.columns, vec!["title"]);
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_driver_errors_are_backend_errors() {
    let dir = TempDir::new().unwrap();
    let backend = SqliteBackend::open(create_library(&dir)).unwrap();

    let err = backend
        .execute("SELECT * FROM nonexistent_table")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(err.to_string().contains("nonexistent_table"));
}

#[tokio::test]
async fn test_teardown_makes_backend_unavailable() {
    let dir = TempDir::new().unwrap();
    let backend = SqliteBackend::open(create_library(&dir)).unwrap();

    backend.teardown();
    backend.teardown();

    let err = backend.execute("SELECT 1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
}
