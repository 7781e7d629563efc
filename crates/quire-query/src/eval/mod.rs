//! In-memory evaluators used by the built-in backend.

mod graph;
mod relational;

pub use graph::GraphEvaluator;
pub use relational::RelationalEvaluator;

use quire_core::{RawRows, Row};

/// Rows produced by the relational evaluator, in output column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TableOutput {
    pub fn into_raw(self) -> RawRows {
        RawRows::from_rows(self.columns, self.rows)
    }
}
