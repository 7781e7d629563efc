//! Statement gatekeeping, parsing and evaluation for quire.
//!
//! The pipeline for one statement is:
//!
//! 1. [`gate::check`] accepts or rejects the raw text (read-only, no
//!    stacked statements, no comments, no admin calls)
//! 2. [`syntax`] parses it once into a typed AST ([`ast::SelectStatement`]
//!    or [`ast::GraphStatement`])
//! 3. [`eval`] runs the AST against an in-memory dataset
//!
//! Native backends (SQLite, Bolt) skip step 3 and hand the gated text to
//! their driver instead.

pub mod ast;
pub mod classify;
pub mod eval;
pub mod gate;
pub mod syntax;

pub use classify::classify_query;
pub use eval::{GraphEvaluator, RelationalEvaluator, TableOutput};
pub use gate::{check, GateRule};
pub use syntax::{parse_graph, parse_select};
