//! Statement grammars.
//!
//! Both grammars are chumsky parsers over `&str` sharing the primitives in
//! [`common`]. Parse failures become `SyntaxError` carrying the first token
//! the grammar could not consume.

pub mod common;
mod cypher;
mod sql;

pub use cypher::parse_graph;
pub use sql::{parse_predicate, parse_select};
