//! Advisory READ / WRITE / SCHEMA tagging for graph results.
//!
//! The tag is attached to graph payloads for display only; nothing
//! dispatches on it.

use crate::gate::mask_literals;
use crate::syntax::common::leading_keyword;
use once_cell::sync::Lazy;
use quire_core::{Dialect, QueryType};
use regex::Regex;

static WRITE_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(CREATE|MERGE|DELETE|SET|REMOVE)\b").unwrap());

static SCHEMA_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(INDEX|CONSTRAINT|DROP)\b").unwrap());

/// Classify a Cypher statement
pub fn classify_query(text: &str) -> QueryType {
    let masked = mask_literals(Dialect::Cypher, text);

    if WRITE_KEYWORDS.is_match(&masked) {
        QueryType::Write
    } else if SCHEMA_KEYWORDS.is_match(&masked) || leading_keyword(text) == "SHOW" {
        QueryType::Schema
    } else {
        QueryType::Read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("MATCH (n) RETURN n", QueryType::Read ; "read")]
    #[test_case("MATCH (n) SET n.x = 1", QueryType::Write ; "write")]
    #[test_case("SHOW LABELS", QueryType::Schema ; "show")]
    #[test_case("DROP INDEX person_name", QueryType::Schema ; "drop index")]
    #[test_case("MATCH (n {title: 'Create'}) RETURN n", QueryType::Read ; "keyword in literal")]
    fn test_classify(text: &str, expected: QueryType) {
        assert_eq!(classify_query(text), expected);
    }
}
