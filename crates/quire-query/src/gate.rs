//! Statement gatekeeper
//!
//! Every statement passes [`check`] before it reaches a backend. The rules
//! run in a fixed order and the first failure is reported by name, so a
//! caller can tell a stacked write from a plain write keyword.
//!
//! Rules after the leading-keyword check look at the statement with string
//! literal contents blanked out, so `WHERE title = 'Create a plan'` is not
//! mistaken for a CREATE clause.

use crate::syntax::common::leading_keyword;
use once_cell::sync::Lazy;
use quire_core::{Dialect, EngineError, EngineResult};
use regex::Regex;
use std::fmt;
use tracing::debug;

/// Named gatekeeper rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRule {
    Empty,
    LeadingKeyword,
    Comment,
    StackedStatement,
    AdminCall,
    WriteKeyword,
}

impl GateRule {
    pub fn name(&self) -> &'static str {
        match self {
            GateRule::Empty => "empty",
            GateRule::LeadingKeyword => "leading-keyword",
            GateRule::Comment => "comment",
            GateRule::StackedStatement => "stacked-statement",
            GateRule::AdminCall => "admin-call",
            GateRule::WriteKeyword => "write-keyword",
        }
    }
}

impl fmt::Display for GateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const CYPHER_LEADING: &[&str] = &["MATCH", "RETURN", "WITH", "UNWIND", "CALL", "SHOW"];

static STACKED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i);\s*(INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|TRUNCATE|REPLACE|MERGE|ATTACH|DETACH|PRAGMA|VACUUM|GRANT|REVOKE|SET|REMOVE)\b",
    )
    .unwrap()
});

/// Admin procedures match only in call position
static ADMIN_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bCALL\s+(dbms|apoc)\.|\b(EXEC|EXECUTE|CALL)\s+(xp|sp)_\w+").unwrap()
});

static CYPHER_WRITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(CREATE|MERGE|DELETE|SET|REMOVE|DETACH)\b").unwrap());

static SQL_WRITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|TRUNCATE|ATTACH|DETACH|VACUUM)\b",
    )
    .unwrap()
});

/// Accept or reject a statement before execution
pub fn check(dialect: Dialect, text: &str) -> EngineResult<()> {
    let result = evaluate(dialect, text);
    if let Err((rule, reason)) = &result {
        debug!(dialect = %dialect, rule = %rule, reason = %reason, "statement rejected");
    }
    result.map_err(|(rule, reason)| EngineError::invalid_query(rule.name(), reason))
}

fn evaluate(dialect: Dialect, text: &str) -> Result<(), (GateRule, String)> {
    let text = text.trim();
    if text.is_empty() {
        return Err((GateRule::Empty, "statement is empty".to_string()));
    }

    let leading = leading_keyword(text);
    let allowed = match dialect {
        Dialect::Sql => leading == "SELECT",
        Dialect::Cypher => CYPHER_LEADING.contains(&leading.as_str()),
    };
    if !allowed {
        let expected = match dialect {
            Dialect::Sql => "SELECT".to_string(),
            Dialect::Cypher => CYPHER_LEADING.join(", "),
        };
        return Err((
            GateRule::LeadingKeyword,
            format!(
                "{} statements must begin with {} (found '{}')",
                dialect,
                expected,
                first_token(text)
            ),
        ));
    }

    let masked = mask_literals(dialect, text);

    for marker in ["--", "/*", "*/"] {
        if masked.contains(marker) {
            return Err((
                GateRule::Comment,
                format!("comment marker '{}' is not allowed", marker),
            ));
        }
    }

    if let Some(caps) = STACKED.captures(&masked) {
        return Err((
            GateRule::StackedStatement,
            format!(
                "statement separator followed by '{}'",
                caps[1].to_ascii_uppercase()
            ),
        ));
    }

    if let Some(found) = ADMIN_CALL.find(&masked) {
        return Err((
            GateRule::AdminCall,
            format!("administrative call '{}' is not allowed", found.as_str()),
        ));
    }

    let writes = match dialect {
        Dialect::Sql => &*SQL_WRITE,
        Dialect::Cypher => &*CYPHER_WRITE,
    };
    if let Some(found) = writes.find(&masked) {
        return Err((
            GateRule::WriteKeyword,
            format!(
                "write keyword '{}' is not allowed",
                found.as_str().to_ascii_uppercase()
            ),
        ));
    }

    Ok(())
}

fn first_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

/// Blank out the contents of quoted literals and quoted identifiers.
///
/// Quote characters stay in place. SQL escapes a quote by doubling it,
/// which this handles as close-then-reopen; Cypher also allows backslash
/// escapes. An unterminated literal is blanked to the end of the text.
pub(crate) fn mask_literals(dialect: Dialect, text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        match quote {
            None => {
                if matches!(c, '\'' | '"' | '`') {
                    quote = Some(c);
                }
                masked.push(c);
            }
            Some(open) => {
                if escaped {
                    escaped = false;
                    masked.push(' ');
                } else if c == '\\' && dialect == Dialect::Cypher && open != '`' {
                    escaped = true;
                    masked.push(' ');
                } else if c == open {
                    quote = None;
                    masked.push(c);
                } else if c.is_whitespace() {
                    masked.push(c);
                } else {
                    masked.push(' ');
                }
            }
        }
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn rule_of(dialect: Dialect, text: &str) -> Option<String> {
        match check(dialect, text) {
            Ok(()) => None,
            Err(EngineError::InvalidQuery { rule, .. }) => Some(rule),
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    #[test_case(Dialect::Sql, "SELECT * FROM books WHERE rating > 4" ; "sql select")]
    #[test_case(Dialect::Sql, "select title from books where title = 'Create a plan'" ; "keyword in literal")]
    #[test_case(Dialect::Sql, "SELECT * FROM books WHERE title = 'it''s -- fine'" ; "doubled quote")]
    #[test_case(Dialect::Cypher, "MATCH (n:Person) RETURN n" ; "cypher match")]
    #[test_case(Dialect::Cypher, "MATCH (n {note: 'don\\'t SET'}) RETURN n" ; "backslash escape")]
    #[test_case(Dialect::Cypher, "SHOW LABELS" ; "show")]
    #[test_case(Dialect::Cypher, "RETURN 1" ; "canary")]
    #[test_case(Dialect::Sql, "SELECT title AS sp_title FROM books" ; "sp prefixed alias")]
    #[test_case(Dialect::Sql, "SELECT xp_total FROM stats" ; "xp prefixed column")]
    #[test_case(Dialect::Sql, "SELECT title AS pragma FROM books" ; "pragma alias")]
    #[test_case(Dialect::Sql, "SELECT * FROM settings WHERE pragma = 1" ; "pragma column")]
    fn test_accepted(dialect: Dialect, text: &str) {
        assert_eq!(rule_of(dialect, text), None);
    }

    #[test_case(Dialect::Sql, "   ", "empty" ; "blank")]
    #[test_case(Dialect::Sql, "DELETE FROM books", "leading-keyword" ; "sql delete")]
    #[test_case(Dialect::Cypher, "CREATE (n:Person)", "leading-keyword" ; "cypher create")]
    #[test_case(Dialect::Sql, "SELECT * FROM books -- trailing", "comment" ; "line comment")]
    #[test_case(Dialect::Sql, "SELECT /* x */ 1", "comment" ; "block comment")]
    #[test_case(Dialect::Sql, "SELECT 1; DROP TABLE books", "stacked-statement" ; "stacked drop")]
    #[test_case(Dialect::Cypher, "MATCH (n) RETURN n; CREATE (m)", "stacked-statement" ; "stacked create")]
    #[test_case(Dialect::Cypher, "CALL dbms.listConfig()", "admin-call" ; "dbms")]
    #[test_case(Dialect::Cypher, "CALL apoc.periodic.iterate('x')", "admin-call" ; "apoc")]
    #[test_case(Dialect::Sql, "SELECT 1 EXEC xp_cmdshell 'dir'", "admin-call" ; "exec xp")]
    #[test_case(Dialect::Sql, "SELECT 1 EXECUTE sp_configure", "admin-call" ; "execute sp")]
    #[test_case(Dialect::Cypher, "CALL sp_helpdb()", "admin-call" ; "call sp")]
    #[test_case(Dialect::Cypher, "MATCH (n:Person) SET n.age = 1 RETURN n", "write-keyword" ; "set")]
    #[test_case(Dialect::Cypher, "MATCH (n) DETACH DELETE n", "write-keyword" ; "detach delete")]
    #[test_case(Dialect::Sql, "PRAGMA writable_schema = 1", "leading-keyword" ; "leading pragma")]
    #[test_case(Dialect::Sql, "SELECT 1; PRAGMA query_only = 0", "stacked-statement" ; "stacked pragma")]
    fn test_rejected(dialect: Dialect, text: &str, rule: &str) {
        assert_eq!(rule_of(dialect, text).as_deref(), Some(rule));
    }

    #[test]
    fn test_unterminated_literal_masks_to_end() {
        let masked = mask_literals(Dialect::Sql, "SELECT 'abc DROP");
        assert_eq!(masked, "SELECT '        ");
        assert_eq!(rule_of(Dialect::Sql, "SELECT 'abc DROP"), None);
    }

    #[test]
    fn test_reason_names_keyword() {
        let err = check(Dialect::Cypher, "MATCH (n) MERGE (m) RETURN n").unwrap_err();
        assert!(err.to_string().contains("MERGE"));
        assert!(err.to_string().contains("write-keyword"));
    }
}
