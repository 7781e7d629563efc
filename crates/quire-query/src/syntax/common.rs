//! Shared parser primitives for the SQL and Cypher grammars.

use crate::ast::CompareOp;
use chumsky::extra;
use chumsky::prelude::*;
use quire_core::{EngineError, Value};

/// Extra type for parsers - uses Rich errors for better messages
pub type Extra<'src> = extra::Err<Rich<'src, char>>;

// ============================================================================
// Primitive parsers
// ============================================================================

/// Identifier: a letter or underscore, then alphanumerics and underscores
pub fn ident<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_alphabetic() || *c == '_')
        .then(
            any()
                .filter(|c: &char| c.is_alphanumeric() || *c == '_')
                .repeated(),
        )
        .to_slice()
        .map(|s: &str| s.to_string())
        .labelled("identifier")
}

/// Any run of word characters, keywords included
pub fn word<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1)
        .to_slice()
}

/// Case-insensitive keyword parser.
///
/// Consumes a whole word so `ORDER` does not match the front of `order_id`.
pub fn kw<'src>(keyword: &'static str) -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    word()
        .try_map(move |s: &str, span| {
            if s.eq_ignore_ascii_case(keyword) {
                Ok(())
            } else {
                Err(Rich::custom(span, format!("expected keyword '{}'", keyword)))
            }
        })
        .padded()
        .labelled(keyword)
}

/// Text between a pair of `quote` characters.
///
/// Inside the literal the quote is escaped either by doubling it or by a
/// preceding backslash. Other backslashes are kept as written.
fn quoted<'src>(quote: char) -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    let escaped_quote = choice((just(quote), just('\\'))).ignore_then(just(quote));
    let plain = any().filter(move |c: &char| *c != quote);

    escaped_quote
        .or(plain)
        .repeated()
        .collect::<String>()
        .delimited_by(just(quote), just(quote))
}

/// `'text'` or `"text"`
pub fn string_literal<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    quoted('\'').or(quoted('"')).labelled("string literal")
}

/// Signed integer or decimal literal
pub fn number<'src>() -> impl Parser<'src, &'src str, Value, Extra<'src>> + Clone {
    let digits = any().filter(|c: &char| c.is_ascii_digit()).repeated().at_least(1);

    just('-')
        .or_not()
        .then(digits.clone())
        .then(just('.').then(digits).or_not())
        .to_slice()
        .try_map(|s: &str, span| {
            if s.contains('.') {
                s.parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| Rich::custom(span, "invalid decimal"))
            } else {
                s.parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| Rich::custom(span, "integer overflow"))
            }
        })
        .labelled("number")
}

/// Literal value: string, number, boolean or null
pub fn literal_value<'src>() -> impl Parser<'src, &'src str, Value, Extra<'src>> + Clone {
    choice((
        string_literal().map(Value::Text),
        number(),
        kw("true").to(Value::Boolean(true)),
        kw("false").to(Value::Boolean(false)),
        kw("null").to(Value::Null),
    ))
    .padded()
    .labelled("literal")
}

/// `>=`, `<=`, `>`, `<`, `=`
pub fn compare_op<'src>() -> impl Parser<'src, &'src str, CompareOp, Extra<'src>> + Clone {
    choice((
        just(">=").to(CompareOp::Ge),
        just("<=").to(CompareOp::Le),
        just(">").to(CompareOp::Gt),
        just("<").to(CompareOp::Lt),
        just("=").to(CompareOp::Eq),
    ))
    .padded()
    .labelled("comparison operator")
}

/// `AS alias`
pub fn alias<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    kw("AS").ignore_then(ident().padded())
}

/// `LIMIT n`, where `n` is a whole number no smaller than zero
pub fn limit<'src>() -> impl Parser<'src, &'src str, usize, Extra<'src>> + Clone {
    let count = number().try_map(|value, span| match value {
        Value::Integer(n) => {
            usize::try_from(n).map_err(|_| Rich::custom(span, "LIMIT cannot be negative"))
        }
        _ => Err(Rich::custom(span, "LIMIT takes a whole number")),
    });
    kw("LIMIT").ignore_then(count.padded().labelled("row count"))
}

/// Optional trailing semicolon, then end of input
pub fn statement_end<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    just(';').padded().or_not().ignore_then(end())
}

// ============================================================================
// Text helpers
// ============================================================================

/// First word of the statement, upper-cased
pub fn leading_keyword(text: &str) -> String {
    text.trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_ascii_uppercase()
}

/// The token starting at `offset`, or `<end of input>`
pub fn token_at(input: &str, offset: usize) -> String {
    let rest = input.get(offset..).unwrap_or("").trim_start();
    let Some(first) = rest.chars().next() else {
        return "<end of input>".to_string();
    };

    if first.is_alphanumeric() || first == '_' {
        rest.chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect()
    } else {
        first.to_string()
    }
}

// ============================================================================
// Error formatting
// ============================================================================

/// Format chumsky errors for human consumption
pub fn format_errors(errs: &[Rich<'_, char>], input: &str) -> String {
    errs.iter()
        .map(|e| {
            let start = e.span().start.min(input.len());
            let before = input.get(..start).unwrap_or("");
            let line = before.lines().count().max(1);
            let col = start - before.rfind('\n').map_or(0, |i| i + 1);

            format!("line {}, column {}: {}", line, col + 1, e.reason())
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convert a failed parse into a `SyntaxError` naming the offending token
pub fn syntax_error(errs: &[Rich<'_, char>], input: &str) -> EngineError {
    match errs.first() {
        Some(first) => EngineError::syntax(
            token_at(input, first.span().start),
            format_errors(errs, input),
        ),
        None => EngineError::syntax("<end of input>", "statement could not be parsed"),
    }
}
