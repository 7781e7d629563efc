//! SELECT grammar
//!
//! ```text
//! SELECT items [FROM table] [WHERE ...] [GROUP BY col] [ORDER BY key [ASC|DESC]] [LIMIT n] [;]
//! ```
//!
//! WHERE text is captured verbatim up to the next clause keyword and then
//! re-read by a much smaller predicate grammar. Anything that grammar does
//! not recognize filters nothing.

use super::common::{
    alias, compare_op, ident, kw, limit, literal_value, number, statement_end, string_literal,
    syntax_error, word, Extra,
};
use crate::ast::{
    AggregateArg, AggregateCall, CompareOp, OrderBy, Predicate, SelectExpr, SelectItem,
    SelectList, SelectStatement, WhereClause,
};
use chumsky::prelude::*;
use quire_core::{EngineResult, Value};
use tracing::debug;

/// Parse one SELECT statement
pub fn parse_select(input: &str) -> EngineResult<SelectStatement> {
    let statement = select_parser()
        .parse(input)
        .into_result()
        .map_err(|errs| syntax_error(&errs, input))?;

    debug!(
        from = ?statement.from,
        aggregate = statement.is_aggregate(),
        "parsed select"
    );
    Ok(statement)
}

/// Recognize `column <op> number` or `column = 'text'` in WHERE text
pub fn parse_predicate(raw: &str) -> Option<Predicate> {
    predicate_parser().parse(raw.trim()).into_result().ok()
}

fn is_clause_keyword(word: &str) -> bool {
    ["GROUP", "ORDER", "LIMIT"]
        .iter()
        .any(|k| word.eq_ignore_ascii_case(k))
}

// ============================================================================
// Statement
// ============================================================================

fn select_parser<'src>() -> impl Parser<'src, &'src str, SelectStatement, Extra<'src>> {
    let with_from = kw("SELECT")
        .ignore_then(select_list())
        .then_ignore(kw("FROM"))
        .then(ident().padded())
        .then(where_clause().or_not())
        .then(group_by().or_not())
        .then(order_by().or_not())
        .then(limit().or_not())
        .map(
            |(((((items, from), filter), group_by), order_by), limit)| SelectStatement {
                items,
                from: Some(from),
                filter,
                group_by,
                order_by,
                limit,
            },
        );

    // `SELECT 1`: only literals may appear without a FROM
    let literal_only = kw("SELECT")
        .ignore_then(
            literal_value()
                .map(SelectExpr::Literal)
                .then(alias().or_not())
                .map(|(expr, alias)| SelectItem { expr, alias })
                .separated_by(just(',').padded())
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .map(|items| SelectStatement {
            items: SelectList::Items(items),
            from: None,
            filter: None,
            group_by: None,
            order_by: None,
            limit: None,
        });

    choice((with_from, literal_only)).then_ignore(statement_end())
}

fn select_list<'src>() -> impl Parser<'src, &'src str, SelectList, Extra<'src>> + Clone {
    let wildcard = just('*').padded().to(SelectList::Wildcard);

    let items = select_expr()
        .then(alias().or_not())
        .map(|(expr, alias)| SelectItem { expr, alias })
        .separated_by(just(',').padded())
        .at_least(1)
        .collect::<Vec<_>>()
        .map(SelectList::Items);

    choice((wildcard, items)).labelled("select list")
}

fn select_expr<'src>() -> impl Parser<'src, &'src str, SelectExpr, Extra<'src>> + Clone {
    let argument = choice((
        just('*').to(AggregateArg::Star),
        ident().map(AggregateArg::Column),
    ))
    .padded();

    let aggregate = ident()
        .then_ignore(just('(').padded())
        .then(argument)
        .then_ignore(just(')').padded())
        .map(|(function, argument)| {
            SelectExpr::Aggregate(AggregateCall {
                function: function.to_ascii_uppercase(),
                argument,
            })
        });

    choice((
        aggregate,
        literal_value().map(SelectExpr::Literal),
        ident().map(SelectExpr::Column),
    ))
    .padded()
}

// ============================================================================
// Clauses
// ============================================================================

fn where_clause<'src>() -> impl Parser<'src, &'src str, WhereClause, Extra<'src>> + Clone {
    let plain_word = word().try_map(|w: &str, span| {
        if is_clause_keyword(w) {
            Err(Rich::custom(span, "clause keyword ends WHERE"))
        } else {
            Ok(())
        }
    });

    let other = any()
        .filter(|c: &char| !(c.is_alphanumeric() || matches!(c, '_' | ';' | '\'' | '"')))
        .ignored();

    let raw = choice((string_literal().ignored(), plain_word, other))
        .repeated()
        .at_least(1)
        .to_slice();

    kw("WHERE").ignore_then(raw).map(|raw: &str| WhereClause {
        raw: raw.trim().to_string(),
        predicate: parse_predicate(raw),
    })
}

fn group_by<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    kw("GROUP").ignore_then(kw("BY")).ignore_then(ident().padded())
}

fn order_by<'src>() -> impl Parser<'src, &'src str, OrderBy, Extra<'src>> + Clone {
    let direction = choice((kw("ASC").to(false), kw("DESC").to(true)));

    kw("ORDER")
        .ignore_then(kw("BY"))
        .ignore_then(select_expr())
        .then(direction.or_not())
        .map(|(key, descending)| OrderBy {
            key,
            descending: descending.unwrap_or(false),
        })
}

fn predicate_parser<'src>() -> impl Parser<'src, &'src str, Predicate, Extra<'src>> {
    ident()
        .padded()
        .then(compare_op())
        .then(choice((number(), string_literal().map(Value::Text))).padded())
        .then_ignore(end())
        .try_map(|((column, op), value), span| {
            if matches!(value, Value::Text(_)) && op != CompareOp::Eq {
                Err(Rich::custom(span, "text literals only support '='"))
            } else {
                Ok(Predicate { column, op, value })
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::EngineError;
    use test_case::test_case;

    #[test]
    fn test_select_star() {
        let stmt = parse_select("SELECT * FROM books").unwrap();
        assert_eq!(stmt.items, SelectList::Wildcard);
        assert_eq!(stmt.from.as_deref(), Some("books"));
        assert!(stmt.filter.is_none());
    }

    #[test]
    fn test_full_statement() {
        let stmt = parse_select(
            "select author, COUNT(*) as n from books where rating >= 4 group by author order by n desc limit 3;",
        )
        .unwrap();

        let SelectList::Items(items) = &stmt.items else {
            panic!("expected items");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].output_name(), "n");
        assert_eq!(stmt.group_by.as_deref(), Some("author"));
        assert_eq!(
            stmt.order_by,
            Some(OrderBy {
                key: SelectExpr::Column("n".into()),
                descending: true
            })
        );
        assert_eq!(stmt.limit, Some(3));

        let filter = stmt.filter.unwrap();
        assert_eq!(filter.raw, "rating >= 4");
        assert_eq!(
            filter.predicate,
            Some(Predicate {
                column: "rating".into(),
                op: CompareOp::Ge,
                value: Value::Integer(4)
            })
        );
    }

    #[test]
    fn test_literal_select_without_from() {
        let stmt = parse_select("SELECT 1").unwrap();
        assert!(stmt.from.is_none());
        assert_eq!(
            stmt.items,
            SelectList::Items(vec![SelectItem {
                expr: SelectExpr::Literal(Value::Integer(1)),
                alias: None
            }])
        );
    }

    #[test]
    fn test_column_without_from_is_rejected() {
        assert!(parse_select("SELECT title").is_err());
    }

    #[test]
    fn test_where_keeps_string_literals_whole() {
        let stmt = parse_select("SELECT * FROM books WHERE title = 'Order of the Limit' LIMIT 1").unwrap();
        let filter = stmt.filter.unwrap();
        assert_eq!(filter.raw, "title = 'Order of the Limit'");
        assert_eq!(stmt.limit, Some(1));
    }

    #[test_case("rating > 4.5", Some(CompareOp::Gt) ; "numeric")]
    #[test_case("author = 'Le Guin'", Some(CompareOp::Eq) ; "text equality")]
    #[test_case("author > 'Le Guin'", None ; "text ordering")]
    #[test_case("rating > 4 AND id < 3", None ; "conjunction")]
    #[test_case("lower(title) = 'x'", None ; "function call")]
    fn test_predicate_recognition(raw: &str, op: Option<CompareOp>) {
        assert_eq!(parse_predicate(raw).map(|p| p.op), op);
    }

    #[test]
    fn test_syntax_error_names_token() {
        let err = parse_select("SELECT * FORM books").unwrap_err();
        let EngineError::SyntaxError { token, .. } = err else {
            panic!("expected syntax error, got {:?}", err);
        };
        assert_eq!(token, "FORM");
    }

    #[test]
    fn test_truncated_statement() {
        let err = parse_select("SELECT * FROM").unwrap_err();
        assert!(matches!(err, EngineError::SyntaxError { ref token, .. } if token == "<end of input>"));
    }
}
