//! Cypher subset grammar
//!
//! Parses `MATCH pattern [WHERE conds] RETURN items [LIMIT n]`, literal
//! `RETURN`, and `SHOW ...` into loose intermediate parts, then narrows
//! them to one of the [`GraphStatement`] shapes. Statements that parse but
//! fall outside those shapes are `UnsupportedPattern`, not syntax errors.

use super::common::{
    alias, compare_op, ident, kw, limit, literal_value, statement_end, syntax_error, word, Extra,
};
use crate::ast::{
    literal_text, CompareOp, CountQuery, GraphStatement, HopPattern, MatchPattern, NodeBinding,
    NodeScan, PropertyFilter, ReturnItem, Traversal,
};
use chumsky::prelude::*;
use quire_core::{EngineError, EngineResult, Value};
use tracing::debug;

/// Clauses outside the supported subset; hitting one mid-parse is reported
/// as an unsupported pattern
const UNSUPPORTED_CLAUSES: &[&str] = &[
    "WITH", "UNWIND", "CALL", "OPTIONAL", "UNION", "ORDER", "SKIP", "FOREACH", "DISTINCT",
];

/// Parse one Cypher statement into a supported shape
pub fn parse_graph(input: &str) -> EngineResult<GraphStatement> {
    let parsed = match cypher_parser().parse(input).into_result() {
        Ok(parsed) => parsed,
        Err(errs) => {
            let err = syntax_error(&errs, input);
            if let EngineError::SyntaxError { token, .. } = &err {
                let upper = token.to_ascii_uppercase();
                if UNSUPPORTED_CLAUSES.contains(&upper.as_str()) {
                    return Err(EngineError::UnsupportedPattern(format!(
                        "{} is not supported",
                        upper
                    )));
                }
            }
            return Err(err);
        }
    };

    let statement = build_statement(parsed)?;
    debug!(shape = shape_name(&statement), "parsed cypher");
    Ok(statement)
}

fn shape_name(statement: &GraphStatement) -> &'static str {
    match statement {
        GraphStatement::Literal(_) => "literal",
        GraphStatement::ShowLabels => "show_labels",
        GraphStatement::ShowRelationshipTypes => "show_relationship_types",
        GraphStatement::NodeScan(_) => "node_scan",
        GraphStatement::Traversal(_) => "traversal",
        GraphStatement::Count(_) => "count",
    }
}

// ============================================================================
// Intermediate types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Out,
    In,
    Both,
    Undirected,
}

#[derive(Debug, Clone)]
struct NodePart {
    alias: Option<String>,
    label: Option<String>,
    properties: Vec<(String, Value)>,
}

#[derive(Debug, Clone)]
struct EdgePart {
    alias: Option<String>,
    edge_type: Option<String>,
    direction: Direction,
    variable_length: bool,
}

#[derive(Debug, Clone)]
enum PatternPart {
    Node(NodePart),
    Edge(EdgePart),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ConditionOp {
    Compare(CompareOp),
    NotEqual,
    Contains,
    StartsWith,
    EndsWith,
}

impl ConditionOp {
    fn describe(&self) -> &'static str {
        match self {
            ConditionOp::Compare(op) => op.symbol(),
            ConditionOp::NotEqual => "<>",
            ConditionOp::Contains => "CONTAINS",
            ConditionOp::StartsWith => "STARTS WITH",
            ConditionOp::EndsWith => "ENDS WITH",
        }
    }
}

#[derive(Debug, Clone)]
struct Condition {
    var: String,
    property: String,
    op: ConditionOp,
    value: Value,
}

#[derive(Debug, Clone)]
enum CallArg {
    Star,
    Var(String),
    Property(String, String),
}

#[derive(Debug, Clone)]
enum ReturnExpr {
    Var(String),
    Property(String, String),
    Call { function: String, argument: CallArg },
}

impl ReturnExpr {
    fn column_name(&self) -> String {
        match self {
            ReturnExpr::Var(v) => v.clone(),
            ReturnExpr::Property(v, p) => format!("{}.{}", v, p),
            ReturnExpr::Call { function, argument } => {
                let arg = match argument {
                    CallArg::Star => "*".to_string(),
                    CallArg::Var(v) => v.clone(),
                    CallArg::Property(v, p) => format!("{}.{}", v, p),
                };
                format!("{}({})", function, arg)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct ParsedReturn {
    expr: ReturnExpr,
    alias: Option<String>,
}

#[derive(Debug, Clone)]
enum ParsedCypher {
    Show(Vec<String>),
    Return(Vec<(Value, Option<String>)>),
    Match {
        pattern: Vec<PatternPart>,
        conditions: Vec<Condition>,
        returns: Vec<ParsedReturn>,
        limit: Option<usize>,
    },
}

// ============================================================================
// Parsers
// ============================================================================

fn cypher_parser<'src>() -> impl Parser<'src, &'src str, ParsedCypher, Extra<'src>> {
    let show = kw("SHOW")
        .ignore_then(
            word()
                .map(|w: &str| w.to_ascii_uppercase())
                .padded()
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .map(ParsedCypher::Show);

    let literal_return = kw("RETURN")
        .ignore_then(
            literal_value()
                .then(alias().or_not())
                .separated_by(just(',').padded())
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .map(ParsedCypher::Return);

    let matched = kw("MATCH")
        .ignore_then(graph_pattern())
        .then(where_clause().or_not())
        .then_ignore(kw("RETURN"))
        .then(return_items())
        .then(limit().or_not())
        .map(
            |(((pattern, conditions), returns), limit)| ParsedCypher::Match {
                pattern,
                conditions: conditions.unwrap_or_default(),
                returns,
                limit,
            },
        );

    choice((show, literal_return, matched)).then_ignore(statement_end())
}

/// Parser for a single property: key: value
fn property<'src>() -> impl Parser<'src, &'src str, (String, Value), Extra<'src>> + Clone {
    ident()
        .padded()
        .then_ignore(just(':').padded())
        .then(literal_value())
        .labelled("property like name: 'Alice'")
}

/// Parser for properties block: {key: value, key2: value2}
fn properties_block<'src>() -> impl Parser<'src, &'src str, Vec<(String, Value)>, Extra<'src>> + Clone
{
    just('{')
        .padded()
        .ignore_then(
            property()
                .separated_by(just(',').padded())
                .allow_trailing()
                .collect::<Vec<_>>(),
        )
        .then_ignore(just('}').padded())
        .or_not()
        .map(|opt| opt.unwrap_or_default())
}

/// Parser for node pattern: (alias:Label {prop: value})
fn node_parser<'src>() -> impl Parser<'src, &'src str, NodePart, Extra<'src>> + Clone {
    let label = just(':')
        .padded()
        .ignore_then(ident())
        .or_not()
        .labelled("node label like :Person");

    just('(')
        .padded()
        .ignore_then(ident().or_not())
        .then(label)
        .then(properties_block())
        .then_ignore(just(')').padded())
        .map(|((alias, label), properties)| NodePart {
            alias,
            label,
            properties,
        })
        .labelled("node pattern like (p:Person {name: 'Alice'})")
}

/// Parser for edge inner content: [alias:TYPE] with an optional `*` length
fn edge_inner<'src>(
) -> impl Parser<'src, &'src str, (Option<String>, Option<String>, bool), Extra<'src>> + Clone {
    let edge_type = just(':')
        .padded()
        .ignore_then(ident())
        .or_not()
        .labelled("relationship type like :KNOWS");

    let variable_length = just('*')
        .then(
            any()
                .filter(|c: &char| c.is_ascii_digit() || *c == '.')
                .repeated(),
        )
        .padded()
        .or_not()
        .map(|q| q.is_some());

    just('[')
        .padded()
        .ignore_then(ident().or_not())
        .then(edge_type)
        .then(variable_length)
        .then_ignore(just(']').padded())
        .map(|((alias, edge_type), variable_length)| (alias, edge_type, variable_length))
}

/// Parser for edge pattern: -[..]-> or <-[..]- or -[..]- or <-[..]->
fn edge_parser<'src>() -> impl Parser<'src, &'src str, EdgePart, Extra<'src>> + Clone {
    let edge = |open: &'static str, close: &'static str, direction: Direction| {
        just(open)
            .padded()
            .ignore_then(edge_inner())
            .then_ignore(just(close).padded())
            .map(move |(alias, edge_type, variable_length)| EdgePart {
                alias,
                edge_type,
                direction,
                variable_length,
            })
    };

    // Longer forms first
    choice((
        edge("<-", "->", Direction::Both),
        edge("<-", "-", Direction::In),
        edge("-", "->", Direction::Out),
        edge("-", "-", Direction::Undirected),
    ))
}

/// Parser for graph pattern: (node)-[edge]->(node)...
fn graph_pattern<'src>() -> impl Parser<'src, &'src str, Vec<PatternPart>, Extra<'src>> + Clone {
    node_parser()
        .then(edge_parser().then(node_parser()).repeated().collect::<Vec<_>>())
        .map(|(first, rest)| {
            let mut parts = vec![PatternPart::Node(first)];
            for (edge, node) in rest {
                parts.push(PatternPart::Edge(edge));
                parts.push(PatternPart::Node(node));
            }
            parts
        })
}

fn condition_op<'src>() -> impl Parser<'src, &'src str, ConditionOp, Extra<'src>> + Clone {
    choice((
        just("<>").padded().to(ConditionOp::NotEqual),
        just("!=").padded().to(ConditionOp::NotEqual),
        compare_op().map(ConditionOp::Compare),
        kw("CONTAINS").to(ConditionOp::Contains),
        kw("STARTS").ignore_then(kw("WITH")).to(ConditionOp::StartsWith),
        kw("ENDS").ignore_then(kw("WITH")).to(ConditionOp::EndsWith),
    ))
}

/// WHERE var.prop op value [AND|OR ...]
fn where_clause<'src>() -> impl Parser<'src, &'src str, Vec<Condition>, Extra<'src>> + Clone {
    let condition = ident()
        .then_ignore(just('.'))
        .then(ident())
        .padded()
        .then(condition_op())
        .then(literal_value())
        .map(|(((var, property), op), value)| Condition {
            var,
            property,
            op,
            value,
        });

    kw("WHERE").ignore_then(
        condition
            .separated_by(choice((kw("AND"), kw("OR"), kw("XOR"))))
            .at_least(1)
            .collect::<Vec<_>>(),
    )
}

fn return_items<'src>() -> impl Parser<'src, &'src str, Vec<ParsedReturn>, Extra<'src>> + Clone {
    let field = ident().then(just('.').ignore_then(ident()).or_not());

    let call_arg = choice((
        just('*').to(CallArg::Star),
        field.clone().map(|(v, p)| match p {
            Some(p) => CallArg::Property(v, p),
            None => CallArg::Var(v),
        }),
    ))
    .padded();

    let call = ident()
        .then_ignore(just('(').padded())
        .then(call_arg)
        .then_ignore(just(')').padded())
        .map(|(function, argument)| ReturnExpr::Call { function, argument });

    let expr = choice((
        call,
        field.map(|(v, p)| match p {
            Some(p) => ReturnExpr::Property(v, p),
            None => ReturnExpr::Var(v),
        }),
    ))
    .padded();

    expr.then(alias().or_not())
        .map(|(expr, alias)| ParsedReturn { expr, alias })
        .separated_by(just(',').padded())
        .at_least(1)
        .collect::<Vec<_>>()
}

// ============================================================================
// Shape classification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarKind {
    Node,
    Relationship,
}

/// Variables bound by the MATCH pattern
#[derive(Debug, Default)]
struct Scope {
    vars: Vec<(String, VarKind)>,
}

impl Scope {
    fn of(pattern: &MatchPattern) -> Self {
        let mut scope = Scope::default();
        match pattern {
            MatchPattern::Node(node) => scope.bind_node(node),
            MatchPattern::Hop(hop) => {
                scope.bind_node(&hop.start);
                scope.bind_node(&hop.end);
                if let Some(var) = &hop.rel_var {
                    scope.vars.push((var.clone(), VarKind::Relationship));
                }
            }
        }
        scope
    }

    fn bind_node(&mut self, node: &NodeBinding) {
        if let Some(var) = &node.var {
            if self.kind(var).is_none() {
                self.vars.push((var.clone(), VarKind::Node));
            }
        }
    }

    fn kind(&self, var: &str) -> Option<VarKind> {
        self.vars.iter().find(|(v, _)| v == var).map(|(_, k)| *k)
    }

    fn require(&self, var: &str) -> EngineResult<VarKind> {
        self.kind(var).ok_or_else(|| {
            EngineError::UnsupportedPattern(format!("variable '{}' is not bound by MATCH", var))
        })
    }
}

fn build_statement(parsed: ParsedCypher) -> EngineResult<GraphStatement> {
    match parsed {
        ParsedCypher::Show(words) => match words.join(" ").as_str() {
            "LABELS" => Ok(GraphStatement::ShowLabels),
            "RELATIONSHIP TYPES" => Ok(GraphStatement::ShowRelationshipTypes),
            other => Err(EngineError::UnsupportedPattern(format!(
                "SHOW {} is not supported",
                other
            ))),
        },
        ParsedCypher::Return(items) => Ok(GraphStatement::Literal(
            items
                .into_iter()
                .map(|(value, alias)| (alias.unwrap_or_else(|| literal_text(&value)), value))
                .collect(),
        )),
        ParsedCypher::Match {
            pattern,
            conditions,
            returns,
            limit,
        } => build_match(pattern, conditions, returns, limit),
    }
}

fn build_match(
    parts: Vec<PatternPart>,
    conditions: Vec<Condition>,
    returns: Vec<ParsedReturn>,
    limit: Option<usize>,
) -> EngineResult<GraphStatement> {
    let pattern = build_pattern(parts)?;
    let scope = Scope::of(&pattern);
    let filter = build_filter(conditions, &scope)?;

    if let Some(column) = count_column(&returns, &scope)? {
        return Ok(GraphStatement::Count(CountQuery {
            pattern,
            filter,
            column,
        }));
    }

    let returns = returns
        .into_iter()
        .map(|r| build_return(r, &scope))
        .collect::<EngineResult<Vec<_>>>()?;

    Ok(match pattern {
        MatchPattern::Node(node) => GraphStatement::NodeScan(NodeScan {
            node,
            filter,
            returns,
            limit,
        }),
        MatchPattern::Hop(hop) => GraphStatement::Traversal(Traversal {
            hop,
            filter,
            returns,
            limit,
        }),
    })
}

fn binding(node: NodePart) -> NodeBinding {
    NodeBinding {
        var: node.alias,
        label: node.label,
        properties: node.properties,
    }
}

fn build_pattern(parts: Vec<PatternPart>) -> EngineResult<MatchPattern> {
    let mut parts = parts.into_iter();
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(PatternPart::Node(node)), None, None, None) => Ok(MatchPattern::Node(binding(node))),
        (
            Some(PatternPart::Node(left)),
            Some(PatternPart::Edge(edge)),
            Some(PatternPart::Node(right)),
            None,
        ) => build_hop(left, edge, right).map(MatchPattern::Hop),
        _ => Err(EngineError::UnsupportedPattern(
            "only single-hop patterns are supported".to_string(),
        )),
    }
}

fn build_hop(left: NodePart, edge: EdgePart, right: NodePart) -> EngineResult<HopPattern> {
    if edge.variable_length {
        return Err(EngineError::UnsupportedPattern(
            "variable-length relationships are not supported".to_string(),
        ));
    }
    let Some(rel_type) = edge.edge_type else {
        return Err(EngineError::UnsupportedPattern(
            "relationship type is required".to_string(),
        ));
    };
    if let Some(rel_var) = &edge.alias {
        if left.alias.as_ref() == Some(rel_var) || right.alias.as_ref() == Some(rel_var) {
            return Err(EngineError::UnsupportedPattern(format!(
                "variable '{}' is bound to both a node and a relationship",
                rel_var
            )));
        }
    }

    let (start, end) = match edge.direction {
        Direction::Out => (left, right),
        Direction::In => (right, left),
        Direction::Both | Direction::Undirected => {
            return Err(EngineError::UnsupportedPattern(
                "relationship direction is required".to_string(),
            ))
        }
    };

    Ok(HopPattern {
        start: binding(start),
        rel_var: edge.alias,
        rel_type,
        end: binding(end),
    })
}

fn build_filter(conditions: Vec<Condition>, scope: &Scope) -> EngineResult<Option<PropertyFilter>> {
    let mut conditions = conditions.into_iter();
    let Some(condition) = conditions.next() else {
        return Ok(None);
    };
    if conditions.next().is_some() {
        return Err(EngineError::UnsupportedPattern(
            "only a single WHERE condition is supported".to_string(),
        ));
    }

    let ConditionOp::Compare(op) = condition.op else {
        return Err(EngineError::UnsupportedPattern(format!(
            "WHERE operator {} is not supported",
            condition.op.describe()
        )));
    };
    let value = match condition.value {
        Value::Integer(i) => i as f64,
        Value::Float(f) => f,
        other => {
            return Err(EngineError::UnsupportedPattern(format!(
                "WHERE compares against numbers only, got {}",
                other.type_name()
            )))
        }
    };
    if scope.require(&condition.var)? != VarKind::Node {
        return Err(EngineError::UnsupportedPattern(
            "WHERE applies to node properties only".to_string(),
        ));
    }

    Ok(Some(PropertyFilter {
        var: condition.var,
        property: condition.property,
        op,
        value,
    }))
}

/// Output column of a `RETURN COUNT(..)` statement, or `None` if the
/// statement has no aggregate
fn count_column(returns: &[ParsedReturn], scope: &Scope) -> EngineResult<Option<String>> {
    let has_call = returns
        .iter()
        .any(|r| matches!(r.expr, ReturnExpr::Call { .. }));
    if !has_call {
        return Ok(None);
    }

    let [item] = returns else {
        return Err(EngineError::AggregateError(
            "COUNT cannot be combined with other return items".to_string(),
        ));
    };
    let ReturnExpr::Call { function, argument } = &item.expr else {
        return Err(EngineError::AggregateError(
            "COUNT cannot be combined with other return items".to_string(),
        ));
    };

    if !function.eq_ignore_ascii_case("count") {
        return Err(EngineError::AggregateError(format!(
            "unsupported aggregate function '{}'",
            function
        )));
    }
    match argument {
        CallArg::Star => {}
        CallArg::Var(var) => {
            if scope.kind(var).is_none() {
                return Err(EngineError::AggregateError(format!(
                    "COUNT of unbound variable '{}'",
                    var
                )));
            }
        }
        CallArg::Property(..) => {
            return Err(EngineError::UnsupportedPattern(
                "COUNT takes a variable or *".to_string(),
            ))
        }
    }

    Ok(Some(
        item.alias
            .clone()
            .unwrap_or_else(|| item.expr.column_name()),
    ))
}

fn build_return(item: ParsedReturn, scope: &Scope) -> EngineResult<ReturnItem> {
    let column = item
        .alias
        .clone()
        .unwrap_or_else(|| item.expr.column_name());

    let (var, property) = match item.expr {
        ReturnExpr::Var(var) => (var, None),
        ReturnExpr::Property(var, property) => (var, Some(property)),
        ReturnExpr::Call { function, .. } => {
            return Err(EngineError::AggregateError(format!(
                "{} cannot be combined with other return items",
                function
            )))
        }
    };
    scope.require(&var)?;

    Ok(ReturnItem {
        var,
        property,
        column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::ErrorKind;
    use test_case::test_case;

    fn kind_of(input: &str) -> ErrorKind {
        parse_graph(input).unwrap_err().kind()
    }

    #[test]
    fn test_node_scan() {
        let stmt = parse_graph("MATCH (p:Person {name: 'Alice'}) RETURN p, p.age AS age LIMIT 5").unwrap();
        let GraphStatement::NodeScan(scan) = stmt else {
            panic!("expected node scan, got {:?}", stmt);
        };
        assert_eq!(scan.node.label.as_deref(), Some("Person"));
        assert_eq!(scan.node.properties, vec![("name".to_string(), Value::from("Alice"))]);
        assert_eq!(scan.returns[0].column, "p");
        assert_eq!(scan.returns[1].column, "age");
        assert_eq!(scan.returns[1].property.as_deref(), Some("age"));
        assert_eq!(scan.limit, Some(5));
    }

    #[test]
    fn test_incoming_edge_is_normalized() {
        let stmt = parse_graph("MATCH (c:Company)<-[r:WORKS_FOR]-(p:Person) RETURN p.name, c.name").unwrap();
        let GraphStatement::Traversal(t) = stmt else {
            panic!("expected traversal");
        };
        assert_eq!(t.hop.start.var.as_deref(), Some("p"));
        assert_eq!(t.hop.end.var.as_deref(), Some("c"));
        assert_eq!(t.hop.rel_type, "WORKS_FOR");
        assert_eq!(t.returns[0].column, "p.name");
    }

    #[test]
    fn test_where_filter() {
        let stmt = parse_graph("MATCH (p:Person) WHERE p.age > 30 RETURN p.name").unwrap();
        let GraphStatement::NodeScan(scan) = stmt else {
            panic!("expected node scan");
        };
        assert_eq!(
            scan.filter,
            Some(PropertyFilter {
                var: "p".into(),
                property: "age".into(),
                op: CompareOp::Gt,
                value: 30.0
            })
        );
    }

    #[test]
    fn test_count() {
        let stmt = parse_graph("MATCH (a:Person)-[:KNOWS]->(b:Person) RETURN count(b)").unwrap();
        let GraphStatement::Count(count) = stmt else {
            panic!("expected count");
        };
        assert_eq!(count.column, "count(b)");
        assert!(matches!(count.pattern, MatchPattern::Hop(_)));
    }

    #[test]
    fn test_literal_and_show() {
        assert_eq!(
            parse_graph("RETURN 1").unwrap(),
            GraphStatement::Literal(vec![("1".to_string(), Value::Integer(1))])
        );
        assert_eq!(parse_graph("SHOW LABELS").unwrap(), GraphStatement::ShowLabels);
        assert_eq!(
            parse_graph("show relationship types;").unwrap(),
            GraphStatement::ShowRelationshipTypes
        );
    }

    #[test_case("MATCH (a)-[:KNOWS]->(b)-[:KNOWS]->(c) RETURN c" ; "multi hop")]
    #[test_case("MATCH (a)-[r]->(b) RETURN a" ; "untyped")]
    #[test_case("MATCH (a)-[:KNOWS]-(b) RETURN a" ; "undirected")]
    #[test_case("MATCH (a)-[:KNOWS*1..3]->(b) RETURN b" ; "variable length")]
    #[test_case("MATCH (n:Person) WITH n RETURN n" ; "with clause")]
    #[test_case("UNWIND [1, 2] AS x RETURN x" ; "unwind")]
    #[test_case("CALL db.labels()" ; "procedure call")]
    #[test_case("MATCH (n:Person) WHERE n.name CONTAINS 'A' RETURN n" ; "contains")]
    #[test_case("MATCH (n:Person) WHERE n.age > 1 AND n.age < 9 RETURN n" ; "two conditions")]
    #[test_case("MATCH (n:Person) RETURN m" ; "unbound variable")]
    #[test_case("MATCH (n:Person) RETURN n ORDER BY n.age" ; "order by")]
    #[test_case("SHOW INDEXES" ; "other show")]
    fn test_unsupported(input: &str) {
        assert_eq!(kind_of(input), ErrorKind::UnsupportedPattern);
    }

    #[test_case("MATCH (n:Person) RETURN n, count(n)" ; "count mixed")]
    #[test_case("MATCH (n:Person) RETURN avg(n)" ; "other aggregate")]
    fn test_aggregate_errors(input: &str) {
        assert_eq!(kind_of(input), ErrorKind::AggregateError);
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_graph("MATCH (n:Person RETURN n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }
}
