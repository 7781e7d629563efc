//! Typed statements produced by the grammars.
//!
//! A statement is parsed exactly once; evaluators pattern-match on these
//! types and never look at the raw text again.

use quire_core::Value;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator shared by SQL predicates and Cypher conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "=",
        }
    }

    /// Whether `actual <op> expected` holds, given `actual.cmp(expected)`.
    ///
    /// An incomparable pair (NaN) never matches.
    pub fn holds(&self, ordering: Option<Ordering>) -> bool {
        let Some(ordering) = ordering else {
            return false;
        };
        match self {
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Eq => ordering == Ordering::Equal,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A literal as it would be written in a statement
pub fn literal_text(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

// ============================================================================
// SQL
// ============================================================================

/// `SELECT ... [FROM t] [WHERE ...] [GROUP BY c] [ORDER BY k] [LIMIT n]`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub items: SelectList,
    /// `None` only for literal-only selects such as `SELECT 1`
    pub from: Option<String>,
    pub filter: Option<WhereClause>,
    pub group_by: Option<String>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl SelectStatement {
    /// True when any item is an aggregate or a GROUP BY is present
    pub fn is_aggregate(&self) -> bool {
        self.group_by.is_some()
            || match &self.items {
                SelectList::Wildcard => false,
                SelectList::Items(items) => items
                    .iter()
                    .any(|i| matches!(i.expr, SelectExpr::Aggregate(_))),
            }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    Wildcard,
    Items(Vec<SelectItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: SelectExpr,
    pub alias: Option<String>,
}

impl SelectItem {
    /// Column name in the output: the alias, else the expression as written
    pub fn output_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| self.expr.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectExpr {
    Column(String),
    Literal(Value),
    Aggregate(AggregateCall),
}

impl SelectExpr {
    /// Canonical display name (`title`, `COUNT(*)`, `'x'`)
    pub fn name(&self) -> String {
        match self {
            SelectExpr::Column(c) => c.clone(),
            SelectExpr::Literal(v) => literal_text(v),
            SelectExpr::Aggregate(call) => call.name(),
        }
    }
}

/// `FUNC(*)` or `FUNC(column)`; the function name is upper-cased but not
/// validated until evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    pub function: String,
    pub argument: AggregateArg,
}

impl AggregateCall {
    pub fn name(&self) -> String {
        match &self.argument {
            AggregateArg::Star => format!("{}(*)", self.function),
            AggregateArg::Column(c) => format!("{}({})", self.function, c),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateArg {
    Star,
    Column(String),
}

/// WHERE text as written plus the predicate recognized in it, if any.
///
/// Text outside the recognized forms leaves `predicate` empty and filters
/// nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub raw: String,
    pub predicate: Option<Predicate>,
}

/// `column <op> number` or `column = 'text'`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Column, alias, aggregate, or 1-based position literal
    pub key: SelectExpr,
    pub descending: bool,
}

// ============================================================================
// Cypher
// ============================================================================

/// One of the graph statement shapes the evaluator supports
#[derive(Debug, Clone, PartialEq)]
pub enum GraphStatement {
    /// `RETURN 1 [AS x], ...`
    Literal(Vec<(String, Value)>),
    /// `SHOW LABELS`
    ShowLabels,
    /// `SHOW RELATIONSHIP TYPES`
    ShowRelationshipTypes,
    /// `MATCH (n:Label {k: v}) [WHERE ...] RETURN ... [LIMIT n]`
    NodeScan(NodeScan),
    /// `MATCH (a)-[r:TYPE]->(b) [WHERE ...] RETURN ... [LIMIT n]`
    Traversal(Traversal),
    /// Either pattern with `RETURN COUNT(x)`
    Count(CountQuery),
}

/// Node pattern `(var:Label {key: value})`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeBinding {
    pub var: Option<String>,
    pub label: Option<String>,
    pub properties: Vec<(String, Value)>,
}

/// Single typed hop, normalized so that `start -> end` is the stored
/// direction of the relationship
#[derive(Debug, Clone, PartialEq)]
pub struct HopPattern {
    pub start: NodeBinding,
    pub rel_var: Option<String>,
    pub rel_type: String,
    pub end: NodeBinding,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchPattern {
    Node(NodeBinding),
    Hop(HopPattern),
}

/// `var.property <op> number`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub var: String,
    pub property: String,
    pub op: CompareOp,
    pub value: f64,
}

/// A projected variable or variable property
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub var: String,
    pub property: Option<String>,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeScan {
    pub node: NodeBinding,
    pub filter: Option<PropertyFilter>,
    pub returns: Vec<ReturnItem>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub hop: HopPattern,
    pub filter: Option<PropertyFilter>,
    pub returns: Vec<ReturnItem>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountQuery {
    pub pattern: MatchPattern,
    pub filter: Option<PropertyFilter>,
    pub column: String,
}
