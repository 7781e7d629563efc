//! Cypher evaluation over an in-memory graph dataset.

use crate::ast::{GraphStatement, HopPattern, MatchPattern, NodeBinding, PropertyFilter, ReturnItem};
use crate::syntax::parse_graph;
use quire_core::{
    Cell, EngineError, EngineResult, GraphDataset, GraphNode, GraphRelationship, RawRows, Record,
    Value,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Evaluates graph statements against a borrowed dataset
pub struct GraphEvaluator<'d> {
    dataset: &'d GraphDataset,
}

#[derive(Debug, Clone, Copy)]
enum Bound<'d> {
    Node(&'d GraphNode),
    Relationship(&'d GraphRelationship),
}

/// Variables bound by one pattern match
#[derive(Debug, Default)]
struct Binding<'s, 'd> {
    vars: Vec<(&'s str, Bound<'d>)>,
    /// Every node the pattern matched, named or anonymous
    nodes: Vec<&'d GraphNode>,
}

impl<'s, 'd> Binding<'s, 'd> {
    fn matched(&mut self, node: &'d GraphNode) {
        if !self.nodes.iter().any(|n| n.id == node.id) {
            self.nodes.push(node);
        }
    }

    fn bind(&mut self, var: &'s Option<String>, value: Bound<'d>) {
        if let Some(var) = var {
            if self.get(var).is_none() {
                self.vars.push((var.as_str(), value));
            }
        }
    }

    fn get(&self, var: &str) -> Option<Bound<'d>> {
        self.vars.iter().find(|(v, _)| *v == var).map(|(_, b)| *b)
    }

    /// Nodes lacking the property or holding a non-numeric value fail
    fn satisfies(&self, filter: Option<&PropertyFilter>) -> bool {
        let Some(filter) = filter else {
            return true;
        };
        match self.get(&filter.var) {
            Some(Bound::Node(node)) => node
                .property(&filter.property)
                .and_then(Value::as_f64)
                .is_some_and(|v| filter.op.holds(v.partial_cmp(&filter.value))),
            _ => false,
        }
    }

    fn cell(&self, item: &ReturnItem) -> Cell {
        match (self.get(&item.var), &item.property) {
            (Some(Bound::Node(node)), None) => Cell::Node(node.clone()),
            (Some(Bound::Relationship(rel)), None) => Cell::Relationship(rel.clone()),
            (Some(Bound::Node(node)), Some(key)) => {
                Cell::Scalar(node.property(key).cloned().unwrap_or(Value::Null))
            }
            (Some(Bound::Relationship(rel)), Some(key)) => {
                Cell::Scalar(rel.property(key).cloned().unwrap_or(Value::Null))
            }
            (None, _) => Cell::Scalar(Value::Null),
        }
    }
}

impl<'d> GraphEvaluator<'d> {
    pub fn new(dataset: &'d GraphDataset) -> Self {
        Self { dataset }
    }

    /// Parse and evaluate statement text
    pub fn execute(&self, text: &str) -> EngineResult<RawRows> {
        let statement = parse_graph(text)?;
        self.evaluate(&statement)
    }

    pub fn evaluate(&self, statement: &GraphStatement) -> EngineResult<RawRows> {
        let rows = match statement {
            GraphStatement::Literal(items) => {
                let record: Record = items
                    .iter()
                    .map(|(name, value)| (name.clone(), Cell::Scalar(value.clone())))
                    .collect();
                RawRows::new(
                    record.columns().map(str::to_string).collect(),
                    vec![record],
                )
            }
            GraphStatement::ShowLabels => single_column("label", self.dataset.labels()),
            GraphStatement::ShowRelationshipTypes => {
                single_column("relationshipType", self.dataset.relationship_types())
            }
            GraphStatement::NodeScan(scan) => {
                let bindings = self.scan(&scan.node, scan.filter.as_ref())?;
                project(&scan.returns, &bindings, scan.limit)
            }
            GraphStatement::Traversal(traversal) => {
                let bindings = self.traverse(&traversal.hop, traversal.filter.as_ref())?;
                project(&traversal.returns, &bindings, traversal.limit)
            }
            GraphStatement::Count(query) => {
                let count = match &query.pattern {
                    MatchPattern::Node(node) => self.scan(node, query.filter.as_ref())?.len(),
                    MatchPattern::Hop(hop) => self.traverse(hop, query.filter.as_ref())?.len(),
                };
                let record = Record::new().with(
                    query.column.clone(),
                    Cell::Scalar(Value::Integer(count as i64)),
                );
                RawRows::new(vec![query.column.clone()], vec![record])
            }
        };

        debug!(records = rows.len(), "evaluated graph statement");
        Ok(rows)
    }

    fn require_label(&self, binding: &NodeBinding) -> EngineResult<()> {
        match &binding.label {
            Some(label) if !self.dataset.has_label(label) => {
                Err(EngineError::NoSuchLabel(label.clone()))
            }
            _ => Ok(()),
        }
    }

    fn scan<'s>(
        &self,
        node: &'s NodeBinding,
        filter: Option<&PropertyFilter>,
    ) -> EngineResult<Vec<Binding<'s, 'd>>> {
        self.require_label(node)?;

        let dataset: &'d GraphDataset = self.dataset;
        Ok(dataset
            .nodes()
            .iter()
            .filter(|n| node_matches(node, n))
            .map(|n| {
                let mut binding = Binding::default();
                binding.matched(n);
                binding.bind(&node.var, Bound::Node(n));
                binding
            })
            .filter(|b| b.satisfies(filter))
            .collect())
    }

    /// One binding per relationship of the hop's type whose endpoints
    /// satisfy both node patterns
    fn traverse<'s>(
        &self,
        hop: &'s HopPattern,
        filter: Option<&PropertyFilter>,
    ) -> EngineResult<Vec<Binding<'s, 'd>>> {
        self.require_label(&hop.start)?;
        self.require_label(&hop.end)?;

        let dataset: &'d GraphDataset = self.dataset;
        let self_loop = hop.start.var.is_some() && hop.start.var == hop.end.var;
        let mut bindings = Vec::new();

        for rel in dataset
            .relationships()
            .iter()
            .filter(|r| r.rel_type == hop.rel_type)
        {
            let (Some(start), Some(end)) = (dataset.node(&rel.start), dataset.node(&rel.end))
            else {
                continue;
            };
            if !node_matches(&hop.start, start) || !node_matches(&hop.end, end) {
                continue;
            }
            if self_loop && start.id != end.id {
                continue;
            }

            let mut binding = Binding::default();
            binding.matched(start);
            binding.matched(end);
            binding.bind(&hop.start.var, Bound::Node(start));
            binding.bind(&hop.end.var, Bound::Node(end));
            binding.bind(&hop.rel_var, Bound::Relationship(rel));
            if binding.satisfies(filter) {
                bindings.push(binding);
            }
        }

        Ok(bindings)
    }
}

fn node_matches(binding: &NodeBinding, node: &GraphNode) -> bool {
    let label_ok = binding
        .label
        .as_ref()
        .map_or(true, |label| node.has_label(label));

    label_ok
        && binding.properties.iter().all(|(key, expected)| {
            node.property(key)
                .is_some_and(|actual| values_equal(actual, expected))
        })
}

/// Numbers compare by magnitude so `{age: 34}` matches a stored 34.0
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn single_column(column: &str, values: BTreeSet<&str>) -> RawRows {
    let records = values
        .into_iter()
        .map(|v| Record::new().with(column, Cell::Scalar(Value::from(v))))
        .collect();
    RawRows::new(vec![column.to_string()], records)
}

fn project(returns: &[ReturnItem], bindings: &[Binding<'_, '_>], limit: Option<usize>) -> RawRows {
    let mut columns: Vec<String> = Vec::with_capacity(returns.len());
    for item in returns {
        if !columns.contains(&item.column) {
            columns.push(item.column.clone());
        }
    }

    let emitted = &bindings[..bindings.len().min(limit.unwrap_or(usize::MAX))];
    let records = emitted
        .iter()
        .map(|binding| {
            returns
                .iter()
                .map(|item| (item.column.clone(), binding.cell(item)))
                .collect::<Record>()
        })
        .collect();

    let mut matched: Vec<GraphNode> = Vec::new();
    for node in emitted.iter().flat_map(|b| b.nodes.iter()) {
        if !matched.iter().any(|m| m.id == node.id) {
            matched.push((*node).clone());
        }
    }

    RawRows::new(columns, records).with_matched_nodes(matched)
}
