//! SELECT evaluation over an in-memory relational dataset.
//!
//! Stages run in a fixed order: table resolution, filter, group/aggregate,
//! order, projection, limit. Ordering runs on working rows (source columns,
//! or group key plus aggregates) so ORDER BY can name a column that is not
//! projected.

use super::TableOutput;
use crate::ast::{
    literal_text, AggregateArg, AggregateCall, Predicate, SelectExpr, SelectItem, SelectList,
    SelectStatement, WhereClause,
};
use crate::syntax::parse_select;
use quire_core::{EngineError, EngineResult, RelationalDataset, Row, Table, Value};
use tracing::debug;

const AGGREGATE_FUNCTIONS: &[&str] = &["COUNT", "AVG", "SUM", "MIN", "MAX"];

static NULL: Value = Value::Null;

/// Evaluates SELECT statements against a borrowed dataset
pub struct RelationalEvaluator<'d> {
    dataset: &'d RelationalDataset,
}

impl<'d> RelationalEvaluator<'d> {
    pub fn new(dataset: &'d RelationalDataset) -> Self {
        Self { dataset }
    }

    /// Parse and evaluate statement text
    pub fn execute(&self, text: &str) -> EngineResult<TableOutput> {
        let statement = parse_select(text)?;
        self.evaluate(&statement)
    }

    pub fn evaluate(&self, statement: &SelectStatement) -> EngineResult<TableOutput> {
        let Some(from) = &statement.from else {
            return Ok(literal_output(statement));
        };
        let table = self
            .dataset
            .table(from)
            .ok_or_else(|| EngineError::NoSuchTable(from.clone()))?;

        let plan = if statement.is_aggregate() {
            Plan::grouped(statement, table)?
        } else {
            Plan::plain(statement, table)?
        };
        let order = match &statement.order_by {
            Some(order) => Some((plan.order_source(&order.key)?, order.descending)),
            None => None,
        };

        let filtered = filter_rows(table, statement.filter.as_ref());
        debug!(
            table = %table.name(),
            scanned = table.rows().len(),
            matched = filtered.len(),
            "filtered rows"
        );

        let mut working: Vec<Row> = match &plan.grouping {
            Some(grouping) => grouping.apply(filtered),
            None => filtered.into_iter().cloned().collect(),
        };

        if let Some((Source::Column(key), descending)) = &order {
            working.sort_by(|a, b| {
                let ordering = a.get(key).unwrap_or(&NULL).total_cmp(b.get(key).unwrap_or(&NULL));
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let mut rows = plan.project(&working);
        if let Some(limit) = statement.limit {
            rows.truncate(limit);
        }

        Ok(TableOutput {
            columns: plan.output_columns(),
            rows,
        })
    }
}

/// `SELECT 1, 'x' AS y`: one row of constants
fn literal_output(statement: &SelectStatement) -> TableOutput {
    let items: &[SelectItem] = match &statement.items {
        SelectList::Items(items) => items.as_slice(),
        SelectList::Wildcard => &[],
    };

    let row: Row = items
        .iter()
        .map(|item| {
            let value = match &item.expr {
                SelectExpr::Literal(v) => v.clone(),
                _ => Value::Null,
            };
            (item.output_name(), value)
        })
        .collect();

    TableOutput {
        columns: row.columns().map(str::to_string).collect(),
        rows: vec![row],
    }
}

fn filter_rows<'t>(table: &'t Table, filter: Option<&WhereClause>) -> Vec<&'t Row> {
    match filter.and_then(|f| f.predicate.as_ref()) {
        Some(predicate) => table
            .rows()
            .iter()
            .filter(|row| predicate_matches(predicate, row))
            .collect(),
        None => {
            if let Some(filter) = filter {
                debug!(raw = %filter.raw, "WHERE clause not recognized, rows left unfiltered");
            }
            table.rows().iter().collect()
        }
    }
}

/// Rows lacking the column, or holding a value of another kind, never match
fn predicate_matches(predicate: &Predicate, row: &Row) -> bool {
    let Some(actual) = row.get(&predicate.column) else {
        return false;
    };

    match (&predicate.value, actual) {
        (Value::Text(expected), actual) => predicate.op.holds(actual.cmp_text(expected)),
        (expected, actual) => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(e)) => predicate.op.holds(a.partial_cmp(&e)),
            _ => false,
        },
    }
}

// ============================================================================
// Plan
// ============================================================================

/// Where an output value comes from
#[derive(Debug, Clone)]
enum Source {
    /// Column of the working row
    Column(String),
    Constant(Value),
}

#[derive(Debug)]
struct Projection {
    name: String,
    source: Source,
}

#[derive(Debug)]
struct Plan {
    projections: Vec<Projection>,
    working_columns: Vec<String>,
    grouping: Option<Grouping>,
}

impl Plan {
    fn plain(statement: &SelectStatement, table: &Table) -> EngineResult<Self> {
        let projections: Vec<Projection> = match &statement.items {
            SelectList::Wildcard => table
                .columns()
                .iter()
                .map(|c| Projection {
                    name: c.clone(),
                    source: Source::Column(c.clone()),
                })
                .collect(),
            SelectList::Items(items) => items
                .iter()
                .map(|item| {
                    let source = match &item.expr {
                        SelectExpr::Column(c) => {
                            require_column(table, c)?;
                            Source::Column(c.clone())
                        }
                        SelectExpr::Literal(v) => Source::Constant(v.clone()),
                        SelectExpr::Aggregate(call) => {
                            return Err(EngineError::AggregateError(format!(
                                "{} used outside an aggregate query",
                                call.name()
                            )))
                        }
                    };
                    Ok(Projection {
                        name: item.output_name(),
                        source,
                    })
                })
                .collect::<EngineResult<Vec<_>>>()?,
        };

        Ok(Self {
            projections,
            working_columns: table.columns().to_vec(),
            grouping: None,
        })
    }

    fn grouped(statement: &SelectStatement, table: &Table) -> EngineResult<Self> {
        let SelectList::Items(items) = &statement.items else {
            return Err(EngineError::AggregateError(
                "SELECT * cannot be combined with GROUP BY or aggregate functions".to_string(),
            ));
        };
        if let Some(key) = &statement.group_by {
            require_column(table, key)?;
        }

        let mut aggregates: Vec<AggregateCall> = Vec::new();
        let mut add_aggregate = |call: &AggregateCall| -> EngineResult<()> {
            validate_aggregate(call, table)?;
            if !aggregates.iter().any(|a| a.name() == call.name()) {
                aggregates.push(call.clone());
            }
            Ok(())
        };

        let mut projections = Vec::with_capacity(items.len());
        for item in items {
            let source = match &item.expr {
                SelectExpr::Column(c) => {
                    if statement.group_by.as_deref() != Some(c.as_str()) {
                        require_column(table, c)?;
                        return Err(EngineError::AggregateError(format!(
                            "column '{}' must appear in GROUP BY or inside an aggregate",
                            c
                        )));
                    }
                    Source::Column(c.clone())
                }
                SelectExpr::Literal(v) => Source::Constant(v.clone()),
                SelectExpr::Aggregate(call) => {
                    add_aggregate(call)?;
                    Source::Column(call.name())
                }
            };
            projections.push(Projection {
                name: item.output_name(),
                source,
            });
        }

        // ORDER BY COUNT(*) without selecting it still needs the value
        if let Some(order) = &statement.order_by {
            if let SelectExpr::Aggregate(call) = &order.key {
                add_aggregate(call)?;
            }
        }

        let mut working_columns: Vec<String> = statement.group_by.iter().cloned().collect();
        working_columns.extend(aggregates.iter().map(AggregateCall::name));

        Ok(Self {
            projections,
            working_columns,
            grouping: Some(Grouping {
                key: statement.group_by.clone(),
                aggregates,
            }),
        })
    }

    /// Resolve an ORDER BY key: output alias, then working column, then
    /// 1-based position
    fn order_source(&self, key: &SelectExpr) -> EngineResult<Source> {
        match key {
            SelectExpr::Column(name) => {
                if let Some(p) = self.projections.iter().find(|p| &p.name == name) {
                    return Ok(p.source.clone());
                }
                if self.working_columns.contains(name) {
                    return Ok(Source::Column(name.clone()));
                }
                Err(EngineError::NoSuchColumn(name.clone()))
            }
            SelectExpr::Aggregate(call) => {
                let name = call.name();
                if self.working_columns.contains(&name) {
                    Ok(Source::Column(name))
                } else {
                    Err(EngineError::NoSuchColumn(name))
                }
            }
            SelectExpr::Literal(Value::Integer(position)) => usize::try_from(*position)
                .ok()
                .and_then(|p| p.checked_sub(1))
                .and_then(|i| self.projections.get(i))
                .map(|p| p.source.clone())
                .ok_or_else(|| EngineError::NoSuchColumn(position.to_string())),
            SelectExpr::Literal(other) => Err(EngineError::NoSuchColumn(literal_text(other))),
        }
    }

    fn project(&self, working: &[Row]) -> Vec<Row> {
        working
            .iter()
            .map(|row| {
                self.projections
                    .iter()
                    .map(|p| {
                        let value = match &p.source {
                            Source::Column(c) => row.get(c).cloned().unwrap_or(Value::Null),
                            Source::Constant(v) => v.clone(),
                        };
                        (p.name.clone(), value)
                    })
                    .collect::<Row>()
            })
            .collect()
    }

    /// Output names, first occurrence wins on duplicates
    fn output_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::with_capacity(self.projections.len());
        for p in &self.projections {
            if !columns.contains(&p.name) {
                columns.push(p.name.clone());
            }
        }
        columns
    }
}

fn require_column(table: &Table, column: &str) -> EngineResult<()> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(EngineError::NoSuchColumn(column.to_string()))
    }
}

fn validate_aggregate(call: &AggregateCall, table: &Table) -> EngineResult<()> {
    if !AGGREGATE_FUNCTIONS.contains(&call.function.as_str()) {
        return Err(EngineError::AggregateError(format!(
            "unknown aggregate function '{}'",
            call.function
        )));
    }
    match &call.argument {
        AggregateArg::Star if call.function != "COUNT" => Err(EngineError::AggregateError(
            format!("{}(*) is not allowed, only COUNT accepts *", call.function),
        )),
        AggregateArg::Star => Ok(()),
        AggregateArg::Column(c) => require_column(table, c),
    }
}

// ============================================================================
// Grouping
// ============================================================================

#[derive(Debug)]
struct Grouping {
    key: Option<String>,
    aggregates: Vec<AggregateCall>,
}

impl Grouping {
    /// One working row per group, groups in first-seen order.
    ///
    /// Without a key every row falls in a single group, so an aggregate
    /// over zero rows still yields one row (`COUNT(*) = 0`).
    fn apply(&self, rows: Vec<&Row>) -> Vec<Row> {
        let mut groups: Vec<(Value, Vec<&Row>)> = Vec::new();
        match &self.key {
            Some(key) => {
                for row in rows {
                    let value = row.get(key).cloned().unwrap_or(Value::Null);
                    match groups.iter_mut().find(|(k, _)| *k == value) {
                        Some((_, members)) => members.push(row),
                        None => groups.push((value, vec![row])),
                    }
                }
            }
            None => groups.push((Value::Null, rows)),
        }

        groups
            .into_iter()
            .map(|(key_value, members)| {
                let mut row = Row::with_capacity(self.aggregates.len() + 1);
                if let Some(key) = &self.key {
                    row.push(key.clone(), key_value);
                }
                for call in &self.aggregates {
                    row.push(call.name(), aggregate(call, &members));
                }
                row
            })
            .collect()
    }
}

fn aggregate(call: &AggregateCall, rows: &[&Row]) -> Value {
    let column = match &call.argument {
        AggregateArg::Star => return Value::Integer(rows.len() as i64),
        AggregateArg::Column(c) => c,
    };
    let values = rows
        .iter()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.is_null());

    match call.function.as_str() {
        "COUNT" => Value::Integer(values.count() as i64),
        "AVG" => {
            let numbers: Vec<f64> = values.filter_map(Value::as_f64).collect();
            if numbers.is_empty() {
                Value::Null
            } else {
                Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        "SUM" => sum(values),
        "MIN" => values
            .min_by(|a, b| a.total_cmp(b))
            .cloned()
            .unwrap_or(Value::Null),
        "MAX" => values
            .max_by(|a, b| a.total_cmp(b))
            .cloned()
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Integer while every input is an integer and the total fits, else Float
fn sum<'a>(values: impl Iterator<Item = &'a Value>) -> Value {
    let mut seen = false;
    let mut all_integers = true;
    let mut int_total: Option<i64> = Some(0);
    let mut float_total = 0.0;

    for value in values {
        match value {
            Value::Integer(i) => {
                seen = true;
                int_total = int_total.and_then(|t| t.checked_add(*i));
                float_total += *i as f64;
            }
            Value::Float(f) => {
                seen = true;
                all_integers = false;
                float_total += f;
            }
            _ => {}
        }
    }

    match (seen, all_integers, int_total) {
        (false, _, _) => Value::Null,
        (true, true, Some(total)) => Value::Integer(total),
        _ => Value::Float(float_total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::ErrorKind;
    use test_case::test_case;

    fn library() -> RelationalDataset {
        let book = |id: i64, title: &str, author: &str, rating: f64| {
            Row::new()
                .with("id", Value::Integer(id))
                .with("title", Value::from(title))
                .with("author", Value::from(author))
                .with("rating", Value::Float(rating))
        };
        RelationalDataset::new(vec![Table::new(
            "books",
            vec![
                book(1, "Dune", "Herbert", 4.5),
                book(2, "Emma", "Austen", 3.75),
                book(3, "Persuasion", "Austen", 4.25),
                book(4, "Solaris", "Lem", 4.0),
            ],
        )])
        .unwrap()
    }

    fn run(sql: &str) -> EngineResult<TableOutput> {
        let dataset = library();
        RelationalEvaluator::new(&dataset).execute(sql)
    }

    fn column(output: &TableOutput, name: &str) -> Vec<Value> {
        output
            .rows
            .iter()
            .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn test_select_star_keeps_table_order() {
        let out = run("SELECT * FROM books").unwrap();
        assert_eq!(out.columns, vec!["id", "title", "author", "rating"]);
        assert_eq!(out.rows.len(), 4);
        assert_eq!(out.rows[0].get("title"), Some(&Value::from("Dune")));
    }

    #[test]
    fn test_table_lookup_ignores_case() {
        assert_eq!(run("SELECT * FROM BOOKS").unwrap().rows.len(), 4);
    }

    #[test]
    fn test_numeric_filter_and_projection() {
        let out = run("SELECT title AS name FROM books WHERE rating >= 4.1").unwrap();
        assert_eq!(out.columns, vec!["name"]);
        assert_eq!(column(&out, "name"), vec![Value::from("Dune"), Value::from("Persuasion")]);
    }

    #[test]
    fn test_text_equality() {
        let out = run("SELECT id FROM books WHERE author = 'Austen'").unwrap();
        assert_eq!(column(&out, "id"), vec![Value::Integer(2), Value::Integer(3)]);
    }

    #[test]
    fn test_unrecognized_where_filters_nothing() {
        let out = run("SELECT id FROM books WHERE rating > 4 AND author = 'Lem'").unwrap();
        assert_eq!(out.rows.len(), 4);
    }

    #[test]
    fn test_order_by_unprojected_column_then_limit() {
        let out = run("SELECT title FROM books ORDER BY rating DESC LIMIT 2").unwrap();
        assert_eq!(column(&out, "title"), vec![Value::from("Dune"), Value::from("Persuasion")]);
    }

    #[test]
    fn test_order_is_stable() {
        let out = run("SELECT id FROM books ORDER BY author").unwrap();
        assert_eq!(
            column(&out, "id"),
            vec![Value::Integer(2), Value::Integer(3), Value::Integer(1), Value::Integer(4)]
        );
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let out = run("SELECT author, COUNT(*) AS n, AVG(rating) FROM books GROUP BY author").unwrap();
        assert_eq!(out.columns, vec!["author", "n", "AVG(rating)"]);
        assert_eq!(
            column(&out, "author"),
            vec![Value::from("Herbert"), Value::from("Austen"), Value::from("Lem")]
        );
        assert_eq!(column(&out, "n"), vec![Value::Integer(1), Value::Integer(2), Value::Integer(1)]);
        assert_eq!(out.rows[1].get("AVG(rating)"), Some(&Value::Float(4.0)));
    }

    #[test]
    fn test_order_by_aggregate_alias() {
        let out = run("SELECT author, COUNT(*) AS n FROM books GROUP BY author ORDER BY n DESC LIMIT 1")
            .unwrap();
        assert_eq!(column(&out, "author"), vec![Value::from("Austen")]);
    }

    #[test]
    fn test_aggregate_without_group_over_no_rows() {
        let out = run("SELECT COUNT(*), SUM(id), MAX(rating) FROM books WHERE rating > 10").unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].get("COUNT(*)"), Some(&Value::Integer(0)));
        assert_eq!(out.rows[0].get("SUM(id)"), Some(&Value::Null));
        assert_eq!(out.rows[0].get("MAX(rating)"), Some(&Value::Null));
    }

    #[test]
    fn test_sum_of_integers_stays_integer() {
        let out = run("SELECT SUM(id), MIN(title) FROM books").unwrap();
        assert_eq!(out.rows[0].get("SUM(id)"), Some(&Value::Integer(10)));
        assert_eq!(out.rows[0].get("MIN(title)"), Some(&Value::from("Dune")));
    }

    #[test]
    fn test_literal_select() {
        let out = run("SELECT 1").unwrap();
        assert_eq!(out.columns, vec!["1"]);
        assert_eq!(out.rows[0].get("1"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_limit_zero() {
        assert!(run("SELECT * FROM books LIMIT 0").unwrap().rows.is_empty());
    }

    #[test_case("SELECT * FROM nonexistent_table", ErrorKind::NoSuchTable ; "unknown table")]
    #[test_case("SELECT isbn FROM books", ErrorKind::NoSuchColumn ; "unknown column")]
    #[test_case("SELECT * FROM books ORDER BY isbn", ErrorKind::NoSuchColumn ; "unknown order key")]
    #[test_case("SELECT COUNT(*) FROM books GROUP BY isbn", ErrorKind::NoSuchColumn ; "unknown group key")]
    #[test_case("SELECT MEDIAN(rating) FROM books", ErrorKind::AggregateError ; "unknown function")]
    #[test_case("SELECT AVG(*) FROM books", ErrorKind::AggregateError ; "star outside count")]
    #[test_case("SELECT title, COUNT(*) FROM books GROUP BY author", ErrorKind::AggregateError ; "non key column")]
    #[test_case("SELECT * FROM books GROUP BY author", ErrorKind::AggregateError ; "star with group by")]
    #[test_case("SELECT * FORM books", ErrorKind::SyntaxError ; "misspelled keyword")]
    fn test_errors(sql: &str, kind: ErrorKind) {
        assert_eq!(run(sql).unwrap_err().kind(), kind);
    }
}
