//! Scalar values carried by every cell and property

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A scalar value.
///
/// Serialized untagged so that JSON datasets and envelopes read naturally:
/// `null`, `true`, `42`, `4.5`, `"2024-01-01T00:00:00Z"`, `"text"`.
/// Strings that parse as RFC 3339 instants deserialize as [`Value::Timestamp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value (Integer and Float only)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Timestamp(_) => "timestamp",
            Value::Text(_) => "text",
        }
    }

    /// Rank used to order values of different types.
    ///
    /// Integer and Float share a rank so they compare numerically.
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::Timestamp(_) => 3,
            Value::Text(_) => 4,
        }
    }

    /// Total ordering used by ORDER BY, MIN and MAX.
    ///
    /// Null < Boolean < numbers < Timestamp < Text. Numbers compare by
    /// magnitude across Integer/Float, text compares lexically.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) if a.rank() == 2 && b.rank() == 2 => {
                // Both numeric, at least one float
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// Compare against a text literal from a statement.
    ///
    /// Text compares lexically. A timestamp compares as an instant when the
    /// literal is RFC 3339 or a bare `YYYY-MM-DD` date (midnight UTC).
    /// Anything else is incomparable.
    pub fn cmp_text(&self, literal: &str) -> Option<Ordering> {
        match self {
            Value::Text(s) => Some(s.as_str().cmp(literal)),
            Value::Timestamp(ts) => parse_instant(literal).map(|other| ts.cmp(&other)),
            _ => None,
        }
    }
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_numeric_ordering_across_types() {
        assert_eq!(Value::Integer(4).total_cmp(&Value::Float(4.5)), Ordering::Less);
        assert_eq!(Value::Float(4.9).total_cmp(&Value::Integer(4)), Ordering::Greater);
        assert_eq!(Value::Integer(2).total_cmp(&Value::Float(2.0)), Ordering::Equal);
    }

    #[test]
    fn test_text_is_lexical() {
        assert_eq!(Value::from("Author B").total_cmp(&Value::from("Author A")), Ordering::Greater);
        assert_eq!(Value::from("10").total_cmp(&Value::from("9")), Ordering::Less);
    }

    #[test]
    fn test_null_sorts_first() {
        assert_eq!(Value::Null.total_cmp(&Value::Integer(i64::MIN)), Ordering::Less);
        assert_eq!(Value::from("").total_cmp(&Value::Null), Ordering::Greater);
    }

    #[test]
    fn test_timestamp_compares_with_text_literal() {
        let ts = Value::Timestamp(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(ts.cmp_text("2020-01-01T00:00:00Z"), Some(Ordering::Equal));
        assert_eq!(ts.cmp_text("2020-01-01T01:00:00+01:00"), Some(Ordering::Equal));
        assert_eq!(ts.cmp_text("2019-12-31"), Some(Ordering::Greater));
        assert_eq!(ts.cmp_text("not a date"), None);
        assert_eq!(Value::from("abc").cmp_text("abd"), Some(Ordering::Less));
        assert_eq!(Value::Integer(1).cmp_text("1"), None);
    }

    #[test]
    fn test_untagged_json_roundtrip_shapes() {
        let values: Vec<Value> =
            serde_json::from_str(r#"[null, true, 3, 4.5, "2024-05-01T12:00:00Z", "plain"]"#).unwrap();

        assert_eq!(values[0], Value::Null);
        assert_eq!(values[1], Value::Boolean(true));
        assert_eq!(values[2], Value::Integer(3));
        assert_eq!(values[3], Value::Float(4.5));
        assert_eq!(
            values[4],
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(values[5], Value::from("plain"));

        let json = serde_json::to_string(&values[2..4]).unwrap();
        assert_eq!(json, "[3,4.5]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Float(4.5).to_string(), "4.5");
        assert_eq!(Value::from("x").to_string(), "x");
    }
}
