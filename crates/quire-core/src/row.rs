//! Ordered name → value mappings
//!
//! Column order is significant for rendering, so rows are backed by a vector
//! of entries rather than a hash map. Lookups are linear, which is fine for
//! the handful of columns a rendered result carries.

use crate::entity::Cell;
use crate::value::Value;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Ordered mapping from column name to a value.
///
/// `Row` (the default) holds scalars; [`Record`] holds entity cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<V = Value> {
    entries: Vec<(String, V)>,
}

/// A graph result record: column name → scalar, node or relationship
pub type Record = Row<Cell>;

impl<V> Default for Row<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> Row<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Set a column, keeping its original position if it already exists
    pub fn push(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style variant of [`Row::push`]
    pub fn with(mut self, name: impl Into<String>, value: V) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert every value, keeping names and order
    pub fn map_values<U>(self, mut f: impl FnMut(V) -> U) -> Row<U> {
        Row {
            entries: self.entries.into_iter().map(|(n, v)| (n, f(v))).collect(),
        }
    }
}

impl<V> FromIterator<(String, V)> for Row<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.push(name, value);
        }
        row
    }
}

impl<V> IntoIterator for Row<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for Row<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RowVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for RowVisitor<V> {
    type Value = Row<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of column names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut row = Row::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, value)) = access.next_entry::<String, V>()? {
            row.push(name, value);
        }
        Ok(row)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Row<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_position_on_overwrite() {
        let mut row = Row::new();
        row.push("a", Value::Integer(1));
        row.push("b", Value::Integer(2));
        row.push("a", Value::Integer(3));

        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_serializes_in_column_order() {
        let row = Row::new()
            .with("zeta", Value::Integer(1))
            .with("alpha", Value::from("x"));

        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"zeta":1,"alpha":"x"}"#);
    }

    #[test]
    fn test_deserialize_preserves_document_order() {
        let row: Row = serde_json::from_str(r#"{"title": "Dune", "id": 7}"#).unwrap();
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["title", "id"]);
        assert_eq!(row.get("id"), Some(&Value::Integer(7)));
    }

    #[test]
    fn test_map_values() {
        let row = Row::new().with("n", Value::Integer(1));
        let record: Record = row.map_values(Cell::Scalar);
        assert_eq!(record.get("n"), Some(&Cell::Scalar(Value::Integer(1))));
    }
}
