//! # Value Module
//!
//! The closed set of value variants dictdb stores, plus [`Row`], the ordered
//! name→value mapping every operation consumes and produces.
//!
//! ## Type Mapping
//!
//! | Variant   | SQLite Affinity | Notes                          |
//! |-----------|-----------------|--------------------------------|
//! | Integer   | INTEGER         | Booleans stored as 1 or 0      |
//! | Real      | REAL            |                                |
//! | Text      | TEXT            | Standard UTF-8                 |
//! | Blob      | BLOB            |                                |
//! | Null      | NULL            | Skipped during type inference  |

use crate::error::{DbError, DbResult};

/// SQL value wrapper used for parameter binding and query results.
///
/// Values are always bound through placeholders, never interpolated into
/// statement text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, ValueRef};
        match self {
            Value::Null => Ok(ToSqlOutput::Borrowed(ValueRef::Null)),
            Value::Integer(i) => Ok(ToSqlOutput::Borrowed(ValueRef::Integer(*i))),
            Value::Real(f) => Ok(ToSqlOutput::Borrowed(ValueRef::Real(*f))),
            Value::Text(s) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
            Value::Blob(b) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(b))),
        }
    }
}

impl From<rusqlite::types::Value> for Value {
    fn from(v: rusqlite::types::Value) -> Self {
        match v {
            rusqlite::types::Value::Null => Value::Null,
            rusqlite::types::Value::Integer(i) => Value::Integer(i),
            rusqlite::types::Value::Real(f) => Value::Real(f),
            rusqlite::types::Value::Text(s) => Value::Text(s),
            rusqlite::types::Value::Blob(b) => Value::Blob(b),
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
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(if v { 1 } else { 0 })
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

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// Convert a JSON value to a SQL value.
///
/// Objects and arrays are serialized to their JSON text representation.
pub fn json_to_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Integer(if *b { 1 } else { 0 }),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Real(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Value::Text(serde_json::to_string(value).unwrap_or_default())
        }
    }
}

/// Convert a SQL value back to JSON (blobs are summarized, not encoded)
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::json!(i),
        Value::Real(f) => serde_json::json!(f),
        Value::Text(s) => serde_json::json!(s),
        Value::Blob(b) => serde_json::json!(format!("<blob:{} bytes>", b.len())),
    }
}

/// An ordered name→value mapping.
///
/// Rows preserve insertion order, which drives the column order of tables
/// created via schema inference. Setting an existing key replaces its value
/// in place rather than appending a duplicate.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a row from a JSON object, converting each member via
    /// [`json_to_value`]. Member order follows the parsed document.
    pub fn from_json(value: &serde_json::Value) -> DbResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| DbError::InvalidPayload("payload must be a JSON object".to_string()))?;

        let mut row = Row::new();
        for (key, val) in obj {
            row.set(key, json_to_value(val));
        }
        Ok(row)
    }

    /// Renders the row as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        for (key, value) in &self.entries {
            obj.insert(key.clone(), value_to_json(value));
        }
        serde_json::Value::Object(obj)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(&k, v);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_preserves_insertion_order() {
        let row = Row::new()
            .with("name", "Cool Project")
            .with("begin_date", "2021-01-01")
            .with("budget", 50000.0);

        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["name", "begin_date", "budget"]);
    }

    #[test]
    fn test_row_set_replaces_in_place() {
        let mut row = Row::new().with("a", 1i64).with("b", 2i64);
        row.set("a", 10i64);

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("a"), Some(&Value::Integer(10)));
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(json_to_value(&json!(42)), Value::Integer(42));
        assert_eq!(json_to_value(&json!(3.14)), Value::Real(3.14));
        assert_eq!(json_to_value(&json!("hi")), Value::Text("hi".to_string()));
        assert_eq!(json_to_value(&json!(true)), Value::Integer(1));
        assert_eq!(json_to_value(&json!(null)), Value::Null);
        assert_eq!(
            json_to_value(&json!([1, 2])),
            Value::Text("[1,2]".to_string())
        );
    }

    #[test]
    fn test_row_from_json_rejects_non_objects() {
        assert!(Row::from_json(&json!([1, 2, 3])).is_err());
        assert!(Row::from_json(&json!("scalar")).is_err());

        let row = Row::from_json(&json!({"name": "x", "n": 1})).unwrap();
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7i64)), Value::Integer(7));
    }
}
