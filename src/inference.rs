//! # Schema Inference Module
//!
//! Maps sample values to SQLite column type affinities and derives full
//! column lists from sample rows. Inference is an exhaustive match over the
//! closed [`Value`] set, so adding a supported variant is a compile-checked
//! change rather than an open-ended runtime probe.

use crate::value::{Row, Value};
use serde::Serialize;

/// SQLite type affinity for column definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
}

impl ColumnType {
    /// Returns the SQL type name for column creation
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }

    /// Maps a declared column type from `PRAGMA table_info` back to an
    /// affinity, following SQLite's own affinity rules
    pub fn from_decl(decl: &str) -> ColumnType {
        let decl = decl.to_uppercase();
        if decl.contains("INT") {
            ColumnType::Integer
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            ColumnType::Real
        } else if decl.contains("BLOB") {
            ColumnType::Blob
        } else {
            ColumnType::Text
        }
    }
}

/// Infers the column type from a sample value.
///
/// Null carries no type information and falls back to TEXT, the most
/// permissive affinity.
pub fn infer_type(value: &Value) -> ColumnType {
    match value {
        Value::Integer(_) => ColumnType::Integer,
        Value::Real(_) => ColumnType::Real,
        Value::Text(_) => ColumnType::Text,
        Value::Blob(_) => ColumnType::Blob,
        Value::Null => ColumnType::Text,
    }
}

/// A column derived from a sample value or reflected from the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    /// Renders the column as it appears in a CREATE TABLE column list
    pub fn as_sql(&self) -> String {
        format!("{} {}", self.name, self.column_type.as_sql())
    }
}

/// Infers one column per sample key, in the sample's insertion order.
///
/// The synthetic `id` primary key is not part of the inferred list; table
/// creation prepends it.
pub fn infer_schema(sample: &Row) -> Vec<ColumnSpec> {
    sample
        .iter()
        .map(|(key, val)| ColumnSpec::new(key.clone(), infer_type(val)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_inference() {
        assert_eq!(infer_type(&Value::Integer(42)), ColumnType::Integer);
        assert_eq!(infer_type(&Value::Real(3.14)), ColumnType::Real);
        assert_eq!(infer_type(&Value::Text("hello".into())), ColumnType::Text);
        assert_eq!(infer_type(&Value::Blob(vec![1, 2, 3])), ColumnType::Blob);
        assert_eq!(infer_type(&Value::Null), ColumnType::Text);
    }

    #[test]
    fn test_schema_inference_order_and_types() {
        let sample = Row::new()
            .with("name", "Cool Project")
            .with("begin_date", "2021-01-01")
            .with("end_date", "2022-01-01")
            .with("budget", 50000.00);

        let schema = infer_schema(&sample);
        let rendered: Vec<String> = schema.iter().map(|c| c.as_sql()).collect();
        assert_eq!(
            rendered,
            vec![
                "name TEXT",
                "begin_date TEXT",
                "end_date TEXT",
                "budget REAL"
            ]
        );
    }

    #[test]
    fn test_empty_sample_yields_no_columns() {
        assert!(infer_schema(&Row::new()).is_empty());
    }
}
