//! # Bulk Load Module
//!
//! [`Frame`] is the tabular dataset accepted by the bulk writer: a set of
//! named, equally-long value columns. Appending a frame creates the target
//! table from the frame's own column names and types when it does not exist
//! yet (no synthetic `id` column; the frame is taken as the complete
//! schema), then inserts every row inside one transaction.

use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::inference::{infer_type, ColumnType};
use crate::store::Store;
use crate::value::Value;
use tracing::info;

/// One named column of a [`Frame`]
#[derive(Debug, Clone)]
pub struct FrameColumn {
    pub name: String,
    pub column_type: ColumnType,
    values: Vec<Value>,
}

/// An in-memory tabular dataset: ordered named columns of equal length.
///
/// Each column's type is inferred from its first non-null value, falling
/// back to TEXT for an all-null column.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<FrameColumn>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append.
    ///
    /// Fails if the column's length differs from columns already present,
    /// or if the name duplicates an existing column.
    pub fn with_column<V: Into<Value>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> DbResult<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();

        if self.columns.iter().any(|c| c.name == name) {
            return Err(DbError::InvalidPayload(format!(
                "duplicate frame column '{}'",
                name
            )));
        }
        if let Some(first) = self.columns.first() {
            if values.len() != first.values.len() {
                return Err(DbError::InvalidPayload(format!(
                    "frame column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    first.values.len()
                )));
            }
        }

        let column_type = values
            .iter()
            .find(|v| !v.is_null())
            .map(infer_type)
            .unwrap_or(ColumnType::Text);

        self.columns.push(FrameColumn {
            name: name.to_string(),
            column_type,
            values,
        });
        Ok(self)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (length of every column)
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// Appends `frame` to `table`, creating the table from the frame's own
/// columns if absent. Returns the number of rows appended.
pub(crate) fn append(store: &Store, table: &Ident, frame: &Frame) -> DbResult<usize> {
    if frame.column_count() == 0 {
        return Err(DbError::InvalidPayload(
            "frame has no columns".to_string(),
        ));
    }

    let idents: DbResult<Vec<Ident>> = frame
        .columns
        .iter()
        .map(|c| Ident::new(&c.name))
        .collect();
    let idents = idents?;

    if store.table_columns(table)?.is_empty() {
        let column_list: Vec<String> = frame
            .columns
            .iter()
            .zip(&idents)
            .map(|(c, ident)| format!("{} {}", ident, c.column_type.as_sql()))
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            table,
            column_list.join(", ")
        );
        store.execute(&sql, &[])?;
        info!("Created table '{}' from frame columns", table);
    }

    let names: Vec<String> = idents.iter().map(Ident::to_string).collect();
    let placeholders: Vec<&str> = idents.iter().map(|_| "?").collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    );

    let rows = frame.row_count();
    let appended = store.with_transaction(move |tx| {
        let mut stmt = tx.prepare(&sql)?;
        for i in 0..rows {
            let params: Vec<&Value> = frame.columns.iter().map(|c| &c.values[i]).collect();
            stmt.execute(rusqlite::params_from_iter(params.iter()))?;
        }
        Ok(rows)
    })?;

    info!("Appended {} rows to '{}'", appended, table);
    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DictDb;
    use crate::value::Row;

    #[test]
    fn test_frame_shape_checks() {
        let frame = Frame::new()
            .with_column("a", vec![1i64, 2, 3])
            .unwrap();
        assert!(frame.clone().with_column("a", vec![4i64, 5, 6]).is_err()); // duplicate
        assert!(frame.clone().with_column("b", vec![1i64]).is_err()); // ragged

        let frame = frame.with_column("b", vec!["x", "y", "z"]).unwrap();
        assert_eq!(frame.column_count(), 2);
        assert_eq!(frame.row_count(), 3);
    }

    #[test]
    fn test_frame_column_type_inference() {
        let frame = Frame::new()
            .with_column("n", vec![Value::Null, Value::Integer(2)])
            .unwrap()
            .with_column("all_null", vec![Value::Null, Value::Null])
            .unwrap();
        assert_eq!(frame.columns[0].column_type, ColumnType::Integer);
        assert_eq!(frame.columns[1].column_type, ColumnType::Text);
    }

    #[test]
    fn test_bulk_load_creates_table() {
        let db = DictDb::in_memory().unwrap();
        let frame = Frame::new()
            .with_column("city", vec!["Oslo", "Lima"])
            .unwrap()
            .with_column("population", vec![709_000i64, 10_092_000])
            .unwrap();

        assert_eq!(db.bulk_load("cities", &frame).unwrap(), 2);
        // No synthetic id column: the frame is the whole schema
        assert_eq!(db.columns("cities").unwrap(), vec!["city", "population"]);

        let rows = db.query("cities", None, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("city").unwrap().as_str(), Some("Oslo"));
    }

    #[test]
    fn test_bulk_load_appends_to_existing_table() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample("scores", &Row::new().with("points", 1i64))
            .unwrap();

        let frame = Frame::new()
            .with_column("points", vec![10i64, 20])
            .unwrap();
        db.bulk_load("scores", &frame).unwrap();
        db.bulk_load("scores", &frame).unwrap();

        let rows = db.query("scores", None, None).unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_bulk_load_empty_frame() {
        let db = DictDb::in_memory().unwrap();
        assert!(db.bulk_load("t", &Frame::new()).is_err());
    }
}
