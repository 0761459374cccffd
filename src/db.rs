//! # DictDb
//!
//! The dictionary-driven layer: infers table schemas from sample rows,
//! builds the corresponding `CREATE TABLE` / `INSERT` / `UPDATE` statements,
//! and executes them against the [`Store`].
//!
//! Statement construction follows two fixed rules:
//! 1. Values are always bound through `?` placeholders.
//! 2. Identifiers are interpolated only after passing [`Ident`] validation;
//!    table and column names are a caller-trusted input, not external data.
//!
//! A process-wide cache tracks which tables have been created or reflected.
//! Column *lists* used for insert filtering are always read live from the
//! database, never from the cache, so the filter cannot drift from the
//! actual schema.

use crate::bulk::{self, Frame};
use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::inference::{infer_schema, ColumnSpec, ColumnType};
use crate::store::Store;
use crate::value::{Row, Value};
use dashmap::DashMap;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Dictionary-driven convenience layer over a single SQLite database
pub struct DictDb {
    store: Store,
    /// Created/reflected schemas keyed by table name
    schema_cache: DashMap<String, Vec<ColumnSpec>>,
}

/// Table statistics
#[derive(Debug, Clone, Serialize)]
pub struct TableStats {
    pub name: String,
    pub column_count: usize,
    pub row_count: u64,
    pub columns: Vec<ColumnSpec>,
}

impl DictDb {
    /// Opens (or creates) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Ok(Self::from_store(Store::open(path)?))
    }

    /// Backs the layer with an in-memory database
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::from_store(Store::in_memory()?))
    }

    fn from_store(store: Store) -> Self {
        Self {
            store,
            schema_cache: DashMap::new(),
        }
    }

    /// Access the underlying store for raw statements
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Creates a table whose columns are inferred from `sample`.
    ///
    /// The column list is a synthetic `id INTEGER PRIMARY KEY AUTOINCREMENT`
    /// followed by one column per sample key, in the sample's insertion
    /// order. Uses `CREATE TABLE IF NOT EXISTS`: calling this again for an
    /// existing table is a no-op and never alters columns. An empty sample
    /// yields a table with only the `id` column.
    pub fn create_table_from_sample(&self, table: &str, sample: &Row) -> DbResult<()> {
        let table = Ident::new(table)?;
        if self.schema_cache.contains_key(table.as_str()) {
            debug!("Table '{}' already created, skipping", table);
            return Ok(());
        }

        let inferred = infer_schema(sample);
        for column in &inferred {
            Ident::new(&column.name)?;
        }
        let mut column_list = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        column_list.extend(inferred.iter().map(|c| c.as_sql()));

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            table,
            column_list.join(", ")
        );
        self.store.execute(&sql, &[])?;
        info!("Created table '{}' with {} columns", table, column_list.len());

        let mut schema = vec![ColumnSpec::new("id", ColumnType::Integer)];
        schema.extend(inferred);
        self.schema_cache.insert(table.as_str().to_string(), schema);

        Ok(())
    }

    /// Live column names of a table, in definition order.
    ///
    /// Always reflected from the database catalog, never the cache. A
    /// missing table yields an empty list, not an error.
    pub fn columns(&self, table: &str) -> DbResult<Vec<String>> {
        let table = Ident::new(table)?;
        Ok(self
            .store
            .table_columns(&table)?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Inserts one row, returning its rowid.
    ///
    /// `row` is filtered against the table's live columns; unknown keys are
    /// silently dropped. This is a deliberately permissive policy, not
    /// validation. A row with no recognized keys still inserts (defaults
    /// only).
    pub fn insert_row(&self, table: &str, row: &Row) -> DbResult<i64> {
        let table = Ident::new(table)?;
        let columns = self.live_columns(&table)?;

        let retained: Vec<(&String, &Value)> = row
            .iter()
            .filter(|(k, _)| columns.iter().any(|c| c == k))
            .map(|(k, v)| (k, v))
            .collect();

        if retained.is_empty() {
            let sql = format!("INSERT INTO {} DEFAULT VALUES", table);
            self.store.execute(&sql, &[])?;
        } else {
            let names: Vec<&str> = retained.iter().map(|(k, _)| k.as_str()).collect();
            let placeholders: Vec<&str> = retained.iter().map(|_| "?").collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                names.join(", "),
                placeholders.join(", ")
            );
            let params: Vec<Value> = retained.iter().map(|(_, v)| (*v).clone()).collect();
            self.store.execute(&sql, &params)?;
        }

        let id = self.store.last_insert_rowid()?;
        debug!("Inserted row {} into '{}'", id, table);
        Ok(id)
    }

    /// Inserts a batch of rows in one all-or-nothing transaction.
    ///
    /// The same column filter as [`insert_row`](Self::insert_row) applies,
    /// computed once against the union of the batch's keys; rows missing a
    /// retained key bind NULL. Any mid-batch failure rolls back the whole
    /// batch and surfaces the error. Returns the number of rows inserted.
    pub fn insert_many(&self, table: &str, rows: &[Row]) -> DbResult<usize> {
        if rows.is_empty() {
            return Err(DbError::EmptyBatch);
        }
        let table = Ident::new(table)?;
        let columns = self.live_columns(&table)?;

        // Union of batch keys, first-seen order, filtered to live columns
        let mut retained: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if columns.iter().any(|c| c == key) && !retained.iter().any(|r| r == key) {
                    retained.push(key.to_string());
                }
            }
        }

        let count = if retained.is_empty() {
            let sql = format!("INSERT INTO {} DEFAULT VALUES", table);
            let n = rows.len();
            self.store.with_transaction(move |tx| {
                for _ in 0..n {
                    tx.execute(&sql, [])?;
                }
                Ok(n)
            })?
        } else {
            let placeholders: Vec<&str> = retained.iter().map(|_| "?").collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                retained.join(", "),
                placeholders.join(", ")
            );
            self.store.with_transaction(move |tx| {
                let mut stmt = tx.prepare(&sql)?;
                for row in rows {
                    let params: Vec<Value> = retained
                        .iter()
                        .map(|col| row.get(col).cloned().unwrap_or(Value::Null))
                        .collect();
                    stmt.execute(rusqlite::params_from_iter(params.iter()))?;
                }
                Ok(rows.len())
            })?
        };

        info!("Inserted {} rows into '{}'", count, table);
        Ok(count)
    }

    /// Runs `SELECT <columns> FROM <table> [WHERE <filter>]`.
    ///
    /// `columns` of `None` selects `*`; requested names are validated as
    /// identifiers. `filter`, when present, is concatenated into the
    /// statement verbatim: it is a trust boundary, and callers must never
    /// pass untrusted input through it. The full result set is materialized
    /// in memory.
    pub fn query(
        &self,
        table: &str,
        columns: Option<&[&str]>,
        filter: Option<&str>,
    ) -> DbResult<Vec<Row>> {
        let table = Ident::new(table)?;
        self.live_columns(&table)?;

        let column_list = match columns {
            None => "*".to_string(),
            Some(names) => {
                let idents: DbResult<Vec<Ident>> = names.iter().map(|n| Ident::new(n)).collect();
                idents?
                    .iter()
                    .map(Ident::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        };

        let mut sql = format!("SELECT {} FROM {}", column_list, table);
        if let Some(expr) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(expr);
        }

        self.store.query(&sql, &[])
    }

    /// Updates every row matching `matches` (conjunctive equality only),
    /// setting the columns in `changes`. Returns the affected row count.
    ///
    /// An empty `matches` updates all rows; an empty `changes` is rejected.
    pub fn update_rows(&self, table: &str, matches: &Row, changes: &Row) -> DbResult<usize> {
        if changes.is_empty() {
            return Err(DbError::InvalidPayload(
                "update requires at least one change".to_string(),
            ));
        }
        let table = Ident::new(table)?;
        self.live_columns(&table)?;

        let mut assignments = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        for (key, value) in changes.iter() {
            let ident = Ident::new(key)?;
            assignments.push(format!("{} = ?", ident));
            params.push(value.clone());
        }

        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        if !matches.is_empty() {
            let mut conditions = Vec::new();
            for (key, value) in matches.iter() {
                let ident = Ident::new(key)?;
                conditions.push(format!("{} = ?", ident));
                params.push(value.clone());
            }
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let affected = self
            .store
            .with_transaction(move |tx| tx.execute(&sql, rusqlite::params_from_iter(params.iter())))?;

        info!("Updated {} rows in '{}'", affected, table);
        Ok(affected)
    }

    /// Appends a [`Frame`] of tabular data in one transaction, creating the
    /// table from the frame's own column types if it does not exist yet.
    /// Returns the number of rows appended.
    pub fn bulk_load(&self, table: &str, frame: &Frame) -> DbResult<usize> {
        let table = Ident::new(table)?;
        let appended = bulk::append(&self.store, &table, frame)?;

        // Table now exists; record its reflected schema
        let schema = self.store.table_columns(&table)?;
        self.schema_cache.insert(table.as_str().to_string(), schema);

        Ok(appended)
    }

    /// Name, column specs and row count for an existing table
    pub fn table_stats(&self, table: &str) -> DbResult<TableStats> {
        let table = Ident::new(table)?;
        let columns = self.store.table_columns(&table)?;
        if columns.is_empty() {
            return Err(DbError::TableNotFound(table.as_str().to_string()));
        }
        self.schema_cache
            .insert(table.as_str().to_string(), columns.clone());

        let sql = format!("SELECT COUNT(*) AS count FROM {}", table);
        let rows = self.store.query(&sql, &[])?;
        let row_count = rows
            .first()
            .and_then(|r| r.get("count"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        Ok(TableStats {
            name: table.as_str().to_string(),
            column_count: columns.len(),
            row_count: row_count as u64,
            columns,
        })
    }

    /// All user table names in the database
    pub fn list_tables(&self) -> DbResult<Vec<String>> {
        self.store.list_tables()
    }

    /// Table names recorded in the created/reflected cache
    pub fn known_tables(&self) -> Vec<String> {
        self.schema_cache.iter().map(|r| r.key().clone()).collect()
    }

    /// Drops the created/reflected cache (useful for testing)
    pub fn clear_cache(&self) {
        self.schema_cache.clear();
    }

    /// Live column names, failing with `TableNotFound` for a missing table
    fn live_columns(&self, table: &Ident) -> DbResult<Vec<String>> {
        let columns: Vec<String> = self
            .store
            .table_columns(table)?
            .into_iter()
            .map(|c| c.name)
            .collect();
        if columns.is_empty() {
            return Err(DbError::TableNotFound(table.as_str().to_string()));
        }
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_sample() -> Row {
        Row::new()
            .with("name", "Cool Project")
            .with("begin_date", "2021-01-01")
            .with("end_date", "2022-01-01")
            .with("budget", 50000.00)
    }

    #[test]
    fn test_create_then_reflect() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample("projects", &project_sample())
            .unwrap();

        let columns = db.columns("projects").unwrap();
        assert_eq!(
            columns,
            vec!["id", "name", "begin_date", "end_date", "budget"]
        );

        let stats = db.table_stats("projects").unwrap();
        let types: Vec<ColumnType> = stats.columns.iter().map(|c| c.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Integer,
                ColumnType::Text,
                ColumnType::Text,
                ColumnType::Text,
                ColumnType::Real
            ]
        );
    }

    #[test]
    fn test_create_is_idempotent() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample("projects", &project_sample())
            .unwrap();
        db.create_table_from_sample("projects", &project_sample())
            .unwrap();

        // A different sample for the same name must not alter columns
        db.clear_cache();
        db.create_table_from_sample("projects", &Row::new().with("other", 1i64))
            .unwrap();

        let columns = db.columns("projects").unwrap();
        assert_eq!(
            columns,
            vec!["id", "name", "begin_date", "end_date", "budget"]
        );
    }

    #[test]
    fn test_empty_sample_creates_id_only_table() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample("bare", &Row::new()).unwrap();
        assert_eq!(db.columns("bare").unwrap(), vec!["id"]);
    }

    #[test]
    fn test_insert_row_filters_unknown_keys() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample("projects", &project_sample())
            .unwrap();

        let row = Row::new()
            .with("name", "Side Project")
            .with("owner", "nobody") // not a column
            .with("budget", 1000.0);
        let id = db.insert_row("projects", &row).unwrap();
        assert_eq!(id, 1);

        let rows = db.query("projects", None, None).unwrap();
        assert_eq!(rows.len(), 1);
        let got = &rows[0];
        assert_eq!(got.get("name").unwrap().as_str(), Some("Side Project"));
        assert_eq!(got.get("budget").unwrap().as_f64(), Some(1000.0));
        assert!(got.get("begin_date").unwrap().is_null());
        assert!(got.get("owner").is_none());
    }

    #[test]
    fn test_insert_row_end_to_end_example() {
        let db = DictDb::in_memory().unwrap();
        let sample = project_sample();
        db.create_table_from_sample("projects", &sample).unwrap();

        let id = db.insert_row("projects", &sample).unwrap();
        assert_eq!(id, 1);

        let rows = db.query("projects", None, None).unwrap();
        assert_eq!(rows.len(), 1);
        let got = &rows[0];
        assert_eq!(got.get("id").unwrap().as_i64(), Some(1));
        assert_eq!(got.get("name").unwrap().as_str(), Some("Cool Project"));
        assert_eq!(got.get("begin_date").unwrap().as_str(), Some("2021-01-01"));
        assert_eq!(got.get("end_date").unwrap().as_str(), Some("2022-01-01"));
        assert_eq!(got.get("budget").unwrap().as_f64(), Some(50000.0));
    }

    #[test]
    fn test_insert_row_unknown_table() {
        let db = DictDb::in_memory().unwrap();
        let err = db
            .insert_row("missing", &Row::new().with("a", 1i64))
            .unwrap_err();
        assert!(matches!(err, DbError::TableNotFound(_)));
    }

    #[test]
    fn test_insert_many_all_or_nothing() {
        let db = DictDb::in_memory().unwrap();
        // UNIQUE constraint lets us inject a failure mid-batch
        db.store()
            .execute(
                "CREATE TABLE items (id INTEGER PRIMARY KEY AUTOINCREMENT, sku TEXT UNIQUE)",
                &[],
            )
            .unwrap();

        let rows = vec![
            Row::new().with("sku", "a"),
            Row::new().with("sku", "b"),
            Row::new().with("sku", "a"), // duplicate, fails on row 3 of 4
            Row::new().with("sku", "c"),
        ];
        assert!(db.insert_many("items", &rows).is_err());

        // No rows from the batch are visible
        let visible = db.query("items", None, None).unwrap();
        assert!(visible.is_empty());
    }

    #[test]
    fn test_insert_many_success_and_null_fill() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample(
            "measurements",
            &Row::new().with("sensor", "s1").with("reading", 0.0),
        )
        .unwrap();

        let rows = vec![
            Row::new().with("sensor", "s1").with("reading", 1.5),
            Row::new().with("sensor", "s2"), // reading binds NULL
        ];
        assert_eq!(db.insert_many("measurements", &rows).unwrap(), 2);

        let got = db
            .query("measurements", None, Some("sensor = 's2'"))
            .unwrap();
        assert_eq!(got.len(), 1);
        assert!(got[0].get("reading").unwrap().is_null());
    }

    #[test]
    fn test_insert_many_empty_batch() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample("t", &Row::new().with("a", 1i64))
            .unwrap();
        assert!(matches!(
            db.insert_many("t", &[]).unwrap_err(),
            DbError::EmptyBatch
        ));
    }

    #[test]
    fn test_query_filter_and_columns() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample("projects", &project_sample())
            .unwrap();
        db.insert_row("projects", &project_sample()).unwrap();

        // No match is empty, not an error
        let none = db.query("projects", None, Some("id = 999")).unwrap();
        assert!(none.is_empty());

        let some = db
            .query("projects", Some(&["name", "budget"]), Some("id = 1"))
            .unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].len(), 2);

        // Selected column names are still validated
        assert!(db
            .query("projects", Some(&["name; DROP TABLE projects"]), None)
            .is_err());
    }

    #[test]
    fn test_update_rows() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample("projects", &project_sample())
            .unwrap();
        db.insert_row("projects", &project_sample()).unwrap();

        let affected = db
            .update_rows(
                "projects",
                &Row::new().with("id", 1i64),
                &Row::new().with("budget", 200000.0),
            )
            .unwrap();
        assert_eq!(affected, 1);

        let rows = db.query("projects", None, Some("id=1")).unwrap();
        assert_eq!(rows[0].get("budget").unwrap().as_f64(), Some(200000.0));

        // Matching nothing affects nothing
        let affected = db
            .update_rows(
                "projects",
                &Row::new().with("id", 42i64),
                &Row::new().with("budget", 0.0),
            )
            .unwrap();
        assert_eq!(affected, 0);

        // Empty change set is rejected
        assert!(db
            .update_rows("projects", &Row::new().with("id", 1i64), &Row::new())
            .is_err());
    }

    #[test]
    fn test_table_stats_and_listing() {
        let db = DictDb::in_memory().unwrap();
        db.create_table_from_sample("projects", &project_sample())
            .unwrap();
        db.insert_row("projects", &project_sample()).unwrap();
        db.insert_row("projects", &project_sample()).unwrap();

        let stats = db.table_stats("projects").unwrap();
        assert_eq!(stats.row_count, 2);
        assert_eq!(stats.column_count, 5);

        assert_eq!(db.list_tables().unwrap(), vec!["projects".to_string()]);
        assert!(db.known_tables().contains(&"projects".to_string()));

        assert!(matches!(
            db.table_stats("missing").unwrap_err(),
            DbError::TableNotFound(_)
        ));
    }

    #[test]
    fn test_identifier_rejection() {
        let db = DictDb::in_memory().unwrap();
        assert!(db
            .create_table_from_sample("bad name", &Row::new())
            .is_err());
        assert!(db
            .create_table_from_sample("t", &Row::new().with("bad key", 1i64))
            .is_err());
    }
}
