//! # Store Module
//!
//! Owns the single `rusqlite` connection for the life of the process and
//! provides the execution primitives the statement-building layer sits on:
//! parameterized execute/query, live schema reflection, and explicit
//! transactions. WAL mode and sane pragmas are applied at open.
//!
//! All calls are synchronous and blocking; sharing a `Store` across threads
//! is serialized by an internal mutex, everything beyond that is SQLite's
//! own locking.

use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::inference::{ColumnSpec, ColumnType};
use crate::value::{Row, Value};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Manages the database connection and provides query utilities
pub struct Store {
    conn: Mutex<Connection>,
    path: String,
}

impl Store {
    /// Opens (or creates) a database file and applies pragmas
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        info!("Opening database at: {}", path_str);

        let conn = Connection::open(&path_str)
            .map_err(|e| DbError::Database(format!("Failed to open database: {}", e)))?;
        Self::initialize_pragmas(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path_str,
        })
    }

    /// Creates an in-memory database (useful for testing)
    pub fn in_memory() -> DbResult<Self> {
        info!("Opening in-memory database");

        let conn = Connection::open_in_memory()
            .map_err(|e| DbError::Database(format!("Failed to create database: {}", e)))?;
        Self::initialize_pragmas(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: ":memory:".to_string(),
        })
    }

    fn initialize_pragmas(conn: &Connection) -> DbResult<()> {
        debug!("Setting up database pragmas");
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )
        .map_err(|e| DbError::Database(format!("Failed to set pragmas: {}", e)))?;
        Ok(())
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DbError::Database("connection mutex poisoned".to_string()))
    }

    /// Execute a write statement (INSERT, UPDATE, DELETE, CREATE) with bound values
    pub fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        let conn = self.conn()?;
        debug!("Executing: {} with {} params", sql, params.len());
        let affected = conn.execute(sql, rusqlite::params_from_iter(params.iter()))?;
        Ok(affected)
    }

    /// Execute a batch of statements without parameters
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run a query and materialize every row
    pub fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut out = Row::new();
            for (i, name) in column_names.iter().enumerate() {
                let value: rusqlite::types::Value = row.get(i)?;
                out.set(name, Value::from(value));
            }
            result.push(out);
        }
        Ok(result)
    }

    /// Rowid of the most recent successful insert on this connection
    pub fn last_insert_rowid(&self) -> DbResult<i64> {
        Ok(self.conn()?.last_insert_rowid())
    }

    /// All user table names in the database
    pub fn list_tables(&self) -> DbResult<Vec<String>> {
        let rows = self.query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            &[],
        )?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("name").and_then(|v| v.as_str()).map(String::from))
            .collect())
    }

    /// Reflects a table's live column list via `PRAGMA table_info`.
    ///
    /// Always hits the database so the result cannot drift from the actual
    /// schema. Returns an empty list for a missing table.
    pub fn table_columns(&self, table: &Ident) -> DbResult<Vec<ColumnSpec>> {
        let sql = format!("PRAGMA table_info({})", table);
        let rows = self.query(&sql, &[])?;

        let mut columns = Vec::new();
        for row in rows {
            let name = row
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let decl = row
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            if !name.is_empty() {
                columns.push(ColumnSpec::new(name, ColumnType::from_decl(&decl)));
            }
        }
        Ok(columns)
    }

    /// Run `f` inside an immediate transaction; commit on Ok, roll back on Err
    pub fn with_transaction<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> rusqlite::Result<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            // Dropping the transaction rolls it back
            Err(e) => Err(e.into()),
        }
    }

    /// Get the database file path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Check if database is in-memory
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}
