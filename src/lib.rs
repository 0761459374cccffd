//! # dictdb
//!
//! A small convenience layer over SQLite: describe a table by handing over a
//! sample row, and dictdb infers the schema, creates the table, and builds
//! the parameterized insert/update/query statements for you.
//!
//! ## Core Components
//!
//! - **DictDb**: schema inference + statement building, the public surface
//! - **Store**: the single `rusqlite` connection, pragmas, transactions
//! - **Row / Value**: ordered dictionaries over a closed set of SQL values
//! - **Ident**: validated identifier type; the only thing ever interpolated
//!   into statement text
//! - **Frame**: tabular dataset for bulk loads
//!
//! ## Quick Start
//!
//! ```no_run
//! use dictdb::{DictDb, Row};
//!
//! # fn main() -> dictdb::DbResult<()> {
//! let db = DictDb::open("mydatabase.db")?;
//!
//! let project = Row::new()
//!     .with("name", "Cool Project")
//!     .with("begin_date", "2021-01-01")
//!     .with("end_date", "2022-01-01")
//!     .with("budget", 50000.00);
//!
//! db.create_table_from_sample("projects", &project)?;
//! let id = db.insert_row("projects", &project)?;
//! let rows = db.query("projects", None, Some("budget > 10000"))?;
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod db;
pub mod error;
pub mod ident;
pub mod inference;
pub mod store;
pub mod value;

pub use bulk::Frame;
pub use db::{DictDb, TableStats};
pub use error::{DbError, DbResult};
pub use ident::Ident;
pub use inference::{infer_type, ColumnSpec, ColumnType};
pub use store::Store;
pub use value::{Row, Value};
