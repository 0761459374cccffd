//! # dictdb demo
//!
//! Explicit end-to-end example: create a table from a sample row, insert,
//! bulk-insert, query and update. Runs only when invoked, never as a side
//! effect of using the library.
//!
//! ```bash
//! # Run against a file database
//! dictdb --db mydatabase.db
//!
//! # In-memory mode
//! dictdb --memory
//! ```

use std::env;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dictdb::{DictDb, Frame, Row};

/// CLI arguments
struct Args {
    /// Database file path
    db_path: String,
    /// Use in-memory database
    in_memory: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            db_path: "dictdb.db".to_string(),
            in_memory: false,
        }
    }
}

impl Args {
    fn from_env() -> Self {
        let mut args = Args::default();
        let env_args: Vec<String> = env::args().collect();
        let mut i = 1;

        while i < env_args.len() {
            match env_args[i].as_str() {
                "--db" | "-d" => {
                    if i + 1 < env_args.len() {
                        args.db_path = env_args[i + 1].clone();
                        i += 1;
                    }
                }
                "--memory" | "-m" => {
                    args.in_memory = true;
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        // Environment variable overrides
        if let Ok(db) = env::var("DICTDB_PATH") {
            args.db_path = db;
        }
        if env::var("DICTDB_MEMORY").is_ok() {
            args.in_memory = true;
        }

        args
    }
}

fn print_help() {
    println!(
        r#"
dictdb - dictionary-driven SQLite demo

USAGE:
    dictdb [OPTIONS]

OPTIONS:
    -d, --db <PATH>      Database file path [default: dictdb.db]
    -m, --memory         Use in-memory database
        --help           Print this help message

ENVIRONMENT VARIABLES:
    DICTDB_PATH          Database file path
    DICTDB_MEMORY        Set to use in-memory database
"#
    );
}

fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let args = Args::from_env();

    let db = if args.in_memory {
        info!("Using in-memory database");
        DictDb::in_memory()?
    } else {
        info!("Using database file: {}", args.db_path);
        DictDb::open(&args.db_path)?
    };

    // Create a table from a sample row; types are inferred per value
    let project = Row::new()
        .with("name", "Cool Project")
        .with("begin_date", "2021-01-01")
        .with("end_date", "2022-01-01")
        .with("budget", 50000.00);
    db.create_table_from_sample("projects", &project)?;

    let id = db.insert_row("projects", &project)?;
    info!("Inserted project with id {}", id);

    // Batch insert is all-or-nothing
    let batch = vec![
        Row::new()
            .with("name", "Follow-up")
            .with("begin_date", "2022-02-01")
            .with("budget", 12000.00),
        Row::new()
            .with("name", "Maintenance")
            .with("begin_date", "2022-03-01")
            .with("budget", 8000.00),
    ];
    db.insert_many("projects", &batch)?;

    // The filter expression is trusted caller input, never external data
    for row in db.query("projects", None, Some("budget >= 10000"))? {
        println!("{}", row.to_json());
    }

    let affected = db.update_rows(
        "projects",
        &Row::new().with("id", id),
        &Row::new().with("budget", 200000.00),
    )?;
    info!("Updated {} row(s)", affected);

    // Bulk-load a tabular frame; the table is created from the frame itself
    let cities = Frame::new()
        .with_column("city", vec!["Oslo", "Lima", "Osaka"])?
        .with_column("population", vec![709_000i64, 10_092_000, 2_691_000])?;
    db.bulk_load("cities", &cities)?;

    let stats = db.table_stats("projects")?;
    info!(
        "Table '{}': {} columns, {} rows",
        stats.name, stats.column_count, stats.row_count
    );

    Ok(())
}
