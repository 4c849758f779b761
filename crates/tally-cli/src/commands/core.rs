//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_engine` - Shared utility to open the database and engine
//! - `cmd_init` - Initialize the database
//! - date argument parsing helpers

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tally_core::{corpus::Corpus, db::Database, Engine};

/// Open the database and wrap it in an engine.
///
/// When `data_dir` is given, the corpus, corrections log, and classifier
/// artifact live under it; otherwise the platform data directory is used.
pub fn open_engine(db_path: &Path, data_dir: Option<&Path>) -> Result<Engine> {
    let db = Database::new(&db_path.to_string_lossy()).context("Failed to open database")?;
    match data_dir {
        Some(dir) => {
            let corpus = Corpus::new(dir.join("corpus.csv"), dir.join("corrections.csv"));
            Engine::new(db, corpus, dir.join("classifier.json"))
                .context("Failed to start engine")
        }
        None => Engine::open(db).context("Failed to start engine"),
    }
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    Database::new(&db_path.to_string_lossy()).context("Failed to initialize database")?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a transaction:  tally add --amount 42.50 --description \"Weekly shop\"");
    println!("  2. Set a budget:       tally budget set Groceries 400");
    println!("  3. Forecast spending:  tally forecast");

    Ok(())
}

/// Parse a YYYY-MM-DD argument
pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", s))
}

/// Parse an optional YYYY-MM-DD argument, defaulting to today
pub fn parse_date_or_today(s: Option<&str>) -> Result<NaiveDate> {
    match s {
        Some(s) => parse_date_arg(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
