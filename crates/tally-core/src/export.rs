//! Transaction CSV export and import
//!
//! The export format is a headered four-column CSV
//! (`date,amount,description,category`, dates as YYYY-MM-DD). Importing the
//! file back through the ledger preserves amount, description, and category
//! exactly, and dates parse back to the same calendar day.

use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::models::NewTransaction;

const HEADERS: [&str; 4] = ["date", "amount", "description", "category"];

/// Write every transaction to a CSV file, newest first
pub fn export_transactions(engine: &Engine, path: &Path) -> Result<usize> {
    let transactions = engine.db().list_transactions()?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;
    for tx in &transactions {
        writer.write_record([
            tx.date.format("%Y-%m-%d").to_string(),
            tx.amount.to_string(),
            tx.description.clone(),
            tx.category.clone(),
        ])?;
    }
    writer.flush()?;
    info!(count = transactions.len(), path = %path.display(), "Exported transactions");
    Ok(transactions.len())
}

/// Insert every row of a previously exported CSV into the ledger.
///
/// Goes through the engine so each insert refreshes the averages cache.
/// Returns the number of imported rows.
pub fn import_transactions(engine: &Engine, path: &Path) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut imported = 0;

    for record in reader.records() {
        let record = record?;
        let date_field = record
            .get(0)
            .ok_or_else(|| Error::Validation("missing date column".into()))?;
        let amount_field = record
            .get(1)
            .ok_or_else(|| Error::Validation("missing amount column".into()))?;
        let description = record
            .get(2)
            .ok_or_else(|| Error::Validation("missing description column".into()))?;
        let category = record
            .get(3)
            .ok_or_else(|| Error::Validation("missing category column".into()))?;

        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d")
            .map_err(|_| Error::Validation(format!("invalid date: {}", date_field)))?;
        let amount: f64 = amount_field
            .parse()
            .map_err(|_| Error::Validation(format!("invalid amount: {}", amount_field)))?;

        engine.add_transaction(&NewTransaction::new(date, amount, description, category))?;
        imported += 1;
    }

    info!(count = imported, path = %path.display(), "Imported transactions");
    Ok(imported)
}
