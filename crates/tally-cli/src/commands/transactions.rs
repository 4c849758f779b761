//! Transaction commands: add, list, delete, recategorize, export, import

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tally_core::{
    export::{export_transactions, import_transactions},
    models::NewTransaction,
    Engine,
};

use super::core::parse_date_or_today;

/// Add a transaction. With no category given, the classifier suggests one;
/// classification and anomaly checks degrade gracefully and never block the
/// add, while a budget breach is reported (and stamped) after the insert.
pub fn cmd_add(
    engine: &Engine,
    date: Option<&str>,
    amount: f64,
    description: &str,
    category: Option<&str>,
) -> Result<()> {
    let date = parse_date_or_today(date)?;

    let category = match category {
        Some(c) => c.to_string(),
        None => {
            let prediction = engine.classify(description);
            if prediction.confidence > 0.0 {
                println!(
                    "💡 Suggested category: {} ({:.0}% confident)",
                    prediction.category,
                    prediction.confidence * 100.0
                );
            } else {
                println!("💡 No classifier model loaded; filing under \"Other\"");
                println!("   (run 'tally train' once you have a corpus)");
            }
            prediction.category
        }
    };

    if engine.anomaly_detector().is_anomalous(&category, amount) {
        println!(
            "⚠️  {:.2} is far above your usual {} spending",
            amount, category
        );
    }

    let breach = engine
        .monitor()
        .check_breach(engine.db(), &category, amount, date)?;

    let id = engine.add_transaction(&NewTransaction::new(date, amount, description, &category))?;
    println!("✅ Added transaction #{} ({} / {:.2} / {})", id, date, amount, category);

    if let Some(budget) = breach {
        println!(
            "🚨 This pushes {} past its monthly limit of {:.2}",
            budget.category, budget.monthly_limit
        );
        engine.monitor().mark_alerted(engine.db(), &budget, date)?;
    }

    Ok(())
}

pub fn cmd_list(engine: &Engine, limit: i64) -> Result<()> {
    let transactions = engine.db().recent_transactions(limit)?;
    if transactions.is_empty() {
        println!("No transactions yet. Add one with 'tally add'.");
        return Ok(());
    }

    println!("{:>5}  {:<10}  {:>10}  {:<16}  DESCRIPTION", "ID", "DATE", "AMOUNT", "CATEGORY");
    for tx in &transactions {
        println!(
            "{:>5}  {}  {:>10.2}  {:<16}  {}",
            tx.id, tx.date, tx.amount, tx.category, tx.description
        );
    }
    Ok(())
}

pub fn cmd_delete(engine: &Engine, id: i64) -> Result<()> {
    engine.delete_transaction(id)?;
    println!("🗑️  Deleted transaction #{}", id);
    Ok(())
}

/// Correct a transaction's category and append the override to the
/// corrections log so the next retrain learns from it
pub fn cmd_recategorize(engine: &Engine, id: i64, category: &str) -> Result<()> {
    let mut tx = engine
        .db()
        .get_transaction(id)?
        .ok_or_else(|| anyhow!("No transaction with id {}", id))?;

    let old = tx.category.clone();
    tx.category = category.to_string();
    engine.update_transaction(&tx)?;
    engine
        .log_correction(&tx.description, category)
        .context("Failed to log correction")?;

    println!("✏️  Transaction #{}: {} → {}", id, old, category);
    println!("   Logged for the next 'tally train'");
    Ok(())
}

pub fn cmd_export(engine: &Engine, output: &Path) -> Result<()> {
    let count = export_transactions(engine, output)?;
    println!("📦 Exported {} transactions to {}", count, output.display());
    Ok(())
}

pub fn cmd_import(engine: &Engine, file: &Path) -> Result<()> {
    let count = import_transactions(engine, file)?;
    println!("📥 Imported {} transactions from {}", count, file.display());
    Ok(())
}
