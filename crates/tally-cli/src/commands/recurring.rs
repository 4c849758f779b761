//! Recurring rule commands

use anyhow::{anyhow, Result};
use tally_core::{models::Frequency, Engine};

use super::core::parse_date_arg;

pub fn cmd_recurring_list(engine: &Engine) -> Result<()> {
    let rules = engine.db().list_recurring_rules()?;
    if rules.is_empty() {
        println!("No recurring rules. Add one with 'tally recurring add'.");
        return Ok(());
    }

    println!("{:>5}  {:<10}  {:>10}  {:<9}  {:<16}  DESCRIPTION", "ID", "NEXT DUE", "AMOUNT", "FREQ", "CATEGORY");
    for rule in &rules {
        println!(
            "{:>5}  {}  {:>10.2}  {:<9}  {:<16}  {}",
            rule.id, rule.next_due_date, rule.amount, rule.frequency, rule.category, rule.description
        );
    }
    Ok(())
}

pub fn cmd_recurring_add(
    engine: &Engine,
    description: &str,
    amount: f64,
    category: &str,
    frequency: &str,
    due: &str,
) -> Result<()> {
    let frequency: Frequency = frequency.parse().map_err(|e: String| anyhow!(e))?;
    let due = parse_date_arg(due)?;

    let id = engine
        .db()
        .insert_recurring_rule(description, amount, category, frequency, due)?;
    println!("✅ Added {} rule #{} due {}", frequency, id, due);
    Ok(())
}

pub fn cmd_recurring_process(engine: &Engine) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let count = engine.process_recurring(today)?;
    if count == 0 {
        println!("Nothing due through {}.", today);
    } else {
        println!("✅ Materialized {} recurring transaction(s)", count);
    }
    Ok(())
}

pub fn cmd_recurring_delete(engine: &Engine, id: i64) -> Result<()> {
    engine.db().delete_recurring_rule(id)?;
    println!("🗑️  Deleted recurring rule #{}", id);
    Ok(())
}
