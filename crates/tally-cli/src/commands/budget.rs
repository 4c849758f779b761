//! Budget commands

use anyhow::Result;
use tally_core::Engine;

pub fn cmd_budget_list(engine: &Engine) -> Result<()> {
    let budgets = engine.db().list_budgets()?;
    if budgets.is_empty() {
        println!("No budgets configured. Try 'tally budget suggest'.");
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    println!("{:>5}  {:<16}  {:>10}  {:>10}  ALERTED", "ID", "CATEGORY", "LIMIT", "SPENT");
    for budget in &budgets {
        let spent = engine
            .db()
            .spent_for_category_in_month(&budget.category, today)?;
        println!(
            "{:>5}  {:<16}  {:>10.2}  {:>10.2}  {}",
            budget.id,
            budget.category,
            budget.monthly_limit,
            spent,
            budget.last_alerted_month.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub fn cmd_budget_set(engine: &Engine, category: &str, limit: f64) -> Result<()> {
    let id = engine.db().upsert_budget(category, limit)?;
    println!("✅ Budget #{}: {} capped at {:.2}/month", id, category, limit);
    Ok(())
}

pub fn cmd_budget_check(engine: &Engine, category: &str, amount: f64) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let spent = engine.db().spent_for_category_in_month(category, today)?;
    match engine.monitor().check_breach(engine.db(), category, amount, today)? {
        Some(budget) => {
            println!(
                "🚨 {:.2} would push {} from {:.2} past its {:.2} limit",
                amount, category, spent, budget.monthly_limit
            );
            engine.monitor().mark_alerted(engine.db(), &budget, today)?;
        }
        None => {
            println!("✅ No breach for {:.2} in {} (spent {:.2} so far)", amount, category, spent);
        }
    }
    Ok(())
}

pub fn cmd_budget_suggest(engine: &Engine) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let suggestions = engine.monitor().suggestions(engine.db(), today)?;
    if suggestions.is_empty() {
        println!("No spending history to base suggestions on.");
        return Ok(());
    }

    println!("💡 Suggested monthly limits (110% of your 6-month average):");
    for s in &suggestions {
        println!("   {:<16} {:>10.2}", s.category, s.monthly_limit);
    }
    println!();
    println!("Accept one with 'tally budget set <category> <limit>'.");
    Ok(())
}

pub fn cmd_budget_delete(engine: &Engine, id: i64) -> Result<()> {
    engine.db().delete_budget(id)?;
    println!("🗑️  Deleted budget #{}", id);
    Ok(())
}
