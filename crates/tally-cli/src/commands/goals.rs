//! Savings goal commands

use anyhow::Result;
use tally_core::{models::SavingsGoal, Engine};

use super::core::parse_date_arg;

pub fn cmd_goals_list(engine: &Engine) -> Result<()> {
    let goals = engine.db().list_goals()?;
    if goals.is_empty() {
        println!("No savings goals. Add one with 'tally goals add'.");
        return Ok(());
    }

    println!("{:>5}  {:<20}  {:>10}  {:>10}  {:>5}  TARGET DATE", "ID", "NAME", "SAVED", "TARGET", "%");
    for goal in &goals {
        let pct = if goal.target_amount > 0.0 {
            (goal.current_amount / goal.target_amount * 100.0).min(100.0)
        } else {
            0.0
        };
        println!(
            "{:>5}  {:<20}  {:>10.2}  {:>10.2}  {:>4.0}%  {}",
            goal.id,
            goal.name,
            goal.current_amount,
            goal.target_amount,
            pct,
            goal.target_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

pub fn cmd_goals_add(engine: &Engine, name: &str, target: f64, date: Option<&str>) -> Result<()> {
    let target_date = date.map(parse_date_arg).transpose()?;
    let id = engine.db().insert_goal(&SavingsGoal {
        id: 0,
        name: name.to_string(),
        target_amount: target,
        current_amount: 0.0,
        target_date,
    })?;
    println!("✅ Goal #{}: {} ({:.2})", id, name, target);
    Ok(())
}

pub fn cmd_goals_contribute(engine: &Engine, id: i64, amount: f64) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let goal = engine.contribute_to_goal(id, amount, today)?;
    println!(
        "💰 {} now at {:.2} of {:.2}",
        goal.name, goal.current_amount, goal.target_amount
    );
    println!("   Contribution booked as a Savings transaction.");
    Ok(())
}

pub fn cmd_goals_delete(engine: &Engine, id: i64) -> Result<()> {
    engine.db().delete_goal(id)?;
    println!("🗑️  Deleted goal #{}", id);
    Ok(())
}
