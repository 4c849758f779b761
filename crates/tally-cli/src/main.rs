//! Tally CLI - Personal finance ledger analytics
//!
//! Usage:
//!   tally init                          Initialize database
//!   tally add --amount 42 --description "Weekly shop"
//!   tally forecast                      Forecast next month vs budgets
//!   tally recurring process             Materialize due recurring rules
//!   tally persona                       Cluster spending behavior

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Add {
            date,
            amount,
            description,
            category,
        } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_add(&engine, date.as_deref(), amount, &description, category.as_deref())
        }
        Commands::List { limit } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_list(&engine, limit)
        }
        Commands::Delete { id } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_delete(&engine, id)
        }
        Commands::Recategorize { id, category } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_recategorize(&engine, id, &category)
        }
        Commands::Classify { description, top } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_classify(&engine, &description, top)
        }
        Commands::Train => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_train(&engine).await
        }
        Commands::Forecast { month, json } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_forecast(&engine, month.as_deref(), json).await
        }
        Commands::Recurring { action } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            match action {
                None | Some(RecurringAction::List) => commands::cmd_recurring_list(&engine),
                Some(RecurringAction::Add {
                    description,
                    amount,
                    category,
                    frequency,
                    due,
                }) => commands::cmd_recurring_add(
                    &engine,
                    &description,
                    amount,
                    &category,
                    &frequency,
                    &due,
                ),
                Some(RecurringAction::Process) => commands::cmd_recurring_process(&engine),
                Some(RecurringAction::Delete { id }) => {
                    commands::cmd_recurring_delete(&engine, id)
                }
            }
        }
        Commands::Budget { action } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            match action {
                None | Some(BudgetAction::List) => commands::cmd_budget_list(&engine),
                Some(BudgetAction::Set { category, limit }) => {
                    commands::cmd_budget_set(&engine, &category, limit)
                }
                Some(BudgetAction::Check { category, amount }) => {
                    commands::cmd_budget_check(&engine, &category, amount)
                }
                Some(BudgetAction::Suggest) => commands::cmd_budget_suggest(&engine),
                Some(BudgetAction::Delete { id }) => commands::cmd_budget_delete(&engine, id),
            }
        }
        Commands::Persona => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_persona(&engine).await
        }
        Commands::Goals { action } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            match action {
                None | Some(GoalsAction::List) => commands::cmd_goals_list(&engine),
                Some(GoalsAction::Add { name, target, date }) => {
                    commands::cmd_goals_add(&engine, &name, target, date.as_deref())
                }
                Some(GoalsAction::Contribute { id, amount }) => {
                    commands::cmd_goals_contribute(&engine, id, amount)
                }
                Some(GoalsAction::Delete { id }) => commands::cmd_goals_delete(&engine, id),
            }
        }
        Commands::Export { output } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_export(&engine, &output)
        }
        Commands::Import { file } => {
            let engine = commands::open_engine(&cli.db, cli.data_dir.as_deref())?;
            commands::cmd_import(&engine, &file)
        }
    }
}
