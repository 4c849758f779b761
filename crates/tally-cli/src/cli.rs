//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Personal finance ledger analytics
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Categorize, schedule, monitor, forecast, and cluster your spending", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Data directory for the model artifact and corrections log
    /// (defaults to the platform data dir, e.g. ~/.local/share/tally)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Add a transaction (suggests a category when none is given)
    Add {
        /// Transaction date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Amount (positive = expense)
        #[arg(short, long)]
        amount: f64,

        /// Free-text description
        #[arg(long)]
        description: String,

        /// Category (classified from the description if omitted)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List recent transactions
    List {
        /// Maximum number to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
    },

    /// Correct a transaction's category (also feeds classifier retraining)
    Recategorize {
        /// Transaction ID
        id: i64,
        /// The correct category
        category: String,
    },

    /// Suggest categories for a description
    Classify {
        /// Free-text description
        description: String,

        /// Show the top N candidates instead of just the best
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Retrain the classifier from the corpus and corrections log
    Train,

    /// Forecast next month's spending against budgets
    Forecast {
        /// Target month (YYYY-MM, defaults to next month)
        #[arg(short, long)]
        month: Option<String>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage recurring rules (list, add, process, delete)
    Recurring {
        #[command(subcommand)]
        action: Option<RecurringAction>,
    },

    /// Manage budgets (list, set, check, suggest, delete)
    Budget {
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },

    /// Cluster spending history into a behavioral persona
    Persona,

    /// Manage savings goals (list, add, contribute, delete)
    Goals {
        #[command(subcommand)]
        action: Option<GoalsAction>,
    },

    /// Export transactions to CSV
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import transactions from a previously exported CSV
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum RecurringAction {
    /// List rules, soonest due first
    List,

    /// Add a rule
    Add {
        /// Description for materialized transactions
        description: String,

        /// Amount per occurrence
        #[arg(short, long)]
        amount: f64,

        /// Category for materialized transactions
        #[arg(short, long)]
        category: String,

        /// monthly or yearly
        #[arg(short, long, default_value = "monthly")]
        frequency: String,

        /// First due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,
    },

    /// Materialize everything due through today
    Process,

    /// Delete a rule
    Delete {
        /// Rule ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// List configured budgets
    List,

    /// Create or update the budget for a category
    Set {
        /// Category the budget applies to
        category: String,
        /// Monthly limit
        limit: f64,
    },

    /// Check whether an incoming amount would breach a budget
    Check {
        /// Category of the incoming transaction
        category: String,
        /// Incoming amount
        amount: f64,
    },

    /// Suggest limits from spending history
    Suggest,

    /// Delete a budget
    Delete {
        /// Budget ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum GoalsAction {
    /// List goals with progress
    List,

    /// Add a goal
    Add {
        /// Goal name
        name: String,
        /// Target amount
        #[arg(short, long)]
        target: f64,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Contribute to a goal (books a "Savings" transaction)
    Contribute {
        /// Goal ID
        id: i64,
        /// Contribution amount
        amount: f64,
    },

    /// Delete a goal
    Delete {
        /// Goal ID
        id: i64,
    },
}
