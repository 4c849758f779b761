//! Tally Core Library
//!
//! Shared analytics for the Tally personal finance ledger:
//! - Database access and migrations for transactions, budgets, rules, goals
//! - Naive Bayes category classification with a user-correction log
//! - Nearest-neighbor expense forecasting with monthly budget comparison
//! - Recurring obligation scheduling with catch-up materialization
//! - Budget breach monitoring with per-month alert deduplication
//! - Spending anomaly detection against cached per-category averages
//! - Behavioral persona clustering over transaction history

pub mod anomaly;
pub mod budget;
pub mod classifier;
pub mod corpus;
pub mod db;
pub mod engine;
pub mod error;
pub mod export;
pub mod forecast;
pub mod jobs;
pub mod models;
pub mod persona;
pub mod recurring;

pub use anomaly::{AnomalyConfig, AnomalyDetector, SpendingAverages};
pub use budget::{BudgetMonitor, BudgetSuggestion};
pub use classifier::{ClassifierHandle, ClassifierModel, Prediction};
pub use corpus::{Corpus, TrainingExample};
pub use db::Database;
pub use engine::{Engine, TrainingOutcome};
pub use error::{Error, Result};
pub use export::{export_transactions, import_transactions};
pub use forecast::{CategoryCodes, ForecastReport, ForecastSession, MonthlyForecast, SpendForecaster};
pub use jobs::JobHandle;
pub use models::{
    Budget, ClusterSummary, Frequency, NewTransaction, Persona, RecurringRule, SavingsGoal,
    Transaction,
};
pub use persona::{PersonaClusterer, PersonaConfig};
pub use recurring::RecurringScheduler;
