//! Domain models for Tally

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A ledger transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    /// Positive = expense, negative = refund/income
    pub amount: f64,
    pub description: String,
    pub category: String,
}

/// A new transaction to be inserted (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
    pub category: String,
}

impl NewTransaction {
    pub fn new(
        date: NaiveDate,
        amount: f64,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount,
            description: description.into(),
            category: category.into(),
        }
    }

    /// Validate user-supplied fields before insertion
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::Error;
        if !self.amount.is_finite() {
            return Err(Error::Validation("amount must be a number".into()));
        }
        if self.description.trim().is_empty() {
            return Err(Error::Validation("description is required".into()));
        }
        if self.category.trim().is_empty() {
            return Err(Error::Validation("category is required".into()));
        }
        Ok(())
    }
}

/// A per-category monthly budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    /// Unique per category
    pub category: String,
    pub monthly_limit: f64,
    /// Month ("YYYY-MM") in which a breach alert was last shown.
    /// Sole deduplication mechanism for budget alerts.
    pub last_alerted_month: Option<String>,
}

/// Recurring obligation billing frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring obligation that materializes transactions when due
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: i64,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub frequency: Frequency,
    /// Advanced only forward, only by the scheduler
    pub next_due_date: NaiveDate,
}

/// One user override of a suggested category.
/// Appended to the corrections log; never edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub description: String,
    pub category: String,
}

/// A savings goal with accumulated contributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: i64,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: Option<NaiveDate>,
}

/// A behavioral persona built from clustered transaction history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub title: String,
    pub clusters: Vec<ClusterSummary>,
}

/// Human-readable summary of one behavioral cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// e.g. "High-Value Weekend Spending"
    pub label: String,
    pub transaction_count: usize,
    pub avg_amount: f64,
    /// "Weekday" or "Weekend"
    pub time_focus: TimeFocus,
    /// Top categories by transaction count, best first (at most 2)
    pub top_categories: Vec<String>,
}

/// Whether a cluster's activity centers on weekdays or the weekend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFocus {
    Weekday,
    Weekend,
}

impl TimeFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekday => "Weekday",
            Self::Weekend => "Weekend",
        }
    }
}

impl std::fmt::Display for TimeFocus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
