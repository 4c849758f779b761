//! Budget threshold monitoring
//!
//! Fires an alert exactly when a transaction pushes month-to-date spend over
//! the configured limit, at most once per category per month. The month
//! stamp on the budget row is the only deduplication state, and it is the
//! caller's job to stamp it (via `mark_alerted`) after actually presenting
//! the alert.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Database;
use crate::error::Result;
use crate::models::Budget;

/// Suggested multiple of historical average spend when proposing limits
const SUGGESTION_HEADROOM: f64 = 1.10;

/// Suggested limits round to this step, and never go below it
const SUGGESTION_STEP: f64 = 50.0;

/// Months of history that feed budget suggestions
const SUGGESTION_WINDOW_MONTHS: u32 = 6;

/// A proposed budget limit derived from spending history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSuggestion {
    pub category: String,
    pub monthly_limit: f64,
}

/// Threshold-crossing detector for per-category monthly budgets
#[derive(Debug, Default)]
pub struct BudgetMonitor {
    /// Global preference: suppress all breach checks without touching
    /// stored budget state
    alerts_disabled: AtomicBool,
}

impl BudgetMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_alerts_disabled(&self, disabled: bool) {
        self.alerts_disabled.store(disabled, Ordering::Relaxed);
    }

    pub fn alerts_disabled(&self) -> bool {
        self.alerts_disabled.load(Ordering::Relaxed)
    }

    /// Return the budget for `category` only if `incoming` is the specific
    /// transaction that crosses the limit this month and no alert has been
    /// shown for this category this month.
    ///
    /// Crossing means `spent <= limit < spent + incoming`: already-over
    /// budgets stay quiet, and so does spend that lands exactly on the
    /// limit.
    pub fn check_breach(
        &self,
        db: &Database,
        category: &str,
        incoming: f64,
        today: NaiveDate,
    ) -> Result<Option<Budget>> {
        if self.alerts_disabled() {
            return Ok(None);
        }
        let budget = match db.budget_for_category(category)? {
            Some(b) => b,
            None => return Ok(None),
        };
        let current_month = today.format("%Y-%m").to_string();
        if budget.last_alerted_month.as_deref() == Some(current_month.as_str()) {
            return Ok(None);
        }
        let spent = db.spent_for_category_in_month(category, today)?;
        if spent <= budget.monthly_limit && spent + incoming > budget.monthly_limit {
            info!(
                category,
                spent,
                incoming,
                limit = budget.monthly_limit,
                "Budget breach"
            );
            return Ok(Some(budget));
        }
        Ok(None)
    }

    /// Record that a breach alert was shown this month. Call after
    /// presenting the alert, never speculatively.
    pub fn mark_alerted(&self, db: &Database, budget: &Budget, today: NaiveDate) -> Result<()> {
        let current_month = today.format("%Y-%m").to_string();
        db.update_budget_alert_month(budget.id, &current_month)
    }

    /// Propose limits for every category with spending history: 110% of the
    /// trailing 6-month monthly average, rounded to the nearest 50, floor 50.
    pub fn suggestions(&self, db: &Database, today: NaiveDate) -> Result<Vec<BudgetSuggestion>> {
        let averages =
            db.average_monthly_spending_per_category(today, SUGGESTION_WINDOW_MONTHS)?;
        let mut suggestions: Vec<BudgetSuggestion> = averages
            .into_iter()
            .map(|(category, average)| {
                let padded = average * SUGGESTION_HEADROOM;
                let rounded = (padded / SUGGESTION_STEP).round() * SUGGESTION_STEP;
                BudgetSuggestion {
                    category,
                    monthly_limit: rounded.max(SUGGESTION_STEP),
                }
            })
            .collect();
        suggestions.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTransaction;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn spend(db: &Database, date_str: &str, amount: f64, category: &str) {
        db.insert_transaction(&NewTransaction::new(
            date(date_str),
            amount,
            "spend",
            category,
        ))
        .unwrap();
    }

    #[test]
    fn alert_fires_only_at_the_crossing() {
        let db = Database::in_memory().unwrap();
        let monitor = BudgetMonitor::new();
        db.upsert_budget("Groceries", 1000.0).unwrap();
        spend(&db, "2025-03-10", 900.0, "Groceries");
        let today = date("2025-03-20");

        // 900 + 50 = 950 <= 1000: no breach
        assert!(monitor
            .check_breach(&db, "Groceries", 50.0, today)
            .unwrap()
            .is_none());

        // 900 + 150 = 1050 > 1000 and 900 <= 1000: breach
        let budget = monitor
            .check_breach(&db, "Groceries", 150.0, today)
            .unwrap()
            .expect("crossing transaction should alert");
        assert_eq!(budget.category, "Groceries");

        // Landing exactly on the limit is not a breach
        assert!(monitor
            .check_breach(&db, "Groceries", 100.0, today)
            .unwrap()
            .is_none());
    }

    #[test]
    fn already_over_budget_stays_quiet() {
        let db = Database::in_memory().unwrap();
        let monitor = BudgetMonitor::new();
        db.upsert_budget("Dining", 200.0).unwrap();
        spend(&db, "2025-03-05", 250.0, "Dining");

        // spent > limit already; this transaction is not the crossing one
        assert!(monitor
            .check_breach(&db, "Dining", 40.0, date("2025-03-20"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn mark_alerted_deduplicates_within_the_month() {
        let db = Database::in_memory().unwrap();
        let monitor = BudgetMonitor::new();
        db.upsert_budget("Groceries", 1000.0).unwrap();
        spend(&db, "2025-03-10", 900.0, "Groceries");
        let today = date("2025-03-20");

        let budget = monitor
            .check_breach(&db, "Groceries", 150.0, today)
            .unwrap()
            .unwrap();
        monitor.mark_alerted(&db, &budget, today).unwrap();

        // Same month: deduplicated
        assert!(monitor
            .check_breach(&db, "Groceries", 150.0, today)
            .unwrap()
            .is_none());

        // Next month: the stamp no longer matches, checks resume
        spend(&db, "2025-04-02", 950.0, "Groceries");
        assert!(monitor
            .check_breach(&db, "Groceries", 150.0, date("2025-04-10"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn disabled_alerts_suppress_without_touching_state() {
        let db = Database::in_memory().unwrap();
        let monitor = BudgetMonitor::new();
        db.upsert_budget("Groceries", 1000.0).unwrap();
        spend(&db, "2025-03-10", 900.0, "Groceries");
        let today = date("2025-03-20");

        monitor.set_alerts_disabled(true);
        assert!(monitor
            .check_breach(&db, "Groceries", 150.0, today)
            .unwrap()
            .is_none());

        // Re-enabling shows the breach: nothing was stamped while disabled
        monitor.set_alerts_disabled(false);
        assert!(monitor
            .check_breach(&db, "Groceries", 150.0, today)
            .unwrap()
            .is_some());
    }

    #[test]
    fn missing_budget_means_no_breach() {
        let db = Database::in_memory().unwrap();
        let monitor = BudgetMonitor::new();
        spend(&db, "2025-03-10", 900.0, "Groceries");
        assert!(monitor
            .check_breach(&db, "Groceries", 150.0, date("2025-03-20"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn suggestions_round_to_fifty_with_headroom() {
        let db = Database::in_memory().unwrap();
        let monitor = BudgetMonitor::new();
        let today = date("2025-04-15");

        // Two months of Groceries at 400 and 500: average 450, * 1.1 = 495,
        // rounds to 500
        spend(&db, "2025-02-10", 400.0, "Groceries");
        spend(&db, "2025-03-10", 500.0, "Groceries");
        // Tiny category rounds up to the floor
        spend(&db, "2025-03-12", 8.0, "Snacks");

        let suggestions = monitor.suggestions(&db, today).unwrap();
        let groceries = suggestions
            .iter()
            .find(|s| s.category == "Groceries")
            .unwrap();
        assert_eq!(groceries.monthly_limit, 500.0);
        let snacks = suggestions.iter().find(|s| s.category == "Snacks").unwrap();
        assert_eq!(snacks.monthly_limit, 50.0);
    }
}
