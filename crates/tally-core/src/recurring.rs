//! Recurring obligation scheduling
//!
//! Each rule is a tiny state machine whose state is its `next_due_date`.
//! A scheduler pass materializes one transaction per missed period, however
//! many periods have elapsed, and leaves every processed rule due strictly
//! in the future. A due date equal to today is processed, not skipped.

use chrono::{Months, NaiveDate};
use tracing::{debug, info};

use crate::anomaly::SpendingAverages;
use crate::db::Database;
use crate::error::Result;
use crate::models::{Frequency, NewTransaction, RecurringRule};

/// Advance a due date by one period. End-of-month dates clamp
/// (Jan 31 + 1 month = Feb 28/29).
fn advance(due: NaiveDate, frequency: Frequency) -> NaiveDate {
    let months = match frequency {
        Frequency::Monthly => Months::new(1),
        Frequency::Yearly => Months::new(12),
    };
    due.checked_add_months(months).unwrap_or(due)
}

/// Materializes due recurring rules into ledger transactions
pub struct RecurringScheduler<'a> {
    db: &'a Database,
    averages: &'a SpendingAverages,
}

impl<'a> RecurringScheduler<'a> {
    pub fn new(db: &'a Database, averages: &'a SpendingAverages) -> Self {
        Self { db, averages }
    }

    /// Process every rule due on or before `today`.
    ///
    /// For each, materialize one transaction per elapsed period (dated at
    /// the period's due date) until the rule is due strictly after today,
    /// then persist the advanced due date once. Returns the number of
    /// transactions materialized.
    pub fn run(&self, today: NaiveDate) -> Result<usize> {
        let due_rules = self.db.due_recurring_rules(today)?;
        let mut materialized = 0;

        for mut rule in due_rules {
            let before = rule.next_due_date;
            materialized += self.catch_up(&mut rule, today)?;
            self.db.update_recurring_due_date(rule.id, rule.next_due_date)?;
            debug!(
                rule = %rule.description,
                from = %before,
                to = %rule.next_due_date,
                "Advanced recurring rule"
            );
        }

        if materialized > 0 {
            info!(count = materialized, "Materialized recurring transactions");
        }
        Ok(materialized)
    }

    /// Materialize every missed period for one rule, advancing its in-memory
    /// due date past today. Does not persist the rule.
    fn catch_up(&self, rule: &mut RecurringRule, today: NaiveDate) -> Result<usize> {
        let mut count = 0;
        while rule.next_due_date <= today {
            self.db.insert_transaction(&NewTransaction::new(
                rule.next_due_date,
                rule.amount,
                rule.description.clone(),
                rule.category.clone(),
            ))?;
            self.averages.refresh(self.db)?;
            rule.next_due_date = advance(rule.next_due_date, rule.frequency);
            count += 1;
        }
        Ok(count)
    }
}
