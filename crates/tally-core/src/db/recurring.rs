//! Recurring rule operations

use chrono::NaiveDate;
use rusqlite::{params, Row};
use std::str::FromStr;

use super::{parse_date, Database};
use crate::error::{Error, Result};
use crate::models::{Frequency, RecurringRule};

fn map_rule(row: &Row<'_>) -> rusqlite::Result<RecurringRule> {
    let frequency: String = row.get(4)?;
    Ok(RecurringRule {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        frequency: Frequency::from_str(&frequency).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?,
        next_due_date: parse_date(&row.get::<_, String>(5)?),
    })
}

const RULE_COLUMNS: &str = "id, description, amount, category, frequency, next_due_date";

impl Database {
    /// List all recurring rules, soonest due first
    pub fn list_recurring_rules(&self) -> Result<Vec<RecurringRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM recurring_rules ORDER BY next_due_date ASC, id ASC",
            RULE_COLUMNS
        ))?;
        let rows = stmt.query_map([], map_rule)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Rules whose next due date is on or before `today`
    pub fn due_recurring_rules(&self, today: NaiveDate) -> Result<Vec<RecurringRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM recurring_rules WHERE next_due_date <= ? ORDER BY next_due_date ASC, id ASC",
            RULE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![today.to_string()], map_rule)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Insert a recurring rule, returning its new id
    pub fn insert_recurring_rule(
        &self,
        description: &str,
        amount: f64,
        category: &str,
        frequency: Frequency,
        next_due_date: NaiveDate,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO recurring_rules (description, amount, category, frequency, next_due_date)
             VALUES (?, ?, ?, ?, ?)",
            params![
                description,
                amount,
                category,
                frequency.as_str(),
                next_due_date.to_string()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Persist a rule's advanced due date (called once per scheduler pass)
    pub fn update_recurring_due_date(&self, id: i64, next_due_date: NaiveDate) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE recurring_rules SET next_due_date = ? WHERE id = ?",
            params![next_due_date.to_string(), id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("recurring rule {}", id)));
        }
        Ok(())
    }

    /// Delete a recurring rule by id
    pub fn delete_recurring_rule(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM recurring_rules WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("recurring rule {}", id)));
        }
        Ok(())
    }
}
