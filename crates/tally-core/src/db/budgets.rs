//! Budget operations

use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::{Error, Result};
use crate::models::Budget;

fn map_budget(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: row.get(0)?,
        category: row.get(1)?,
        monthly_limit: row.get(2)?,
        last_alerted_month: row.get(3)?,
    })
}

const BUDGET_COLUMNS: &str = "id, category, monthly_limit, last_alerted_month";

impl Database {
    /// List all budgets, by category
    pub fn list_budgets(&self) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM budgets ORDER BY category",
            BUDGET_COLUMNS
        ))?;
        let rows = stmt.query_map([], map_budget)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Get the budget configured for a category, if any
    pub fn budget_for_category(&self, category: &str) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let budget = conn
            .query_row(
                &format!("SELECT {} FROM budgets WHERE category = ?", BUDGET_COLUMNS),
                params![category],
                map_budget,
            )
            .optional()?;
        Ok(budget)
    }

    /// Create or update the budget for a category (category is unique)
    pub fn upsert_budget(&self, category: &str, monthly_limit: f64) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO budgets (category, monthly_limit) VALUES (?, ?)
             ON CONFLICT(category) DO UPDATE SET monthly_limit = excluded.monthly_limit",
            params![category, monthly_limit],
        )?;
        let id: i64 = conn.query_row(
            "SELECT id FROM budgets WHERE category = ?",
            params![category],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Change a budget's monthly limit
    pub fn update_budget_limit(&self, id: i64, monthly_limit: f64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE budgets SET monthly_limit = ? WHERE id = ?",
            params![monthly_limit, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("budget {}", id)));
        }
        Ok(())
    }

    /// Record the month ("YYYY-MM") a breach alert was shown for this budget
    pub fn update_budget_alert_month(&self, id: i64, month: &str) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE budgets SET last_alerted_month = ? WHERE id = ?",
            params![month, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("budget {}", id)));
        }
        Ok(())
    }

    /// Delete a budget by id
    pub fn delete_budget(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM budgets WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("budget {}", id)));
        }
        Ok(())
    }
}
