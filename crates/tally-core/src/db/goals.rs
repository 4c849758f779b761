//! Savings goal operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_date, Database};
use crate::error::{Error, Result};
use crate::models::SavingsGoal;

fn map_goal(row: &Row<'_>) -> rusqlite::Result<SavingsGoal> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        name: row.get(1)?,
        target_amount: row.get(2)?,
        current_amount: row.get(3)?,
        target_date: row
            .get::<_, Option<String>>(4)?
            .map(|s| parse_date(&s)),
    })
}

const GOAL_COLUMNS: &str = "id, name, target_amount, current_amount, target_date";

impl Database {
    /// Insert a savings goal, returning its new id
    pub fn insert_goal(&self, goal: &SavingsGoal) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO savings_goals (name, target_amount, current_amount, target_date)
             VALUES (?, ?, ?, ?)",
            params![
                goal.name,
                goal.target_amount,
                goal.current_amount,
                goal.target_date.map(|d| d.to_string())
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List all savings goals
    pub fn list_goals(&self) -> Result<Vec<SavingsGoal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM savings_goals ORDER BY id",
            GOAL_COLUMNS
        ))?;
        let rows = stmt.query_map([], map_goal)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Get a savings goal by id
    pub fn get_goal(&self, id: i64) -> Result<Option<SavingsGoal>> {
        let conn = self.conn()?;
        let goal = conn
            .query_row(
                &format!("SELECT {} FROM savings_goals WHERE id = ?", GOAL_COLUMNS),
                params![id],
                map_goal,
            )
            .optional()?;
        Ok(goal)
    }

    /// Set a goal's accumulated amount
    pub fn update_goal_amount(&self, id: i64, current_amount: f64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE savings_goals SET current_amount = ? WHERE id = ?",
            params![current_amount, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("savings goal {}", id)));
        }
        Ok(())
    }

    /// Delete a savings goal by id
    pub fn delete_goal(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM savings_goals WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("savings goal {}", id)));
        }
        Ok(())
    }
}
