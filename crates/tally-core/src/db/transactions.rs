//! Transaction operations and aggregate queries

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashMap;

use super::{month_bounds, parse_date, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction};

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        date: parse_date(&row.get::<_, String>(1)?),
        amount: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
    })
}

const TX_COLUMNS: &str = "id, date, amount, description, category";

impl Database {
    /// Insert a transaction, returning its new id
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        tx.validate()?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transactions (date, amount, description, category) VALUES (?, ?, ?, ?)",
            params![tx.date.to_string(), tx.amount, tx.description, tx.category],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Update an existing transaction in full
    pub fn update_transaction(&self, tx: &Transaction) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE transactions SET date = ?, amount = ?, description = ?, category = ? WHERE id = ?",
            params![
                tx.date.to_string(),
                tx.amount,
                tx.description,
                tx.category,
                tx.id
            ],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("transaction {}", tx.id)));
        }
        Ok(())
    }

    /// Delete a transaction by id
    pub fn delete_transaction(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    /// Get a single transaction by id
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("SELECT {} FROM transactions WHERE id = ?", TX_COLUMNS),
                params![id],
                map_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// List all transactions, newest first by (date, id)
    pub fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY date DESC, id DESC",
            TX_COLUMNS
        ))?;
        let rows = stmt.query_map([], map_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The most recent transactions, newest first
    pub fn recent_transactions(&self, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY date DESC, id DESC LIMIT ?",
            TX_COLUMNS
        ))?;
        let rows = stmt.query_map(params![limit], map_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Transactions within a date range (inclusive), newest first
    pub fn transactions_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE date BETWEEN ? AND ? ORDER BY date DESC, id DESC",
            TX_COLUMNS
        ))?;
        let rows = stmt.query_map(params![from.to_string(), to.to_string()], map_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Transactions in a category, newest first
    pub fn transactions_for_category(&self, category: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE category = ? ORDER BY date DESC, id DESC",
            TX_COLUMNS
        ))?;
        let rows = stmt.query_map(params![category], map_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct categories, alphabetical
    pub fn distinct_categories(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT category FROM transactions ORDER BY category")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct categories ordered by the date they first appeared in the
    /// ledger (ties broken alphabetically). Feeds the forecaster's dense
    /// category-code assignment, which must be stable within a session.
    pub fn categories_by_first_seen(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, MIN(date) AS first_seen FROM transactions
             GROUP BY category ORDER BY first_seen, category",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Per-category mean transaction amount across all history.
    /// Source of truth for the spending-averages cache.
    pub fn category_average_spending(&self) -> Result<HashMap<String, f64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, AVG(amount) FROM transactions GROUP BY category",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?;
        let mut map = HashMap::new();
        for row in rows {
            let (category, avg) = row?;
            map.insert(category, avg);
        }
        Ok(map)
    }

    /// Per-category average of monthly totals over the trailing window.
    /// Feeds budget suggestions.
    pub fn average_monthly_spending_per_category(
        &self,
        today: NaiveDate,
        months_back: u32,
    ) -> Result<HashMap<String, f64>> {
        let since = today
            .checked_sub_months(chrono::Months::new(months_back))
            .unwrap_or(today);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, AVG(monthly_total) FROM (
                 SELECT category, strftime('%Y-%m', date) AS month, SUM(amount) AS monthly_total
                 FROM transactions WHERE date >= ?
                 GROUP BY category, month
             ) GROUP BY category",
        )?;
        let rows = stmt.query_map(params![since.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (category, avg) = row?;
            map.insert(category, avg);
        }
        Ok(map)
    }

    /// Category totals for one calendar month
    pub fn category_totals_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<HashMap<String, f64>> {
        let (start, end) = month_bounds(year, month);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, SUM(amount) FROM transactions
             WHERE date BETWEEN ? AND ? GROUP BY category",
        )?;
        let rows = stmt.query_map(params![start.to_string(), end.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (category, total) = row?;
            map.insert(category, total);
        }
        Ok(map)
    }

    /// Total spend for one calendar month
    pub fn total_for_month(&self, year: i32, month: u32) -> Result<f64> {
        let (start, end) = month_bounds(year, month);
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE date BETWEEN ? AND ?",
            params![start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Monthly totals for a year, keyed "YYYY-MM"
    pub fn monthly_totals_for_year(&self, year: i32) -> Result<HashMap<String, f64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT strftime('%Y-%m', date) AS month, SUM(amount) FROM transactions
             WHERE strftime('%Y', date) = ? GROUP BY month",
        )?;
        let rows = stmt.query_map(params![format!("{:04}", year)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (month, total) = row?;
            map.insert(month, total);
        }
        Ok(map)
    }

    /// Month-to-date spend for a category in the month containing `today`
    pub fn spent_for_category_in_month(&self, category: &str, today: NaiveDate) -> Result<f64> {
        let (start, end) = month_bounds(today.year(), today.month());
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions
             WHERE category = ? AND date BETWEEN ? AND ?",
            params![category, start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}
