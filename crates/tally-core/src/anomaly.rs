//! Spend anomaly detection against cached per-category averages
//!
//! The averages cache is recomputed in full on every ledger mutation rather
//! than maintained incrementally; at single-user dataset sizes the O(n)
//! recompute is cheaper than getting incremental maintenance wrong. Reads
//! between a mutation and its refresh may observe the previous snapshot;
//! that window is an accepted limitation of the cache contract.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::db::Database;
use crate::error::Result;

/// Amounts below this floor are never flagged, regardless of the average
pub const MINIMUM_ANOMALY_AMOUNT: f64 = 500.0;

/// An amount is anomalous above `average * ANOMALY_MULTIPLIER`
pub const ANOMALY_MULTIPLIER: f64 = 4.0;

/// Anomaly thresholds, overridable per detector
#[derive(Debug, Clone, Copy)]
pub struct AnomalyConfig {
    /// Minimum amount worth flagging at all
    pub minimum_amount: f64,
    /// Multiple of the category average that marks an outlier
    pub multiplier: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            minimum_amount: MINIMUM_ANOMALY_AMOUNT,
            multiplier: ANOMALY_MULTIPLIER,
        }
    }
}

/// Process-wide cache of mean transaction amount per category.
///
/// Refresh-on-write is the only update path; concurrent refreshes serialize
/// on the write lock and the last writer wins, which is safe because a
/// refresh is idempotent for a given ledger state.
#[derive(Debug, Default)]
pub struct SpendingAverages {
    inner: RwLock<HashMap<String, f64>>,
}

impl SpendingAverages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the full category -> average map from the ledger
    pub fn refresh(&self, db: &Database) -> Result<()> {
        let averages = db.category_average_spending()?;
        debug!(categories = averages.len(), "Refreshed spending averages");
        let mut inner = self.inner.write().expect("averages cache poisoned");
        *inner = averages;
        Ok(())
    }

    /// Cached average for a category, if one is on file
    pub fn average_for(&self, category: &str) -> Option<f64> {
        self.inner
            .read()
            .expect("averages cache poisoned")
            .get(category)
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("averages cache poisoned").is_empty()
    }
}

/// Flags single expenses far above the category's historical average
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    averages: Arc<SpendingAverages>,
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(averages: Arc<SpendingAverages>) -> Self {
        Self {
            averages,
            config: AnomalyConfig::default(),
        }
    }

    pub fn with_config(averages: Arc<SpendingAverages>, config: AnomalyConfig) -> Self {
        Self { averages, config }
    }

    /// True only when the amount clears the fixed floor AND a nonzero
    /// average exists for the category AND the amount exceeds the average
    /// times the multiplier. No average on file means never anomalous.
    pub fn is_anomalous(&self, category: &str, amount: f64) -> bool {
        if amount < self.config.minimum_amount {
            return false;
        }
        let average = match self.averages.average_for(category) {
            Some(avg) => avg,
            None => return false,
        };
        if average == 0.0 {
            return false;
        }
        amount > average * self.config.multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTransaction;
    use chrono::NaiveDate;

    fn seeded_averages(db: &Database) -> Arc<SpendingAverages> {
        let averages = Arc::new(SpendingAverages::new());
        averages.refresh(db).unwrap();
        averages
    }

    fn seed(db: &Database, amounts: &[f64], category: &str) {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        for (i, amount) in amounts.iter().enumerate() {
            db.insert_transaction(&NewTransaction::new(
                date,
                *amount,
                format!("purchase {}", i),
                category,
            ))
            .unwrap();
        }
    }

    #[test]
    fn small_amounts_never_flag() {
        let db = Database::in_memory().unwrap();
        seed(&db, &[10.0, 20.0, 30.0], "Food");
        let detector = AnomalyDetector::new(seeded_averages(&db));

        // 499.99 is 25x the ~20 average but below the floor
        assert!(!detector.is_anomalous("Food", 499.99));
    }

    #[test]
    fn amounts_above_multiplier_flag() {
        let db = Database::in_memory().unwrap();
        seed(&db, &[150.0, 150.0, 150.0], "Electronics");
        let detector = AnomalyDetector::new(seeded_averages(&db));

        // average 150, 4x = 600
        assert!(!detector.is_anomalous("Electronics", 600.0));
        assert!(detector.is_anomalous("Electronics", 600.01));
    }

    #[test]
    fn unknown_or_zero_average_never_flags() {
        let db = Database::in_memory().unwrap();
        seed(&db, &[100.0, -100.0], "Refunds"); // averages to zero
        let detector = AnomalyDetector::new(seeded_averages(&db));

        assert!(!detector.is_anomalous("NeverSeen", 10_000.0));
        assert!(!detector.is_anomalous("Refunds", 10_000.0));
    }

    #[test]
    fn refresh_tracks_ledger_changes() {
        let db = Database::in_memory().unwrap();
        seed(&db, &[100.0], "Travel");
        let averages = seeded_averages(&db);
        let detector = AnomalyDetector::new(averages.clone());
        assert!(detector.is_anomalous("Travel", 500.0));

        // A large legitimate purchase raises the average after refresh
        seed(&db, &[2000.0], "Travel");
        averages.refresh(&db).unwrap();
        assert!(!detector.is_anomalous("Travel", 500.0));
    }
}
