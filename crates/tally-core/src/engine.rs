//! Runtime engine tying the store to the analytics
//!
//! The engine owns the pieces with process lifetime: the database handle,
//! the spending-averages cache (recomputed on every ledger mutation), the
//! hot-swappable classifier slot, the corrections log, and the budget
//! monitor. Components that are pure functions of the ledger (forecaster,
//! persona clusterer, scheduler) are constructed per call.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::anomaly::{AnomalyDetector, SpendingAverages};
use crate::budget::BudgetMonitor;
use crate::classifier::{ClassifierHandle, ClassifierModel, Prediction};
use crate::corpus::Corpus;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::forecast::{ForecastReport, ForecastSession};
use crate::jobs::{self, JobHandle};
use crate::models::{NewTransaction, Persona, SavingsGoal, Transaction};
use crate::persona::PersonaClusterer;
use crate::recurring::RecurringScheduler;

/// Category used for savings-goal contribution transactions
const SAVINGS_CATEGORY: &str = "Savings";

/// Result summary of a classifier retrain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub examples: usize,
    pub labels: usize,
}

/// Long-lived runtime state for one ledger
pub struct Engine {
    db: Database,
    averages: Arc<SpendingAverages>,
    classifier: Arc<ClassifierHandle>,
    corpus: Corpus,
    monitor: BudgetMonitor,
    artifact_path: PathBuf,
}

impl Engine {
    /// Open an engine over a database, loading any persisted classifier
    /// artifact (fail-safe) and priming the averages cache.
    pub fn new(db: Database, corpus: Corpus, artifact_path: impl Into<PathBuf>) -> Result<Self> {
        let artifact_path = artifact_path.into();
        let averages = Arc::new(SpendingAverages::new());
        averages.refresh(&db)?;

        let classifier = Arc::new(ClassifierHandle::new());
        if artifact_path.exists() {
            classifier.load(&artifact_path);
        }

        Ok(Self {
            db,
            averages,
            classifier,
            corpus,
            monitor: BudgetMonitor::new(),
            artifact_path,
        })
    }

    /// Engine rooted in the platform data directory
    pub fn open(db: Database) -> Result<Self> {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tally");
        Self::new(db, Corpus::in_data_dir(), dir.join("classifier.json"))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn averages(&self) -> &Arc<SpendingAverages> {
        &self.averages
    }

    pub fn classifier(&self) -> &ClassifierHandle {
        &self.classifier
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn monitor(&self) -> &BudgetMonitor {
        &self.monitor
    }

    // ----- Ledger mutations (every one refreshes the averages cache) -----

    /// Insert a transaction and recompute the averages cache
    pub fn add_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let id = self.db.insert_transaction(tx)?;
        self.averages.refresh(&self.db)?;
        Ok(id)
    }

    /// Correct a transaction in place and recompute the averages cache
    pub fn update_transaction(&self, tx: &Transaction) -> Result<()> {
        self.db.update_transaction(tx)?;
        self.averages.refresh(&self.db)
    }

    /// Delete a transaction and recompute the averages cache
    pub fn delete_transaction(&self, id: i64) -> Result<()> {
        self.db.delete_transaction(id)?;
        self.averages.refresh(&self.db)
    }

    // ----- Classification -----

    /// Suggest a category for a description (degrades to "Other" at zero
    /// confidence when no model is loaded)
    pub fn classify(&self, description: &str) -> Prediction {
        self.classifier.predict(description)
    }

    pub fn classify_top_k(&self, description: &str, k: usize) -> Vec<Prediction> {
        self.classifier.predict_top_k(description, k)
    }

    /// Record a user override of a suggested category.
    /// The corrections log feeds every subsequent retrain.
    pub fn log_correction(&self, description: &str, category: &str) -> Result<()> {
        self.corpus.append_correction(description, category)
    }

    /// Retrain the classifier off-thread from the base corpus plus the
    /// corrections log, persist the artifact atomically, and swap the live
    /// model. Readers see the old model until the swap completes.
    pub fn retrain_classifier(&self) -> JobHandle<TrainingOutcome> {
        let corpus = self.corpus.clone();
        let classifier = Arc::clone(&self.classifier);
        let artifact_path = self.artifact_path.clone();

        jobs::spawn("retrain-classifier", move || {
            let examples = corpus.load_examples()?;
            let model = ClassifierModel::train(&examples)?;
            let outcome = TrainingOutcome {
                examples: examples.len(),
                labels: model.labels().len(),
            };
            model.save_to(&artifact_path)?;
            classifier.install(model);
            info!(
                examples = outcome.examples,
                labels = outcome.labels,
                "Classifier retrained"
            );
            Ok(outcome)
        })
    }

    // ----- Anomaly detection -----

    pub fn anomaly_detector(&self) -> AnomalyDetector {
        AnomalyDetector::new(Arc::clone(&self.averages))
    }

    // ----- Scheduling -----

    /// One scheduler pass over all due recurring rules
    pub fn process_recurring(&self, today: NaiveDate) -> Result<usize> {
        RecurringScheduler::new(&self.db, &self.averages).run(today)
    }

    // ----- Forecasting -----

    /// Train a forecast session and produce the report for a month,
    /// off-thread. `today` anchors the prior-month comparison.
    pub fn forecast_report(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> JobHandle<ForecastReport> {
        let db = self.db.clone();
        jobs::spawn("forecast", move || {
            let session = ForecastSession::build(&db)?;
            session.report(&db, year, month, today)
        })
    }

    // ----- Persona -----

    /// Cluster the full history into a persona, off-thread.
    /// `None` when there is not enough history.
    pub fn generate_persona(&self) -> JobHandle<Option<Persona>> {
        let db = self.db.clone();
        jobs::spawn("persona", move || {
            let transactions = db.list_transactions()?;
            Ok(PersonaClusterer::new().generate(&transactions))
        })
    }

    // ----- Savings goals -----

    /// Add to a goal and book the contribution as a "Savings" transaction
    pub fn contribute_to_goal(
        &self,
        goal_id: i64,
        amount: f64,
        today: NaiveDate,
    ) -> Result<SavingsGoal> {
        let goal = self
            .db
            .get_goal(goal_id)?
            .ok_or_else(|| Error::NotFound(format!("savings goal {}", goal_id)))?;
        let new_amount = goal.current_amount + amount;
        self.db.update_goal_amount(goal_id, new_amount)?;
        self.add_transaction(&NewTransaction::new(
            today,
            amount,
            format!("Contribution to goal: {}", goal.name),
            SAVINGS_CATEGORY,
        ))?;
        Ok(SavingsGoal {
            current_amount: new_amount,
            ..goal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;

    fn scratch_engine(dir: &tempfile::TempDir) -> Engine {
        let db = Database::in_memory().unwrap();
        let corpus = Corpus::new(
            dir.path().join("corpus.csv"),
            dir.path().join("corrections.csv"),
        );
        Engine::new(db, corpus, dir.path().join("classifier.json")).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn mutations_refresh_the_averages_cache() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(&dir);

        let id = engine
            .add_transaction(&NewTransaction::new(date("2025-03-01"), 100.0, "Shop", "Groceries"))
            .unwrap();
        assert_eq!(engine.averages().average_for("Groceries"), Some(100.0));

        let mut tx = engine.db().get_transaction(id).unwrap().unwrap();
        tx.amount = 60.0;
        engine.update_transaction(&tx).unwrap();
        assert_eq!(engine.averages().average_for("Groceries"), Some(60.0));

        engine.delete_transaction(id).unwrap();
        assert_eq!(engine.averages().average_for("Groceries"), None);
    }

    #[tokio::test]
    async fn retrain_swaps_model_and_persists_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(&dir);

        // No model yet: degraded prediction
        assert_eq!(engine.classify("pizza palace").category, "Other");

        std::fs::write(
            engine.corpus().base_path(),
            "Description,Category\npizza palace,Food\nmetro pass,Transport\n",
        )
        .unwrap();
        engine.log_correction("corner pharmacy", "Health").unwrap();

        let outcome = engine.retrain_classifier().join().await.unwrap();
        assert_eq!(outcome.examples, 3);
        assert_eq!(outcome.labels, 3);

        assert_eq!(engine.classify("pizza palace").category, "Food");
        // Correction contributed a label
        assert_eq!(engine.classify("corner pharmacy").category, "Health");

        // A fresh engine over the same artifact starts loaded
        let db = Database::in_memory().unwrap();
        let engine2 = Engine::new(
            db,
            Corpus::new(
                dir.path().join("corpus.csv"),
                dir.path().join("corrections.csv"),
            ),
            dir.path().join("classifier.json"),
        )
        .unwrap();
        assert!(engine2.classifier().is_loaded());
    }

    #[tokio::test]
    async fn retrain_on_empty_corpus_reports_insufficient_data() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(&dir);
        assert!(matches!(
            engine.retrain_classifier().join().await,
            Err(Error::InsufficientData(_))
        ));
        // The live (absent) model is untouched
        assert!(!engine.classifier().is_loaded());
    }

    #[test]
    fn goal_contribution_books_a_savings_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(&dir);

        let goal_id = engine
            .db()
            .insert_goal(&SavingsGoal {
                id: 0,
                name: "Vacation".to_string(),
                target_amount: 1000.0,
                current_amount: 100.0,
                target_date: None,
            })
            .unwrap();

        let updated = engine
            .contribute_to_goal(goal_id, 50.0, date("2025-03-10"))
            .unwrap();
        assert_eq!(updated.current_amount, 150.0);

        let transactions = engine.db().list_transactions().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].category, "Savings");
        assert_eq!(transactions[0].amount, 50.0);
        // The contribution refreshed the cache too
        assert_eq!(engine.averages().average_for("Savings"), Some(50.0));
    }

    #[test]
    fn contribution_to_missing_goal_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(&dir);
        assert!(matches!(
            engine.contribute_to_goal(99, 50.0, date("2025-03-10")),
            Err(Error::NotFound(_))
        ));
    }
}
