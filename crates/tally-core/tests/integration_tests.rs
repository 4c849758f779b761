//! Integration tests for tally-core
//!
//! These tests exercise full workflows across the store and the analytics:
//! add → classify → monitor → schedule → forecast → cluster → export.

use chrono::NaiveDate;

use tally_core::{
    classifier::CONFIDENCE_FLOOR,
    corpus::Corpus,
    db::Database,
    export::{export_transactions, import_transactions},
    forecast::ForecastSession,
    models::{Frequency, NewTransaction},
    Engine, Error, PersonaClusterer, RecurringScheduler, SpendingAverages,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Three months of varied spending: enough for the forecaster (>= 10
/// samples) and the persona clusterer (>= 30 transactions), with a clear
/// split between cheap weekday staples and large weekend purchases.
fn seed_sample_ledger(db: &Database) {
    let rows: &[(&str, f64, &str, &str)] = &[
        ("2025-01-04", 1800.0, "New laptop", "Electronics"),
        ("2025-01-06", 42.0, "Weekly shop", "Groceries"),
        ("2025-01-07", 12.0, "Lunch special", "Food"),
        ("2025-01-11", 950.0, "Weekend getaway", "Travel"),
        ("2025-01-13", 38.0, "Weekly shop", "Groceries"),
        ("2025-01-15", 60.0, "Electricity bill", "Bills"),
        ("2025-01-18", 2100.0, "Camera body", "Electronics"),
        ("2025-01-20", 45.0, "Weekly shop", "Groceries"),
        ("2025-01-22", 15.0, "Pizza night", "Food"),
        ("2025-01-27", 40.0, "Weekly shop", "Groceries"),
        ("2025-02-01", 1200.0, "Rent", "Housing"),
        ("2025-02-03", 44.0, "Weekly shop", "Groceries"),
        ("2025-02-05", 18.0, "Ramen bar", "Food"),
        ("2025-02-08", 1750.0, "Monitor upgrade", "Electronics"),
        ("2025-02-10", 41.0, "Weekly shop", "Groceries"),
        ("2025-02-12", 62.0, "Electricity bill", "Bills"),
        ("2025-02-15", 880.0, "Flight booking", "Travel"),
        ("2025-02-17", 39.0, "Weekly shop", "Groceries"),
        ("2025-02-19", 14.0, "Lunch special", "Food"),
        ("2025-02-24", 43.0, "Weekly shop", "Groceries"),
        ("2025-03-01", 1200.0, "Rent", "Housing"),
        ("2025-03-03", 46.0, "Weekly shop", "Groceries"),
        ("2025-03-05", 16.0, "Pizza night", "Food"),
        ("2025-03-08", 1950.0, "Sound system", "Electronics"),
        ("2025-03-10", 40.0, "Weekly shop", "Groceries"),
        ("2025-03-12", 58.0, "Electricity bill", "Bills"),
        ("2025-03-15", 990.0, "Hotel stay", "Travel"),
        ("2025-03-17", 42.0, "Weekly shop", "Groceries"),
        ("2025-03-19", 13.0, "Lunch special", "Food"),
        ("2025-03-24", 44.0, "Weekly shop", "Groceries"),
        ("2025-03-29", 2050.0, "Lens kit", "Electronics"),
        ("2025-03-31", 61.0, "Internet bill", "Bills"),
    ];
    for (d, amount, description, category) in rows {
        db.insert_transaction(&NewTransaction::new(date(d), *amount, *description, *category))
            .unwrap();
    }
}

fn scratch_engine(dir: &tempfile::TempDir) -> Engine {
    let db = Database::in_memory().unwrap();
    let corpus = Corpus::new(
        dir.path().join("corpus.csv"),
        dir.path().join("corrections.csv"),
    );
    Engine::new(db, corpus, dir.path().join("classifier.json")).unwrap()
}

// =============================================================================
// Classifier workflow
// =============================================================================

#[tokio::test]
async fn classify_correct_retrain_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let engine = scratch_engine(&dir);

    std::fs::write(
        engine.corpus().base_path(),
        "Description,Category\n\
         pizza palace downtown,Food\n\
         family restaurant dinner,Food\n\
         city metro pass,Transport\n\
         uber airport ride,Transport\n\
         corner pharmacy refill,Health\n",
    )
    .unwrap();

    engine.retrain_classifier().join().await.unwrap();

    // Echoed training descriptions come back with their own label, at
    // confidence no lower than a disjoint, dissimilar description scores
    let echo = engine.classify("pizza palace downtown");
    assert_eq!(echo.category, "Food");
    let unrelated = engine.classify("xyzzy plugh");
    assert!(echo.confidence >= unrelated.confidence);

    // Top-k respects the floor, ordering, and k
    let top = engine.classify_top_k("dinner at the pizza restaurant", 3);
    assert!(top.len() <= 3);
    for pair in top.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
    for p in &top {
        assert!(p.confidence >= CONFIDENCE_FLOOR);
    }

    // A correction introduces a brand-new label on the next retrain
    engine.log_correction("monthly yoga studio", "Fitness").unwrap();
    engine.retrain_classifier().join().await.unwrap();
    assert_eq!(engine.classify("monthly yoga studio").category, "Fitness");
}

// =============================================================================
// Recurring scheduling + budget monitoring
// =============================================================================

#[test]
fn scheduler_catches_up_and_feeds_budget_monitor() {
    let dir = tempfile::tempdir().unwrap();
    let engine = scratch_engine(&dir);

    engine
        .db()
        .insert_recurring_rule("Rent", 1200.0, "Housing", Frequency::Monthly, date("2025-01-01"))
        .unwrap();
    let today = date("2025-03-15");

    // Jan, Feb, Mar due dates are all caught up in one pass
    let materialized = engine.process_recurring(today).unwrap();
    assert_eq!(materialized, 3);
    let rule = &engine.db().list_recurring_rules().unwrap()[0];
    assert!(rule.next_due_date > today);

    // The materialized March rent is visible to month-to-date spend
    engine.db().upsert_budget("Housing", 1500.0).unwrap();
    let monitor = engine.monitor();

    // 1200 + 200 = 1400 <= 1500: no breach
    assert!(monitor
        .check_breach(engine.db(), "Housing", 200.0, today)
        .unwrap()
        .is_none());

    // 1200 + 400 = 1600 > 1500: the crossing transaction alerts
    let budget = monitor
        .check_breach(engine.db(), "Housing", 400.0, today)
        .unwrap()
        .expect("crossing should alert");
    monitor.mark_alerted(engine.db(), &budget, today).unwrap();

    // Deduplicated for the rest of the month
    assert!(monitor
        .check_breach(engine.db(), "Housing", 400.0, today)
        .unwrap()
        .is_none());
}

// =============================================================================
// Anomaly detection over the live cache
// =============================================================================

#[test]
fn anomaly_detection_tracks_ledger_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let engine = scratch_engine(&dir);
    seed_sample_ledger(engine.db());
    engine.averages().refresh(engine.db()).unwrap();

    let detector = engine.anomaly_detector();

    // Groceries average ~42: a 500 grocery run is 10x the average
    assert!(detector.is_anomalous("Groceries", 500.0));
    // Below the fixed floor nothing flags, however extreme
    assert!(!detector.is_anomalous("Groceries", 499.0));
    // No history for the category: cold-start safe
    assert!(!detector.is_anomalous("Jewelry", 9999.0));

    // Corrections to the ledger move the average
    let id = engine
        .add_transaction(&NewTransaction::new(date("2025-03-30"), 5000.0, "Catering", "Groceries"))
        .unwrap();
    assert!(!detector.is_anomalous("Groceries", 500.0));
    engine.delete_transaction(id).unwrap();
    assert!(detector.is_anomalous("Groceries", 500.0));
}

// =============================================================================
// Forecasting
// =============================================================================

#[test]
fn forecast_session_produces_a_comparable_report() {
    let db = Database::in_memory().unwrap();
    seed_sample_ledger(&db);
    db.upsert_budget("Electronics", 100.0).unwrap();
    db.upsert_budget("Groceries", 100000.0).unwrap();

    let session = ForecastSession::build(&db).unwrap();
    // Forecasting April from mid-March: the comparison baseline is February
    let report = session.report(&db, 2025, 4, date("2025-03-31")).unwrap();

    // Only positive category totals are reported, largest first
    assert!(!report.forecast.categories.is_empty());
    for c in &report.forecast.categories {
        assert!(c.amount > 0.0);
    }
    for pair in report.forecast.categories.windows(2) {
        assert!(pair[0].amount >= pair[1].amount);
    }
    let sum: f64 = report.forecast.categories.iter().map(|c| c.amount).sum();
    assert!((sum - report.forecast.total).abs() < 1e-6);

    // February actual is the comparison baseline (month before "today")
    let feb_actual = db.total_for_month(2025, 2).unwrap();
    assert_eq!(report.last_month_actual, feb_actual);
    assert!((report.difference - (report.forecast.total - feb_actual)).abs() < 1e-6);

    // The 100-limit Electronics budget must show as a projected breach;
    // the enormous Groceries budget must not
    assert!(report.breaches.iter().any(|b| b.category == "Electronics"));
    assert!(!report.breaches.iter().any(|b| b.category == "Groceries"));
    for b in &report.breaches {
        assert!((b.overspend - (b.projected - b.monthly_limit)).abs() < 1e-6);
    }

    // Same session, same inputs: deterministic
    let again = session.forecast_month(2025, 4);
    assert_eq!(again.total, report.forecast.total);
}

#[test]
fn forecast_needs_ten_samples() {
    let db = Database::in_memory().unwrap();
    for i in 0..9 {
        db.insert_transaction(&NewTransaction::new(
            date("2025-03-01"),
            10.0 + i as f64,
            "shop",
            "Groceries",
        ))
        .unwrap();
    }
    assert!(matches!(
        ForecastSession::build(&db),
        Err(Error::InsufficientData(_))
    ));
}

// =============================================================================
// Persona clustering
// =============================================================================

#[tokio::test]
async fn persona_generation_over_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let engine = scratch_engine(&dir);

    // Under 30 transactions: soft failure
    assert!(engine.generate_persona().join().await.unwrap().is_none());

    seed_sample_ledger(engine.db());
    let persona = engine
        .generate_persona()
        .join()
        .await
        .unwrap()
        .expect("enough history");

    assert!(!persona.clusters.is_empty());
    assert!(persona.clusters.len() <= 3);
    let total: usize = persona.clusters.iter().map(|c| c.transaction_count).sum();
    assert_eq!(total, engine.db().list_transactions().unwrap().len());
    for cluster in &persona.clusters {
        assert!(cluster.transaction_count > 0);
        assert!(!cluster.top_categories.is_empty());
        assert!(cluster.top_categories.len() <= 2);
    }
}

#[test]
fn persona_is_reproducible() {
    let db = Database::in_memory().unwrap();
    seed_sample_ledger(&db);
    let transactions = db.list_transactions().unwrap();

    let clusterer = PersonaClusterer::new();
    let a = clusterer.generate(&transactions).unwrap();
    let b = clusterer.generate(&transactions).unwrap();
    let counts_a: Vec<usize> = a.clusters.iter().map(|c| c.transaction_count).collect();
    let counts_b: Vec<usize> = b.clusters.iter().map(|c| c.transaction_count).collect();
    assert_eq!(counts_a, counts_b);
}

// =============================================================================
// Export / import round trip
// =============================================================================

#[test]
fn export_import_round_trip_preserves_fields() {
    let dir = tempfile::tempdir().unwrap();
    let source = scratch_engine(&dir);
    seed_sample_ledger(source.db());

    let path = dir.path().join("ledger.csv");
    let exported = export_transactions(&source, &path).unwrap();
    assert_eq!(exported, 32);

    let target = scratch_engine(&dir);
    let imported = import_transactions(&target, &path).unwrap();
    assert_eq!(imported, exported);

    let mut original = source.db().list_transactions().unwrap();
    let mut round_tripped = target.db().list_transactions().unwrap();
    original.sort_by(|a, b| (a.date, a.amount.to_bits()).cmp(&(b.date, b.amount.to_bits())));
    round_tripped.sort_by(|a, b| (a.date, a.amount.to_bits()).cmp(&(b.date, b.amount.to_bits())));
    for (a, b) in original.iter().zip(round_tripped.iter()) {
        assert_eq!(a.date, b.date);
        assert_eq!(a.amount, b.amount);
        assert_eq!(a.description, b.description);
        assert_eq!(a.category, b.category);
    }

    // The import refreshed the averages cache as it went
    assert!(target.averages().average_for("Groceries").is_some());
}

// =============================================================================
// Scheduler + averages wiring without an engine
// =============================================================================

#[test]
fn scheduler_over_bare_store_refreshes_cache() {
    let db = Database::in_memory().unwrap();
    let averages = SpendingAverages::new();
    db.insert_recurring_rule("Netflix", 15.49, "Entertainment", Frequency::Monthly, date("2025-02-01"))
        .unwrap();

    let count = RecurringScheduler::new(&db, &averages)
        .run(date("2025-04-01"))
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(averages.average_for("Entertainment"), Some(15.49));
}
