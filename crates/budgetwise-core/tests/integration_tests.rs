//! Integration tests for budgetwise-core
//!
//! These tests exercise the full dataset → train → persist → predict workflow
//! and the store → analyzer path.

use std::path::{Path, PathBuf};

use budgetwise_core::{
    db::Database,
    detect_anomalies, get_insights,
    import::parse_expenses_csv,
    EngineConfig, ForecastEngine,
};

/// Twelve months of history at three budget levels
///
/// Contains one row with an unmapped month and one malformed row; both must be
/// reported, not silently absorbed.
fn history_csv() -> String {
    let months = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];

    let mut csv = String::from("Month,Monthly_Budget,InitialExpense,AmountOfProduct,Remaining_Balance\n");
    for (i, month) in months.iter().enumerate() {
        for budget in [4000.0, 6000.0, 8000.0] {
            let initial = budget * 0.55 + i as f64 * 40.0;
            let other = if i == 11 { 900.0 } else { 200.0 };
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                month,
                budget,
                initial,
                other,
                budget - initial - other
            ));
        }
    }
    csv.push_str("Smarch,5000,2000,100,2900\n");
    csv.push_str("June,5000,n/a,100,0\n");
    csv
}

fn write_history(dir: &Path) -> PathBuf {
    let path = dir.join("history.csv");
    std::fs::write(&path, history_csv()).expect("Failed to write dataset");
    path
}

// =============================================================================
// Forecast Workflow
// =============================================================================

#[test]
fn test_train_persist_reload_predict() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::new(write_history(dir.path()), dir.path().join("model.json.gz"));

    let engine = ForecastEngine::new(config.clone());
    let summary = engine.train_and_persist().expect("Training failed");

    assert_eq!(summary.rows_used, 36);
    // One malformed row from the loader, one unmapped month from the feature builder
    assert_eq!(summary.rows_skipped, 2);
    assert!(summary.persisted);
    assert!(config.model_path.exists());

    // A fresh process picks up the artifact instead of retraining
    std::fs::remove_file(&config.dataset_path).unwrap();
    let restarted = ForecastEngine::bootstrap(config);
    assert!(restarted.is_trained());

    for (budget, month) in [(4000.0, 1), (6000.0, 11), (8000.0, 12)] {
        let before = engine.predict_next_month(budget, month).unwrap();
        let after = restarted.predict_next_month(budget, month).unwrap();
        assert_eq!(before, after);
        assert!(before > 0.0);
    }
}

#[test]
fn test_december_forecast_wraps_to_january() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::new(write_history(dir.path()), dir.path().join("model.json.gz"));
    let engine = ForecastEngine::bootstrap(config);

    let forecast = engine
        .forecast_next_month(6000.0, 12)
        .unwrap()
        .expect("Model should be trained");
    assert_eq!(forecast.next_month.number(), 1);
}

#[test]
fn test_missing_dataset_degrades_to_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ForecastEngine::bootstrap(EngineConfig::new(
        dir.path().join("absent.csv"),
        dir.path().join("model.json.gz"),
    ));

    assert!(!engine.is_trained());
    assert_eq!(engine.predict_next_month(5000.0, 3).unwrap(), 0.0);
    assert!(engine.forecast_next_month(5000.0, 3).unwrap().is_none());

    let status = engine.status();
    assert!(!status.trained);
    assert!(!status.artifact_present);
}

// =============================================================================
// Store → Analyzer
// =============================================================================

#[test]
fn test_imported_expenses_feed_the_analyzer() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("budgetwise.db");
    let db = Database::new_unencrypted(&db_path.to_string_lossy())
        .expect("Failed to create database");

    let csv = "date,category,amount,title\n\
               2024-05-01,Food,40,Groceries\n\
               2024-05-02,Food,45,Groceries\n\
               2024-05-03,Transport,38,Fuel\n\
               2024-05-04,Food,42,Groceries\n\
               2024-05-05,Transport,41,Fuel\n\
               2024-05-06,Food,39,Groceries\n\
               2024-05-07,Food,44,Groceries\n\
               2024-05-08,Transport,40,Fuel\n\
               2024-05-09,Food,43,Groceries\n\
               2024-05-10,Electronics,2500,Laptop\n";

    let report = parse_expenses_csv(csv.as_bytes()).unwrap();
    assert!(report.skipped.is_empty());
    db.add_expenses("alice", &report.expenses).unwrap();

    let records = db.expense_records("alice").unwrap();
    assert_eq!(records.len(), 10);

    let insights = get_insights(&records);
    assert_eq!(
        insights,
        vec!["You are spending a lot on Electronics (87% of total).".to_string()]
    );

    let anomalies = detect_anomalies(&records);
    assert_eq!(anomalies.len(), 1);
    assert!(anomalies[0].contains("Laptop"));

    // Another user sees nothing
    assert_eq!(
        get_insights(&db.expense_records("bob").unwrap()),
        vec!["Add more expenses to get AI insights.".to_string()]
    );
}
