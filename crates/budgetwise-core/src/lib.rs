//! Budgetwise Core Library
//!
//! Shared functionality for the Budgetwise expense tracker:
//! - Forecast engine: historical dataset loading, feature building, and a
//!   persisted random-forest model predicting next month's total expense
//! - Spending analyzer: category concentration insights and isolation-forest
//!   outlier detection
//! - Per-user expense and budget store (SQLite, optional SQLCipher encryption)
//! - Expense CSV import and export

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod import;
pub mod ml;
pub mod models;

/// Shared fixtures for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::EngineConfig;
pub use db::Database;
pub use engine::{
    detect_anomalies, find_anomalies, get_insights, AnomalyFlag, BootstrapOutcome, ForecastEngine,
    Insight, InsightReport, ModelStatus, TrainingSummary,
};
pub use error::{Error, Result};
pub use import::{parse_expenses_csv, write_expenses_csv, ImportReport, RowOutcome};
