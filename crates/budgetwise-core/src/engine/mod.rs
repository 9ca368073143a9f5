//! Forecasting and analysis engine
//!
//! - `dataset`: historical dataset loading
//! - `features`: (month, budget) -> total expense training rows
//! - `forecast`: the shared forecast model, its artifact, and predictions
//! - `analyzer`: category insights and amount anomalies

pub mod analyzer;
pub mod dataset;
pub mod features;
pub mod forecast;

pub use analyzer::{
    category_insights, detect_anomalies, find_anomalies, get_insights, AnomalyFlag, Insight,
    InsightReport, EMPTY_INSIGHT_PROMPT,
};
pub use dataset::{load_dataset, load_dataset_from_reader, DatasetLoad, LoadReport, SkippedRow};
pub use features::{build_features, DroppedRecord, FeatureSet};
pub use forecast::{
    next_month, BootstrapOutcome, ForecastEngine, ForecastModel, ModelStatus, ModelStore,
    TrainingSummary,
};
