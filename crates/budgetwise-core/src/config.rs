//! Engine configuration
//!
//! Paths can be set through environment variables:
//!
//! - `BUDGETWISE_DATASET`: historical dataset CSV (default: `DatasetFinalCSV.csv`)
//! - `BUDGETWISE_MODEL`: trained model artifact (default: `model.json.gz`)

use std::path::PathBuf;

pub const DATASET_ENV: &str = "BUDGETWISE_DATASET";
pub const MODEL_ENV: &str = "BUDGETWISE_MODEL";

pub const DEFAULT_DATASET_PATH: &str = "DatasetFinalCSV.csv";
pub const DEFAULT_MODEL_PATH: &str = "model.json.gz";

/// Where the forecasting engine reads its training data and keeps its artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
}

impl EngineConfig {
    pub fn new(dataset_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            model_path: model_path.into(),
        }
    }

    /// Read paths from the environment, falling back to the defaults
    pub fn from_env() -> Self {
        let dataset_path = std::env::var(DATASET_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DATASET_PATH.to_string());

        let model_path = std::env::var(MODEL_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());

        Self::new(dataset_path, model_path)
    }

    /// Replace either path when an explicit override is given (CLI flags)
    pub fn with_overrides(
        mut self,
        dataset_path: Option<PathBuf>,
        model_path: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = dataset_path {
            self.dataset_path = path;
        }
        if let Some(path) = model_path {
            self.model_path = path;
        }
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATASET_PATH, DEFAULT_MODEL_PATH)
    }
}
