//! Forecast model: training, persistence, and next-month prediction
//!
//! There is exactly one `ForecastEngine` per process. It owns the model behind
//! a read/write lock: predictions take the read side, while training and
//! artifact I/O take the write side, so no reader ever observes a model that
//! is only partially replaced.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::dataset::{load_dataset, DatasetLoad, LoadReport};
use super::features::build_features;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::ml::{ForestConfig, RandomForest};
use crate::models::{Forecast, Month};

/// Number of trees in the forecast ensemble
pub const FORECAST_ESTIMATORS: usize = 100;

/// Bumped whenever the artifact layout changes
const ARTIFACT_VERSION: u32 = 1;

/// Month that follows `current_month` (1-12), wrapping December to January
pub fn next_month(current_month: u32) -> u32 {
    (current_month % 12) + 1
}

/// Reject queries the model should never see
fn validate_query(budget: f64, current_month: u32) -> Result<Month> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(Error::InvalidInput(format!(
            "budget must be a non-negative number, got {}",
            budget
        )));
    }

    Month::from_number(current_month).ok_or_else(|| {
        Error::InvalidInput(format!(
            "month must be between 1 and 12, got {}",
            current_month
        ))
    })
}

/// What a training run consumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingSummary {
    pub rows_used: usize,
    /// Rows rejected by the loader plus records dropped by the feature builder
    pub rows_skipped: usize,
    pub persisted: bool,
}

/// The single process-wide regression model
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ForecastModel {
    #[default]
    Untrained,
    Trained(RandomForest),
}

impl ForecastModel {
    pub fn is_trained(&self) -> bool {
        matches!(self, Self::Trained(_))
    }

    /// Fit a new forest from a dataset load
    ///
    /// On failure the current state is left untouched.
    pub fn train(&mut self, report: &LoadReport) -> Result<TrainingSummary> {
        let (forest, summary) = fit_forest(report)?;
        *self = Self::Trained(forest);
        Ok(summary)
    }

    /// Point estimate for `(month, budget)`, or `None` when untrained
    pub fn predict(&self, month: Month, budget: f64) -> Option<f64> {
        match self {
            Self::Untrained => None,
            Self::Trained(forest) => Some(forest.predict_one(&[month.number() as f64, budget])),
        }
    }
}

fn fit_forest(report: &LoadReport) -> Result<(RandomForest, TrainingSummary)> {
    if report.is_empty() {
        return Err(Error::DataUnavailable(
            "historical dataset has no usable rows".to_string(),
        ));
    }

    let features = build_features(&report.records);
    if features.rows.is_empty() {
        return Err(Error::Training(format!(
            "all {} records were dropped while building features",
            report.records.len()
        )));
    }

    let (samples, targets) = features.to_matrix();
    let mut forest = RandomForest::new(ForestConfig {
        n_estimators: FORECAST_ESTIMATORS,
        ..Default::default()
    });
    forest.fit(&samples, &targets).map_err(Error::Training)?;

    let summary = TrainingSummary {
        rows_used: features.rows.len(),
        rows_skipped: report.skipped.len() + features.dropped.len(),
        persisted: false,
    };

    Ok((forest, summary))
}

#[derive(Serialize, Deserialize)]
struct Artifact<F> {
    version: u32,
    trained_at: DateTime<Utc>,
    forest: F,
}

/// On-disk home of the trained model (gzip-compressed JSON)
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the artifact atomically (temp file in the same directory, then rename)
    pub fn save(&self, forest: &RandomForest) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let tmp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let writer = BufWriter::new(tmp.as_file());
            let mut encoder = GzEncoder::new(writer, Compression::default());
            serde_json::to_writer(
                &mut encoder,
                &Artifact {
                    version: ARTIFACT_VERSION,
                    trained_at: Utc::now(),
                    forest,
                },
            )?;
            let mut writer = encoder.finish()?;
            writer.flush()?;
        }

        tmp.persist(&self.path).map_err(|e| {
            Error::Storage(format!(
                "failed to write model artifact {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Read the artifact; `Ok(None)` when no artifact exists
    pub fn load(&self) -> Result<Option<RandomForest>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let artifact: Artifact<RandomForest> = serde_json::from_reader(decoder).map_err(|e| {
            Error::Storage(format!(
                "corrupt model artifact {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if artifact.version != ARTIFACT_VERSION {
            return Err(Error::Storage(format!(
                "model artifact version {} is not supported (expected {})",
                artifact.version, ARTIFACT_VERSION
            )));
        }
        if !artifact.forest.is_fitted() || artifact.forest.n_features() != 2 {
            return Err(Error::Storage(
                "model artifact does not contain a fitted (month, budget) forest".to_string(),
            ));
        }

        Ok(Some(artifact.forest))
    }
}

/// How the engine reached its current state at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Reused a persisted artifact
    Loaded,
    /// No usable artifact, trained from the dataset
    Trained(TrainingSummary),
    /// Neither worked; predictions return the sentinel
    Untrained { reason: String },
}

/// Model status for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub trained: bool,
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub artifact_present: bool,
}

/// Owned handle to the forecast model and its artifact
pub struct ForecastEngine {
    config: EngineConfig,
    store: ModelStore,
    model: RwLock<ForecastModel>,
}

impl ForecastEngine {
    /// Create an untrained engine without touching the filesystem
    pub fn new(config: EngineConfig) -> Self {
        let store = ModelStore::new(config.model_path.clone());
        Self {
            config,
            store,
            model: RwLock::new(ForecastModel::Untrained),
        }
    }

    /// Create an engine and bring it up: reload the artifact or train a new one
    pub fn bootstrap(config: EngineConfig) -> Self {
        let engine = Self::new(config);
        engine.initialize();
        engine
    }

    /// Reload the persisted model, falling back to training
    ///
    /// Never fails: every problem is logged and leaves the engine untrained.
    pub fn initialize(&self) -> BootstrapOutcome {
        match self.reload() {
            Ok(true) => {
                info!(path = %self.store.path().display(), "Loaded forecast model");
                return BootstrapOutcome::Loaded;
            }
            Ok(false) => {
                info!(path = %self.store.path().display(), "Model not found, training new one");
            }
            Err(e) => {
                warn!(error = %e, "Could not load forecast model, retraining");
            }
        }

        match self.train_and_persist() {
            Ok(summary) => BootstrapOutcome::Trained(summary),
            Err(e) => {
                warn!(error = %e, "Forecast model unavailable, training skipped");
                BootstrapOutcome::Untrained {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Replace the in-memory model with the persisted artifact, if present
    pub fn reload(&self) -> Result<bool> {
        let mut model = self.write_model();
        match self.store.load()? {
            Some(forest) => {
                *model = ForecastModel::Trained(forest);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Train from the configured dataset and persist the artifact
    ///
    /// A failed save is logged and reported via `persisted = false`; the
    /// freshly trained model is kept in memory either way.
    pub fn train_and_persist(&self) -> Result<TrainingSummary> {
        let report = match load_dataset(&self.config.dataset_path)? {
            DatasetLoad::NotFound => {
                return Err(Error::DataUnavailable(format!(
                    "historical dataset not found at {}",
                    self.config.dataset_path.display()
                )))
            }
            DatasetLoad::Loaded(report) => report,
        };

        let (forest, mut summary) = fit_forest(&report)?;

        let mut model = self.write_model();
        match self.store.save(&forest) {
            Ok(()) => summary.persisted = true,
            Err(e) => warn!(
                error = %e,
                path = %self.store.path().display(),
                "Failed to persist forecast model"
            ),
        }
        *model = ForecastModel::Trained(forest);

        info!(
            rows_used = summary.rows_used,
            rows_skipped = summary.rows_skipped,
            persisted = summary.persisted,
            "Model trained"
        );

        Ok(summary)
    }

    /// Persist the current model; errors if untrained
    pub fn save(&self) -> Result<()> {
        let model = self.write_model();
        match &*model {
            ForecastModel::Trained(forest) => self.store.save(forest),
            ForecastModel::Untrained => Err(Error::DataUnavailable(
                "no trained model to save".to_string(),
            )),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.read_model().is_trained()
    }

    /// Predicted total expense for the month after `current_month`
    ///
    /// Returns 0.0 when no model is available. Use `forecast_next_month` to
    /// tell that case apart from a genuine zero forecast.
    pub fn predict_next_month(&self, budget: f64, current_month: u32) -> Result<f64> {
        Ok(self
            .forecast_next_month(budget, current_month)?
            .map(|f| f.value)
            .unwrap_or(0.0))
    }

    /// Forecast for the month after `current_month`, or `None` when untrained
    pub fn forecast_next_month(&self, budget: f64, current_month: u32) -> Result<Option<Forecast>> {
        let current = validate_query(budget, current_month)?;
        let next = current.next();

        Ok(self
            .read_model()
            .predict(next, budget)
            .map(|value| Forecast {
                next_month: next,
                value,
            }))
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            trained: self.is_trained(),
            dataset_path: self.config.dataset_path.clone(),
            model_path: self.store.path().to_path_buf(),
            artifact_present: self.store.exists(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn read_model(&self) -> RwLockReadGuard<'_, ForecastModel> {
        self.model.read().unwrap_or_else(|poisoned| {
            warn!("Forecast model lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_model(&self) -> RwLockWriteGuard<'_, ForecastModel> {
        self.model.write().unwrap_or_else(|poisoned| {
            warn!("Forecast model lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
