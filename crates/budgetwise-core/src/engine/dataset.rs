//! Historical dataset loader
//!
//! Reads the training CSV from a fixed path. A missing file is reported as
//! `DatasetLoad::NotFound` so training can short-circuit; rows that fail to
//! parse are collected in the load report instead of aborting the load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::HistoricalRecord;

/// A dataset row that could not be used, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line number in the source file (header is line 1)
    pub line: u64,
    pub reason: String,
}

/// Parsed records plus everything that was skipped on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub records: Vec<HistoricalRecord>,
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Outcome of loading the dataset
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetLoad {
    NotFound,
    Loaded(LoadReport),
}

/// Load the historical dataset from `path`
pub fn load_dataset(path: &Path) -> Result<DatasetLoad> {
    if !path.exists() {
        warn!(path = %path.display(), "Historical dataset not found");
        return Ok(DatasetLoad::NotFound);
    }

    let file = File::open(path)?;
    let report = load_dataset_from_reader(file)?;

    debug!(
        path = %path.display(),
        records = report.records.len(),
        skipped = report.skipped.len(),
        "Loaded historical dataset"
    );

    Ok(DatasetLoad::Loaded(report))
}

/// Parse dataset rows from any reader
///
/// Fails only if the header is unreadable or lacks a required column.
pub fn load_dataset_from_reader<R: Read>(reader: R) -> Result<LoadReport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for required in ["Month", "Monthly_Budget", "InitialExpense", "AmountOfProduct"] {
        if !headers.iter().any(|h| h == required) {
            return Err(Error::DataUnavailable(format!(
                "dataset is missing required column '{}'",
                required
            )));
        }
    }

    let mut report = LoadReport::default();

    for (i, result) in rdr.deserialize::<HistoricalRecord>().enumerate() {
        // Header is line 1, first data row line 2
        let fallback_line = i as u64 + 2;
        match result {
            Ok(record) => report.records.push(record),
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                warn!(line, error = %e, "Skipping malformed dataset row");
                report.skipped.push(SkippedRow {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
