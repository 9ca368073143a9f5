//! Feature builder: historical records -> (month number, budget) -> total expense

use serde::Serialize;
use tracing::warn;

use crate::models::{HistoricalRecord, Month, TrainingFeatureRow};

/// A record that was left out of the training set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRecord {
    /// Position of the record in the loaded sequence
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    /// Usable rows, in input order
    pub rows: Vec<TrainingFeatureRow>,
    pub dropped: Vec<DroppedRecord>,
}

impl FeatureSet {
    /// Split into the (samples, targets) pair the regressor consumes
    pub fn to_matrix(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        self.rows
            .iter()
            .map(|row| (row.features().to_vec(), row.total_expense))
            .unzip()
    }
}

/// Build training rows from historical records
///
/// Records whose month is not one of the twelve English month names, or whose
/// amounts are not finite, are dropped and reported rather than coerced.
pub fn build_features(records: &[HistoricalRecord]) -> FeatureSet {
    let mut set = FeatureSet::default();

    for (index, record) in records.iter().enumerate() {
        let month = match record.month.parse::<Month>() {
            Ok(month) => month,
            Err(reason) => {
                warn!(index, month = %record.month, "Dropping record with unmapped month");
                set.dropped.push(DroppedRecord { index, reason });
                continue;
            }
        };

        let total_expense = record.total_expense();
        if !record.monthly_budget.is_finite() || !total_expense.is_finite() {
            warn!(index, "Dropping record with non-finite amounts");
            set.dropped.push(DroppedRecord {
                index,
                reason: "non-finite budget or expense".to_string(),
            });
            continue;
        }

        set.rows.push(TrainingFeatureRow {
            month: month.number(),
            monthly_budget: record.monthly_budget,
            total_expense,
        });
    }

    set
}
