//! Test utilities for budgetwise-core
//!
//! Synthetic historical dataset and expense fixtures shared by the unit tests
//! here and by the server and CLI test suites.

use std::path::{Path, PathBuf};

use crate::models::{ExpenseRecord, Month, NewExpense};

/// Header of the historical dataset CSV
pub const DATASET_HEADER: &str =
    "Month,Monthly_Budget,InitialExpense,AmountOfProduct,Remaining_Balance";

/// A small seasonal dataset: six budgets for each of the twelve months
///
/// Expenses scale with the budget and December carries a holiday bump.
pub fn sample_dataset_csv() -> String {
    let mut csv = String::from(DATASET_HEADER);
    csv.push('\n');

    for (i, month) in Month::ALL.iter().enumerate() {
        for step in 0..6 {
            let budget = 3000.0 + step as f64 * 1000.0;
            let initial = budget * 0.6 + i as f64 * 25.0;
            let other = if *month == Month::December {
                600.0
            } else {
                150.0 + step as f64 * 10.0
            };
            let remaining = budget - initial - other;
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                month, budget, initial, other, remaining
            ));
        }
    }

    csv
}

/// Write `sample_dataset_csv()` into `dir` and return its path
pub fn write_sample_dataset(dir: &Path) -> PathBuf {
    let path = dir.join("DatasetFinalCSV.csv");
    std::fs::write(&path, sample_dataset_csv()).expect("failed to write sample dataset");
    path
}

/// Analyzer records from `(title, amount, category)` triples
pub fn expense_records(items: &[(&str, f64, &str)]) -> Vec<ExpenseRecord> {
    items
        .iter()
        .map(|(title, amount, category)| ExpenseRecord::new(*title, *amount, *category))
        .collect()
}

/// A new expense without a date
pub fn new_expense(title: &str, amount: f64, category: &str) -> NewExpense {
    NewExpense {
        title: title.to_string(),
        amount,
        category: category.to_string(),
        date: None,
    }
}
