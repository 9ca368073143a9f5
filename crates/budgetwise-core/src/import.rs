//! Expense CSV import and export
//!
//! Accepted header: `date, category, amount, title` in any order and any
//! case; `date` may be omitted. The bank-export spelling
//! `Date, Category, Amount, Description` is accepted as well. Rows that cannot be parsed are reported with their line
//! number rather than aborting the whole file.

use std::io::{Read, Write};

use chrono::{DateTime, NaiveDate};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::SkippedRow;
use crate::error::{Error, Result};
use crate::models::{Expense, NewExpense};

pub const EXPORT_HEADER: [&str; 4] = ["date", "category", "amount", "title"];

/// What happened to a single CSV row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Parsed(NewExpense),
    Skipped { line: u64, reason: String },
}

/// Parsed expenses plus the rows that were left out
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub expenses: Vec<NewExpense>,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Parsed(expense) => self.expenses.push(expense),
            RowOutcome::Skipped { line, reason } => {
                warn!(line, reason = %reason, "Skipping expense row");
                self.skipped.push(SkippedRow { line, reason });
            }
        }
    }
}

/// Column positions resolved from the header
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: Option<usize>,
    category: usize,
    amount: usize,
    title: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };

        match (
            find(&["category"]),
            find(&["amount"]),
            find(&["title", "description"]),
        ) {
            (Some(category), Some(amount), Some(title)) => Ok(Self {
                date: find(&["date"]),
                category,
                amount,
                title,
            }),
            _ => Err(Error::Import(
                "CSV must contain columns: title, amount, category".to_string(),
            )),
        }
    }
}

/// Parse an expense CSV
///
/// Fails only if the header is unreadable or a required column is missing.
pub fn parse_expenses_csv<R: Read>(reader: R) -> Result<ImportReport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::resolve(rdr.headers()?)?;
    let mut report = ImportReport::default();

    for (i, result) in rdr.records().enumerate() {
        let fallback_line = i as u64 + 2;
        let outcome = match result {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                parse_row(&columns, &record, line)
            }
            Err(e) => RowOutcome::Skipped {
                line: e.position().map(|p| p.line()).unwrap_or(fallback_line),
                reason: e.to_string(),
            },
        };
        report.record(outcome);
    }

    debug!(
        parsed = report.expenses.len(),
        skipped = report.skipped.len(),
        "Parsed expense CSV"
    );

    Ok(report)
}

fn parse_row(columns: &Columns, record: &StringRecord, line: u64) -> RowOutcome {
    let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");
    let skipped = |reason: String| RowOutcome::Skipped { line, reason };

    let title = field(columns.title);
    if title.is_empty() {
        return skipped("missing title".to_string());
    }

    let category = field(columns.category);
    if category.is_empty() {
        return skipped("missing category".to_string());
    }

    let amount = match parse_amount(field(columns.amount)) {
        Ok(amount) => amount,
        Err(e) => return skipped(e.to_string()),
    };

    let date = match columns.date.map(field).unwrap_or("") {
        "" => None,
        raw => match parse_date(raw) {
            Ok(date) => Some(date),
            Err(e) => return skipped(e.to_string()),
        },
    };

    RowOutcome::Parsed(NewExpense {
        title: title.to_string(),
        amount,
        category: category.to_string(),
        date,
    })
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', '₹', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(Error::Import(format!("Unable to parse amount: {}", s))),
    }
}

#[derive(Serialize)]
struct ExportRow<'a> {
    date: String,
    category: &'a str,
    amount: f64,
    title: &'a str,
}

/// Write expenses in the import column layout
pub fn write_expenses_csv<W: Write>(writer: W, expenses: &[Expense]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);

    for expense in expenses {
        wtr.serialize(ExportRow {
            date: expense.date.map(|d| d.to_string()).unwrap_or_default(),
            category: &expense.category,
            amount: expense.amount,
            title: &expense.title,
        })?;
    }

    // An empty export still carries the header
    if expenses.is_empty() {
        wtr.write_record(EXPORT_HEADER)?;
    }

    wtr.flush()?;
    Ok(())
}
