//! Domain models for Budgetwise

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Calendar month used as the seasonal feature of the forecast model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Self::January,
        Self::February,
        Self::March,
        Self::April,
        Self::May,
        Self::June,
        Self::July,
        Self::August,
        Self::September,
        Self::October,
        Self::November,
        Self::December,
    ];

    /// Ordinal 1-12
    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1..=12 => Some(Self::ALL[(n - 1) as usize]),
            _ => None,
        }
    }

    /// The following month, wrapping December to January
    pub fn next(&self) -> Self {
        Self::ALL[(self.number() % 12) as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::January => "January",
            Self::February => "February",
            Self::March => "March",
            Self::April => "April",
            Self::May => "May",
            Self::June => "June",
            Self::July => "July",
            Self::August => "August",
            Self::September => "September",
            Self::October => "October",
            Self::November => "November",
            Self::December => "December",
        }
    }
}

impl std::str::FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| format!("Unknown month: {}", s))
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the historical training dataset
///
/// Column names follow the published dataset; unknown columns are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Monthly_Budget")]
    pub monthly_budget: f64,
    /// Sum of the fixed categories (grocery, rent, transport)
    #[serde(rename = "InitialExpense")]
    pub initial_expense: f64,
    #[serde(rename = "AmountOfProduct")]
    pub other_expense: f64,
}

impl HistoricalRecord {
    pub fn total_expense(&self) -> f64 {
        self.initial_expense + self.other_expense
    }
}

/// (month, budget) -> total expense, as consumed by the regression fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingFeatureRow {
    pub month: u32,
    pub monthly_budget: f64,
    pub total_expense: f64,
}

impl TrainingFeatureRow {
    pub fn features(&self) -> [f64; 2] {
        [self.month as f64, self.monthly_budget]
    }
}

/// The expense shape the analyzer works on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub title: String,
    pub amount: f64,
    pub category: String,
}

impl ExpenseRecord {
    pub fn new(title: impl Into<String>, amount: f64, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            amount,
            category: category.into(),
        }
    }
}

/// A next-month expense forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub next_month: Month,
    pub value: f64,
}

/// A stored expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<&Expense> for ExpenseRecord {
    fn from(expense: &Expense) -> Self {
        Self::new(&expense.title, expense.amount, &expense.category)
    }
}

/// New expense for insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// A user's current monthly budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub user_id: String,
    pub amount: f64,
    /// Free-form label supplied by the client (e.g. "2024-05" or "May")
    pub month: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Budget {
    /// Budget returned when the user has never set one
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            amount: 0.0,
            month: String::new(),
            updated_at: None,
        }
    }
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}
