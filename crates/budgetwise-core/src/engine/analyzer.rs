//! Spending analyzer: category concentration insights and outlier detection
//!
//! Both analyses are pure functions of the expense list passed in. Nothing
//! is fitted ahead of time and nothing is kept between calls.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::ml::IsolationForest;
use crate::models::ExpenseRecord;

/// Shown when there are no expenses to analyze
pub const EMPTY_INSIGHT_PROMPT: &str = "Add more expenses to get AI insights.";

/// A category is flagged once it takes more than this share of total spend
pub const CONCENTRATION_THRESHOLD: f64 = 0.3;

/// Anomaly detection needs at least this many expenses
pub const MIN_EXPENSES_FOR_ANOMALIES: usize = 5;

/// Expected share of outliers in a user's expenses
pub const ANOMALY_CONTAMINATION: f64 = 0.1;

const ANOMALY_ESTIMATORS: usize = 100;

/// A category that dominates spending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub category: String,
    pub amount: f64,
    /// Share of total spend, truncated to a whole percent
    pub share_percent: u32,
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "You are spending a lot on {} ({}% of total).",
            self.category, self.share_percent
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsightReport {
    /// No expenses at all
    NeedsMoreData,
    /// Possibly empty when nothing crosses the threshold
    Insights(Vec<Insight>),
}

impl InsightReport {
    /// Human-readable messages
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::NeedsMoreData => vec![EMPTY_INSIGHT_PROMPT.to_string()],
            Self::Insights(insights) => insights.iter().map(|i| i.to_string()).collect(),
        }
    }
}

/// Group spend by category and report the dominant ones
///
/// Categories are reported in order of first appearance.
pub fn category_insights(expenses: &[ExpenseRecord]) -> InsightReport {
    if expenses.is_empty() {
        return InsightReport::NeedsMoreData;
    }

    let mut order: Vec<(String, f64)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for expense in expenses {
        match slots.get(expense.category.as_str()) {
            Some(&slot) => order[slot].1 += expense.amount,
            None => {
                slots.insert(expense.category.as_str(), order.len());
                order.push((expense.category.clone(), expense.amount));
            }
        }
    }

    let total: f64 = order.iter().map(|(_, amount)| amount).sum();
    if !total.is_finite() || total <= 0.0 {
        return InsightReport::Insights(Vec::new());
    }

    let insights = order
        .into_iter()
        .filter(|(_, amount)| *amount > total * CONCENTRATION_THRESHOLD)
        .map(|(category, amount)| Insight {
            share_percent: (amount / total * 100.0) as u32,
            category,
            amount,
        })
        .collect();

    InsightReport::Insights(insights)
}

/// Insight messages for a user's expenses
pub fn get_insights(expenses: &[ExpenseRecord]) -> Vec<String> {
    category_insights(expenses).messages()
}

/// An expense whose amount stands out from the rest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyFlag {
    /// Position in the analyzed list
    pub index: usize,
    pub title: String,
    pub amount: f64,
    /// Isolation score; higher is more unusual
    pub score: f64,
}

impl fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unusual expense detected: {} - ₹{:.2}",
            self.title, self.amount
        )
    }
}

/// Flag expenses with unusual amounts, in input order
///
/// Lists with fewer than five usable amounts are too small to judge and
/// produce no flags. Non-finite amounts are left out of the fit.
pub fn find_anomalies(expenses: &[ExpenseRecord]) -> Vec<AnomalyFlag> {
    let candidates: Vec<(usize, f64)> = expenses
        .iter()
        .enumerate()
        .filter(|(_, e)| e.amount.is_finite())
        .map(|(i, e)| (i, e.amount))
        .collect();

    if candidates.len() < MIN_EXPENSES_FOR_ANOMALIES {
        return Vec::new();
    }

    let data: Vec<Vec<f64>> = candidates.iter().map(|(_, amount)| vec![*amount]).collect();
    let mut forest = IsolationForest::new(ANOMALY_ESTIMATORS, ANOMALY_CONTAMINATION);
    let scored = forest.fit_predict_scored(&data);

    let anomalies: Vec<AnomalyFlag> = candidates
        .iter()
        .zip(scored)
        .filter(|(_, (flagged, _))| *flagged)
        .map(|((index, amount), (_, score))| AnomalyFlag {
            index: *index,
            title: expenses[*index].title.clone(),
            amount: *amount,
            score,
        })
        .collect();

    debug!(
        analyzed = candidates.len(),
        flagged = anomalies.len(),
        "Anomaly detection finished"
    );

    anomalies
}

/// Anomaly messages for a user's expenses
pub fn detect_anomalies(expenses: &[ExpenseRecord]) -> Vec<String> {
    find_anomalies(expenses).iter().map(|a| a.to_string()).collect()
}
