//! Forecast and spending-analysis handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::Datelike;
use serde::Serialize;

use crate::{AppError, AppState, AuthUser};
use budgetwise_core::{engine::analyzer, ModelStatus};

/// Response for GET /api/ai/predict-next-month
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    /// Forecast total expense, rounded to 2 decimals (0 when unavailable)
    pub prediction: f64,
    /// False when no trained model is loaded
    pub available: bool,
    pub next_month: Option<String>,
    pub message: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// GET /api/ai/predict-next-month - Forecast next month's total from the caller's budget
pub async fn predict_next_month(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PredictionResponse>, AppError> {
    let budget = state.db.get_budget(&user.user_id)?;
    let current_month = chrono::Local::now().month();

    let forecast = state
        .engine
        .forecast_next_month(budget.amount, current_month)
        .map_err(AppError::from_core)?;

    let response = match forecast {
        Some(forecast) => PredictionResponse {
            prediction: round2(forecast.value),
            available: true,
            next_month: Some(forecast.next_month.to_string()),
            message: format!(
                "Based on your budget of ₹{}, we predict your next month's expense.",
                budget.amount
            ),
        },
        None => PredictionResponse {
            prediction: 0.0,
            available: false,
            next_month: None,
            message: "Forecast model is not available yet.".to_string(),
        },
    };

    Ok(Json(response))
}

/// Response for GET /api/ai/get-insights
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
    pub anomalies: Vec<String>,
}

/// GET /api/ai/get-insights - Category insights and unusual expenses
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<InsightsResponse>, AppError> {
    let records = state.db.expense_records(&user.user_id)?;

    // Isolation-forest fitting is CPU-bound
    let response = tokio::task::spawn_blocking(move || InsightsResponse {
        insights: analyzer::get_insights(&records),
        anomalies: analyzer::detect_anomalies(&records),
    })
    .await?;

    Ok(Json(response))
}

/// Response for GET /api/ai/suggest
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
}

/// GET /api/ai/suggest - General saving tips
pub async fn suggest() -> Json<SuggestResponse> {
    Json(SuggestResponse {
        suggestions: vec![
            "Try to save 10% of your income.".to_string(),
            "Track your daily expenses.".to_string(),
        ],
    })
}

/// GET /api/ai/model - Forecast model status
pub async fn model_status(State(state): State<Arc<AppState>>) -> Json<ModelStatus> {
    Json(state.engine.status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1234.5678), 1234.57);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(10.004), 10.0);
    }
}
