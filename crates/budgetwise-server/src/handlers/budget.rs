//! Budget handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::{AppError, AppState, AuthUser};
use budgetwise_core::models::Budget;

#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub amount: f64,
    #[serde(default)]
    pub month: String,
}

/// GET /api/budget - The caller's budget (zero if never set)
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Budget>, AppError> {
    Ok(Json(state.db.get_budget(&user.user_id)?))
}

/// POST /api/budget - Set the caller's budget
pub async fn set_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BudgetRequest>,
) -> Result<Json<Budget>, AppError> {
    let budget = state
        .db
        .set_budget(&user.user_id, req.amount, &req.month)
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user.user_id,
        "update",
        Some("budget"),
        None,
        Some(&format!("amount={}", budget.amount)),
    )?;

    Ok(Json(budget))
}
