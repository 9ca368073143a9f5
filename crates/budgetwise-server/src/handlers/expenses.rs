//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use tracing::info;

use crate::{AppError, AppState, AuthUser, MessageResponse, MAX_UPLOAD_SIZE};
use budgetwise_core::{
    engine::SkippedRow,
    import::{parse_expenses_csv, write_expenses_csv},
    models::{Expense, NewExpense},
};

/// GET /api/expenses - The caller's expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = state.db.list_expenses(&user.user_id)?;
    Ok(Json(expenses))
}

/// POST /api/expenses - Add an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(expense): Json<NewExpense>,
) -> Result<Json<Expense>, AppError> {
    let id = state
        .db
        .add_expense(&user.user_id, &expense)
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user.user_id,
        "create",
        Some("expense"),
        Some(id),
        Some(&expense.title),
    )?;

    let created = state
        .db
        .get_expense(&user.user_id, id)?
        .ok_or_else(|| AppError::internal("Expense vanished after insert"))?;

    Ok(Json(created))
}

/// DELETE /api/expenses/:id
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.db.delete_expense(&user.user_id, id)? {
        return Err(AppError::not_found("Expense not found"));
    }

    state
        .db
        .log_audit(&user.user_id, "delete", Some("expense"), Some(id), None)?;

    Ok(Json(MessageResponse {
        message: "Expense deleted".to_string(),
    }))
}

/// Upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

/// POST /api/expenses/upload - Import expenses from a CSV file (multipart `file`)
pub async fn upload_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_ascii_lowercase();
        if !filename.ends_with(".csv") {
            return Err(AppError::bad_request(
                "Invalid file format. Please upload a CSV file.",
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;

        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(AppError::bad_request(&format!(
                "File too large. Maximum size is {} MB",
                MAX_UPLOAD_SIZE / 1024 / 1024
            )));
        }

        file_data = Some(bytes.to_vec());
    }

    let data = file_data.ok_or_else(|| AppError::bad_request("No file provided"))?;

    let report = parse_expenses_csv(data.as_slice()).map_err(AppError::from_core)?;
    let ids = state
        .db
        .add_expenses(&user.user_id, &report.expenses)
        .map_err(AppError::from_core)?;

    info!(
        user = %user.user_id,
        imported = ids.len(),
        skipped = report.skipped.len(),
        "Imported expenses"
    );

    state.db.log_audit(
        &user.user_id,
        "import",
        Some("expense"),
        None,
        Some(&format!(
            "imported={} skipped={}",
            ids.len(),
            report.skipped.len()
        )),
    )?;

    Ok(Json(UploadResponse {
        message: format!("Successfully imported {} expenses", ids.len()),
        imported: ids.len(),
        skipped: report.skipped,
    }))
}

/// GET /api/expenses/export - Download the caller's expenses as CSV
pub async fn export_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, AppError> {
    let expenses = state.db.list_expenses(&user.user_id)?;

    let mut buf = Vec::new();
    write_expenses_csv(&mut buf, &expenses)?;

    state.db.log_audit(
        &user.user_id,
        "export",
        Some("expense"),
        None,
        Some(&format!("count={}", expenses.len())),
    )?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"expenses.csv\"",
            ),
        ],
        buf,
    )
        .into_response())
}
