//! Authentication-related handlers

use axum::{Extension, Json};
use serde::Serialize;

use crate::{AuthMethod, AuthUser, MessageResponse};

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// The authenticated user's identifier
    pub user: String,
    /// How the user was authenticated
    pub auth_method: AuthMethod,
}

/// Get the currently authenticated user
pub async fn get_me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user: user.user_id,
        auth_method: user.method,
    })
}

/// GET / - Service banner
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to the Budgetwise API".to_string(),
    })
}
