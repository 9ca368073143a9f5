//! Budgetwise Web Server
//!
//! Axum-based REST API for the Budgetwise expense tracker.
//!
//! Security features:
//! - Bearer authentication on every `/api` route (secure by default, use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input validation (upload size limits, audit page limits)
//! - Audit logging for API access
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use budgetwise_core::{db::Database, ForecastEngine};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum audit log page size
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Environment variable holding the JWT signing secret
pub const JWT_SECRET_ENV: &str = "BUDGETWISE_JWT_SECRET";

/// Environment variable holding comma-separated API keys
pub const API_KEYS_ENV: &str = "BUDGETWISE_API_KEYS";

/// Header naming the acting user for API-key requests
pub const USER_HEADER: &str = "x-budgetwise-user";

/// Authorization header for bearer auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// User id assigned to API-key requests without a user header
pub const API_KEY_USER: &str = "api-key";

/// User id assigned when authentication is disabled
pub const LOCAL_DEV_USER: &str = "local-dev";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// API keys for service-to-service access
    /// Format: "Bearer <key>" in Authorization header
    pub api_keys: Vec<String>,
    /// HS256 secret for bearer JWTs; the `sub` claim is the user id
    pub jwt_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
            jwt_secret: None,
        }
    }
}

impl ServerConfig {
    /// Read API keys and the JWT secret from the environment
    pub fn with_env_credentials(mut self) -> Self {
        if let Ok(keys) = std::env::var(API_KEYS_ENV) {
            self.api_keys = parse_api_keys(&keys);
        }
        self.jwt_secret = std::env::var(JWT_SECRET_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty());
        self
    }
}

/// Parse a comma-separated list of API keys, ignoring blanks
pub fn parse_api_keys(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub engine: Arc<ForecastEngine>,
    pub config: ServerConfig,
}

/// How a request was authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Jwt,
    ApiKey,
    None,
}

/// The resolved identity, placed in request extensions by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub method: AuthMethod,
}

/// JWT claims accepted by the server
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Authentication middleware - validates bearer JWTs or API keys
///
/// # Security Notes
///
/// **JWT**: verified with HS256 against `BUDGETWISE_JWT_SECRET`; expiry is
/// enforced. The `sub` claim becomes the user id.
///
/// **API keys**: compared in constant time. The acting user is taken from the
/// `X-Budgetwise-User` header, so keys should only be issued to trusted
/// services.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if !state.config.require_auth {
        request.extensions_mut().insert(AuthUser {
            user_id: LOCAL_DEV_USER.to_string(),
            method: AuthMethod::None,
        });
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    if let Some(token) = token {
        if let Some(secret) = &state.config.jwt_secret {
            match validate_jwt(&token, secret) {
                Ok(user_id) => {
                    debug!(user = %user_id, path = %path, "Authenticated via JWT");
                    request.extensions_mut().insert(AuthUser {
                        user_id,
                        method: AuthMethod::Jwt,
                    });
                    return next.run(request).await;
                }
                Err(e) => {
                    // Fall through: the token may be an API key
                    debug!(error = %e, path = %path, "Bearer token is not a valid JWT");
                }
            }
        }

        if validate_api_key(&token, &state.config.api_keys) {
            let user_id = request
                .headers()
                .get(USER_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .unwrap_or(API_KEY_USER)
                .to_string();
            debug!(user = %user_id, path = %path, "Authenticated via API key");
            request.extensions_mut().insert(AuthUser {
                user_id,
                method: AuthMethod::ApiKey,
            });
            return next.run(request).await;
        }
    }

    warn!(path = %path, "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an HS256 JWT and return its subject
fn validate_jwt(token: &str, secret: &str) -> Result<String, String> {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| format!("JWT validation failed: {}", e))?;

    let sub = token_data.claims.sub.trim().to_string();
    if sub.is_empty() {
        return Err("JWT subject is empty".to_string());
    }
    Ok(sub)
}

/// Validate an API key against the configured keys using constant-time comparison
/// to prevent timing attacks.
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Simple message response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create the application router
pub fn create_router(db: Database, engine: Arc<ForecastEngine>, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        engine,
        config: config.clone(),
    });

    let api_routes = Router::new()
        // Auth
        .route("/me", get(handlers::get_me))
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/expenses/upload",
            post(handlers::upload_expenses)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 64 * 1024)),
        )
        .route("/expenses/export", get(handlers::export_expenses))
        .route("/expenses/:id", delete(handlers::delete_expense))
        // Budget
        .route(
            "/budget",
            get(handlers::get_budget).post(handlers::set_budget),
        )
        // AI
        .route("/ai/predict-next-month", get(handlers::predict_next_month))
        .route("/ai/get-insights", get(handlers::get_insights))
        .route("/ai/suggest", get(handlers::suggest))
        .route("/ai/model", get(handlers::model_status))
        // Audit log
        .route("/audit", get(handlers::list_audit_log))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Build CORS layer
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    engine: Arc<ForecastEngine>,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.api_keys.is_empty() && config.jwt_secret.is_none() {
        warn!(
            "⚠️  Authentication required but neither {} nor {} is set; every /api request will be rejected",
            JWT_SECRET_ENV, API_KEYS_ENV
        );
    }

    if engine.is_trained() {
        info!("✅ Forecast model ready");
    } else {
        warn!("⚠️  Forecast model unavailable; predictions will return 0");
    }

    let app = create_router(db, engine, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error, exposing only caller mistakes to the client
    pub fn from_core(err: budgetwise_core::Error) -> Self {
        use budgetwise_core::Error;

        match err {
            Error::InvalidInput(msg) | Error::Import(msg) => Self::bad_request(&msg),
            Error::NotFound(msg) => Self::not_found(&msg),
            other => Self::from(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
