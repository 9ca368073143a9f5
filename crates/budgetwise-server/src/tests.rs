//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use budgetwise_core::test_utils::write_sample_dataset;
use budgetwise_core::EngineConfig;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

const TEST_SECRET: &str = "test-jwt-secret";
const TEST_API_KEY: &str = "test-api-key-0123456789";

fn untrained_engine(dir: &TempDir) -> Arc<ForecastEngine> {
    Arc::new(ForecastEngine::new(EngineConfig::new(
        dir.path().join("missing.csv"),
        dir.path().join("model.json.gz"),
    )))
}

fn trained_engine(dir: &TempDir) -> Arc<ForecastEngine> {
    let dataset = write_sample_dataset(dir.path());
    let engine = ForecastEngine::new(EngineConfig::new(dataset, dir.path().join("model.json.gz")));
    engine.train_and_persist().unwrap();
    Arc::new(engine)
}

fn setup_test_app() -> Router {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    create_router(Database::in_memory().unwrap(), untrained_engine(&dir), config)
}

fn setup_auth_app() -> Router {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        require_auth: true,
        api_keys: vec![TEST_API_KEY.to_string()],
        jwt_secret: Some(TEST_SECRET.to_string()),
        ..Default::default()
    };
    create_router(Database::in_memory().unwrap(), untrained_engine(&dir), config)
}

fn make_jwt(sub: &str, secret: &str, ttl_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let exp = (chrono::Utc::now().timestamp() + ttl_secs) as usize;
    let claims = Claims {
        sub: sub.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn multipart_upload(filename: &str, contents: &str) -> Request<Body> {
    let boundary = "BUDGETWISEBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = boundary,
        f = filename,
        c = contents
    );
    Request::builder()
        .method("POST")
        .uri("/api/expenses/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

// ========== Root & Auth Tests ==========

#[tokio::test]
async fn test_root_is_public() {
    let app = setup_auth_app();

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Welcome to the Budgetwise API");
}

#[tokio::test]
async fn test_unauthenticated_request_rejected() {
    let app = setup_auth_app();

    let response = app.oneshot(get("/api/expenses")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Authentication required");
}

#[tokio::test]
async fn test_no_auth_mode_uses_local_dev() {
    let app = setup_test_app();

    let response = app.oneshot(get("/api/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["user"], "local-dev");
    assert_eq!(json["auth_method"], "none");
}

#[tokio::test]
async fn test_jwt_auth() {
    let app = setup_auth_app();
    let token = make_jwt("alice", TEST_SECRET, 3600);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["user"], "alice");
    assert_eq!(json["auth_method"], "jwt");
}

#[tokio::test]
async fn test_jwt_with_wrong_secret_rejected() {
    let app = setup_auth_app();
    let token = make_jwt("alice", "some-other-secret", 3600);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_jwt_rejected() {
    let app = setup_auth_app();
    let token = make_jwt("alice", TEST_SECRET, -3600);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_key_auth_with_user_header() {
    let app = setup_auth_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("authorization", format!("Bearer {}", TEST_API_KEY))
                .header("x-budgetwise-user", "bob")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["user"], "bob");
    assert_eq!(json["auth_method"], "api_key");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("authorization", format!("Bearer {}", TEST_API_KEY))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["user"], "api-key");
}

#[tokio::test]
async fn test_wrong_api_key_rejected() {
    let app = setup_auth_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("authorization", "Bearer not-the-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_validate_api_key() {
    let keys = vec!["alpha".to_string(), "bravo-key".to_string()];
    assert!(validate_api_key("alpha", &keys));
    assert!(validate_api_key("bravo-key", &keys));
    assert!(!validate_api_key("alph", &keys));
    assert!(!validate_api_key("", &keys));
    assert!(!validate_api_key("alpha", &[]));
}

#[test]
fn test_parse_api_keys() {
    assert_eq!(parse_api_keys(" a, b ,,c "), vec!["a", "b", "c"]);
    assert!(parse_api_keys("").is_empty());
}

// ========== Expense API Tests ==========

#[tokio::test]
async fn test_create_and_list_expenses() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/expenses",
            serde_json::json!({
                "title": "Groceries",
                "amount": 42.5,
                "category": "Food",
                "date": "2024-05-01"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = get_body_json(response).await;
    assert_eq!(created["title"], "Groceries");
    assert_eq!(created["user_id"], "local-dev");
    assert_eq!(created["date"], "2024-05-01");

    let response = app.oneshot(get("/api/expenses")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = get_body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_invalid_expense() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/expenses",
            serde_json::json!({ "title": " ", "amount": 3.0, "category": "Food" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_expense() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/expenses",
            serde_json::json!({ "title": "Taxi", "amount": 12.0, "category": "Transport" }),
        ))
        .await
        .unwrap();
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    let delete = |id: i64| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/expenses/{}", id))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete(id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["message"], "Expense deleted");

    let response = app.oneshot(delete(id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expenses_isolated_between_users() {
    let app = setup_auth_app();
    let alice = make_jwt("alice", TEST_SECRET, 3600);
    let bob = make_jwt("bob", TEST_SECRET, 3600);

    let mut create = post_json(
        "/api/expenses",
        serde_json::json!({ "title": "Rent", "amount": 900.0, "category": "Housing" }),
    );
    create.headers_mut().insert(
        "authorization",
        format!("Bearer {}", alice).parse().unwrap(),
    );
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/expenses")
                .header("authorization", format!("Bearer {}", bob))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let list = get_body_json(response).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_csv() {
    let app = setup_test_app();
    let csv = "date,category,amount,title\n2024-05-01,Food,12.5,Lunch\n2024-05-02,Food,oops,Dinner\n2024-05-03,Transport,30,Fuel\n";

    let response = app
        .clone()
        .oneshot(multipart_upload("may.csv", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["imported"], 2);
    assert_eq!(json["message"], "Successfully imported 2 expenses");
    assert_eq!(json["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(json["skipped"][0]["line"], 3);

    let response = app.oneshot(get("/api/expenses")).await.unwrap();
    assert_eq!(get_body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_rejects_non_csv() {
    let app = setup_test_app();

    let response = app
        .oneshot(multipart_upload("notes.txt", "hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Invalid file format. Please upload a CSV file.");
}

#[tokio::test]
async fn test_upload_missing_columns() {
    let app = setup_test_app();

    let response = app
        .oneshot(multipart_upload("bad.csv", "date,amount\n2024-01-01,5\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_csv() {
    let app = setup_test_app();

    app.clone()
        .oneshot(post_json(
            "/api/expenses",
            serde_json::json!({ "title": "Book", "amount": 15.0, "category": "Education", "date": "2024-02-10" }),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/expenses/export")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );

    let text = get_body_text(response).await;
    assert_eq!(text, "date,category,amount,title\n2024-02-10,Education,15.0,Book\n");
}

// ========== Budget API Tests ==========

#[tokio::test]
async fn test_budget_defaults_and_updates() {
    let app = setup_test_app();

    let response = app.clone().oneshot(get("/api/budget")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 0.0);
    assert_eq!(json["month"], "");

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/budget",
            serde_json::json!({ "amount": 5000.0, "month": "2024-05" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/budget")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 5000.0);
    assert_eq!(json["month"], "2024-05");
}

#[tokio::test]
async fn test_negative_budget_rejected() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget",
            serde_json::json!({ "amount": -10.0, "month": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== AI API Tests ==========

#[tokio::test]
async fn test_predict_untrained_reports_unavailable() {
    let app = setup_test_app();

    let response = app
        .oneshot(get("/api/ai/predict-next-month"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["prediction"], 0.0);
    assert_eq!(json["available"], false);
    assert!(json["next_month"].is_null());
}

#[tokio::test]
async fn test_predict_with_trained_model() {
    let dir = TempDir::new().unwrap();
    let db = Database::in_memory().unwrap();
    db.set_budget("local-dev", 6000.0, "").unwrap();
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    let app = create_router(db, trained_engine(&dir), config);

    let response = app
        .oneshot(get("/api/ai/predict-next-month"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["available"], true);
    let prediction = json["prediction"].as_f64().unwrap();
    assert!(prediction > 0.0);
    // Rounded to cents
    assert!(((prediction * 100.0).round() - prediction * 100.0).abs() < 1e-6);
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("Based on your budget of ₹6000"));
}

#[tokio::test]
async fn test_insights_empty() {
    let app = setup_test_app();

    let response = app.oneshot(get("/api/ai/get-insights")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(
        json["insights"],
        serde_json::json!(["Add more expenses to get AI insights."])
    );
    assert_eq!(json["anomalies"], serde_json::json!([]));
}

#[tokio::test]
async fn test_insights_and_anomalies() {
    let app = setup_test_app();

    for (title, amount, category) in [
        ("coffee", 10.0, "Food"),
        ("snack", 12.0, "Food"),
        ("lunch", 11.0, "Food"),
        ("bus", 9.0, "Transport"),
        ("laptop", 500.0, "Shopping"),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/expenses",
                serde_json::json!({ "title": title, "amount": amount, "category": category }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/api/ai/get-insights")).await.unwrap();
    let json = get_body_json(response).await;

    assert_eq!(
        json["insights"],
        serde_json::json!(["You are spending a lot on Shopping (92% of total)."])
    );
    assert_eq!(
        json["anomalies"],
        serde_json::json!(["Unusual expense detected: laptop - ₹500.00"])
    );
}

#[tokio::test]
async fn test_suggest() {
    let app = setup_test_app();

    let response = app.oneshot(get("/api/ai/suggest")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(
        json["suggestions"],
        serde_json::json!(["Try to save 10% of your income.", "Track your daily expenses."])
    );
}

#[tokio::test]
async fn test_model_status() {
    let app = setup_test_app();

    let response = app.oneshot(get("/api/ai/model")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["trained"], false);
    assert_eq!(json["artifact_present"], false);
}

// ========== Audit API Tests ==========

#[tokio::test]
async fn test_audit_records_writes() {
    let app = setup_test_app();

    app.clone()
        .oneshot(post_json(
            "/api/budget",
            serde_json::json!({ "amount": 100.0, "month": "" }),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/audit?limit=5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "update");
    assert_eq!(entries[0]["entity_type"], "budget");
}
