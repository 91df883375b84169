//! HTTP surface tests driving the router directly with tower's `oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use expense_tracker::backend;

async fn app() -> axum::Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    backend::app(pool)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check() {
    let app = app().await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_and_list_transactions() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(post(
            "/api/categories",
            json!({ "name": "Food", "kind": "expense" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let category = body_json(response).await;
    let category_id = category["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(post(
            "/api/transactions",
            json!({
                "date": "2025-08-10",
                "amount": 42.5,
                "kind": "expense",
                "category_id": category_id,
                "description": "groceries"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["category"], "Food");
    assert_eq!(created["amount"], 42.5);

    let response = app.oneshot(get("/api/transactions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["date"], "2025-08-10");
}

#[tokio::test]
async fn negative_amount_is_rejected() {
    let app = app().await;
    let response = app
        .oneshot(post(
            "/api/transactions",
            json!({ "date": "2025-08-10", "amount": -5.0, "kind": "expense" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_transaction_is_404() {
    let app = app().await;
    let response = app.oneshot(get("/api/transactions/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn budget_requires_existing_category() {
    let app = app().await;
    let response = app
        .oneshot(post(
            "/api/budgets",
            json!({ "category_id": 42, "monthly_limit": 500.0, "start_date": "2025-01-01" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn analytics_endpoints_tolerate_empty_ledger() {
    let app = app().await;

    for uri in [
        "/api/analytics/monthly-trend",
        "/api/analytics/top-categories",
        "/api/analytics/unusual-spending",
        "/api/analytics/budget-alerts",
        "/api/analytics/savings-opportunities",
        "/api/analytics/predict-by-category",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(0), "{uri}");
    }

    let response = app
        .clone()
        .oneshot(get("/api/analytics/predict-spending"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let forecast = body_json(response).await;
    assert_eq!(forecast["predicted_amount"], 0.0);
    assert_eq!(forecast["confidence"], "low");
    assert!(forecast["message"].is_string());

    let response = app
        .clone()
        .oneshot(get("/api/analytics/spending-patterns"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let patterns = body_json(response).await;
    assert_eq!(patterns["by_day_of_week"].as_array().unwrap().len(), 7);

    let response = app
        .oneshot(get("/api/analytics/budget-exhaustion/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn budget_alert_fires_for_current_month_spend() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(post(
            "/api/categories",
            json!({ "name": "Food", "kind": "expense" }),
        ))
        .await
        .unwrap();
    let category_id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(post(
            "/api/budgets",
            json!({
                "category_id": category_id,
                "monthly_limit": 500.0,
                "start_date": "2025-01-01"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // spend 95% of the budget today
    let today = chrono::Utc::now().date_naive().to_string();
    let response = app
        .clone()
        .oneshot(post(
            "/api/transactions",
            json!({
                "date": today,
                "amount": 475.0,
                "kind": "expense",
                "category_id": category_id
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get("/api/analytics/budget-alerts"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let alerts = body_json(response).await;
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["percentage"], 95.0);
    assert_eq!(alerts[0]["alert_level"], "warning");

    let response = app
        .oneshot(get(&format!(
            "/api/analytics/budget-exhaustion/{category_id}"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["current_spending"], 475.0);
    assert_eq!(report["budget_limit"], 500.0);
}
