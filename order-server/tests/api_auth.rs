//! HTTP surface tests: authentication middleware, revocation on logout
//! and role gates, exercised through the full router.

use axum::body::Body;
use http::{Request, StatusCode, header};
use order_server::auth::JwtConfig;
use order_server::routes::build_app;
use order_server::{Config, OrderPolicy, ServerState};
use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::order::UserRole;
use std::str::FromStr;
use tower::ServiceExt;

async fn test_state() -> (ServerState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        work_dir: dir.path().to_str().unwrap().to_string(),
        http_port: 0,
        jwt: JwtConfig {
            secret: "test-secret-test-secret-test-secret!".to_string(),
            expiration_minutes: 60,
            issuer: "auth-service".to_string(),
            audience: "order-api".to_string(),
        },
        environment: "development".to_string(),
        catalog_base_url: "http://localhost:1".to_string(),
        catalog_timeout_ms: 100,
        lock_timeout_ms: 500,
        revocation_purge_interval_secs: 3600,
        policy: OrderPolicy {
            delivery_fee: Decimal::from_str("2.99").unwrap(),
            free_delivery_threshold: Decimal::from_str("25.00").unwrap(),
            min_order_amount: Decimal::from_str("10.00").unwrap(),
            estimated_delivery_minutes: 45,
        },
    };
    let state = ServerState::initialize(&config).await.unwrap();
    (state, dir)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (state, _dir) = test_state().await;
    let app = build_app(state);

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "order-server");
}

#[tokio::test]
async fn api_requires_token() {
    let (state, _dir) = test_state().await;
    let app = build_app(state);

    let response = app
        .clone()
        .oneshot(get("/api/v1/orders/my", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get("/api/v1/orders/my", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_reaches_handlers() {
    let (state, _dir) = test_state().await;
    let token = state
        .jwt_service()
        .generate_token("cust-1", UserRole::Customer)
        .unwrap();
    let app = build_app(state);

    let response = app
        .oneshot(get("/api/v1/orders/my", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn logout_revokes_the_token_immediately() {
    let (state, _dir) = test_state().await;
    let token = state
        .jwt_service()
        .generate_token("cust-1", UserRole::Customer)
        .unwrap();
    let app = build_app(state);

    let logout = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The same token is rejected from now on
    let response = app
        .oneshot(get("/api/v1/orders/my", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["code"], 1005);
}

#[tokio::test]
async fn staff_routes_reject_customers() {
    let (state, _dir) = test_state().await;
    let customer_token = state
        .jwt_service()
        .generate_token("cust-1", UserRole::Customer)
        .unwrap();
    let courier_token = state
        .jwt_service()
        .generate_token("courier-1", UserRole::Courier)
        .unwrap();
    let app = build_app(state);

    let patch = |token: &str| {
        Request::builder()
            .method("PATCH")
            .uri("/api/v1/admin/orders/o1/status")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"confirmed"}"#))
            .unwrap()
    };

    let response = app.clone().oneshot(patch(&customer_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A courier passes the role gate and gets a domain answer instead
    let response = app.oneshot(patch(&courier_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn manager_routes_reject_couriers() {
    let (state, _dir) = test_state().await;
    let courier_token = state
        .jwt_service()
        .generate_token("courier-1", UserRole::Courier)
        .unwrap();
    let manager_token = state
        .jwt_service()
        .generate_token("manager-1", UserRole::Manager)
        .unwrap();
    let app = build_app(state);

    let response = app
        .clone()
        .oneshot(get("/api/v1/admin/orders", Some(&courier_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get("/api/v1/admin/orders", Some(&manager_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
