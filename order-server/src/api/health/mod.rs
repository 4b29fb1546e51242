//! Health API Module

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// Health router (public, mounted outside `/api`)
pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    // A failed ping still answers; load balancers read the status field
    let db_ok = sqlx::query("SELECT 1")
        .fetch_one(&state.db.pool)
        .await
        .is_ok();

    Json(HealthResponse {
        status: if db_ok { "ok" } else { "degraded" },
        service: "order-server",
    })
}
