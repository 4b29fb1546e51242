//! Order API Module
//!
//! Customer-facing order endpoints. Mutations funnel through the order
//! service, which serializes them per order.

pub mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/my", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}", patch(handler::update))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/history", get(handler::history))
}
