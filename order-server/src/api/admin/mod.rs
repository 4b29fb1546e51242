//! Admin API Module
//!
//! Staff endpoints: global listings, status transitions, statistics.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch},
};

use crate::auth;
use crate::core::ServerState;

/// Admin router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/admin/orders", routes())
}

fn routes() -> Router<ServerState> {
    // Couriers may drive transitions; listings and statistics need a
    // manager or admin
    let staff_routes = Router::new()
        .route("/{id}/status", patch(handler::update_status))
        .route_layer(middleware::from_fn(auth::require_staff));

    let manager_routes = Router::new()
        .route("/", get(handler::list_all))
        .route("/statistics", get(handler::statistics))
        .route_layer(middleware::from_fn(auth::require_manager));

    staff_routes.merge(manager_routes)
}
