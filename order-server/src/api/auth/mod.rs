//! Auth API Module
//!
//! Logout is the revocation hook: the presented token's id goes into
//! the revocation set for the remainder of its lifetime.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Auth router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/v1/auth/logout", post(handler::logout))
}
