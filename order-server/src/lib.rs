//! Order Server - order lifecycle engine
//!
//! # Architecture Overview
//!
//! This crate is the order service's main entry point. Core pieces:
//!
//! - **Auth** (`auth`): stateless JWT verification plus a persistent
//!   token revocation set
//! - **Catalog** (`catalog`): snapshot client for the product service
//! - **Orders** (`orders`): the aggregate store, per-order locks and
//!   the lifecycle state machine
//! - **HTTP API** (`api`): RESTful surface under `/api/v1`
//! - **Database** (`db`): embedded SQLite storage
//!
//! # Module Structure
//!
//! ```text
//! order-server/src/
//! ├── core/          # config, state, server, background tasks
//! ├── auth/          # JWT verification, revocation, middleware
//! ├── catalog/       # product snapshot client
//! ├── orders/        # locks, store, service
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # pool setup and repositories
//! ├── routes/        # router assembly and middleware stack
//! └── common/        # logging
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod common;
pub mod core;
pub mod db;
pub mod orders;
pub mod routes;

// Re-export public types
pub use auth::{CurrentUser, JwtService, RevocationStore};
pub use catalog::{CatalogClient, CatalogProduct, CatalogResolver};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderLocks, OrderPolicy, OrderService, OrderStore};

// Re-export unified error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use common::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Audit logging macro - events land in the permanent audit log
#[macro_export]
macro_rules! audit_log {
    ($event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            target: "audit",
            event = $event,
            $($key = $value),*
        );
    };
}

// Security logging macro - supports tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
