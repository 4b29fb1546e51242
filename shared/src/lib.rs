//! Shared types for the order platform
//!
//! Common types used across crates: the unified error system, the order
//! domain model with its status state machine, pagination helpers and
//! small utilities.

pub mod error;
pub mod models;
pub mod request;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::order::{Order, OrderStatus, UserRole};
pub use request::{PaginatedResponse, PaginationQuery};
