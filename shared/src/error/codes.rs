//! Unified error codes for the order platform
//!
//! Error codes are shared between the order server and its clients and
//! are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Product errors
//! - 9xxx: System / dependency errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient
/// serialization and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Token has been revoked (logout / rotation)
    TokenRevoked = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Staff role required
    StaffRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Illegal status transition
    InvalidTransition = 4002,
    /// Order is in a terminal status
    OrderTerminal = 4003,
    /// Order is no longer pending
    OrderNotPending = 4004,
    /// Order is locked by a concurrent mutation
    OrderLocked = 4005,
    /// Order has no items
    OrderEmpty = 4006,
    /// Order total below the configured minimum
    OrderBelowMinimum = 4007,

    // ==================== 6xxx: Product ====================
    /// Product not found in the catalog
    ProductNotFound = 6001,
    /// Product exists but is not available for ordering
    ProductUnavailable = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Catalog service unreachable
    CatalogUnavailable = 9101,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::TokenRevoked => "Authentication token has been revoked",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::StaffRequired => "Staff role is required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Illegal order status transition",
            ErrorCode::OrderTerminal => "Order is already delivered or cancelled",
            ErrorCode::OrderNotPending => "Order is no longer pending",
            ErrorCode::OrderLocked => "Order is being modified by another request",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::OrderBelowMinimum => "Order total is below the minimum order amount",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductUnavailable => "Product is not available",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::CatalogUnavailable => "Catalog service is unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            7 => Self::RequiredField,
            1001 => Self::NotAuthenticated,
            1002 => Self::InvalidCredentials,
            1003 => Self::TokenExpired,
            1004 => Self::TokenInvalid,
            1005 => Self::TokenRevoked,
            2001 => Self::PermissionDenied,
            2002 => Self::RoleRequired,
            2003 => Self::StaffRequired,
            4001 => Self::OrderNotFound,
            4002 => Self::InvalidTransition,
            4003 => Self::OrderTerminal,
            4004 => Self::OrderNotPending,
            4005 => Self::OrderLocked,
            4006 => Self::OrderEmpty,
            4007 => Self::OrderBelowMinimum,
            6001 => Self::ProductNotFound,
            6002 => Self::ProductUnavailable,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::NetworkError,
            9004 => Self::TimeoutError,
            9005 => Self::ConfigError,
            9101 => Self::CatalogUnavailable,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
