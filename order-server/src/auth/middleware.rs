//! Authentication middleware
//!
//! Axum middleware for JWT authentication and role checks.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::security_log;
use shared::AppError;

/// Authentication middleware
///
/// Extracts and verifies the JWT from `Authorization: Bearer <token>`,
/// then checks the revocation set by token id. On success a
/// [`CurrentUser`] is injected into request extensions.
///
/// Signature and expiry are checked before the revocation lookup, so a
/// forged token never touches the database.
///
/// # Paths that skip authentication
///
/// - `OPTIONS *` (CORS preflight)
/// - anything outside `/api/`
/// - `GET /health` is mounted outside `/api/` and never reaches here
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // Allow CORS preflight through
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Non-API routes fall through to their own handlers (or 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::not_authenticated());
        }
    };

    let claims = match state.jwt_service().validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );
            return match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            };
        }
    };

    let user = CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Invalid claims: {}", e)))?;

    // Revocation is consulted on every request; a logout is effective
    // immediately
    if state.revocation_store().is_revoked(&user.token_id).await? {
        security_log!(
            "WARN",
            "auth_revoked",
            user_id = user.id.clone(),
            token_id = user.token_id.clone()
        );
        return Err(AppError::token_revoked());
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Staff middleware: couriers, managers and admins only
pub async fn require_staff(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req.current_user()?;
    if !user.is_staff() {
        security_log!(
            "WARN",
            "staff_required",
            user_id = user.id.clone(),
            user_role = user.role.as_str()
        );
        return Err(AppError::new(shared::ErrorCode::StaffRequired));
    }
    Ok(next.run(req).await)
}

/// Manager middleware: managers and admins only
pub async fn require_manager(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req.current_user()?;
    if !user.is_manager() {
        security_log!(
            "WARN",
            "manager_required",
            user_id = user.id.clone(),
            user_role = user.role.as_str()
        );
        return Err(AppError::new(shared::ErrorCode::StaffRequired));
    }
    Ok(next.run(req).await)
}

/// Extension trait for extracting the CurrentUser from a request
pub trait CurrentUserExt {
    /// Get the CurrentUser from request extensions
    ///
    /// Returns 401 when the request never passed authentication.
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or_else(AppError::not_authenticated)
    }
}
