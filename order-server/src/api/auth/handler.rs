//! Auth API Handlers

use axum::{Extension, Json, extract::State};

use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use shared::{ApiResponse, AppResult};

/// Revoke the caller's own token
///
/// The marker lives until the token's natural expiry; every subsequent
/// request with this token fails with 401 immediately.
pub async fn logout(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .revocation_store()
        .revoke(&user.token_id, user.expires_at)
        .await?;

    audit_log!(
        "user_logout",
        user_id = user.id.clone(),
        token_id = user.token_id.clone()
    );

    Ok(Json(ApiResponse::ok()))
}
