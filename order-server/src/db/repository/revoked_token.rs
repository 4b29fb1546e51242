//! Revoked Token Repository
//!
//! Backing table for the revocation set. Markers carry the token's
//! natural expiry so the purge task can drop them once they no longer
//! matter.

use super::RepoResult;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Record a revoked token id. Revoking the same id twice is a no-op.
pub async fn insert(
    pool: &SqlitePool,
    token_id: &str,
    expires_at: DateTime<Utc>,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO revoked_tokens (token_id, revoked_at, expires_at) VALUES (?, ?, ?) \
         ON CONFLICT(token_id) DO NOTHING",
    )
    .bind(token_id)
    .bind(Utc::now())
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Check whether a token id has been revoked
pub async fn exists(pool: &SqlitePool, token_id: &str) -> RepoResult<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM revoked_tokens WHERE token_id = ?")
            .bind(token_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// Delete markers whose token has expired anyway; returns rows removed
pub async fn purge_expired(pool: &SqlitePool) -> RepoResult<u64> {
    let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
