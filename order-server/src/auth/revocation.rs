//! Token revocation store
//!
//! Durable set of revoked token ids. Every authenticated request reads
//! through to the database so a revocation takes effect immediately on
//! all workers; there is no per-process cache to go stale.

use crate::db::repository::revoked_token;
use chrono::{DateTime, Utc};
use shared::AppResult;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct RevocationStore {
    pool: SqlitePool,
}

impl RevocationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Revoke a token id until its natural expiry. Idempotent.
    pub async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        revoked_token::insert(&self.pool, token_id, expires_at).await?;
        tracing::info!(token_id, %expires_at, "Token revoked");
        Ok(())
    }

    /// Check whether a token id has been revoked
    pub async fn is_revoked(&self, token_id: &str) -> AppResult<bool> {
        Ok(revoked_token::exists(&self.pool, token_id).await?)
    }

    /// Drop markers for tokens that have expired anyway
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let removed = revoked_token::purge_expired(&self.pool).await?;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired revocation markers");
        }
        Ok(removed)
    }
}
