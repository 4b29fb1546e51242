//! Token revocation integration tests

use chrono::{Duration, Utc};
use order_server::auth::RevocationStore;
use order_server::db::DbService;

async fn setup() -> (RevocationStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("orders.db");
    let db = DbService::new(db_path.to_str().unwrap()).await.unwrap();
    (RevocationStore::new(db.pool.clone()), dir)
}

#[tokio::test]
async fn revocation_is_immediate() {
    let (store, _dir) = setup().await;
    let expires = Utc::now() + Duration::hours(1);

    assert!(!store.is_revoked("jti-1").await.unwrap());
    store.revoke("jti-1", expires).await.unwrap();
    assert!(store.is_revoked("jti-1").await.unwrap());

    // Other tokens are untouched
    assert!(!store.is_revoked("jti-2").await.unwrap());
}

#[tokio::test]
async fn revoke_is_idempotent() {
    let (store, _dir) = setup().await;
    let expires = Utc::now() + Duration::hours(1);

    store.revoke("jti-1", expires).await.unwrap();
    store.revoke("jti-1", expires).await.unwrap();
    assert!(store.is_revoked("jti-1").await.unwrap());
}

#[tokio::test]
async fn purge_drops_only_expired_markers() {
    let (store, _dir) = setup().await;

    store
        .revoke("jti-old", Utc::now() - Duration::minutes(5))
        .await
        .unwrap();
    store
        .revoke("jti-live", Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert!(store.is_revoked("jti-old").await.unwrap());

    let removed = store.purge_expired().await.unwrap();
    assert_eq!(removed, 1);

    // The expired marker is gone, but its token is expired anyway
    assert!(!store.is_revoked("jti-old").await.unwrap());
    assert!(store.is_revoked("jti-live").await.unwrap());

    // Nothing left to purge
    assert_eq!(store.purge_expired().await.unwrap(), 0);
}
