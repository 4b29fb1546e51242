use std::sync::Arc;

use crate::auth::{JwtService, RevocationStore};
use crate::catalog::CatalogClient;
use crate::core::Config;
use crate::db::DbService;
use crate::orders::{OrderService, OrderStore};
use shared::{AppError, AppResult};

/// Server state — shared references to every service
///
/// Cloning is cheap; every field is either `Clone`-over-`Arc` or a
/// pooled handle.
///
/// | Field | Description |
/// |-------|-------------|
/// | config | Immutable configuration |
/// | db | SQLite pool (WAL) |
/// | jwt_service | JWT verification |
/// | revocation_store | Revoked token set |
/// | order_service | Order lifecycle engine |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    pub revocation_store: RevocationStore,
    pub order_service: Arc<OrderService>,
}

impl ServerState {
    /// Initialize every service from configuration
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .map_err(|e| AppError::internal(format!("Failed to create work dir: {e}")))?;

        let db = DbService::new(&config.db_path()).await?;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let revocation_store = RevocationStore::new(db.pool.clone());

        let catalog = Arc::new(CatalogClient::new(
            &config.catalog_base_url,
            config.catalog_timeout(),
        )?);
        let store = OrderStore::new(db.pool.clone(), config.lock_timeout());
        let order_service = Arc::new(OrderService::new(store, catalog, config.policy.clone()));

        Ok(Self {
            config: config.clone(),
            db,
            jwt_service,
            revocation_store,
            order_service,
        })
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn revocation_store(&self) -> &RevocationStore {
        &self.revocation_store
    }

    pub fn order_service(&self) -> &OrderService {
        &self.order_service
    }
}
