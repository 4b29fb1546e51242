use crate::auth::JwtConfig;
use crate::orders::OrderPolicy;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration
///
/// # Environment variables
///
/// Every setting can be overridden through the environment:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/order-server | Working directory (database, logs) |
/// | HTTP_PORT | 8003 | HTTP service port |
/// | ENVIRONMENT | development | Runtime environment |
/// | CATALOG_BASE_URL | http://localhost:8001 | Catalog service base URL |
/// | CATALOG_TIMEOUT_MS | 2000 | Per-request catalog timeout |
/// | LOCK_TIMEOUT_MS | 3000 | Per-order lock acquisition timeout |
/// | DELIVERY_FEE | 2.99 | Flat delivery fee |
/// | FREE_DELIVERY_THRESHOLD | 25.00 | Subtotal for free delivery |
/// | MIN_ORDER_AMOUNT | 10.00 | Minimum order subtotal |
/// | ESTIMATED_DELIVERY_MINUTES | 45 | Delivery estimate at creation |
/// | REVOCATION_PURGE_INTERVAL_SECS | 3600 | Revocation purge cadence |
///
/// JWT settings (`JWT_SECRET`, `JWT_ISSUER`, `JWT_AUDIENCE`,
/// `JWT_EXPIRATION_MINUTES`) are read by [`JwtConfig`].
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// JWT verification configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,

    /// Catalog service base URL
    pub catalog_base_url: String,
    /// Per-request catalog timeout (milliseconds)
    pub catalog_timeout_ms: u64,
    /// Per-order lock acquisition timeout (milliseconds)
    pub lock_timeout_ms: u64,
    /// Revocation purge task cadence (seconds)
    pub revocation_purge_interval_secs: u64,

    /// Pricing and lifecycle policy
    pub policy: OrderPolicy,
}

fn env_decimal(name: &str, default: &str) -> Decimal {
    std::env::var(name)
        .ok()
        .and_then(|v| Decimal::from_str(&v).ok())
        .unwrap_or_else(|| Decimal::from_str(default).unwrap_or_default())
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/order-server".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8003),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            catalog_base_url: std::env::var("CATALOG_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".into()),
            catalog_timeout_ms: std::env::var("CATALOG_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(2000),
            lock_timeout_ms: std::env::var("LOCK_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            revocation_purge_interval_secs: std::env::var("REVOCATION_PURGE_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3600),
            policy: OrderPolicy {
                delivery_fee: env_decimal("DELIVERY_FEE", "2.99"),
                free_delivery_threshold: env_decimal("FREE_DELIVERY_THRESHOLD", "25.00"),
                min_order_amount: env_decimal("MIN_ORDER_AMOUNT", "10.00"),
                estimated_delivery_minutes: std::env::var("ESTIMATED_DELIVERY_MINUTES")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(45),
            },
        }
    }

    /// Path of the SQLite database file
    pub fn db_path(&self) -> String {
        format!("{}/orders.db", self.work_dir)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_millis(self.catalog_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
