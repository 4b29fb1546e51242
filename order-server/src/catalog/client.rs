//! HTTP client for the catalog service
//!
//! Fetches point-in-time product snapshots at order creation. Results
//! are never cached across requests; a snapshot is only valid for the
//! order being priced.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{AppError, AppResult};
use std::collections::HashMap;
use std::time::Duration;

/// Delay before the single retry on a transport failure
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Product snapshot as seen by the catalog at this instant
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    pub available: bool,
}

#[derive(Debug, Deserialize)]
struct CatalogEnvelope {
    success: bool,
    #[serde(default)]
    data: Vec<CatalogProduct>,
}

/// Resolver seam: the order service only needs this one lookup, and
/// tests substitute a stub.
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    /// Resolve product ids to snapshots. Ids unknown to the catalog are
    /// simply absent from the result; only transport-level failure is
    /// an error.
    async fn resolve(&self, product_ids: &[String])
    -> AppResult<HashMap<String, CatalogProduct>>;
}

/// reqwest-backed catalog client
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, product_ids: &[String]) -> Result<Vec<CatalogProduct>, reqwest::Error> {
        let url = format!("{}/internal/products/by-ids", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(product_ids)
            .send()
            .await?
            .error_for_status()?;
        let envelope: CatalogEnvelope = response.json().await?;
        if envelope.success {
            Ok(envelope.data)
        } else {
            Ok(vec![])
        }
    }
}

#[async_trait]
impl CatalogResolver for CatalogClient {
    async fn resolve(
        &self,
        product_ids: &[String],
    ) -> AppResult<HashMap<String, CatalogProduct>> {
        let products = match self.fetch(product_ids).await {
            Ok(products) => products,
            // Retry exactly once, on transport errors only; an HTTP
            // error status is already a definitive answer
            Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                tracing::warn!(error = %e, "Catalog request failed, retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;
                self.fetch(product_ids).await.map_err(|e| {
                    tracing::error!(error = %e, "Catalog unreachable");
                    AppError::catalog_unavailable(format!("Catalog service unreachable: {e}"))
                })?
            }
            Err(e) => {
                tracing::error!(error = %e, "Catalog returned an error");
                return Err(AppError::catalog_unavailable(format!(
                    "Catalog service error: {e}"
                )));
            }
        };

        Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parsing() {
        let json = r#"{"success":true,"data":[
            {"id":"p1","name":"Margherita","price":"8.50","available":true},
            {"id":"p2","name":"Calzone","price":11.0,"available":false}
        ]}"#;
        let envelope: CatalogEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.data[0].unit_price, Decimal::new(850, 2));
        assert!(!envelope.data[1].available);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = CatalogClient::new("http://catalog:8001/", Duration::from_secs(2)).unwrap();
        assert_eq!(client.base_url, "http://catalog:8001");
    }
}
