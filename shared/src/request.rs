//! Request types for the shared crate
//!
//! Common request types used across the platform

use serde::{Deserialize, Deserializer, Serialize};

/// Pagination query parameters
///
/// The numeric fields also accept string values: query-string
/// deserialization buffers values as strings when this struct is
/// `#[serde(flatten)]`-ed into a larger query type.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    /// Page number (1-based, default: 1)
    #[serde(default = "default_page", deserialize_with = "lenient_u32")]
    pub page: u32,

    /// Items per page (default: 20, max: 100)
    #[serde(default = "default_per_page", deserialize_with = "lenient_u32")]
    pub per_page: u32,
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientU32;

    impl serde::de::Visitor<'_> for LenientU32 {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an unsigned integer or a numeric string")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(E::custom)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(E::custom)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<u32, E> {
            v.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(LenientU32)
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationQuery {
    /// Get the offset for database queries
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)) as u64 * self.limit() as u64
    }

    /// Get the limit (clamped to 1..=100)
    pub fn limit(&self) -> u32 {
        self.per_page.clamp(1, 100)
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// Build a page from rows and the total matching count
    pub fn new(data: Vec<T>, total: u64, pagination: &PaginationQuery) -> Self {
        let per_page = pagination.limit();
        let total_pages = total.div_ceil(per_page as u64) as u32;
        Self {
            data,
            total,
            page: pagination.page,
            per_page,
            total_pages,
        }
    }
}
