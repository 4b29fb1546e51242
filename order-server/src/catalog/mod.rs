//! Catalog snapshot client

pub mod client;

pub use client::{CatalogClient, CatalogProduct, CatalogResolver};
