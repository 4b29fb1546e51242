//! Order lifecycle engine: keyed locks, aggregate store, service

pub mod locks;
pub mod service;
pub mod store;

pub use locks::OrderLocks;
pub use service::{OrderPolicy, OrderService};
pub use store::OrderStore;
