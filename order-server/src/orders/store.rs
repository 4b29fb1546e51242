//! Order aggregate store
//!
//! Pairs the SQL repository with the keyed lock map. All read-modify-
//! write cycles go through [`OrderStore::with_lock`], which loads the
//! latest persisted state only after the lock is held.

use super::locks::OrderLocks;
use crate::db::repository::order as order_repo;
use crate::db::repository::order::OrderFilter;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::models::order::{
    DailyOrderStats, Order, OrderStatistics, OrderStatus, StatusHistoryEntry,
};
use shared::{AppError, AppResult, PaginationQuery};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Clone)]
pub struct OrderStore {
    pool: SqlitePool,
    locks: OrderLocks,
    lock_timeout: Duration,
}

impl OrderStore {
    pub fn new(pool: SqlitePool, lock_timeout: Duration) -> Self {
        Self {
            pool,
            locks: OrderLocks::new(),
            lock_timeout,
        }
    }

    /// Persist a new aggregate: order, items and the creation history
    /// entry commit together or not at all.
    pub async fn create(&self, order: &Order, changed_by: &str) -> AppResult<()> {
        order_repo::insert(&self.pool, order, changed_by).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Order>> {
        Ok(order_repo::find_by_id(&self.pool, id).await?)
    }

    pub async fn list(
        &self,
        filter: &OrderFilter,
        pagination: &PaginationQuery,
    ) -> AppResult<(Vec<Order>, u64)> {
        Ok(order_repo::list(&self.pool, filter, pagination).await?)
    }

    pub async fn history(&self, order_id: &str) -> AppResult<Vec<StatusHistoryEntry>> {
        Ok(order_repo::history(&self.pool, order_id).await?)
    }

    /// Run a mutation under this order's lock
    ///
    /// The closure receives the latest persisted state and returns the
    /// history entry to append, if the mutation changed the status. The
    /// mutated aggregate is persisted in one transaction before the
    /// lock is released.
    pub async fn with_lock<F>(&self, order_id: &str, mutate: F) -> AppResult<Order>
    where
        F: FnOnce(&mut Order) -> AppResult<Option<StatusHistoryEntry>>,
    {
        let _guard = self.locks.acquire(order_id, self.lock_timeout).await?;

        let mut order = order_repo::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::order_not_found(order_id))?;

        let history = mutate(&mut order)?;
        order.updated_at = Utc::now();

        order_repo::persist_update(&self.pool, &order, history.as_ref()).await?;
        Ok(order)
    }

    /// Build the statistics projection for orders matching the filter
    pub async fn statistics(&self, filter: &OrderFilter) -> AppResult<OrderStatistics> {
        let rows = order_repo::statistics_rows(&self.pool, filter).await?;

        let mut by_status: HashMap<String, i64> = HashMap::new();
        let mut delivered_revenue = Decimal::ZERO;
        let mut delivered_count = 0i64;
        let mut daily: Vec<DailyOrderStats> = Vec::new();

        for (day, status, total) in &rows {
            *by_status.entry(status.as_str().to_string()).or_insert(0) += 1;

            let delivered = *status == OrderStatus::Delivered;
            if delivered {
                delivered_revenue += total;
                delivered_count += 1;
            }

            // Rows arrive ordered by day
            match daily.last_mut() {
                Some(bucket) if bucket.date == *day => {
                    bucket.order_count += 1;
                    if delivered {
                        bucket.revenue += total;
                    }
                }
                _ => daily.push(DailyOrderStats {
                    date: day.clone(),
                    order_count: 1,
                    revenue: if delivered { *total } else { Decimal::ZERO },
                }),
            }
        }

        let average_order_value = if delivered_count > 0 {
            (delivered_revenue / Decimal::from(delivered_count)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(OrderStatistics {
            total_orders: rows.len() as i64,
            by_status,
            delivered_revenue,
            average_order_value,
            daily,
        })
    }
}
