//! Order Repository
//!
//! Persists the order aggregate: the order row, its items and its
//! append-only status history. Money columns are stored as canonical
//! decimal strings and parsed back at the boundary.

use super::{RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::PaginationQuery;
use shared::models::order::{
    DeliveryType, Order, OrderItem, OrderStatus, PaymentMethod, StatusHistoryEntry,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

/// Filters shared by the listing endpoints and statistics
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    user_id: String,
    status: String,
    delivery_type: String,
    payment_method: String,
    contact_name: String,
    contact_phone: String,
    contact_email: Option<String>,
    delivery_address: Option<String>,
    customer_note: Option<String>,
    promo_code: Option<String>,
    subtotal: String,
    delivery_fee: String,
    total_amount: String,
    estimated_delivery: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: String,
    product_name: String,
    unit_price: String,
    quantity: i32,
    line_total: String,
    note: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    from_status: Option<String>,
    to_status: String,
    changed_by: String,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_decimal(column: &str, value: &str) -> RepoResult<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| RepoError::Corrupt(format!("{column} is not a decimal ({value}): {e}")))
}

fn parse_status(value: &str) -> RepoResult<OrderStatus> {
    OrderStatus::from_str(value).map_err(RepoError::Corrupt)
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> RepoResult<Order> {
        Ok(Order {
            status: parse_status(&self.status)?,
            delivery_type: DeliveryType::from_str(&self.delivery_type)
                .map_err(RepoError::Corrupt)?,
            payment_method: PaymentMethod::from_str(&self.payment_method)
                .map_err(RepoError::Corrupt)?,
            subtotal: parse_decimal("subtotal", &self.subtotal)?,
            delivery_fee: parse_decimal("delivery_fee", &self.delivery_fee)?,
            total_amount: parse_decimal("total_amount", &self.total_amount)?,
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            contact_name: self.contact_name,
            contact_phone: self.contact_phone,
            contact_email: self.contact_email,
            delivery_address: self.delivery_address,
            customer_note: self.customer_note,
            promo_code: self.promo_code,
            estimated_delivery: self.estimated_delivery,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

impl OrderItemRow {
    fn into_item(self) -> RepoResult<OrderItem> {
        Ok(OrderItem {
            unit_price: parse_decimal("unit_price", &self.unit_price)?,
            line_total: parse_decimal("line_total", &self.line_total)?,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            note: self.note,
        })
    }
}

impl HistoryRow {
    fn into_entry(self) -> RepoResult<StatusHistoryEntry> {
        Ok(StatusHistoryEntry {
            from_status: self.from_status.as_deref().map(parse_status).transpose()?,
            to_status: parse_status(&self.to_status)?,
            changed_by: self.changed_by,
            reason: self.reason,
            created_at: self.created_at,
        })
    }
}

/// Insert a freshly created order with its items and the creation
/// history entry, all in one transaction.
pub async fn insert(pool: &SqlitePool, order: &Order, changed_by: &str) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, status, delivery_type, payment_method, \
         contact_name, contact_phone, contact_email, delivery_address, customer_note, \
         promo_code, subtotal, delivery_fee, total_amount, estimated_delivery, delivered_at, \
         created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.user_id)
    .bind(order.status.as_str())
    .bind(order.delivery_type.as_str())
    .bind(order.payment_method.as_str())
    .bind(&order.contact_name)
    .bind(&order.contact_phone)
    .bind(&order.contact_email)
    .bind(&order.delivery_address)
    .bind(&order.customer_note)
    .bind(&order.promo_code)
    .bind(order.subtotal.to_string())
    .bind(order.delivery_fee.to_string())
    .bind(order.total_amount.to_string())
    .bind(order.estimated_delivery)
    .bind(order.delivered_at)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;

    for item in &order.items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, product_name, unit_price, \
             quantity, line_total, note) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.unit_price.to_string())
        .bind(item.quantity)
        .bind(item.line_total.to_string())
        .bind(&item.note)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "INSERT INTO order_status_history (order_id, from_status, to_status, changed_by, \
         reason, created_at) VALUES (?, NULL, ?, ?, NULL, ?)",
    )
    .bind(&order.id)
    .bind(order.status.as_str())
    .bind(changed_by)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Load a full order aggregate by id
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT product_id, product_name, unit_price, quantity, line_total, note \
         FROM order_items WHERE order_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let items = item_rows
        .into_iter()
        .map(OrderItemRow::into_item)
        .collect::<RepoResult<Vec<_>>>()?;

    row.into_order(items).map(Some)
}

/// Persist a mutated aggregate, appending a history entry when the
/// mutation changed the status. Runs in one transaction.
pub async fn persist_update(
    pool: &SqlitePool,
    order: &Order,
    history: Option<&StatusHistoryEntry>,
) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE orders SET status = ?, contact_name = ?, contact_phone = ?, \
         contact_email = ?, delivery_address = ?, customer_note = ?, delivered_at = ?, \
         updated_at = ? WHERE id = ?",
    )
    .bind(order.status.as_str())
    .bind(&order.contact_name)
    .bind(&order.contact_phone)
    .bind(&order.contact_email)
    .bind(&order.delivery_address)
    .bind(&order.customer_note)
    .bind(order.delivered_at)
    .bind(order.updated_at)
    .bind(&order.id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("order {}", order.id)));
    }

    if let Some(entry) = history {
        sqlx::query(
            "INSERT INTO order_status_history (order_id, from_status, to_status, changed_by, \
             reason, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(entry.from_status.map(|s| s.as_str()))
        .bind(entry.to_status.as_str())
        .bind(&entry.changed_by)
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// The append-only status history, oldest first
pub async fn history(pool: &SqlitePool, order_id: &str) -> RepoResult<Vec<StatusHistoryEntry>> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT from_status, to_status, changed_by, reason, created_at \
         FROM order_status_history WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(HistoryRow::into_entry).collect()
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    builder.push(" WHERE 1=1");
    if let Some(user_id) = &filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id.clone());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.date_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        builder.push(" AND created_at <= ").push_bind(to);
    }
}

/// List orders matching the filter, newest first, with the total count
///
/// Items are loaded per order; listing pages are small (max 100).
pub async fn list(
    pool: &SqlitePool,
    filter: &OrderFilter,
    pagination: &PaginationQuery,
) -> RepoResult<(Vec<Order>, u64)> {
    let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
    push_filter(&mut count_query, filter);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut list_query = QueryBuilder::<Sqlite>::new("SELECT * FROM orders");
    push_filter(&mut list_query, filter);
    list_query
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(pagination.limit() as i64)
        .push(" OFFSET ")
        .push_bind(pagination.offset() as i64);

    let rows: Vec<OrderRow> = list_query.build_query_as().fetch_all(pool).await?;

    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT product_id, product_name, unit_price, quantity, line_total, note \
             FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(&row.id)
        .fetch_all(pool)
        .await?;
        let items = item_rows
            .into_iter()
            .map(OrderItemRow::into_item)
            .collect::<RepoResult<Vec<_>>>()?;
        orders.push(row.into_order(items)?);
    }

    Ok((orders, total as u64))
}

#[derive(Debug, sqlx::FromRow)]
struct StatRow {
    day: String,
    status: String,
    total_amount: String,
}

/// Raw per-order rows for the statistics projection
///
/// Aggregation happens in Rust so the decimal amounts never go through
/// SQLite floating point.
pub async fn statistics_rows(
    pool: &SqlitePool,
    filter: &OrderFilter,
) -> RepoResult<Vec<(String, OrderStatus, Decimal)>> {
    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT substr(created_at, 1, 10) AS day, status, total_amount FROM orders",
    );
    push_filter(&mut query, filter);
    query.push(" ORDER BY day");

    let rows: Vec<StatRow> = query.build_query_as().fetch_all(pool).await?;
    rows.into_iter()
        .map(|r| {
            Ok((
                r.day,
                parse_status(&r.status)?,
                parse_decimal("total_amount", &r.total_amount)?,
            ))
        })
        .collect()
}
