//! Order service
//!
//! Orchestrates the order lifecycle: creation against a catalog
//! snapshot, role-gated reads, and lock-serialized mutations driven by
//! the status state machine.

use super::store::OrderStore;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::catalog::CatalogResolver;
use crate::db::repository::order::OrderFilter;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use shared::models::order::{
    DeliveryType, Order, OrderCreate, OrderItem, OrderStatistics, OrderStatus, OrderUpdate,
    StatusHistoryEntry,
};
use shared::{AppError, AppResult, ErrorCode, PaginatedResponse, PaginationQuery};
use std::sync::Arc;
use validator::Validate;

/// Pricing and policy knobs, loaded from configuration
#[derive(Debug, Clone)]
pub struct OrderPolicy {
    /// Flat fee for delivery orders below the free-delivery threshold
    pub delivery_fee: Decimal,
    /// Subtotal at which delivery becomes free
    pub free_delivery_threshold: Decimal,
    /// Minimum order subtotal
    pub min_order_amount: Decimal,
    /// Estimated delivery window stamped at creation
    pub estimated_delivery_minutes: i64,
}

pub struct OrderService {
    store: OrderStore,
    catalog: Arc<dyn CatalogResolver>,
    policy: OrderPolicy,
}

impl OrderService {
    pub fn new(store: OrderStore, catalog: Arc<dyn CatalogResolver>, policy: OrderPolicy) -> Self {
        Self {
            store,
            catalog,
            policy,
        }
    }

    /// Create an order from a catalog snapshot
    ///
    /// Prices are frozen from the snapshot; later catalog changes never
    /// touch an existing order. Nothing is persisted unless every
    /// requested product resolves and is available.
    pub async fn create_order(&self, user: &CurrentUser, payload: OrderCreate) -> AppResult<Order> {
        payload
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        if payload.delivery_type == DeliveryType::Delivery
            && payload
                .delivery_address
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            return Err(AppError::validation(
                "delivery_address is required for delivery orders",
            )
            .with_detail("field", "delivery_address"));
        }

        // One catalog call per order, duplicate ids collapsed
        let mut product_ids: Vec<String> =
            payload.items.iter().map(|i| i.product_id.clone()).collect();
        product_ids.sort();
        product_ids.dedup();

        let snapshot = self.catalog.resolve(&product_ids).await?;

        let mut items = Vec::with_capacity(payload.items.len());
        let mut subtotal = Decimal::ZERO;
        for line in &payload.items {
            let product = snapshot
                .get(&line.product_id)
                .ok_or_else(|| AppError::product_not_found(&line.product_id))?;
            if !product.available {
                return Err(AppError::product_unavailable(&line.product_id));
            }
            let line_total = product.unit_price * Decimal::from(line.quantity);
            subtotal += line_total;
            items.push(OrderItem {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                unit_price: product.unit_price,
                quantity: line.quantity,
                line_total,
                note: line.note.clone(),
            });
        }

        if subtotal < self.policy.min_order_amount {
            return Err(AppError::with_message(
                ErrorCode::OrderBelowMinimum,
                format!(
                    "Order subtotal {} is below the minimum of {}",
                    subtotal, self.policy.min_order_amount
                ),
            ));
        }

        let delivery_fee = match payload.delivery_type {
            DeliveryType::Delivery if subtotal < self.policy.free_delivery_threshold => {
                self.policy.delivery_fee
            }
            _ => Decimal::ZERO,
        };

        let now = Utc::now();
        let estimated_delivery = match payload.delivery_type {
            DeliveryType::Delivery => {
                Some(now + Duration::minutes(self.policy.estimated_delivery_minutes))
            }
            DeliveryType::Pickup => None,
        };

        let order = Order {
            id: shared::util::new_id(),
            order_number: shared::util::order_number(),
            user_id: user.id.clone(),
            status: OrderStatus::Pending,
            delivery_type: payload.delivery_type,
            payment_method: payload.payment_method,
            contact_name: payload.contact_name,
            contact_phone: payload.contact_phone,
            contact_email: payload.contact_email,
            delivery_address: payload.delivery_address,
            customer_note: payload.customer_note,
            promo_code: payload.promo_code,
            subtotal,
            delivery_fee,
            total_amount: subtotal + delivery_fee,
            estimated_delivery,
            delivered_at: None,
            created_at: now,
            updated_at: now,
            items,
        };

        self.store.create(&order, &user.id).await?;

        audit_log!(
            "order_created",
            order_id = order.id.clone(),
            order_number = order.order_number.clone(),
            user_id = user.id.clone(),
            total = order.total_amount.to_string()
        );
        tracing::info!(order_id = %order.id, user_id = %user.id, "Order created");

        Ok(order)
    }

    /// Fetch one order; customers see only their own
    pub async fn get_order(&self, user: &CurrentUser, id: &str) -> AppResult<Order> {
        let order = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::order_not_found(id))?;

        if !order.is_owned_by(&user.id) && !user.is_staff() {
            return Err(AppError::forbidden("You do not have access to this order"));
        }
        Ok(order)
    }

    /// List the caller's own orders
    pub async fn list_mine(
        &self,
        user: &CurrentUser,
        mut filter: OrderFilter,
        pagination: &PaginationQuery,
    ) -> AppResult<PaginatedResponse<Order>> {
        filter.user_id = Some(user.id.clone());
        let (orders, total) = self.store.list(&filter, pagination).await?;
        Ok(PaginatedResponse::new(orders, total, pagination))
    }

    /// List all orders (managers and admins)
    pub async fn list_all(
        &self,
        user: &CurrentUser,
        filter: OrderFilter,
        pagination: &PaginationQuery,
    ) -> AppResult<PaginatedResponse<Order>> {
        if !user.is_manager() {
            return Err(AppError::new(ErrorCode::StaffRequired));
        }
        let (orders, total) = self.store.list(&filter, pagination).await?;
        Ok(PaginatedResponse::new(orders, total, pagination))
    }

    /// Edit contact and delivery details of a pending order (owner only)
    pub async fn update_order(
        &self,
        user: &CurrentUser,
        id: &str,
        payload: OrderUpdate,
    ) -> AppResult<Order> {
        payload
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        if payload.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let user_id = user.id.clone();
        let order = self
            .store
            .with_lock(id, move |order| {
                if !order.is_owned_by(&user_id) {
                    return Err(AppError::forbidden("You do not have access to this order"));
                }
                if order.status != OrderStatus::Pending {
                    return Err(AppError::new(ErrorCode::OrderNotPending));
                }

                if let Some(name) = payload.contact_name {
                    order.contact_name = name;
                }
                if let Some(phone) = payload.contact_phone {
                    order.contact_phone = phone;
                }
                if let Some(email) = payload.contact_email {
                    order.contact_email = Some(email);
                }
                if let Some(address) = payload.delivery_address {
                    // A delivery order must keep a usable address
                    if order.delivery_type == DeliveryType::Delivery
                        && address.trim().is_empty()
                    {
                        return Err(AppError::validation(
                            "delivery_address is required for delivery orders",
                        )
                        .with_detail("field", "delivery_address"));
                    }
                    order.delivery_address = Some(address);
                }
                if let Some(note) = payload.customer_note {
                    order.customer_note = Some(note);
                }
                Ok(None)
            })
            .await?;

        audit_log!(
            "order_updated",
            order_id = order.id.clone(),
            user_id = user.id.clone()
        );
        Ok(order)
    }

    /// Cancel an order
    ///
    /// Customers may cancel their own order while it is still pending;
    /// staff may cancel any non-terminal order. Cancelling a cancelled
    /// order is an illegal transition, not a no-op.
    pub async fn cancel_order(
        &self,
        user: &CurrentUser,
        id: &str,
        reason: Option<String>,
    ) -> AppResult<Order> {
        let actor = user.clone();
        let order = self
            .store
            .with_lock(id, move |order| {
                if !order.is_owned_by(&actor.id) && !actor.is_staff() {
                    return Err(AppError::forbidden("You do not have access to this order"));
                }
                if !order.status.can_transition_to(OrderStatus::Cancelled) {
                    return Err(AppError::invalid_transition(
                        order.status.as_str(),
                        OrderStatus::Cancelled.as_str(),
                    ));
                }
                if !actor.is_staff() && order.status != OrderStatus::Pending {
                    return Err(AppError::with_message(
                        ErrorCode::OrderNotPending,
                        "Only pending orders can be cancelled by the customer",
                    ));
                }

                let entry = StatusHistoryEntry {
                    from_status: Some(order.status),
                    to_status: OrderStatus::Cancelled,
                    changed_by: actor.id.clone(),
                    reason,
                    created_at: Utc::now(),
                };
                order.status = OrderStatus::Cancelled;
                Ok(Some(entry))
            })
            .await?;

        audit_log!(
            "order_cancelled",
            order_id = order.id.clone(),
            user_id = user.id.clone()
        );
        tracing::info!(order_id = %order.id, user_id = %user.id, "Order cancelled");
        Ok(order)
    }

    /// Drive a status transition (staff)
    pub async fn transition_status(
        &self,
        user: &CurrentUser,
        id: &str,
        target: OrderStatus,
        reason: Option<String>,
    ) -> AppResult<Order> {
        if !user.is_staff() {
            return Err(AppError::new(ErrorCode::StaffRequired));
        }

        let actor_id = user.id.clone();
        let order = self
            .store
            .with_lock(id, move |order| {
                if !order.status.can_transition_to(target) {
                    return Err(AppError::invalid_transition(
                        order.status.as_str(),
                        target.as_str(),
                    ));
                }

                let entry = StatusHistoryEntry {
                    from_status: Some(order.status),
                    to_status: target,
                    changed_by: actor_id,
                    reason,
                    created_at: Utc::now(),
                };
                order.status = target;
                if target == OrderStatus::Delivered {
                    order.delivered_at = Some(Utc::now());
                }
                Ok(Some(entry))
            })
            .await?;

        audit_log!(
            "order_status_changed",
            order_id = order.id.clone(),
            user_id = user.id.clone(),
            status = order.status.as_str()
        );
        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            "Order status changed"
        );
        Ok(order)
    }

    /// The append-only status history (owner or staff)
    pub async fn history(
        &self,
        user: &CurrentUser,
        id: &str,
    ) -> AppResult<Vec<StatusHistoryEntry>> {
        // Reuses the ownership check
        self.get_order(user, id).await?;
        self.store.history(id).await
    }

    /// On-demand statistics projection (managers and admins)
    pub async fn statistics(
        &self,
        user: &CurrentUser,
        filter: OrderFilter,
    ) -> AppResult<OrderStatistics> {
        if !user.is_manager() {
            return Err(AppError::new(ErrorCode::StaffRequired));
        }
        self.store.statistics(&filter).await
    }
}
