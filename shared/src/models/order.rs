//! Order domain model and status state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order lifecycle status
///
/// The happy path is strictly linear:
/// pending → confirmed → preparing → ready → delivering → delivered.
/// Any non-terminal status may also move to `Cancelled`. `Delivered`
/// and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Check whether this status admits no further transitions
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// The next status on the linear happy path, if any
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Preparing),
            Self::Preparing => Some(Self::Ready),
            Self::Ready => Some(Self::Delivering),
            Self::Delivering => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }

    /// Check whether a transition to `target` is legal
    ///
    /// Legal edges are the single forward step plus cancellation from
    /// any non-terminal status. Self-transitions are illegal, including
    /// cancelled → cancelled.
    pub fn can_transition_to(&self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if target == Self::Cancelled {
            return true;
        }
        self.next() == Some(target)
    }

    /// All statuses reachable from this one in a single transition
    pub fn allowed_transitions(&self) -> Vec<Self> {
        let mut targets = Vec::with_capacity(2);
        if let Some(next) = self.next() {
            targets.push(next);
        }
        if !self.is_terminal() {
            targets.push(Self::Cancelled);
        }
        targets
    }

    /// The stable string form, used in the database and the API
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "delivering" => Ok(Self::Delivering),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the order reaches the customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    #[default]
    Delivery,
    Pickup,
}

impl DeliveryType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Pickup => "pickup",
        }
    }
}

impl std::str::FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(Self::Delivery),
            "pickup" => Ok(Self::Pickup),
            other => Err(format!("unknown delivery type: {}", other)),
        }
    }
}

/// Declared payment method (payment processing itself is external)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Online,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Online => "online",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "online" => Ok(Self::Online),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// Caller role carried in the JWT
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Customer,
    Courier,
    Manager,
    Admin,
}

impl UserRole {
    /// Couriers and above may drive status transitions
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Courier | Self::Manager | Self::Admin)
    }

    /// Managers and admins may list all orders and read statistics
    pub const fn is_manager(&self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Courier => "courier",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "courier" => Ok(Self::Courier),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A line item with its price frozen at creation time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    /// Unit price captured from the catalog at creation
    pub unit_price: Decimal,
    pub quantity: i32,
    /// unit_price * quantity
    pub line_total: Decimal,
    pub note: Option<String>,
}

/// One append-only status history entry
///
/// `from_status` is `None` only for the creation entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusHistoryEntry {
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    /// User id of the actor who caused the change
    pub changed_by: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// Human-readable receipt reference (ORD-...)
    pub order_number: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub delivery_type: DeliveryType,
    pub payment_method: PaymentMethod,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: Option<String>,
    pub delivery_address: Option<String>,
    pub customer_note: Option<String>,
    /// Recorded verbatim; discounting is out of scope
    pub promo_code: Option<String>,
    /// Sum of item line totals
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    /// subtotal + delivery_fee
    pub total_amount: Decimal,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Check whether `user_id` owns this order
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

// ==================== Request payloads ====================

/// One requested line in an order creation payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemCreate {
    #[validate(length(min = 1, message = "product_id must not be empty"))]
    pub product_id: String,
    #[validate(range(min = 1, max = 99, message = "quantity must be between 1 and 99"))]
    pub quantity: i32,
    #[validate(length(max = 200))]
    pub note: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderCreate {
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    #[validate(nested)]
    pub items: Vec<OrderItemCreate>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[validate(length(min = 1, max = 100))]
    pub contact_name: String,
    #[validate(length(min = 5, max = 30))]
    pub contact_phone: String,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 300))]
    pub delivery_address: Option<String>,
    #[validate(length(max = 500))]
    pub customer_note: Option<String>,
    #[validate(length(max = 50))]
    pub promo_code: Option<String>,
}

/// Pending-only edit payload (owner only)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OrderUpdate {
    #[validate(length(min = 1, max = 100))]
    pub contact_name: Option<String>,
    #[validate(length(min = 5, max = 30))]
    pub contact_phone: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 300))]
    pub delivery_address: Option<String>,
    #[validate(length(max = 500))]
    pub customer_note: Option<String>,
}

impl OrderUpdate {
    pub fn is_empty(&self) -> bool {
        self.contact_name.is_none()
            && self.contact_phone.is_none()
            && self.contact_email.is_none()
            && self.delivery_address.is_none()
            && self.customer_note.is_none()
    }
}

/// Cancel payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OrderCancel {
    #[validate(length(max = 300))]
    pub reason: Option<String>,
}

/// Staff status transition payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    #[validate(length(max = 300))]
    pub reason: Option<String>,
}

// ==================== Statistics ====================

/// One per-day bucket in the statistics projection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyOrderStats {
    /// YYYY-MM-DD
    pub date: String,
    pub order_count: i64,
    pub revenue: Decimal,
}

/// On-demand statistics projection over a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub total_orders: i64,
    /// Count per status string
    pub by_status: std::collections::HashMap<String, i64>,
    /// Sum of total_amount over delivered orders
    pub delivered_revenue: Decimal,
    /// delivered_revenue / delivered count, zero when none
    pub average_order_value: Decimal,
    pub daily: Vec<DailyOrderStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_happy_path_is_linear() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_no_skipping_or_reversing() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Delivering.can_transition_to(OrderStatus::Ready));
        // Self-transition is not legal either
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_cancel_from_every_non_terminal() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivering,
        ] {
            assert!(status.can_transition_to(OrderStatus::Cancelled), "{:?}", status);
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for target in [
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Delivering,
                OrderStatus::Delivered,
                OrderStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(target), "{:?} -> {:?}", terminal, target);
            }
            assert!(terminal.allowed_transitions().is_empty());
        }
    }

    #[test]
    fn test_allowed_transitions() {
        assert_eq!(
            OrderStatus::Pending.allowed_transitions(),
            vec![OrderStatus::Confirmed, OrderStatus::Cancelled]
        );
        assert_eq!(
            OrderStatus::Delivering.allowed_transitions(),
            vec![OrderStatus::Delivered, OrderStatus::Cancelled]
        );
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivering).unwrap(),
            "\"delivering\""
        );
        let status: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_role_tiers() {
        assert!(!UserRole::Customer.is_staff());
        assert!(UserRole::Courier.is_staff());
        assert!(!UserRole::Courier.is_manager());
        assert!(UserRole::Manager.is_staff());
        assert!(UserRole::Manager.is_manager());
        assert!(UserRole::Admin.is_manager());
    }

    #[test]
    fn test_order_create_validation() {
        use validator::Validate;

        let valid = OrderCreate {
            items: vec![OrderItemCreate {
                product_id: "p1".into(),
                quantity: 2,
                note: None,
            }],
            delivery_type: DeliveryType::Pickup,
            payment_method: PaymentMethod::Cash,
            contact_name: "Ana".into(),
            contact_phone: "600123123".into(),
            contact_email: Some("ana@example.com".into()),
            delivery_address: None,
            customer_note: None,
            promo_code: None,
        };
        assert!(valid.validate().is_ok());

        let empty_items = OrderCreate {
            items: vec![],
            ..valid.clone()
        };
        assert!(empty_items.validate().is_err());

        let bad_quantity = OrderCreate {
            items: vec![OrderItemCreate {
                product_id: "p1".into(),
                quantity: 0,
                note: None,
            }],
            ..valid.clone()
        };
        assert!(bad_quantity.validate().is_err());

        let bad_email = OrderCreate {
            contact_email: Some("not-an-email".into()),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        // Email stays optional
        let no_email = OrderCreate {
            contact_email: None,
            ..valid.clone()
        };
        assert!(no_email.validate().is_ok());
    }

    #[test]
    fn test_order_update_is_empty() {
        assert!(OrderUpdate::default().is_empty());
        let update = OrderUpdate {
            customer_note: Some("no onions".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        let update = OrderUpdate {
            contact_email: Some("ana@example.com".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_order_update_email_validation() {
        use validator::Validate;

        let update = OrderUpdate {
            contact_email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
