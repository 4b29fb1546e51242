//! Domain models shared across crates

pub mod order;

pub use order::{
    DailyOrderStats, DeliveryType, Order, OrderCancel, OrderCreate, OrderItem, OrderItemCreate,
    OrderStatistics, OrderStatus, OrderStatusUpdate, OrderUpdate, PaymentMethod,
    StatusHistoryEntry, UserRole,
};
