//! Order domain types.
//!
//! Orders are append-only once placed: items never change, and the only
//! mutable field is `payment_status`. Item prices are snapshots taken at
//! placement time, deliberately decoupled from later catalog changes so that
//! historical orders stay invoiceable at the price the customer actually
//! paid.

use chrono::{DateTime, Utc};

use marketrow_core::{CustomerId, Money, OrderId, PaymentStatus, ProductId};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// The customer who placed the order.
    pub customer_id: CustomerId,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
    /// Starts `Pending`; moved by the payment collaborator afterwards.
    pub payment_status: PaymentStatus,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price snapshot captured at placement. Never re-read from the
    /// catalog.
    pub unit_price: Money,
}

impl OrderItem {
    /// Price of this line at the snapshotted unit price.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Input for the bulk order-item insert at placement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Money,
}

/// An order together with all of its items.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    /// Sum of all line totals at snapshotted prices.
    #[must_use]
    pub fn total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}
