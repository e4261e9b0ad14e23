//! Cart domain types.
//!
//! A cart is a transient container keyed by an opaque UUID. It lives from
//! first interaction until either order placement deletes it or it is
//! abandoned. Cart lines always price against the live catalog; only order
//! placement freezes prices.

use chrono::{DateTime, Utc};

use marketrow_core::{CartId, Money, ProductId};

/// Upper bound on a single line's quantity. Checked on input and again when
/// repeat adds merge, so a line can never approach `i32::MAX`.
pub const MAX_LINE_QUANTITY: i32 = 1_000_000;

/// A not-yet-converted shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Cart {
    /// Opaque cart token.
    pub id: CartId,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
}

/// One product entry in a cart.
///
/// At most one row exists per `(cart_id, product_id)`; repeat adds merge
/// into the existing row's quantity.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CartItem {
    pub cart_id: CartId,
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: i32,
}

/// A cart item joined to its product for pricing.
///
/// This is what order placement reads to snapshot prices, and what cart
/// views price totals from.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CartLine {
    pub product_id: ProductId,
    /// Product title at read time.
    pub title: String,
    /// Current catalog unit price at read time.
    pub unit_price: Money,
    pub quantity: i32,
}

impl CartLine {
    /// Price of this line at current catalog prices.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}
