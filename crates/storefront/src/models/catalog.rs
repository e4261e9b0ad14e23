//! Catalog domain types: products and the collections that group them.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use marketrow_core::{CollectionId, Money, ProductId};

/// A named grouping of products.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Collection {
    /// Unique collection ID.
    pub id: CollectionId,
    /// Display title.
    pub title: String,
}

/// A purchasable catalog entry.
///
/// `unit_price` is the *current* price. Order placement copies it into order
/// items; nothing else ever references a product row from an order.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Optional long-form description.
    pub description: Option<String>,
    /// Current unit price.
    pub unit_price: Money,
    /// Units on hand. Catalog metadata only; placement does not decrement it.
    pub inventory: i32,
    /// Collection this product belongs to.
    pub collection_id: CollectionId,
    /// When the catalog entry last changed.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price: Money,
    #[serde(default)]
    pub inventory: i32,
    pub collection_id: CollectionId,
}

/// Payload for creating or replacing a collection.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCollection {
    pub title: String,
}
