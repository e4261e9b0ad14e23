//! Storage abstraction.
//!
//! All persistence goes through the [`Store`] trait: callers open a
//! transaction with [`Store::begin`], perform any number of operations on the
//! returned [`StoreTx`], and finish with [`StoreTx::commit`]. Dropping a
//! transaction without committing rolls every operation back. Order placement
//! relies on this: its whole read-snapshot-insert-delete sequence runs inside
//! one transaction and either lands completely or not at all.
//!
//! Two backends exist:
//! - [`postgres::PgStore`] - durable storage over a connection pool
//! - [`memory::MemoryStore`] - a volatile single-writer backend for demos
//!   and hermetic tests
//!
//! Both enforce the same structural rules: one cart line per
//! `(cart, product)` with merge-on-add, guarded cart deletion (the delete
//! reports whether a row actually went away), cascade from cart to cart
//! items, and unique customer emails.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use marketrow_core::{
    CartId, CollectionId, CustomerId, EntityRef, OrderId, PaymentStatus, ProductId, TagId,
};

use crate::models::{
    Cart, CartItem, CartLine, Collection, Customer, NewCollection, NewCustomer, NewOrderItem,
    NewProduct, NewReview, Order, OrderItem, Product, Review, Tag, TaggedItem,
};

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (duplicate email, duplicate tag
    /// attachment).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed in a way that makes retrying the whole call
    /// reasonable (lost connection, serialization failure).
    #[error("transient storage failure: {0}")]
    Transient(String),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A transactional storage backend.
///
/// Implementations must hand out transactions that see a consistent snapshot
/// and serialize conflicting writers: two transactions racing to delete the
/// same cart must resolve to exactly one winner.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Fails if the backend cannot start a transaction (e.g. pool exhausted).
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    /// Cheap connectivity check for readiness probes.
    ///
    /// # Errors
    ///
    /// Fails if the backend is unreachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One open transaction against a [`Store`].
///
/// Every method sees the transaction's own uncommitted writes. Dropping the
/// value without calling [`StoreTx::commit`] discards them all.
#[async_trait]
pub trait StoreTx: Send {
    // === Collections ===

    async fn list_collections(&mut self) -> Result<Vec<Collection>, StoreError>;

    async fn get_collection(&mut self, id: CollectionId)
    -> Result<Option<Collection>, StoreError>;

    async fn insert_collection(&mut self, new: &NewCollection) -> Result<Collection, StoreError>;

    /// Full replace; `None` if the collection does not exist.
    async fn update_collection(
        &mut self,
        id: CollectionId,
        new: &NewCollection,
    ) -> Result<Option<Collection>, StoreError>;

    /// Returns whether a row was deleted. Callers enforce the
    /// products-still-present guard before calling this.
    async fn delete_collection(&mut self, id: CollectionId) -> Result<bool, StoreError>;

    /// Number of products currently in the collection.
    async fn count_products_in_collection(
        &mut self,
        id: CollectionId,
    ) -> Result<i64, StoreError>;

    // === Products ===

    /// All products, optionally narrowed to one collection, ordered by id.
    async fn list_products(
        &mut self,
        collection_id: Option<CollectionId>,
    ) -> Result<Vec<Product>, StoreError>;

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn insert_product(&mut self, new: &NewProduct) -> Result<Product, StoreError>;

    /// Full replace; `None` if the product does not exist.
    async fn update_product(
        &mut self,
        id: ProductId,
        new: &NewProduct,
    ) -> Result<Option<Product>, StoreError>;

    /// Returns whether a row was deleted. Callers enforce the
    /// referenced-by-order-items guard before calling this.
    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError>;

    /// Whether any order item references the product.
    async fn product_has_order_items(&mut self, id: ProductId) -> Result<bool, StoreError>;

    // === Customers ===

    async fn list_customers(&mut self) -> Result<Vec<Customer>, StoreError>;

    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    /// Fails with [`StoreError::Conflict`] on a duplicate email.
    async fn insert_customer(&mut self, new: &NewCustomer) -> Result<Customer, StoreError>;

    /// Full replace; `None` if the customer does not exist. Fails with
    /// [`StoreError::Conflict`] if the new email belongs to someone else.
    async fn update_customer(
        &mut self,
        id: CustomerId,
        new: &NewCustomer,
    ) -> Result<Option<Customer>, StoreError>;

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool, StoreError>;

    /// Whether any order references the customer.
    async fn customer_has_orders(&mut self, id: CustomerId) -> Result<bool, StoreError>;

    // === Carts ===

    /// Create an empty cart with a fresh opaque id.
    async fn insert_cart(&mut self, created_at: DateTime<Utc>) -> Result<Cart, StoreError>;

    async fn get_cart(&mut self, id: CartId) -> Result<Option<Cart>, StoreError>;

    /// Merge-on-add: adds `quantity` to the existing `(cart, product)` line
    /// or creates the line if absent. Atomic with respect to concurrent adds
    /// of the same product. Fails with [`StoreError::Conflict`] if the merged
    /// quantity would exceed [`MAX_LINE_QUANTITY`](crate::models::MAX_LINE_QUANTITY).
    async fn upsert_cart_item(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StoreError>;

    /// Overwrite a line's quantity; `None` if the line does not exist.
    async fn set_cart_item_quantity(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Option<CartItem>, StoreError>;

    /// Remove one line; returns whether it existed.
    async fn delete_cart_item(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<bool, StoreError>;

    /// The cart's items joined to live catalog prices, ordered by product id.
    async fn cart_lines(&mut self, cart_id: CartId) -> Result<Vec<CartLine>, StoreError>;

    /// Delete the cart and (by cascade) its items.
    ///
    /// Returns `false` when no row was deleted, which is how a placement
    /// discovers that a concurrent placement already consumed the cart.
    async fn delete_cart(&mut self, id: CartId) -> Result<bool, StoreError>;

    // === Orders ===

    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        placed_at: DateTime<Utc>,
    ) -> Result<Order, StoreError>;

    /// Bulk-insert the order's items. Prices in `items` are snapshots taken
    /// by the caller; the store never re-reads the catalog here.
    async fn insert_order_items(
        &mut self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, StoreError>;

    /// All orders, optionally narrowed to one customer, ordered by id.
    async fn list_orders(
        &mut self,
        customer_id: Option<CustomerId>,
    ) -> Result<Vec<Order>, StoreError>;

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError>;

    /// Move the payment status; `None` if the order does not exist.
    async fn set_payment_status(
        &mut self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Option<Order>, StoreError>;

    // === Reviews ===

    async fn list_reviews(&mut self, product_id: ProductId) -> Result<Vec<Review>, StoreError>;

    async fn insert_review(
        &mut self,
        product_id: ProductId,
        new: &NewReview,
        date: NaiveDate,
    ) -> Result<Review, StoreError>;

    // === Tags ===

    async fn list_tags(&mut self) -> Result<Vec<Tag>, StoreError>;

    async fn get_tag(&mut self, id: TagId) -> Result<Option<Tag>, StoreError>;

    async fn insert_tag(&mut self, label: &str) -> Result<Tag, StoreError>;

    /// Attach a tag to an entity. Fails with [`StoreError::Conflict`] if the
    /// attachment already exists.
    async fn attach_tag(
        &mut self,
        tag_id: TagId,
        entity: EntityRef,
    ) -> Result<TaggedItem, StoreError>;

    /// Remove an attachment; returns whether it existed.
    async fn detach_tag(&mut self, tag_id: TagId, entity: EntityRef) -> Result<bool, StoreError>;

    /// Every attachment of the given tag, ordered by id.
    async fn tagged_items(&mut self, tag_id: TagId) -> Result<Vec<TaggedItem>, StoreError>;

    /// Every tag attached to the given entity, ordered by id.
    async fn tags_for_entity(&mut self, entity: EntityRef) -> Result<Vec<Tag>, StoreError>;

    // === Transaction control ===

    /// Commit all writes performed on this transaction.
    ///
    /// # Errors
    ///
    /// On failure nothing was persisted; callers may retry from scratch.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
