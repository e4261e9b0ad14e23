//! Durable `PostgreSQL` storage backend.
//!
//! # Tables
//!
//! - `collections` - product groupings
//! - `products` - the catalog
//! - `customers` - registered customers (unique email)
//! - `carts` / `cart_items` - open carts; `cart_items` has a composite
//!   primary key on `(cart_id, product_id)` and cascades on cart deletion
//! - `orders` / `order_items` - placed orders with price snapshots
//! - `reviews` - per-product reviews
//! - `tags` / `tagged_items` - labels attached to `(entity_kind, entity_id)`
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p marketrow-cli -- migrate
//! ```
//!
//! All queries are runtime-checked and rely on the `FromRow` derives of the
//! model structs. Uniqueness rules (customer email, tag attachment) map
//! database unique violations onto [`StoreError::Conflict`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use marketrow_core::{
    CartId, CollectionId, CustomerId, EntityRef, OrderId, PaymentStatus, ProductId, TagId,
};

use crate::models::{
    Cart, CartItem, CartLine, Collection, Customer, MAX_LINE_QUANTITY, NewCollection, NewCustomer,
    NewOrderItem, NewProduct, NewReview, Order, OrderItem, Product, Review, Tag, TaggedItem,
};
use crate::store::{Store, StoreError, StoreTx};

/// `PostgreSQL` [`Store`] implementation over a connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the connection cannot be established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool (used by the CLI for migrations).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique violation onto [`StoreError::Conflict`], everything else onto
/// [`StoreError::Database`].
fn conflict_on_unique(e: sqlx::Error, message: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(message.to_owned());
    }
    StoreError::Database(e)
}

/// One open `PostgreSQL` transaction.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    // === Collections ===

    async fn list_collections(&mut self) -> Result<Vec<Collection>, StoreError> {
        let rows = sqlx::query_as::<_, Collection>("SELECT id, title FROM collections ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn get_collection(
        &mut self,
        id: CollectionId,
    ) -> Result<Option<Collection>, StoreError> {
        let row = sqlx::query_as::<_, Collection>("SELECT id, title FROM collections WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_collection(&mut self, new: &NewCollection) -> Result<Collection, StoreError> {
        let row = sqlx::query_as::<_, Collection>(
            "INSERT INTO collections (title) VALUES ($1) RETURNING id, title",
        )
        .bind(&new.title)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_collection(
        &mut self,
        id: CollectionId,
        new: &NewCollection,
    ) -> Result<Option<Collection>, StoreError> {
        let row = sqlx::query_as::<_, Collection>(
            "UPDATE collections SET title = $2 WHERE id = $1 RETURNING id, title",
        )
        .bind(id)
        .bind(&new.title)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_collection(&mut self, id: CollectionId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_products_in_collection(
        &mut self,
        id: CollectionId,
    ) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE collection_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    // === Products ===

    async fn list_products(
        &mut self,
        collection_id: Option<CollectionId>,
    ) -> Result<Vec<Product>, StoreError> {
        let rows = if let Some(collection_id) = collection_id {
            sqlx::query_as::<_, Product>(
                "SELECT id, title, description, unit_price, inventory, collection_id, updated_at \
                 FROM products WHERE collection_id = $1 ORDER BY id",
            )
            .bind(collection_id)
            .fetch_all(&mut *self.tx)
            .await?
        } else {
            sqlx::query_as::<_, Product>(
                "SELECT id, title, description, unit_price, inventory, collection_id, updated_at \
                 FROM products ORDER BY id",
            )
            .fetch_all(&mut *self.tx)
            .await?
        };
        Ok(rows)
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, Product>(
            "SELECT id, title, description, unit_price, inventory, collection_id, updated_at \
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn insert_product(&mut self, new: &NewProduct) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, Product>(
            "INSERT INTO products (title, description, unit_price, inventory, collection_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, title, description, unit_price, inventory, collection_id, updated_at",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.unit_price)
        .bind(new.inventory)
        .bind(new.collection_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        new: &NewProduct,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, Product>(
            "UPDATE products \
             SET title = $2, description = $3, unit_price = $4, inventory = $5, \
                 collection_id = $6, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, title, description, unit_price, inventory, collection_id, updated_at",
        )
        .bind(id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.unit_price)
        .bind(new.inventory)
        .bind(new.collection_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn product_has_order_items(&mut self, id: ProductId) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM order_items WHERE product_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    // === Customers ===

    async fn list_customers(&mut self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query_as::<_, Customer>(
            "SELECT id, first_name, last_name, email, phone, birth_date, membership \
             FROM customers ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query_as::<_, Customer>(
            "SELECT id, first_name, last_name, email, phone, birth_date, membership \
             FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn insert_customer(&mut self, new: &NewCustomer) -> Result<Customer, StoreError> {
        let row = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (first_name, last_name, email, phone, birth_date, membership) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, first_name, last_name, email, phone, birth_date, membership",
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.birth_date)
        .bind(new.membership)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "customer email already registered"))?;
        Ok(row)
    }

    async fn update_customer(
        &mut self,
        id: CustomerId,
        new: &NewCustomer,
    ) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query_as::<_, Customer>(
            "UPDATE customers \
             SET first_name = $2, last_name = $3, email = $4, phone = $5, \
                 birth_date = $6, membership = $7 \
             WHERE id = $1 \
             RETURNING id, first_name, last_name, email, phone, birth_date, membership",
        )
        .bind(id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.birth_date)
        .bind(new.membership)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "customer email already registered"))?;
        Ok(row)
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn customer_has_orders(&mut self, id: CustomerId) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE customer_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    // === Carts ===

    async fn insert_cart(&mut self, created_at: DateTime<Utc>) -> Result<Cart, StoreError> {
        let row = sqlx::query_as::<_, Cart>(
            "INSERT INTO carts (id, created_at) VALUES ($1, $2) RETURNING id, created_at",
        )
        .bind(CartId::generate())
        .bind(created_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn get_cart(&mut self, id: CartId) -> Result<Option<Cart>, StoreError> {
        let row = sqlx::query_as::<_, Cart>("SELECT id, created_at FROM carts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn upsert_cart_item(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StoreError> {
        // The composite primary key makes the merge atomic under concurrency.
        // The WHERE clause skips the update when the merged total would pass
        // the line cap, so RETURNING yields no row in that case.
        let row = sqlx::query_as::<_, CartItem>(
            "INSERT INTO cart_items (cart_id, product_id, quantity) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (cart_id, product_id) \
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
             WHERE cart_items.quantity + EXCLUDED.quantity <= $4 \
             RETURNING cart_id, product_id, quantity",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(MAX_LINE_QUANTITY)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.ok_or_else(|| {
            StoreError::Conflict(format!("cart line quantity exceeds {MAX_LINE_QUANTITY}"))
        })
    }

    async fn set_cart_item_quantity(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Option<CartItem>, StoreError> {
        let row = sqlx::query_as::<_, CartItem>(
            "UPDATE cart_items SET quantity = $3 \
             WHERE cart_id = $1 AND product_id = $2 \
             RETURNING cart_id, product_id, quantity",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_cart_item(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cart_lines(&mut self, cart_id: CartId) -> Result<Vec<CartLine>, StoreError> {
        let rows = sqlx::query_as::<_, CartLine>(
            "SELECT ci.product_id, p.title, p.unit_price, ci.quantity \
             FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             WHERE ci.cart_id = $1 \
             ORDER BY ci.product_id",
        )
        .bind(cart_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn delete_cart(&mut self, id: CartId) -> Result<bool, StoreError> {
        // Guarded delete: rows_affected = 0 means a concurrent placement won
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // === Orders ===

    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        placed_at: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (customer_id, placed_at, payment_status) \
             VALUES ($1, $2, $3) \
             RETURNING id, customer_id, placed_at, payment_status",
        )
        .bind(customer_id)
        .bind(placed_at)
        .bind(PaymentStatus::Pending)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn insert_order_items(
        &mut self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, StoreError> {
        let product_ids: Vec<i64> = items.iter().map(|i| i.product_id.as_i64()).collect();
        let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
        let unit_prices: Vec<rust_decimal::Decimal> =
            items.iter().map(|i| i.unit_price.amount()).collect();

        // One bulk statement for the whole order
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, unit_price) \
             SELECT $1, product_id, quantity, unit_price \
             FROM UNNEST($2::bigint[], $3::int[], $4::numeric[]) \
                  AS t(product_id, quantity, unit_price)",
        )
        .bind(order_id)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&unit_prices)
        .execute(&mut *self.tx)
        .await?;

        Ok(items
            .iter()
            .map(|item| OrderItem {
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect())
    }

    async fn list_orders(
        &mut self,
        customer_id: Option<CustomerId>,
    ) -> Result<Vec<Order>, StoreError> {
        let rows = if let Some(customer_id) = customer_id {
            sqlx::query_as::<_, Order>(
                "SELECT id, customer_id, placed_at, payment_status \
                 FROM orders WHERE customer_id = $1 ORDER BY id",
            )
            .bind(customer_id)
            .fetch_all(&mut *self.tx)
            .await?
        } else {
            sqlx::query_as::<_, Order>(
                "SELECT id, customer_id, placed_at, payment_status FROM orders ORDER BY id",
            )
            .fetch_all(&mut *self.tx)
            .await?
        };
        Ok(rows)
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, Order>(
            "SELECT id, customer_id, placed_at, payment_status FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let rows = sqlx::query_as::<_, OrderItem>(
            "SELECT order_id, product_id, quantity, unit_price \
             FROM order_items WHERE order_id = $1 ORDER BY product_id",
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn set_payment_status(
        &mut self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, Order>(
            "UPDATE orders SET payment_status = $2 WHERE id = $1 \
             RETURNING id, customer_id, placed_at, payment_status",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    // === Reviews ===

    async fn list_reviews(&mut self, product_id: ProductId) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query_as::<_, Review>(
            "SELECT id, product_id, name, description, date \
             FROM reviews WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn insert_review(
        &mut self,
        product_id: ProductId,
        new: &NewReview,
        date: NaiveDate,
    ) -> Result<Review, StoreError> {
        let row = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (product_id, name, description, date) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, product_id, name, description, date",
        )
        .bind(product_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(date)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    // === Tags ===

    async fn list_tags(&mut self) -> Result<Vec<Tag>, StoreError> {
        let rows = sqlx::query_as::<_, Tag>("SELECT id, label FROM tags ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn get_tag(&mut self, id: TagId) -> Result<Option<Tag>, StoreError> {
        let row = sqlx::query_as::<_, Tag>("SELECT id, label FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_tag(&mut self, label: &str) -> Result<Tag, StoreError> {
        let row =
            sqlx::query_as::<_, Tag>("INSERT INTO tags (label) VALUES ($1) RETURNING id, label")
                .bind(label)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(row)
    }

    async fn attach_tag(
        &mut self,
        tag_id: TagId,
        entity: EntityRef,
    ) -> Result<TaggedItem, StoreError> {
        let row = sqlx::query_as::<_, TaggedItem>(
            "INSERT INTO tagged_items (tag_id, entity_kind, entity_id) \
             VALUES ($1, $2, $3) \
             RETURNING id, tag_id, entity_kind, entity_id",
        )
        .bind(tag_id)
        .bind(entity.kind)
        .bind(entity.id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_unique(e, "tag already attached to this entity"))?;
        Ok(row)
    }

    async fn detach_tag(&mut self, tag_id: TagId, entity: EntityRef) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM tagged_items \
             WHERE tag_id = $1 AND entity_kind = $2 AND entity_id = $3",
        )
        .bind(tag_id)
        .bind(entity.kind)
        .bind(entity.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn tagged_items(&mut self, tag_id: TagId) -> Result<Vec<TaggedItem>, StoreError> {
        let rows = sqlx::query_as::<_, TaggedItem>(
            "SELECT id, tag_id, entity_kind, entity_id \
             FROM tagged_items WHERE tag_id = $1 ORDER BY id",
        )
        .bind(tag_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn tags_for_entity(&mut self, entity: EntityRef) -> Result<Vec<Tag>, StoreError> {
        let rows = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.label \
             FROM tags t \
             JOIN tagged_items ti ON ti.tag_id = t.id \
             WHERE ti.entity_kind = $1 AND ti.entity_id = $2 \
             ORDER BY t.id",
        )
        .bind(entity.kind)
        .bind(entity.id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    // === Transaction control ===

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
