//! Volatile in-process storage backend.
//!
//! [`MemoryStore`] keeps all state behind one `tokio::sync::RwLock`. A
//! transaction takes the write guard for its whole lifetime and works on a
//! scratch copy of the state; commit swaps the scratch in, drop discards it.
//! That makes transactions trivially serializable - exactly the isolation
//! order placement needs for the cart-exclusivity rule - at the cost of a
//! single writer, which is plenty for demos and hermetic tests.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use marketrow_core::{
    CartId, CollectionId, CustomerId, EntityRef, OrderId, PaymentStatus, ProductId, ReviewId,
    TagId, TaggedItemId,
};

use crate::models::{
    Cart, CartItem, CartLine, Collection, Customer, MAX_LINE_QUANTITY, NewCollection, NewCustomer,
    NewOrderItem, NewProduct, NewReview, Order, OrderItem, Product, Review, Tag, TaggedItem,
};
use crate::store::{Store, StoreError, StoreTx};

/// Monotonic id counters, one per sequence-keyed table.
#[derive(Debug, Clone, Default)]
struct Sequences {
    collection: i64,
    product: i64,
    customer: i64,
    order: i64,
    review: i64,
    tag: i64,
    tagged_item: i64,
}

impl Sequences {
    fn next(seq: &mut i64) -> i64 {
        *seq += 1;
        *seq
    }
}

/// The whole dataset. Cloned wholesale into each transaction's scratch.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    collections: BTreeMap<i64, Collection>,
    products: BTreeMap<i64, Product>,
    customers: BTreeMap<i64, Customer>,
    carts: HashMap<CartId, Cart>,
    cart_items: BTreeMap<(CartId, i64), CartItem>,
    orders: BTreeMap<i64, Order>,
    order_items: BTreeMap<(i64, i64), OrderItem>,
    reviews: BTreeMap<i64, Review>,
    tags: BTreeMap<i64, Tag>,
    tagged_items: BTreeMap<i64, TaggedItem>,
    sequences: Sequences,
}

/// In-memory [`Store`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = Arc::clone(&self.state).write_owned().await;
        let scratch = guard.clone();
        Ok(Box::new(MemoryTx { guard, scratch }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// One open transaction: the lock guard plus a scratch copy of the state.
pub struct MemoryTx {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    scratch: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    // === Collections ===

    async fn list_collections(&mut self) -> Result<Vec<Collection>, StoreError> {
        Ok(self.scratch.collections.values().cloned().collect())
    }

    async fn get_collection(
        &mut self,
        id: CollectionId,
    ) -> Result<Option<Collection>, StoreError> {
        Ok(self.scratch.collections.get(&id.as_i64()).cloned())
    }

    async fn insert_collection(&mut self, new: &NewCollection) -> Result<Collection, StoreError> {
        let id = Sequences::next(&mut self.scratch.sequences.collection);
        let collection = Collection {
            id: CollectionId::new(id),
            title: new.title.clone(),
        };
        self.scratch.collections.insert(id, collection.clone());
        Ok(collection)
    }

    async fn update_collection(
        &mut self,
        id: CollectionId,
        new: &NewCollection,
    ) -> Result<Option<Collection>, StoreError> {
        Ok(self.scratch.collections.get_mut(&id.as_i64()).map(|row| {
            row.title = new.title.clone();
            row.clone()
        }))
    }

    async fn delete_collection(&mut self, id: CollectionId) -> Result<bool, StoreError> {
        Ok(self.scratch.collections.remove(&id.as_i64()).is_some())
    }

    async fn count_products_in_collection(
        &mut self,
        id: CollectionId,
    ) -> Result<i64, StoreError> {
        let count = self
            .scratch
            .products
            .values()
            .filter(|p| p.collection_id == id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    // === Products ===

    async fn list_products(
        &mut self,
        collection_id: Option<CollectionId>,
    ) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .scratch
            .products
            .values()
            .filter(|p| collection_id.is_none_or(|c| p.collection_id == c))
            .cloned()
            .collect())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.scratch.products.get(&id.as_i64()).cloned())
    }

    async fn insert_product(&mut self, new: &NewProduct) -> Result<Product, StoreError> {
        let id = Sequences::next(&mut self.scratch.sequences.product);
        let product = Product {
            id: ProductId::new(id),
            title: new.title.clone(),
            description: new.description.clone(),
            unit_price: new.unit_price,
            inventory: new.inventory,
            collection_id: new.collection_id,
            updated_at: Utc::now(),
        };
        self.scratch.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        new: &NewProduct,
    ) -> Result<Option<Product>, StoreError> {
        Ok(self.scratch.products.get_mut(&id.as_i64()).map(|row| {
            row.title = new.title.clone();
            row.description = new.description.clone();
            row.unit_price = new.unit_price;
            row.inventory = new.inventory;
            row.collection_id = new.collection_id;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError> {
        let existed = self.scratch.products.remove(&id.as_i64()).is_some();
        if existed {
            // Cascade: a deleted product disappears from open carts
            self.scratch
                .cart_items
                .retain(|(_, product_id), _| *product_id != id.as_i64());
        }
        Ok(existed)
    }

    async fn product_has_order_items(&mut self, id: ProductId) -> Result<bool, StoreError> {
        Ok(self
            .scratch
            .order_items
            .values()
            .any(|item| item.product_id == id))
    }

    // === Customers ===

    async fn list_customers(&mut self) -> Result<Vec<Customer>, StoreError> {
        Ok(self.scratch.customers.values().cloned().collect())
    }

    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(self.scratch.customers.get(&id.as_i64()).cloned())
    }

    async fn insert_customer(&mut self, new: &NewCustomer) -> Result<Customer, StoreError> {
        if self
            .scratch
            .customers
            .values()
            .any(|c| c.email == new.email)
        {
            return Err(StoreError::Conflict(format!(
                "customer email already registered: {}",
                new.email
            )));
        }
        let id = Sequences::next(&mut self.scratch.sequences.customer);
        let customer = Customer {
            id: CustomerId::new(id),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            birth_date: new.birth_date,
            membership: new.membership,
        };
        self.scratch.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn update_customer(
        &mut self,
        id: CustomerId,
        new: &NewCustomer,
    ) -> Result<Option<Customer>, StoreError> {
        if self
            .scratch
            .customers
            .values()
            .any(|c| c.email == new.email && c.id != id)
        {
            return Err(StoreError::Conflict(format!(
                "customer email already registered: {}",
                new.email
            )));
        }
        Ok(self.scratch.customers.get_mut(&id.as_i64()).map(|row| {
            row.first_name = new.first_name.clone();
            row.last_name = new.last_name.clone();
            row.email = new.email.clone();
            row.phone = new.phone.clone();
            row.birth_date = new.birth_date;
            row.membership = new.membership;
            row.clone()
        }))
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool, StoreError> {
        Ok(self.scratch.customers.remove(&id.as_i64()).is_some())
    }

    async fn customer_has_orders(&mut self, id: CustomerId) -> Result<bool, StoreError> {
        Ok(self
            .scratch
            .orders
            .values()
            .any(|order| order.customer_id == id))
    }

    // === Carts ===

    async fn insert_cart(&mut self, created_at: DateTime<Utc>) -> Result<Cart, StoreError> {
        let cart = Cart {
            id: CartId::generate(),
            created_at,
        };
        self.scratch.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn get_cart(&mut self, id: CartId) -> Result<Option<Cart>, StoreError> {
        Ok(self.scratch.carts.get(&id).cloned())
    }

    async fn upsert_cart_item(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StoreError> {
        match self.scratch.cart_items.entry((cart_id, product_id.as_i64())) {
            Entry::Occupied(mut slot) => {
                let item = slot.get_mut();
                let merged = item
                    .quantity
                    .checked_add(quantity)
                    .filter(|total| *total <= MAX_LINE_QUANTITY)
                    .ok_or_else(|| {
                        StoreError::Conflict(format!(
                            "cart line quantity exceeds {MAX_LINE_QUANTITY}"
                        ))
                    })?;
                item.quantity = merged;
                Ok(item.clone())
            }
            Entry::Vacant(slot) => Ok(slot
                .insert(CartItem {
                    cart_id,
                    product_id,
                    quantity,
                })
                .clone()),
        }
    }

    async fn set_cart_item_quantity(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Option<CartItem>, StoreError> {
        Ok(self
            .scratch
            .cart_items
            .get_mut(&(cart_id, product_id.as_i64()))
            .map(|item| {
                item.quantity = quantity;
                item.clone()
            }))
    }

    async fn delete_cart_item(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .scratch
            .cart_items
            .remove(&(cart_id, product_id.as_i64()))
            .is_some())
    }

    async fn cart_lines(&mut self, cart_id: CartId) -> Result<Vec<CartLine>, StoreError> {
        let lines = self
            .scratch
            .cart_items
            .range((cart_id, i64::MIN)..=(cart_id, i64::MAX))
            .filter_map(|((_, product_id), item)| {
                self.scratch.products.get(product_id).map(|product| CartLine {
                    product_id: product.id,
                    title: product.title.clone(),
                    unit_price: product.unit_price,
                    quantity: item.quantity,
                })
            })
            .collect();
        Ok(lines)
    }

    async fn delete_cart(&mut self, id: CartId) -> Result<bool, StoreError> {
        let existed = self.scratch.carts.remove(&id).is_some();
        if existed {
            // Cascade to the cart's items
            self.scratch
                .cart_items
                .retain(|(cart_id, _), _| *cart_id != id);
        }
        Ok(existed)
    }

    // === Orders ===

    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        placed_at: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        let id = Sequences::next(&mut self.scratch.sequences.order);
        let order = Order {
            id: OrderId::new(id),
            customer_id,
            placed_at,
            payment_status: PaymentStatus::Pending,
        };
        self.scratch.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn insert_order_items(
        &mut self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, StoreError> {
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            let row = OrderItem {
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            };
            self.scratch
                .order_items
                .insert((order_id.as_i64(), item.product_id.as_i64()), row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn list_orders(
        &mut self,
        customer_id: Option<CustomerId>,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .scratch
            .orders
            .values()
            .filter(|o| customer_id.is_none_or(|c| o.customer_id == c))
            .cloned()
            .collect())
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.scratch.orders.get(&id.as_i64()).cloned())
    }

    async fn order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        Ok(self
            .scratch
            .order_items
            .range((order_id.as_i64(), i64::MIN)..=(order_id.as_i64(), i64::MAX))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn set_payment_status(
        &mut self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self.scratch.orders.get_mut(&id.as_i64()).map(|order| {
            order.payment_status = status;
            order.clone()
        }))
    }

    // === Reviews ===

    async fn list_reviews(&mut self, product_id: ProductId) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .scratch
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn insert_review(
        &mut self,
        product_id: ProductId,
        new: &NewReview,
        date: NaiveDate,
    ) -> Result<Review, StoreError> {
        let id = Sequences::next(&mut self.scratch.sequences.review);
        let review = Review {
            id: ReviewId::new(id),
            product_id,
            name: new.name.clone(),
            description: new.description.clone(),
            date,
        };
        self.scratch.reviews.insert(id, review.clone());
        Ok(review)
    }

    // === Tags ===

    async fn list_tags(&mut self) -> Result<Vec<Tag>, StoreError> {
        Ok(self.scratch.tags.values().cloned().collect())
    }

    async fn get_tag(&mut self, id: TagId) -> Result<Option<Tag>, StoreError> {
        Ok(self.scratch.tags.get(&id.as_i64()).cloned())
    }

    async fn insert_tag(&mut self, label: &str) -> Result<Tag, StoreError> {
        let id = Sequences::next(&mut self.scratch.sequences.tag);
        let tag = Tag {
            id: TagId::new(id),
            label: label.to_owned(),
        };
        self.scratch.tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn attach_tag(
        &mut self,
        tag_id: TagId,
        entity: EntityRef,
    ) -> Result<TaggedItem, StoreError> {
        if self
            .scratch
            .tagged_items
            .values()
            .any(|item| item.tag_id == tag_id && item.entity() == entity)
        {
            return Err(StoreError::Conflict(format!(
                "tag {tag_id} already attached to {entity}"
            )));
        }
        let id = Sequences::next(&mut self.scratch.sequences.tagged_item);
        let item = TaggedItem {
            id: TaggedItemId::new(id),
            tag_id,
            entity_kind: entity.kind,
            entity_id: entity.id,
        };
        self.scratch.tagged_items.insert(id, item.clone());
        Ok(item)
    }

    async fn detach_tag(&mut self, tag_id: TagId, entity: EntityRef) -> Result<bool, StoreError> {
        let before = self.scratch.tagged_items.len();
        self.scratch
            .tagged_items
            .retain(|_, item| !(item.tag_id == tag_id && item.entity() == entity));
        Ok(self.scratch.tagged_items.len() < before)
    }

    async fn tagged_items(&mut self, tag_id: TagId) -> Result<Vec<TaggedItem>, StoreError> {
        Ok(self
            .scratch
            .tagged_items
            .values()
            .filter(|item| item.tag_id == tag_id)
            .cloned()
            .collect())
    }

    async fn tags_for_entity(&mut self, entity: EntityRef) -> Result<Vec<Tag>, StoreError> {
        Ok(self
            .scratch
            .tagged_items
            .values()
            .filter(|item| item.entity() == entity)
            .filter_map(|item| self.scratch.tags.get(&item.tag_id.as_i64()))
            .cloned()
            .collect())
    }

    // === Transaction control ===

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { mut guard, scratch } = *self;
        *guard = scratch;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marketrow_core::{Email, Membership, Money};

    fn new_customer(email: &str) -> NewCustomer {
        NewCustomer {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: Email::parse(email).unwrap(),
            phone: "555-0100".to_owned(),
            birth_date: None,
            membership: Membership::Bronze,
        }
    }

    async fn seed_product(store: &MemoryStore, title: &str, cents: i64) -> Product {
        let mut tx = store.begin().await.unwrap();
        let collection = tx
            .insert_collection(&NewCollection {
                title: "Default".to_owned(),
            })
            .await
            .unwrap();
        let product = tx
            .insert_product(&NewProduct {
                title: title.to_owned(),
                description: None,
                unit_price: Money::from_cents(cents),
                inventory: 10,
                collection_id: collection.id,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        product
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_collection(&NewCollection {
                title: "Dropped".to_owned(),
            })
            .await
            .unwrap();
            // dropped without commit
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Kettle", 2500).await;

        let mut tx = store.begin().await.unwrap();
        let found = tx.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Kettle");
        assert_eq!(found.unit_price, Money::from_cents(2500));
    }

    #[tokio::test]
    async fn upsert_merges_quantities_into_one_line() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Mug", 800).await;

        let mut tx = store.begin().await.unwrap();
        let cart = tx.insert_cart(Utc::now()).await.unwrap();
        tx.upsert_cart_item(cart.id, product.id, 2).await.unwrap();
        let merged = tx.upsert_cart_item(cart.id, product.id, 3).await.unwrap();
        assert_eq!(merged.quantity, 5);

        let lines = tx.cart_lines(cart.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn upsert_refuses_to_merge_past_the_line_cap() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Mug", 800).await;

        let mut tx = store.begin().await.unwrap();
        let cart = tx.insert_cart(Utc::now()).await.unwrap();
        tx.upsert_cart_item(cart.id, product.id, MAX_LINE_QUANTITY - 1)
            .await
            .unwrap();
        let merged = tx.upsert_cart_item(cart.id, product.id, 1).await.unwrap();
        assert_eq!(merged.quantity, MAX_LINE_QUANTITY);

        let err = tx
            .upsert_cart_item(cart.id, product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // even a sum that would overflow i32 comes back as a clean conflict
        let err = tx
            .upsert_cart_item(cart.id, product.id, i32::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let lines = tx.cart_lines(cart.id).await.unwrap();
        assert_eq!(lines[0].quantity, MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn cart_delete_cascades_and_reports_absence() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Plate", 1200).await;

        let mut tx = store.begin().await.unwrap();
        let cart = tx.insert_cart(Utc::now()).await.unwrap();
        tx.upsert_cart_item(cart.id, product.id, 1).await.unwrap();

        assert!(tx.delete_cart(cart.id).await.unwrap());
        assert!(tx.cart_lines(cart.id).await.unwrap().is_empty());
        // second delete finds nothing
        assert!(!tx.delete_cart(cart.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_customer_email_conflicts() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_customer(&new_customer("ada@example.com"))
            .await
            .unwrap();
        let err = tx
            .insert_customer(&new_customer("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_tag_attachment_conflicts() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Vase", 3000).await;

        let mut tx = store.begin().await.unwrap();
        let tag = tx.insert_tag("fragile").await.unwrap();
        let entity = EntityRef::product(product.id);
        tx.attach_tag(tag.id, entity).await.unwrap();
        let err = tx.attach_tag(tag.id, entity).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        assert!(tx.detach_tag(tag.id, entity).await.unwrap());
        assert!(!tx.detach_tag(tag.id, entity).await.unwrap());
    }

    #[tokio::test]
    async fn product_delete_cascades_to_cart_lines() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Bowl", 900).await;

        let mut tx = store.begin().await.unwrap();
        let cart = tx.insert_cart(Utc::now()).await.unwrap();
        tx.upsert_cart_item(cart.id, product.id, 2).await.unwrap();
        assert!(tx.delete_product(product.id).await.unwrap());
        assert!(tx.cart_lines(cart.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn order_items_store_their_own_prices() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Teapot", 1000).await;

        let mut tx = store.begin().await.unwrap();
        let customer = tx
            .insert_customer(&new_customer("buyer@example.com"))
            .await
            .unwrap();
        let order = tx.insert_order(customer.id, Utc::now()).await.unwrap();
        tx.insert_order_items(
            order.id,
            &[NewOrderItem {
                product_id: product.id,
                quantity: 2,
                unit_price: product.unit_price,
            }],
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        // raise the catalog price afterwards
        let mut tx = store.begin().await.unwrap();
        tx.update_product(
            product.id,
            &NewProduct {
                title: "Teapot".to_owned(),
                description: None,
                unit_price: Money::from_cents(9999),
                inventory: 10,
                collection_id: product.collection_id,
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let items = tx.order_items(order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price, Money::from_cents(1000));
    }
}
