//! Cart operations.
//!
//! Carts are anonymous and identified by UUID. Adding a product that is
//! already in the cart merges quantities into the existing line instead of
//! creating a second one. Totals are always computed live from current
//! catalog prices; nothing is snapshotted until the order is placed.

use chrono::Utc;
use marketrow_core::{CartId, Money, ProductId};

use crate::error::{AppError, Result};
use crate::models::{Cart, CartItem, CartLine, MAX_LINE_QUANTITY};
use crate::store::Store;

fn validate_quantity(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(AppError::InvalidInput(
            "quantity must be at least 1".to_owned(),
        ));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::InvalidInput(format!(
            "quantity must be at most {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

/// Open a new empty cart.
///
/// # Errors
///
/// Fails only on storage errors.
pub async fn create_cart(store: &dyn Store) -> Result<Cart> {
    let mut tx = store.begin().await?;
    let cart = tx.insert_cart(Utc::now()).await?;
    tx.commit().await?;
    Ok(cart)
}

/// Fetch a cart together with its lines at current prices.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the cart does not exist.
pub async fn cart_with_lines(store: &dyn Store, id: CartId) -> Result<(Cart, Vec<CartLine>)> {
    let mut tx = store.begin().await?;
    let cart = tx.get_cart(id).await?.ok_or(AppError::NotFound("cart"))?;
    let lines = tx.cart_lines(id).await?;
    tx.commit().await?;
    Ok((cart, lines))
}

/// Live total of a cart's lines.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Money {
    lines.iter().map(CartLine::line_total).sum()
}

/// Add a product to a cart, merging with any existing line.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] for a quantity outside
/// `1..=`[`MAX_LINE_QUANTITY`] or an unknown product, [`AppError::NotFound`]
/// if the cart does not exist, and a conflict if the merged line would
/// exceed the quantity cap.
pub async fn add_item(
    store: &dyn Store,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
) -> Result<CartItem> {
    validate_quantity(quantity)?;
    let mut tx = store.begin().await?;
    if tx.get_cart(cart_id).await?.is_none() {
        return Err(AppError::NotFound("cart"));
    }
    if tx.get_product(product_id).await?.is_none() {
        return Err(AppError::InvalidInput("unknown product".to_owned()));
    }
    let item = tx.upsert_cart_item(cart_id, product_id, quantity).await?;
    tx.commit().await?;
    Ok(item)
}

/// Overwrite the quantity of an existing cart line.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] for a quantity outside
/// `1..=`[`MAX_LINE_QUANTITY`], or [`AppError::NotFound`] if the line does
/// not exist.
pub async fn set_item_quantity(
    store: &dyn Store,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
) -> Result<CartItem> {
    validate_quantity(quantity)?;
    let mut tx = store.begin().await?;
    let item = tx
        .set_cart_item_quantity(cart_id, product_id, quantity)
        .await?
        .ok_or(AppError::NotFound("cart item"))?;
    tx.commit().await?;
    Ok(item)
}

/// Remove one line from a cart.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the line does not exist.
pub async fn remove_item(store: &dyn Store, cart_id: CartId, product_id: ProductId) -> Result<()> {
    let mut tx = store.begin().await?;
    if !tx.delete_cart_item(cart_id, product_id).await? {
        return Err(AppError::NotFound("cart item"));
    }
    tx.commit().await?;
    Ok(())
}

/// Discard a cart and all of its lines.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the cart does not exist.
pub async fn delete_cart(store: &dyn Store, id: CartId) -> Result<()> {
    let mut tx = store.begin().await?;
    if !tx.delete_cart(id).await? {
        return Err(AppError::NotFound("cart"));
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketrow_core::CollectionId;

    use super::*;
    use crate::models::{NewCollection, NewProduct};
    use crate::services::catalog;
    use crate::store::memory::MemoryStore;
    use crate::store::StoreError;

    async fn seed_product(store: &MemoryStore, title: &str, cents: i64) -> ProductId {
        let collection = catalog::create_collection(
            store,
            &NewCollection {
                title: "Pantry".to_owned(),
            },
        )
        .await
        .unwrap();
        seed_product_in(store, title, cents, collection.id).await
    }

    async fn seed_product_in(
        store: &MemoryStore,
        title: &str,
        cents: i64,
        collection_id: CollectionId,
    ) -> ProductId {
        catalog::create_product(
            store,
            &NewProduct {
                title: title.to_owned(),
                description: None,
                unit_price: Money::from_cents(cents),
                inventory: 25,
                collection_id,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn adding_same_product_twice_merges_into_one_line() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Olive oil", 1000).await;
        let cart = create_cart(&store).await.unwrap();

        add_item(&store, cart.id, product, 2).await.unwrap();
        let merged = add_item(&store, cart.id, product, 3).await.unwrap();
        assert_eq!(merged.quantity, 5);

        let (_, lines) = cart_with_lines(&store, cart.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(cart_total(&lines), Money::from_cents(5000));
    }

    #[tokio::test]
    async fn total_follows_current_catalog_prices() {
        let store = MemoryStore::new();
        let collection = catalog::create_collection(
            &store,
            &NewCollection {
                title: "Pantry".to_owned(),
            },
        )
        .await
        .unwrap();
        let product = seed_product_in(&store, "Olive oil", 1000, collection.id).await;
        let cart = create_cart(&store).await.unwrap();
        add_item(&store, cart.id, product, 2).await.unwrap();

        let (_, lines) = cart_with_lines(&store, cart.id).await.unwrap();
        assert_eq!(cart_total(&lines), Money::from_cents(2000));

        // Reprice the product; the open cart sees the new price immediately
        catalog::update_product(
            &store,
            product,
            &NewProduct {
                title: "Olive oil".to_owned(),
                description: None,
                unit_price: Money::from_cents(1500),
                inventory: 25,
                collection_id: collection.id,
            },
        )
        .await
        .unwrap();

        let (_, lines) = cart_with_lines(&store, cart.id).await.unwrap();
        assert_eq!(cart_total(&lines), Money::from_cents(3000));
    }

    #[tokio::test]
    async fn non_positive_quantities_are_rejected() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Olive oil", 1000).await;
        let cart = create_cart(&store).await.unwrap();

        let err = add_item(&store, cart.id, product, 0).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        add_item(&store, cart.id, product, 1).await.unwrap();
        let err = set_item_quantity(&store, cart.id, product, -2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn merged_quantity_past_the_cap_is_a_conflict() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Olive oil", 1000).await;
        let cart = create_cart(&store).await.unwrap();

        let err = add_item(&store, cart.id, product, MAX_LINE_QUANTITY + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        // Each add is individually valid but the merged line would pass the cap
        add_item(&store, cart.id, product, MAX_LINE_QUANTITY)
            .await
            .unwrap();
        let err = add_item(&store, cart.id, product, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Conflict(_))));

        // The failed merge rolled back; the line is unchanged
        let (_, lines) = cart_with_lines(&store, cart.id).await.unwrap();
        assert_eq!(lines[0].quantity, MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn unknown_product_is_invalid_input() {
        let store = MemoryStore::new();
        let cart = create_cart(&store).await.unwrap();

        let err = add_item(&store, cart.id, ProductId::new(404), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn missing_cart_is_not_found() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "Olive oil", 1000).await;

        let err = add_item(&store, CartId::generate(), product, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("cart")));
    }

    #[tokio::test]
    async fn removing_a_line_leaves_the_rest() {
        let store = MemoryStore::new();
        let collection = catalog::create_collection(
            &store,
            &NewCollection {
                title: "Pantry".to_owned(),
            },
        )
        .await
        .unwrap();
        let oil = seed_product_in(&store, "Olive oil", 1000, collection.id).await;
        let salt = seed_product_in(&store, "Sea salt", 500, collection.id).await;
        let cart = create_cart(&store).await.unwrap();
        add_item(&store, cart.id, oil, 2).await.unwrap();
        add_item(&store, cart.id, salt, 1).await.unwrap();

        remove_item(&store, cart.id, oil).await.unwrap();

        let (_, lines) = cart_with_lines(&store, cart.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, salt);

        let err = remove_item(&store, cart.id, oil).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("cart item")));
    }
}
