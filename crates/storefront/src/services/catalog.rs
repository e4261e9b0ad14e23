//! Collection and product operations.
//!
//! Deletes are guarded: a collection that still contains products, or a
//! product that appears on an order, refuses deletion with a conflict
//! instead of cascading into sale history.

use marketrow_core::{CollectionId, ProductId};

use crate::error::{AppError, Result};
use crate::models::{Collection, NewCollection, NewProduct, Product};
use crate::store::Store;

// === Collections ===

/// List all collections.
///
/// # Errors
///
/// Fails only on storage errors.
pub async fn list_collections(store: &dyn Store) -> Result<Vec<Collection>> {
    let mut tx = store.begin().await?;
    let collections = tx.list_collections().await?;
    tx.commit().await?;
    Ok(collections)
}

/// Fetch one collection.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the collection does not exist.
pub async fn get_collection(store: &dyn Store, id: CollectionId) -> Result<Collection> {
    let mut tx = store.begin().await?;
    let collection = tx
        .get_collection(id)
        .await?
        .ok_or(AppError::NotFound("collection"))?;
    tx.commit().await?;
    Ok(collection)
}

/// Create a collection.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] if the title is blank.
pub async fn create_collection(store: &dyn Store, new: &NewCollection) -> Result<Collection> {
    validate_collection(new)?;
    let mut tx = store.begin().await?;
    let collection = tx.insert_collection(new).await?;
    tx.commit().await?;
    Ok(collection)
}

/// Rename a collection.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the collection does not exist, or
/// [`AppError::InvalidInput`] if the new title is blank.
pub async fn update_collection(
    store: &dyn Store,
    id: CollectionId,
    new: &NewCollection,
) -> Result<Collection> {
    validate_collection(new)?;
    let mut tx = store.begin().await?;
    let collection = tx
        .update_collection(id, new)
        .await?
        .ok_or(AppError::NotFound("collection"))?;
    tx.commit().await?;
    Ok(collection)
}

/// Delete a collection, refusing if it still contains products.
///
/// # Errors
///
/// Returns [`AppError::Conflict`] if products reference the collection, or
/// [`AppError::NotFound`] if it does not exist.
pub async fn delete_collection(store: &dyn Store, id: CollectionId) -> Result<()> {
    let mut tx = store.begin().await?;
    let products = tx.count_products_in_collection(id).await?;
    if products > 0 {
        return Err(AppError::Conflict(format!(
            "collection contains {products} products"
        )));
    }
    if !tx.delete_collection(id).await? {
        return Err(AppError::NotFound("collection"));
    }
    tx.commit().await?;
    Ok(())
}

fn validate_collection(new: &NewCollection) -> Result<()> {
    if new.title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "collection title must not be empty".to_owned(),
        ));
    }
    Ok(())
}

// === Products ===

/// List products, optionally narrowed to one collection.
///
/// # Errors
///
/// Fails only on storage errors.
pub async fn list_products(
    store: &dyn Store,
    collection_id: Option<CollectionId>,
) -> Result<Vec<Product>> {
    let mut tx = store.begin().await?;
    let products = tx.list_products(collection_id).await?;
    tx.commit().await?;
    Ok(products)
}

/// Fetch one product.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the product does not exist.
pub async fn get_product(store: &dyn Store, id: ProductId) -> Result<Product> {
    let mut tx = store.begin().await?;
    let product = tx
        .get_product(id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    tx.commit().await?;
    Ok(product)
}

/// Create a product in an existing collection.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] if a field is out of range or the
/// collection does not exist.
pub async fn create_product(store: &dyn Store, new: &NewProduct) -> Result<Product> {
    validate_product(new)?;
    let mut tx = store.begin().await?;
    if tx.get_collection(new.collection_id).await?.is_none() {
        return Err(AppError::InvalidInput("unknown collection".to_owned()));
    }
    let product = tx.insert_product(new).await?;
    tx.commit().await?;
    Ok(product)
}

/// Replace a product's fields.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the product does not exist, or
/// [`AppError::InvalidInput`] on bad fields or an unknown collection.
pub async fn update_product(
    store: &dyn Store,
    id: ProductId,
    new: &NewProduct,
) -> Result<Product> {
    validate_product(new)?;
    let mut tx = store.begin().await?;
    if tx.get_collection(new.collection_id).await?.is_none() {
        return Err(AppError::InvalidInput("unknown collection".to_owned()));
    }
    let product = tx
        .update_product(id, new)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    tx.commit().await?;
    Ok(product)
}

/// Delete a product, refusing if any order references it.
///
/// Open cart lines for the product are removed by cascade; committed order
/// history is never touched.
///
/// # Errors
///
/// Returns [`AppError::Conflict`] if order items reference the product, or
/// [`AppError::NotFound`] if it does not exist.
pub async fn delete_product(store: &dyn Store, id: ProductId) -> Result<()> {
    let mut tx = store.begin().await?;
    if tx.product_has_order_items(id).await? {
        return Err(AppError::Conflict(
            "product is referenced by order items".to_owned(),
        ));
    }
    if !tx.delete_product(id).await? {
        return Err(AppError::NotFound("product"));
    }
    tx.commit().await?;
    Ok(())
}

fn validate_product(new: &NewProduct) -> Result<()> {
    if new.title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "product title must not be empty".to_owned(),
        ));
    }
    if new.unit_price.is_negative() {
        return Err(AppError::InvalidInput(
            "unit price must not be negative".to_owned(),
        ));
    }
    if new.inventory < 0 {
        return Err(AppError::InvalidInput(
            "inventory must not be negative".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketrow_core::Money;

    use super::*;
    use crate::store::memory::MemoryStore;

    async fn seed_collection(store: &MemoryStore, title: &str) -> Collection {
        create_collection(
            store,
            &NewCollection {
                title: title.to_owned(),
            },
        )
        .await
        .unwrap()
    }

    fn new_product(title: &str, cents: i64, collection_id: CollectionId) -> NewProduct {
        NewProduct {
            title: title.to_owned(),
            description: None,
            unit_price: Money::from_cents(cents),
            inventory: 10,
            collection_id,
        }
    }

    #[tokio::test]
    async fn deleting_collection_with_products_conflicts() {
        let store = MemoryStore::new();
        let collection = seed_collection(&store, "Pantry").await;
        create_product(&store, &new_product("Olive oil", 1299, collection.id))
            .await
            .unwrap();

        let err = delete_collection(&store, collection.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Still there
        assert!(get_collection(&store, collection.id).await.is_ok());
    }

    #[tokio::test]
    async fn deleting_empty_collection_succeeds() {
        let store = MemoryStore::new();
        let collection = seed_collection(&store, "Seasonal").await;

        delete_collection(&store, collection.id).await.unwrap();

        let err = get_collection(&store, collection.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("collection")));
    }

    #[tokio::test]
    async fn product_requires_existing_collection() {
        let store = MemoryStore::new();

        let err = create_product(&store, &new_product("Ghost", 100, CollectionId::new(99)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn blank_titles_are_rejected() {
        let store = MemoryStore::new();
        let collection = seed_collection(&store, "Pantry").await;

        let err = create_product(&store, &new_product("   ", 100, collection.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = create_collection(&store, &NewCollection { title: " ".to_owned() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn listing_products_filters_by_collection() {
        let store = MemoryStore::new();
        let pantry = seed_collection(&store, "Pantry").await;
        let dairy = seed_collection(&store, "Dairy").await;
        create_product(&store, &new_product("Olive oil", 1299, pantry.id))
            .await
            .unwrap();
        create_product(&store, &new_product("Milk", 349, dairy.id))
            .await
            .unwrap();

        let all = list_products(&store, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let pantry_only = list_products(&store, Some(pantry.id)).await.unwrap();
        assert_eq!(pantry_only.len(), 1);
        assert_eq!(pantry_only[0].title, "Olive oil");
    }

    #[tokio::test]
    async fn updating_missing_product_is_not_found() {
        let store = MemoryStore::new();
        let collection = seed_collection(&store, "Pantry").await;

        let err = update_product(
            &store,
            ProductId::new(404),
            &new_product("Renamed", 100, collection.id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound("product")));
    }
}
