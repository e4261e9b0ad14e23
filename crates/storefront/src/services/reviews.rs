//! Product review operations.
//!
//! Reviews hang off a product and carry the submission date; there is no
//! reviewer account linkage, just a free-form name.

use chrono::Utc;
use marketrow_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::{NewReview, Review};
use crate::store::Store;

/// List the reviews of one product.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the product does not exist.
pub async fn list_reviews(store: &dyn Store, product_id: ProductId) -> Result<Vec<Review>> {
    let mut tx = store.begin().await?;
    if tx.get_product(product_id).await?.is_none() {
        return Err(AppError::NotFound("product"));
    }
    let reviews = tx.list_reviews(product_id).await?;
    tx.commit().await?;
    Ok(reviews)
}

/// Attach a review to a product, dated today.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the product does not exist, or
/// [`AppError::InvalidInput`] on blank fields.
pub async fn create_review(
    store: &dyn Store,
    product_id: ProductId,
    new: &NewReview,
) -> Result<Review> {
    if new.name.trim().is_empty() || new.description.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "review name and description must not be empty".to_owned(),
        ));
    }
    let mut tx = store.begin().await?;
    if tx.get_product(product_id).await?.is_none() {
        return Err(AppError::NotFound("product"));
    }
    let review = tx
        .insert_review(product_id, new, Utc::now().date_naive())
        .await?;
    tx.commit().await?;
    Ok(review)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketrow_core::Money;

    use super::*;
    use crate::models::{NewCollection, NewProduct};
    use crate::services::catalog;
    use crate::store::memory::MemoryStore;

    async fn seed_product(store: &MemoryStore) -> ProductId {
        let collection = catalog::create_collection(
            store,
            &NewCollection {
                title: "Pantry".to_owned(),
            },
        )
        .await
        .unwrap();
        catalog::create_product(
            store,
            &NewProduct {
                title: "Olive oil".to_owned(),
                description: None,
                unit_price: Money::from_cents(1299),
                inventory: 10,
                collection_id: collection.id,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn new_review(name: &str) -> NewReview {
        NewReview {
            name: name.to_owned(),
            description: "Peppery finish, great on bread.".to_owned(),
        }
    }

    #[tokio::test]
    async fn review_is_dated_today() {
        let store = MemoryStore::new();
        let product = seed_product(&store).await;

        let review = create_review(&store, product, &new_review("Jo"))
            .await
            .unwrap();
        assert_eq!(review.date, Utc::now().date_naive());
        assert_eq!(review.product_id, product);
    }

    #[tokio::test]
    async fn reviews_require_an_existing_product() {
        let store = MemoryStore::new();

        let err = create_review(&store, ProductId::new(404), &new_review("Jo"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("product")));

        let err = list_reviews(&store, ProductId::new(404)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("product")));
    }

    #[tokio::test]
    async fn listing_returns_reviews_in_insertion_order() {
        let store = MemoryStore::new();
        let product = seed_product(&store).await;

        create_review(&store, product, &new_review("Jo"))
            .await
            .unwrap();
        create_review(&store, product, &new_review("Sam"))
            .await
            .unwrap();

        let reviews = list_reviews(&store, product).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].name, "Jo");
        assert_eq!(reviews[1].name, "Sam");
    }

    #[tokio::test]
    async fn blank_review_fields_are_rejected() {
        let store = MemoryStore::new();
        let product = seed_product(&store).await;

        let err = create_review(&store, product, &new_review("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
