//! Product route handlers, including nested reviews.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use marketrow_core::{CollectionId, Money, ProductId, ReviewId};

use crate::error::Result;
use crate::models::{NewProduct, NewReview, Product, Review};
use crate::services::{catalog, reviews};
use crate::state::AppState;

/// Product as rendered to clients.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    pub unit_price: Money,
    /// `unit_price` with 10% tax applied, rounded to cents.
    pub price_with_tax: Money,
    pub inventory: i32,
    pub collection_id: CollectionId,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            price_with_tax: product.unit_price.with_tax(),
            unit_price: product.unit_price,
            title: product.title,
            description: product.description,
            inventory: product.inventory,
            collection_id: product.collection_id,
            updated_at: product.updated_at,
        }
    }
}

/// Query filter for the product list.
#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub collection_id: Option<CollectionId>,
}

/// List products, optionally narrowed to one collection.
///
/// GET /products?collection_id=
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<ProductView>>> {
    let products = catalog::list_products(state.store(), filter.collection_id).await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// Product detail.
///
/// GET /products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = catalog::get_product(state.store(), id).await?;
    Ok(Json(product.into()))
}

/// Create a product.
///
/// POST /products
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let product = catalog::create_product(state.store(), &new).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Replace a product's fields.
///
/// PUT /products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(new): Json<NewProduct>,
) -> Result<Json<ProductView>> {
    let product = catalog::update_product(state.store(), id, &new).await?;
    Ok(Json(product.into()))
}

/// Delete a product unless order history references it.
///
/// DELETE /products/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    catalog::delete_product(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// === Reviews ===

/// Review as rendered to clients.
#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            product_id: review.product_id,
            name: review.name,
            description: review.description,
            date: review.date,
        }
    }
}

/// List a product's reviews.
///
/// GET /products/{id}/reviews
pub async fn reviews_index(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<ReviewView>>> {
    let reviews = reviews::list_reviews(state.store(), id).await?;
    Ok(Json(reviews.into_iter().map(ReviewView::from).collect()))
}

/// Attach a review to a product.
///
/// POST /products/{id}/reviews
pub async fn reviews_create(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(new): Json<NewReview>,
) -> Result<(StatusCode, Json<ReviewView>)> {
    let review = reviews::create_review(state.store(), id, &new).await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}
