//! Cart route handlers.
//!
//! Carts are anonymous: opening one returns a UUID the client keeps. All
//! cart views price lines at the current catalog price; totals here are
//! live, not snapshots.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketrow_core::{CartId, Money, ProductId};

use crate::error::Result;
use crate::models::{Cart, CartItem, CartLine};
use crate::services::carts;
use crate::state::AppState;

/// One cart line at current catalog prices.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: i32,
    pub total_price: Money,
}

impl From<CartLine> for CartLineView {
    fn from(line: CartLine) -> Self {
        Self {
            total_price: line.line_total(),
            product_id: line.product_id,
            title: line.title,
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

/// Cart with lines and the live grand total.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartLineView>,
    pub total: Money,
}

impl CartView {
    fn new(cart: Cart, lines: Vec<CartLine>) -> Self {
        Self {
            id: cart.id,
            created_at: cart.created_at,
            total: carts::cart_total(&lines),
            items: lines.into_iter().map(CartLineView::from).collect(),
        }
    }
}

/// A bare cart line, returned from item writes.
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
}

impl From<CartItem> for CartItemView {
    fn from(item: CartItem) -> Self {
        Self {
            cart_id: item.cart_id,
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

/// Request to add a product to a cart.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Request to overwrite a line's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Open a new empty cart.
///
/// POST /carts
pub async fn create(State(state): State<AppState>) -> Result<(StatusCode, Json<CartView>)> {
    let cart = carts::create_cart(state.store()).await?;
    Ok((StatusCode::CREATED, Json(CartView::new(cart, Vec::new()))))
}

/// Cart detail with lines and live total.
///
/// GET /carts/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<CartId>) -> Result<Json<CartView>> {
    let (cart, lines) = carts::cart_with_lines(state.store(), id).await?;
    Ok(Json(CartView::new(cart, lines)))
}

/// Discard a cart and its lines.
///
/// DELETE /carts/{id}
pub async fn destroy(State(state): State<AppState>, Path(id): Path<CartId>) -> Result<StatusCode> {
    carts::delete_cart(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a product to a cart, merging with any existing line.
///
/// POST /carts/{id}/items
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<CartId>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItemView>)> {
    let item = carts::add_item(state.store(), id, req.product_id, req.quantity).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// Overwrite a line's quantity.
///
/// PATCH /carts/{id}/items/{product_id}
pub async fn update_item(
    State(state): State<AppState>,
    Path((cart_id, product_id)): Path<(CartId, ProductId)>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartItemView>> {
    let item = carts::set_item_quantity(state.store(), cart_id, product_id, req.quantity).await?;
    Ok(Json(item.into()))
}

/// Remove a line from a cart.
///
/// DELETE /carts/{id}/items/{product_id}
pub async fn remove_item(
    State(state): State<AppState>,
    Path((cart_id, product_id)): Path<(CartId, ProductId)>,
) -> Result<StatusCode> {
    carts::remove_item(state.store(), cart_id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
