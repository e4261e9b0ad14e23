//! Order route handlers.
//!
//! Placement converts a cart into an order in one atomic step; everything
//! else here is read-side, plus the payment status update.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketrow_core::{CartId, CustomerId, Money, OrderId, PaymentStatus, ProductId};

use crate::error::Result;
use crate::models::{Order, OrderItem, OrderWithItems};
use crate::services::orders;
use crate::state::AppState;

/// Order header as rendered to clients.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            placed_at: order.placed_at,
            payment_status: order.payment_status,
        }
    }
}

/// One order line at its snapshotted price.
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Money,
    pub total_price: Money,
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        Self {
            total_price: item.line_total(),
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// Order detail with items and the total at snapshotted prices.
#[derive(Debug, Serialize)]
pub struct OrderDetailView {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItemView>,
    pub total: Money,
}

impl From<OrderWithItems> for OrderDetailView {
    fn from(order: OrderWithItems) -> Self {
        Self {
            total: order.total(),
            id: order.order.id,
            customer_id: order.order.customer_id,
            placed_at: order.order.placed_at,
            payment_status: order.order.payment_status,
            items: order.items.into_iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Request to place an order from a cart.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub cart_id: CartId,
    pub customer_id: CustomerId,
}

/// Request to move an order's payment status.
#[derive(Debug, Deserialize)]
pub struct PaymentUpdateRequest {
    pub payment_status: PaymentStatus,
}

/// Query filter for the order list.
#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub customer_id: Option<CustomerId>,
}

/// List orders, optionally one customer's.
///
/// GET /orders?customer_id=
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<OrderView>>> {
    let orders = orders::list_orders(state.store(), filter.customer_id).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// Place an order from a cart.
///
/// POST /orders
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetailView>)> {
    let order = orders::place_order(
        state.store(),
        state.notifier(),
        req.cart_id,
        req.customer_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// Order detail with items.
///
/// GET /orders/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetailView>> {
    let order = orders::get_order(state.store(), id).await?;
    Ok(Json(order.into()))
}

/// Update an order's payment status.
///
/// PATCH /orders/{id}/payment
pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(req): Json<PaymentUpdateRequest>,
) -> Result<Json<OrderView>> {
    let order = orders::set_payment_status(state.store(), id, req.payment_status).await?;
    Ok(Json(order.into()))
}
