//! Order placement and retrieval.
//!
//! Placement is the one multi-step write in the system: everything between
//! creating the order row and deleting the consumed cart happens in a single
//! transaction, so a failure anywhere leaves no trace. Item prices are
//! snapshotted from the catalog at placement time; later price changes never
//! touch a committed order.

use chrono::Utc;
use marketrow_core::{CartId, CustomerId, OrderId, PaymentStatus};

use crate::error::{AppError, Result};
use crate::events::{EventNotifier, OrderCreated};
use crate::models::{NewOrderItem, Order, OrderWithItems};
use crate::store::Store;

/// Convert a cart into an order.
///
/// Validates that the cart exists and is non-empty and that the customer
/// exists, then atomically creates the order, snapshots the cart's lines at
/// current catalog prices, and consumes the cart. Exactly one placement can
/// win a given cart: a concurrent placement that finds the cart already
/// consumed aborts and rolls back.
///
/// The order-created event is emitted only after the transaction commits,
/// and subscriber failures never affect the returned order.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the cart or customer does not exist
/// (or the cart was consumed concurrently), [`AppError::InvalidState`] if
/// the cart is empty.
pub async fn place_order(
    store: &dyn Store,
    notifier: &EventNotifier,
    cart_id: CartId,
    customer_id: CustomerId,
) -> Result<OrderWithItems> {
    let mut tx = store.begin().await?;

    // Preconditions, checked inside the transaction
    if tx.get_cart(cart_id).await?.is_none() {
        return Err(AppError::NotFound("cart"));
    }
    let lines = tx.cart_lines(cart_id).await?;
    if lines.is_empty() {
        return Err(AppError::InvalidState("cart is empty".to_owned()));
    }
    let Some(customer) = tx.get_customer(customer_id).await? else {
        return Err(AppError::NotFound("customer"));
    };

    let order = tx.insert_order(customer_id, Utc::now()).await?;

    // Snapshot current catalog prices into the order lines
    let new_items: Vec<NewOrderItem> = lines
        .iter()
        .map(|line| NewOrderItem {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
        .collect();
    let items = tx.insert_order_items(order.id, &new_items).await?;

    // The cart must still be ours to consume; losing this race aborts the
    // placement and the rollback discards the order rows above
    if !tx.delete_cart(cart_id).await? {
        return Err(AppError::NotFound("cart"));
    }

    tx.commit().await?;

    let order = OrderWithItems { order, items };
    notifier
        .order_created(&OrderCreated::new(&order, &customer))
        .await;
    Ok(order)
}

/// List orders, optionally narrowed to one customer.
///
/// # Errors
///
/// Fails only on storage errors.
pub async fn list_orders(
    store: &dyn Store,
    customer_id: Option<CustomerId>,
) -> Result<Vec<Order>> {
    let mut tx = store.begin().await?;
    let orders = tx.list_orders(customer_id).await?;
    tx.commit().await?;
    Ok(orders)
}

/// Fetch one order with its items.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the order does not exist.
pub async fn get_order(store: &dyn Store, id: OrderId) -> Result<OrderWithItems> {
    let mut tx = store.begin().await?;
    let order = tx.get_order(id).await?.ok_or(AppError::NotFound("order"))?;
    let items = tx.order_items(id).await?;
    tx.commit().await?;
    Ok(OrderWithItems { order, items })
}

/// Update an order's payment status.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the order does not exist.
pub async fn set_payment_status(
    store: &dyn Store,
    id: OrderId,
    status: PaymentStatus,
) -> Result<Order> {
    let mut tx = store.begin().await?;
    let order = tx
        .set_payment_status(id, status)
        .await?
        .ok_or(AppError::NotFound("order"))?;
    tx.commit().await?;
    Ok(order)
}
