//! End-to-end checkout: cart assembly through order placement.
//!
//! Exercises the HTTP surface the way a client would: build a catalog, fill
//! a cart, place the order, then verify the price-snapshot semantics.

#![allow(clippy::indexing_slicing)]

use axum::Router;
use http::StatusCode;
use serde_json::json;

use marketrow_integration_tests::{
    add_to_cart, create_collection, create_customer, create_product, delete, get, open_cart,
    patch_json, place_order, post_json, put_json, test_app,
};

struct Checkout {
    cart: String,
    customer: i64,
    collection: i64,
    oil: i64,
    salt: i64,
}

/// The standard checkout fixture: a cart holding 2 x $10.00 + 1 x $5.00.
async fn seeded_checkout(app: &Router) -> Checkout {
    let collection = create_collection(app, "Pantry").await;
    let oil = create_product(app, collection, "Olive Oil", "10.00").await;
    let salt = create_product(app, collection, "Sea Salt", "5.00").await;
    let customer = create_customer(app, "jo@example.com").await;
    let cart = open_cart(app).await;
    add_to_cart(app, &cart, oil, 2).await;
    add_to_cart(app, &cart, salt, 1).await;
    Checkout {
        cart,
        customer,
        collection,
        oil,
        salt,
    }
}

// ============================================================================
// Checkout Flow
// ============================================================================

#[tokio::test]
async fn checkout_flow_places_a_twenty_five_dollar_order() {
    let app = test_app();
    let checkout = seeded_checkout(&app).await;

    // The cart shows live totals before placement
    let (status, cart_body) = get(&app, &format!("/carts/{}", checkout.cart)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart_body["total"], json!("25.00"));
    assert_eq!(cart_body["items"].as_array().expect("items").len(), 2);
    assert_eq!(cart_body["items"][0]["total_price"], json!("20.00"));

    // Place the order
    let order = place_order(&app, &checkout.cart, checkout.customer).await;
    assert_eq!(order["payment_status"], json!("pending"));
    assert_eq!(order["total"], json!("25.00"));
    assert_eq!(order["customer_id"], json!(checkout.customer));

    let items = order["items"].as_array().expect("order items");
    assert_eq!(items.len(), 2);
    let oil_line = items
        .iter()
        .find(|item| item["product_id"] == json!(checkout.oil))
        .expect("oil line");
    assert_eq!(oil_line["quantity"], json!(2));
    assert_eq!(oil_line["unit_price"], json!("10.00"));
    assert_eq!(oil_line["total_price"], json!("20.00"));

    // Placement consumes the cart
    let (status, _) = get(&app, &format!("/carts/{}", checkout.cart)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The order is readable afterwards and shows up in the customer's history
    let order_id = order["id"].as_i64().expect("order id");
    let (status, fetched) = get(&app, &format!("/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["total"], json!("25.00"));

    let (status, list) = get(&app, &format!("/orders?customer_id={}", checkout.customer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().expect("orders").len(), 1);
}

#[tokio::test]
async fn adding_the_same_product_twice_merges_lines() {
    let app = test_app();
    let collection = create_collection(&app, "Pantry").await;
    let oil = create_product(&app, collection, "Olive Oil", "10.00").await;
    let cart = open_cart(&app).await;

    add_to_cart(&app, &cart, oil, 2).await;
    add_to_cart(&app, &cart, oil, 3).await;

    let (status, body) = get(&app, &format!("/carts/{cart}")).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], json!(5));
    assert_eq!(body["total"], json!("50.00"));
}

#[tokio::test]
async fn cart_lines_can_be_adjusted_and_removed() {
    let app = test_app();
    let checkout = seeded_checkout(&app).await;

    // Set the oil line to a single unit
    let (status, item) = patch_json(
        &app,
        &format!("/carts/{}/items/{}", checkout.cart, checkout.oil),
        &json!({ "quantity": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["quantity"], json!(1));

    // Drop the salt line entirely
    let (status, _) = delete(
        &app,
        &format!("/carts/{}/items/{}", checkout.cart, checkout.salt),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = get(&app, &format!("/carts/{}", checkout.cart)).await;
    assert_eq!(body["total"], json!("10.00"));
    assert_eq!(body["items"].as_array().expect("items").len(), 1);
}

#[tokio::test]
async fn order_total_survives_later_price_changes() {
    let app = test_app();
    let checkout = seeded_checkout(&app).await;

    let order = place_order(&app, &checkout.cart, checkout.customer).await;
    let order_id = order["id"].as_i64().expect("order id");

    // Reprice the oil well above the snapshot
    let (status, _) = put_json(
        &app,
        &format!("/products/{}", checkout.oil),
        &json!({
            "title": "Olive Oil",
            "unit_price": "99.00",
            "inventory": 10,
            "collection_id": checkout.collection,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = get(&app, &format!("/orders/{order_id}")).await;
    assert_eq!(fetched["total"], json!("25.00"));
    let items = fetched["items"].as_array().expect("items");
    let oil_line = items
        .iter()
        .find(|item| item["product_id"] == json!(checkout.oil))
        .expect("oil line");
    assert_eq!(oil_line["unit_price"], json!("10.00"));
}

#[tokio::test]
async fn payment_status_updates_after_checkout() {
    let app = test_app();
    let checkout = seeded_checkout(&app).await;

    let order = place_order(&app, &checkout.cart, checkout.customer).await;
    let order_id = order["id"].as_i64().expect("order id");

    let (status, updated) = patch_json(
        &app,
        &format!("/orders/{order_id}/payment"),
        &json!({ "payment_status": "complete" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["payment_status"], json!("complete"));

    let (status, _) = patch_json(
        &app,
        "/orders/424242/payment",
        &json!({ "payment_status": "failed" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Failure Paths
// ============================================================================

#[tokio::test]
async fn placing_an_empty_cart_is_rejected() {
    let app = test_app();
    let customer = create_customer(&app, "jo@example.com").await;
    let cart = open_cart(&app).await;

    let (status, body) = post_json(
        &app,
        "/orders",
        &json!({ "cart_id": cart, "customer_id": customer }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], json!("invalid state: cart is empty"));

    // The cart is untouched
    let (status, _) = get(&app, &format!("/carts/{cart}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_cart_or_customer_is_not_found() {
    let app = test_app();
    let checkout = seeded_checkout(&app).await;

    let (status, body) = post_json(
        &app,
        "/orders",
        &json!({
            "cart_id": "00000000-0000-0000-0000-000000000000",
            "customer_id": checkout.customer,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("cart not found"));

    let (status, body) = post_json(
        &app,
        "/orders",
        &json!({ "cart_id": checkout.cart, "customer_id": 9999 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("customer not found"));

    // Failed placements leave the cart intact
    let (status, cart_body) = get(&app, &format!("/carts/{}", checkout.cart)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart_body["items"].as_array().expect("items").len(), 2);
}

#[tokio::test]
async fn quantities_below_one_are_rejected() {
    let app = test_app();
    let collection = create_collection(&app, "Pantry").await;
    let oil = create_product(&app, collection, "Olive Oil", "10.00").await;
    let cart = open_cart(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/carts/{cart}/items"),
        &json!({ "product_id": oil, "quantity": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("invalid input: quantity must be at least 1")
    );
}
