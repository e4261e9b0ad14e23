//! Integration tests for Marketrow.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketrow-integration-tests
//! ```
//!
//! The suites drive the full Axum router in process over the in-memory
//! store, so no database or running server is required. The request
//! helpers below keep the individual tests focused on behavior.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::indexing_slicing)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use marketrow_storefront::config::{AppConfig, StoreBackend};
use marketrow_storefront::events::EventNotifier;
use marketrow_storefront::routes;
use marketrow_storefront::state::AppState;
use marketrow_storefront::store::memory::MemoryStore;

/// Build the full application router over a fresh in-memory store.
///
/// Every call returns an independent application; tests never share state.
#[must_use]
pub fn test_app() -> Router {
    let config = AppConfig {
        store_backend: StoreBackend::Memory,
        database_url: None,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        smtp: None,
    };
    let state = AppState::new(config, Arc::new(MemoryStore::new()), EventNotifier::new());
    routes::routes().with_state(state)
}

/// Send a GET request.
pub async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    send(app, bodyless_request("GET", path)).await
}

/// Send a POST request with an empty body.
pub async fn post_empty(app: &Router, path: &str) -> (StatusCode, Value) {
    send(app, bodyless_request("POST", path)).await
}

/// Send a POST request carrying a JSON body.
pub async fn post_json(app: &Router, path: &str, body: &Value) -> (StatusCode, Value) {
    send(app, json_request("POST", path, body)).await
}

/// Send a PUT request carrying a JSON body.
pub async fn put_json(app: &Router, path: &str, body: &Value) -> (StatusCode, Value) {
    send(app, json_request("PUT", path, body)).await
}

/// Send a PATCH request carrying a JSON body.
pub async fn patch_json(app: &Router, path: &str, body: &Value) -> (StatusCode, Value) {
    send(app, json_request("PATCH", path, body)).await
}

/// Send a DELETE request.
pub async fn delete(app: &Router, path: &str) -> (StatusCode, Value) {
    send(app, bodyless_request("DELETE", path)).await
}

fn bodyless_request(method: &str, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("request builds")
}

fn json_request(method: &str, path: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

// ============================================================================
// Seed Fixtures
// ============================================================================
//
// Shared builders for the entities most suites need. Each asserts the
// expected success status so test bodies stay focused on behavior.

/// Create a collection and return its id.
pub async fn create_collection(app: &Router, title: &str) -> i64 {
    let (status, body) = post_json(app, "/collections", &serde_json::json!({ "title": title })).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("collection id")
}

/// Create a product and return its id.
pub async fn create_product(app: &Router, collection_id: i64, title: &str, unit_price: &str) -> i64 {
    let (status, body) = post_json(
        app,
        "/products",
        &serde_json::json!({
            "title": title,
            "unit_price": unit_price,
            "inventory": 10,
            "collection_id": collection_id,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("product id")
}

/// Register a customer and return their id.
pub async fn create_customer(app: &Router, email: &str) -> i64 {
    let (status, body) = post_json(
        app,
        "/customers",
        &serde_json::json!({
            "first_name": "Jo",
            "last_name": "March",
            "email": email,
            "phone": "555-0101",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("customer id")
}

/// Open a cart and return its id.
pub async fn open_cart(app: &Router) -> String {
    let (status, body) = post_empty(app, "/carts").await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("cart id").to_owned()
}

/// Add a product to a cart.
pub async fn add_to_cart(app: &Router, cart_id: &str, product_id: i64, quantity: i64) {
    let (status, _) = post_json(
        app,
        &format!("/carts/{cart_id}/items"),
        &serde_json::json!({ "product_id": product_id, "quantity": quantity }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

/// Place an order from a cart and return the order body.
pub async fn place_order(app: &Router, cart_id: &str, customer_id: i64) -> Value {
    let (status, body) = post_json(
        app,
        "/orders",
        &serde_json::json!({ "cart_id": cart_id, "customer_id": customer_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

/// Drive one request through the router and decode the response.
///
/// Empty bodies come back as `Value::Null`; non-JSON bodies (the health
/// endpoint, extractor rejections) come back as `Value::String`.
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router handles the request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body reads")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}
