//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Liveness check
//! GET    /health/ready                   - Readiness check (store ping)
//!
//! # Catalog
//! GET    /products                       - List products (?collection_id=)
//! POST   /products                       - Create product
//! GET    /products/{id}                  - Product detail
//! PUT    /products/{id}                  - Replace product
//! DELETE /products/{id}                  - Delete product (guarded)
//! GET    /products/{id}/reviews          - List reviews
//! POST   /products/{id}/reviews          - Create review
//! GET    /collections                    - List collections
//! POST   /collections                    - Create collection
//! GET    /collections/{id}               - Collection detail
//! PUT    /collections/{id}               - Rename collection
//! DELETE /collections/{id}               - Delete collection (guarded)
//!
//! # Carts
//! POST   /carts                          - Open a cart
//! GET    /carts/{id}                     - Cart with lines and live total
//! DELETE /carts/{id}                     - Discard a cart
//! POST   /carts/{id}/items               - Add item (merge-on-add)
//! PATCH  /carts/{id}/items/{product_id}  - Set line quantity
//! DELETE /carts/{id}/items/{product_id}  - Remove line
//!
//! # Customers
//! GET    /customers                      - List customers
//! POST   /customers                      - Register customer
//! GET    /customers/{id}                 - Customer detail
//! PUT    /customers/{id}                 - Replace customer
//! DELETE /customers/{id}                 - Delete customer (guarded)
//!
//! # Orders
//! GET    /orders                         - List orders (?customer_id=)
//! POST   /orders                         - Place order from a cart
//! GET    /orders/{id}                    - Order with items
//! PATCH  /orders/{id}/payment            - Update payment status
//!
//! # Tags
//! GET    /tags                           - List tags (?entity_kind=&entity_id=)
//! POST   /tags                           - Create tag
//! GET    /tags/{id}/items                - Entities under a tag
//! POST   /tags/{id}/items                - Attach tag to an entity
//! DELETE /tags/{id}/items                - Detach tag from an entity
//! ```

pub mod carts;
pub mod collections;
pub mod customers;
pub mod orders;
pub mod products;
pub mod tags;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route(
            "/{id}/reviews",
            get(products::reviews_index).post(products::reviews_create),
        )
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index).post(collections::create))
        .route(
            "/{id}",
            get(collections::show)
                .put(collections::update)
                .delete(collections::destroy),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(carts::create))
        .route("/{id}", get(carts::show).delete(carts::destroy))
        .route("/{id}/items", post(carts::add_item))
        .route(
            "/{id}/items/{product_id}",
            patch(carts::update_item).delete(carts::remove_item),
        )
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::index).post(customers::create))
        .route(
            "/{id}",
            get(customers::show)
                .put(customers::update)
                .delete(customers::destroy),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/payment", patch(orders::update_payment))
}

/// Create the tag routes router.
pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::index).post(tags::create))
        .route(
            "/{id}/items",
            get(tags::items_index)
                .post(tags::attach)
                .delete(tags::detach),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        .nest("/carts", cart_routes())
        .nest("/customers", customer_routes())
        .nest("/orders", order_routes())
        .nest("/tags", tag_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies store connectivity before returning OK.
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
