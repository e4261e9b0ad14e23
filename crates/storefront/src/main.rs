//! Marketrow Storefront - JSON e-commerce API.
//!
//! This binary serves the storefront API on port 3000.
//!
//! # Architecture
//!
//! - Axum JSON API over plain async domain services
//! - Storage behind the `Store` trait: `PostgreSQL` for durable
//!   deployments, in-memory for demos and local hacking
//! - Order placement emits post-commit events that fan out to a log
//!   subscriber and, when SMTP is configured, an email subscriber

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketrow_storefront::config::{AppConfig, StoreBackend};
use marketrow_storefront::events::{EmailSubscriber, EventNotifier, LoggingSubscriber};
use marketrow_storefront::routes;
use marketrow_storefront::state::AppState;
use marketrow_storefront::store::Store;
use marketrow_storefront::store::memory::MemoryStore;
use marketrow_storefront::store::postgres::PgStore;

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed before tracing init)
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketrow_storefront=info,tower_http=debug".into());

    // Use JSON format on Fly.io for structured log parsing, text format locally
    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    // Select the storage backend
    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_ref()
                .expect("database URL is required for the postgres backend");
            let store = PgStore::connect(url)
                .await
                .expect("Failed to connect to PostgreSQL");
            tracing::info!("Database pool created");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; all data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p marketrow-cli -- migrate

    // Order events always reach the log; email requires SMTP configuration
    let mut notifier = EventNotifier::new().with(Arc::new(LoggingSubscriber));
    if let Some(smtp) = &config.smtp {
        let email = EmailSubscriber::new(smtp).expect("Failed to build SMTP transport");
        notifier = notifier.with(Arc::new(email));
    }
    tracing::info!(
        subscribers = notifier.subscriber_count(),
        "order notifier ready"
    );

    // Build application state
    let state = AppState::new(config.clone(), store, notifier);

    // Build router
    let app = routes::routes()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record("latency_ms", latency.as_millis() as u64);
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state);

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
