//! Health endpoint checks.

use http::StatusCode;
use serde_json::Value;

use marketrow_integration_tests::{get, test_app};

#[tokio::test]
async fn liveness_returns_ok() {
    let app = test_app();

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_owned()));
}

#[tokio::test]
async fn readiness_reports_the_store_reachable() {
    let app = test_app();

    let (status, _) = get(&app, "/health/ready").await;

    assert_eq!(status, StatusCode::OK);
}
