//! Unified error handling for the HTTP API.
//!
//! Provides a single `AppError` type that every route handler returns. Errors
//! map onto HTTP status codes in one place, and storage failures are logged
//! but never leak details to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request is well-formed but the resource is in a state that
    /// forbids it (e.g. placing an order from an empty cart).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The request itself is malformed or references unusable data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation clashes with existing data (duplicate email, guarded
    /// delete).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server-side failures with full detail
        if matches!(
            self,
            Self::Store(StoreError::Database(_) | StoreError::Transient(_))
        ) {
            tracing::error!(error = %self, "request failed");
        }

        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Store(StoreError::Conflict(msg)) => msg.clone(),
            Self::Store(_) => "internal error".to_owned(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
