//! Product review types.

use chrono::NaiveDate;
use serde::Deserialize;

use marketrow_core::{ProductId, ReviewId};

/// A customer review of a product.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    /// Reviewer's display name.
    pub name: String,
    pub description: String,
    /// Day the review was left; set server-side.
    pub date: NaiveDate,
}

/// Payload for leaving a review.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub name: String,
    pub description: String,
}
