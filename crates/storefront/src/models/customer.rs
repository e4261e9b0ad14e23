//! Customer domain types.

use chrono::NaiveDate;
use serde::Deserialize;

use marketrow_core::{CustomerId, Email, Membership};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    /// Unique store-wide.
    pub email: Email,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    /// Loyalty tier; defaults to bronze.
    pub membership: Membership,
}

/// Payload for creating or replacing a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub membership: Membership,
}
