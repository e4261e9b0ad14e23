//! Customer route handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Serialize;

use marketrow_core::{CustomerId, Email, Membership};

use crate::error::Result;
use crate::models::{Customer, NewCustomer};
use crate::services::customers;
use crate::state::AppState;

/// Customer as rendered to clients.
#[derive(Debug, Serialize)]
pub struct CustomerView {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
}

impl From<Customer> for CustomerView {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone: customer.phone,
            birth_date: customer.birth_date,
            membership: customer.membership,
        }
    }
}

/// List all customers.
///
/// GET /customers
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CustomerView>>> {
    let customers = customers::list_customers(state.store()).await?;
    Ok(Json(
        customers.into_iter().map(CustomerView::from).collect(),
    ))
}

/// Customer detail.
///
/// GET /customers/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<Json<CustomerView>> {
    let customer = customers::get_customer(state.store(), id).await?;
    Ok(Json(customer.into()))
}

/// Register a customer.
///
/// POST /customers
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewCustomer>,
) -> Result<(StatusCode, Json<CustomerView>)> {
    let customer = customers::create_customer(state.store(), &new).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// Replace a customer's fields.
///
/// PUT /customers/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Json(new): Json<NewCustomer>,
) -> Result<Json<CustomerView>> {
    let customer = customers::update_customer(state.store(), id, &new).await?;
    Ok(Json(customer.into()))
}

/// Delete a customer unless they have order history.
///
/// DELETE /customers/{id}
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode> {
    customers::delete_customer(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
