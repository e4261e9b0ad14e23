//! Customer record operations.
//!
//! Email uniqueness is enforced by the store; a duplicate surfaces as a
//! conflict. Customers with order history cannot be deleted.

use marketrow_core::CustomerId;

use crate::error::{AppError, Result};
use crate::models::{Customer, NewCustomer};
use crate::store::Store;

/// List all customers.
///
/// # Errors
///
/// Fails only on storage errors.
pub async fn list_customers(store: &dyn Store) -> Result<Vec<Customer>> {
    let mut tx = store.begin().await?;
    let customers = tx.list_customers().await?;
    tx.commit().await?;
    Ok(customers)
}

/// Fetch one customer.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the customer does not exist.
pub async fn get_customer(store: &dyn Store, id: CustomerId) -> Result<Customer> {
    let mut tx = store.begin().await?;
    let customer = tx
        .get_customer(id)
        .await?
        .ok_or(AppError::NotFound("customer"))?;
    tx.commit().await?;
    Ok(customer)
}

/// Register a customer.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] on blank names, or a conflict if the
/// email is already registered.
pub async fn create_customer(store: &dyn Store, new: &NewCustomer) -> Result<Customer> {
    validate(new)?;
    let mut tx = store.begin().await?;
    let customer = tx.insert_customer(new).await?;
    tx.commit().await?;
    Ok(customer)
}

/// Replace a customer's fields.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the customer does not exist,
/// [`AppError::InvalidInput`] on blank names, or a conflict if the new email
/// belongs to someone else.
pub async fn update_customer(
    store: &dyn Store,
    id: CustomerId,
    new: &NewCustomer,
) -> Result<Customer> {
    validate(new)?;
    let mut tx = store.begin().await?;
    let customer = tx
        .update_customer(id, new)
        .await?
        .ok_or(AppError::NotFound("customer"))?;
    tx.commit().await?;
    Ok(customer)
}

/// Delete a customer, refusing if they have placed orders.
///
/// # Errors
///
/// Returns [`AppError::Conflict`] if orders reference the customer, or
/// [`AppError::NotFound`] if they do not exist.
pub async fn delete_customer(store: &dyn Store, id: CustomerId) -> Result<()> {
    let mut tx = store.begin().await?;
    if tx.customer_has_orders(id).await? {
        return Err(AppError::Conflict("customer has placed orders".to_owned()));
    }
    if !tx.delete_customer(id).await? {
        return Err(AppError::NotFound("customer"));
    }
    tx.commit().await?;
    Ok(())
}

fn validate(new: &NewCustomer) -> Result<()> {
    if new.first_name.trim().is_empty() || new.last_name.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "customer name must not be empty".to_owned(),
        ));
    }
    Ok(())
}
