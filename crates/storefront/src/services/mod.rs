//! Business logic for the storefront.
//!
//! # Services
//!
//! - `catalog` - collections and products, with guarded deletes
//! - `carts` - anonymous carts, merge-on-add items, live totals
//! - `customers` - customer records (unique email)
//! - `orders` - order placement, retrieval, payment status
//! - `reviews` - per-product reviews
//! - `tags` - labels attachable to any entity
//!
//! Every operation opens one transaction on the
//! [`Store`](crate::store::Store), does all of its reads and writes inside
//! it, and commits at the end. Returning early with an error drops the
//! transaction, which rolls everything back.

pub mod carts;
pub mod catalog;
pub mod customers;
pub mod orders;
pub mod reviews;
pub mod tags;
