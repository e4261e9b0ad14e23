//! Marketrow Core - Shared types library.
//!
//! This crate provides common types used across all Marketrow components:
//! - `storefront` - The JSON API service and order placement core
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, statuses,
//!   and the tagged entity-kind union used for polymorphic associations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
