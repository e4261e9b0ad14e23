//! Marketrow storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing the HTTP surface to be driven in-process by tests and
//! reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
