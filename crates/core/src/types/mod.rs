//! Core types for Marketrow.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod entity;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use entity::{EntityKind, EntityKindError, EntityRef};
pub use id::*;
pub use money::Money;
pub use status::{Membership, PaymentStatus, StatusParseError};
