//! Domain models.
//!
//! These are the persisted shapes shared by both store backends. HTTP
//! responses never expose them directly; the route layer builds view structs
//! from them instead.

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod order;
pub mod review;
pub mod tag;

pub use cart::{Cart, CartItem, CartLine, MAX_LINE_QUANTITY};
pub use catalog::{Collection, NewCollection, NewProduct, Product};
pub use customer::{Customer, NewCustomer};
pub use order::{NewOrderItem, Order, OrderItem, OrderWithItems};
pub use review::{NewReview, Review};
pub use tag::{Tag, TaggedItem};
