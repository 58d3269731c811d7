//! Domain layer for the storefront backend.
//!
//! This crate is free of I/O. It provides:
//! - Entities for the catalog, users, FAQs, and the Chilean location table
//! - The order aggregate with line-item snapshots and totals
//! - The order state machine and its sink-state rule
//! - Field validation shared by every entity

pub mod catalog;
pub mod error;
pub mod faq;
pub mod location;
pub mod money;
pub mod order;
pub mod user;
mod validation;

pub use catalog::{Category, CategoryPatch, NewCategory, NewProduct, Product, ProductPatch};
pub use error::DomainError;
pub use faq::{Faq, FaqPatch, NewFaq};
pub use location::{Comuna, Region};
pub use money::Money;
pub use order::{
    LineItem, Order, OrderNumber, OrderNumberGenerator, OrderState, PlaceOrder, RequestedItem,
    ShippingDetails,
};
pub use user::{NewUser, Role, User, UserPatch};
