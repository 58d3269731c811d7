//! Use cases of the storefront backend.
//!
//! Each service wraps a [`store::Store`] and adds the rules that need more
//! than one entity (a product's category must exist, a user's comuna must
//! belong to their region), plus logging and metrics.
//!
//! [`OrderService`] owns the order lifecycle:
//! 1. Placement validates the request, checks every product and its stock,
//!    and decrements stock in the same unit of work that stores the order
//! 2. State changes are refused once an order is delivered or canceled
//! 3. Canceling returns every line's units to stock

pub mod catalog;
pub mod error;
pub mod faq;
pub mod location;
pub mod order;
pub mod user;

pub use catalog::{CatalogService, CategoryView, ProductView};
pub use error::{Result, ServiceError};
pub use faq::FaqService;
pub use location::{ComunaView, LocationService, RegionWithComunas};
pub use order::{OrderService, OrderStats, OrderView, RECENT_ORDERS};
pub use user::{UserService, UserView};
