//! Persistence for the storefront backend.
//!
//! The [`Store`] trait family is implemented twice: [`InMemoryStore`] for tests
//! and single-process runs, and [`PostgresStore`] for production. Both make
//! order placement, order state changes, stock adjustments, and cascading
//! deletes atomic.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{FaqQuery, OrderQuery, ProductQuery, UserQuery};
pub use store::{CatalogStore, FaqStore, LocationStore, OrderStore, StateChange, Store, UserStore};
