//! Shared types for the storefront backend.

mod types;

pub use types::{CategoryId, ComunaId, FaqId, LineItemId, OrderId, ProductId, RegionId, UserId};
