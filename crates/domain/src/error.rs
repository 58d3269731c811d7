//! Domain error types.

use common::ProductId;
use thiserror::Error;

use crate::order::OrderState;

/// Business-rule violations detected without touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A field failed validation.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// An order was requested without items.
    #[error("Order has no items")]
    NoItems,

    /// A line quantity was zero.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// An order line references a product that does not exist.
    #[error("Product not found: {0}")]
    UnknownProduct(ProductId),

    /// Not enough stock to satisfy a request.
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i32,
    },

    /// The order is in a sink state and cannot change.
    #[error("Invalid state transition: an order in {from} state cannot change to {to}")]
    InvalidTransition { from: OrderState, to: OrderState },

    /// An order state name could not be parsed.
    #[error("Invalid order state: {0}")]
    InvalidStateName(String),

    /// A user role name could not be parsed.
    #[error("Invalid role: {0}")]
    InvalidRole(String),
}

impl DomainError {
    /// Builds a `Validation` error.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
