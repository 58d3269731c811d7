//! HTTP handlers, one module per resource.

pub mod categories;
pub mod faqs;
pub mod health;
pub mod locations;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod users;

use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Body returned by delete endpoints.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parses a path segment into a typed id.
fn parse_id<T: From<Uuid>>(raw: &str) -> Result<T, ApiError> {
    Uuid::parse_str(raw)
        .map(T::from)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}

/// Unwraps a required query parameter.
fn required<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("Missing query parameter: {name}")))
}
