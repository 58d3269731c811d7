//! Service error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors returned by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A business rule was violated.
    #[error(transparent)]
    Domain(DomainError),

    /// Persistence failed or rejected the operation.
    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::Domain(DomainError::Validation { .. }) => "validation",
            ServiceError::Domain(DomainError::NoItems) => "no_items",
            ServiceError::Domain(DomainError::InvalidQuantity { .. }) => "invalid_quantity",
            ServiceError::Domain(DomainError::InsufficientStock { .. }) => "insufficient_stock",
            ServiceError::Domain(DomainError::InvalidTransition { .. }) => "invalid_transition",
            ServiceError::Domain(_) => "domain",
            ServiceError::Store(StoreError::Conflict(_)) => "conflict",
            ServiceError::Store(_) => "store",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnknownProduct(id) => ServiceError::not_found("Product", id),
            other => ServiceError::Domain(other),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            StoreError::Domain(domain) => domain.into(),
            other => ServiceError::Store(other),
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
