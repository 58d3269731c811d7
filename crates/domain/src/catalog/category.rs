use common::CategoryId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::validation;

/// A product category. Names are unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

/// Input for creating a category.
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Partial update of a category.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

impl Category {
    /// Validates the input and builds a new category.
    pub fn create(new: NewCategory) -> Result<Self, DomainError> {
        validation::required("name", &new.name, 50)?;
        validation::optional("description", new.description.as_deref(), 200)?;

        Ok(Self {
            id: CategoryId::new(),
            name: new.name.trim().to_string(),
            description: new.description,
            active: new.active.unwrap_or(true),
        })
    }

    /// Applies a partial update.
    pub fn apply(&mut self, patch: CategoryPatch) -> Result<(), DomainError> {
        if let Some(name) = &patch.name {
            validation::required("name", name, 50)?;
        }
        validation::optional("description", patch.description.as_deref(), 200)?;

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        Ok(())
    }
}
