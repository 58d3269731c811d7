use chrono::{DateTime, Utc};
use common::{CategoryId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;
use crate::validation;

/// A product offered in the store.
///
/// `stock` is the only inventory record: order placement decrements it and
/// cancellation returns units to it. It never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Unique catalog code (e.g. `P-0001`).
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: i32,
    /// Stock level at or below which the product is reported as low.
    pub critical_stock: i32,
    pub image: Option<String>,
    pub category_id: Option<CategoryId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: i32,
    pub critical_stock: Option<i32>,
    pub image: Option<String>,
    pub category_id: Option<CategoryId>,
    pub active: Option<bool>,
}

/// Partial update of a product. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<i32>,
    pub critical_stock: Option<i32>,
    pub image: Option<String>,
    pub category_id: Option<CategoryId>,
    pub active: Option<bool>,
}

impl Product {
    /// Threshold used when a product is created without one.
    pub const DEFAULT_CRITICAL_STOCK: i32 = 5;

    /// Validates the input and builds a new product.
    pub fn create(new: NewProduct, now: DateTime<Utc>) -> Result<Self, DomainError> {
        validation::required("code", &new.code, 20)?;
        validation::required("name", &new.name, 100)?;
        validation::optional("description", new.description.as_deref(), 500)?;
        validation::optional("image", new.image.as_deref(), 255)?;
        validate_price(new.price)?;
        validation::non_negative("stock", new.stock)?;
        let critical_stock = new
            .critical_stock
            .unwrap_or(Self::DEFAULT_CRITICAL_STOCK);
        validation::non_negative("critical_stock", critical_stock)?;

        Ok(Self {
            id: ProductId::new(),
            code: new.code.trim().to_string(),
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            critical_stock,
            image: new.image,
            category_id: new.category_id,
            active: new.active.unwrap_or(true),
            created_at: now,
        })
    }

    /// Applies a partial update, validating every provided field first.
    pub fn apply(&mut self, patch: ProductPatch) -> Result<(), DomainError> {
        if let Some(name) = &patch.name {
            validation::required("name", name, 100)?;
        }
        validation::optional("description", patch.description.as_deref(), 500)?;
        validation::optional("image", patch.image.as_deref(), 255)?;
        if let Some(price) = patch.price {
            validate_price(price)?;
        }
        if let Some(stock) = patch.stock {
            validation::non_negative("stock", stock)?;
        }
        if let Some(critical) = patch.critical_stock {
            validation::non_negative("critical_stock", critical)?;
        }

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(critical) = patch.critical_stock {
            self.critical_stock = critical;
        }
        if let Some(image) = patch.image {
            self.image = Some(image);
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = Some(category_id);
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        Ok(())
    }

    /// Returns true when stock is at or below the critical threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.critical_stock
    }

    /// Returns true if at least one unit is available.
    pub fn has_stock(&self) -> bool {
        self.stock > 0
    }

    /// Fails with `InsufficientStock` unless `requested` units are available.
    pub fn ensure_available(&self, requested: i64) -> Result<(), DomainError> {
        if i64::from(self.stock) < requested {
            return Err(DomainError::InsufficientStock {
                product: self.name.clone(),
                requested,
                available: self.stock,
            });
        }
        Ok(())
    }

    /// Returns the stock after adding `delta` (negative removes units).
    pub fn adjusted_stock(&self, delta: i32) -> Result<i32, DomainError> {
        let next = i64::from(self.stock) + i64::from(delta);
        if next < 0 {
            return Err(DomainError::InsufficientStock {
                product: self.name.clone(),
                requested: -i64::from(delta),
                available: self.stock,
            });
        }
        i32::try_from(next).map_err(|_| stock_too_large())
    }

    /// Puts `quantity` units back into stock, as when an order is canceled.
    pub fn restock(&mut self, quantity: u32) -> Result<(), DomainError> {
        let delta = i32::try_from(quantity).map_err(|_| stock_too_large())?;
        self.stock = self.adjusted_stock(delta)?;
        Ok(())
    }
}

fn stock_too_large() -> DomainError {
    DomainError::validation("stock", "is too large")
}

fn validate_price(price: Money) -> Result<(), DomainError> {
    if !price.is_positive() {
        return Err(DomainError::validation("price", "must be greater than 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product() -> NewProduct {
        NewProduct {
            code: "P-0001".to_string(),
            name: "Cuaderno".to_string(),
            price: Money::new(2990),
            stock: 10,
            ..Default::default()
        }
    }

    #[test]
    fn create_applies_defaults() {
        let product = Product::create(new_product(), Utc::now()).unwrap();
        assert_eq!(product.critical_stock, Product::DEFAULT_CRITICAL_STOCK);
        assert!(product.active);
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn create_rejects_non_positive_price() {
        let mut input = new_product();
        input.price = Money::zero();
        assert!(matches!(
            Product::create(input, Utc::now()),
            Err(DomainError::Validation { field: "price", .. })
        ));
    }

    #[test]
    fn create_rejects_negative_stock_and_long_code() {
        let mut input = new_product();
        input.stock = -1;
        assert!(Product::create(input, Utc::now()).is_err());

        let mut input = new_product();
        input.code = "X".repeat(21);
        assert!(Product::create(input, Utc::now()).is_err());
    }

    #[test]
    fn apply_only_touches_provided_fields() {
        let mut product = Product::create(new_product(), Utc::now()).unwrap();
        product
            .apply(ProductPatch {
                price: Some(Money::new(3490)),
                active: Some(false),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(product.price, Money::new(3490));
        assert!(!product.active);
        assert_eq!(product.name, "Cuaderno");
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let mut product = Product::create(new_product(), Utc::now()).unwrap();
        let before = product.clone();
        let result = product.apply(ProductPatch {
            name: Some("Lápiz".to_string()),
            stock: Some(-5),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(product, before);
    }

    #[test]
    fn low_stock_includes_threshold() {
        let mut product = Product::create(new_product(), Utc::now()).unwrap();
        product.stock = 5;
        assert!(product.is_low_stock());
        product.stock = 6;
        assert!(!product.is_low_stock());
    }

    #[test]
    fn ensure_available_reports_shortage() {
        let product = Product::create(new_product(), Utc::now()).unwrap();
        assert!(product.ensure_available(10).is_ok());
        assert_eq!(
            product.ensure_available(11),
            Err(DomainError::InsufficientStock {
                product: "Cuaderno".to_string(),
                requested: 11,
                available: 10,
            })
        );
    }

    #[test]
    fn adjusted_stock_never_goes_negative() {
        let product = Product::create(new_product(), Utc::now()).unwrap();
        assert_eq!(product.adjusted_stock(5).unwrap(), 15);
        assert_eq!(product.adjusted_stock(-10).unwrap(), 0);
        assert!(product.adjusted_stock(-11).is_err());
    }

    #[test]
    fn restock_rejects_overflow_and_keeps_stock() {
        let mut product = Product::create(new_product(), Utc::now()).unwrap();
        product.restock(4).unwrap();
        assert_eq!(product.stock, 14);

        product.stock = i32::MAX - 1;
        assert!(matches!(
            product.restock(2),
            Err(DomainError::Validation { field: "stock", .. })
        ));
        assert!(matches!(
            product.restock(u32::MAX),
            Err(DomainError::Validation { field: "stock", .. })
        ));
        assert_eq!(product.stock, i32::MAX - 1);
    }
}
