//! Line items: per-product snapshots inside an order.

use common::{LineItemId, ProductId};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::error::DomainError;
use crate::money::Money;

/// One product line of an order.
///
/// Name and unit price are copied from the product when the order is placed,
/// so later catalog edits never alter historical orders. `product_id` becomes
/// `None` if the product is deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    subtotal: Money,
}

impl LineItem {
    /// Snapshots `product` for `quantity` units.
    pub fn snapshot(product: &Product, quantity: u32) -> Result<Self, DomainError> {
        Self::restore(
            LineItemId::new(),
            Some(product.id),
            product.name.clone(),
            product.price,
            quantity,
        )
    }

    /// Rebuilds a persisted line item; the subtotal is always recomputed.
    ///
    /// Fails with a `Validation` error when `unit_price × quantity` does not
    /// fit in a [`Money`].
    pub fn restore(
        id: LineItemId,
        product_id: Option<ProductId>,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        let subtotal = unit_price
            .checked_mul(quantity)
            .ok_or_else(|| DomainError::validation("subtotal", "exceeds the maximum amount"))?;
        Ok(Self {
            id,
            product_id,
            product_name: product_name.into(),
            unit_price,
            quantity,
            subtotal,
        })
    }

    /// Returns `unit_price × quantity`.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }
}
