//! Order aggregate: placement and state transitions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::error::DomainError;
use crate::money::Money;
use crate::validation;

use super::{LineItem, OrderNumber, OrderState};

/// Free-text shipping destination captured with the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub address: Option<String>,
    pub region: Option<String>,
    pub comuna: Option<String>,
}

/// One requested line: a product and how many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl RequestedItem {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Request to place an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: UserId,
    pub items: Vec<RequestedItem>,
    pub shipping: ShippingDetails,
    pub notes: Option<String>,
}

impl PlaceOrder {
    /// Creates a request without shipping details or notes.
    pub fn new(user_id: UserId, items: Vec<RequestedItem>) -> Self {
        Self {
            user_id,
            items,
            shipping: ShippingDetails::default(),
            notes: None,
        }
    }

    /// Checks the request shape: at least one line, positive quantities,
    /// and field lengths.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::NoItems);
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(DomainError::InvalidQuantity {
                quantity: item.quantity,
            });
        }
        validation::optional("shipping_address", self.shipping.address.as_deref(), 200)?;
        validation::optional("shipping_region", self.shipping.region.as_deref(), 50)?;
        validation::optional("shipping_comuna", self.shipping.comuna.as_deref(), 50)?;
        validation::optional("notes", self.notes.as_deref(), 500)?;
        Ok(())
    }

    /// Total units requested per product, in order of first appearance.
    ///
    /// A product listed on several lines is counted once with the summed
    /// quantity, which is what the stock check and decrement operate on.
    pub fn quantities_by_product(&self) -> Vec<(ProductId, i64)> {
        let mut totals: Vec<(ProductId, i64)> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match totals.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, total)) => *total += i64::from(item.quantity),
                None => totals.push((item.product_id, i64::from(item.quantity))),
            }
        }
        totals
    }

    /// Distinct product ids referenced by the request.
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.quantities_by_product()
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }
}

/// Order aggregate root.
///
/// Owns its line items in display order. `subtotal`, `discount`, and `total`
/// are fixed when the order is placed and are not recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub number: OrderNumber,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub state: OrderState,
    pub shipping: ShippingDetails,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Builds a pending order from `request` against the current catalog.
    ///
    /// Every check runs before anything is built: request shape, that each
    /// product exists, and that each product has enough stock for the summed
    /// quantity requested. Line items snapshot product name and price.
    ///
    /// This does not touch stock; callers apply
    /// [`PlaceOrder::quantities_by_product`] atomically with persisting the
    /// returned order.
    pub fn place(
        request: &PlaceOrder,
        products: &HashMap<ProductId, Product>,
        number: OrderNumber,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        request.validate()?;

        for (product_id, requested) in request.quantities_by_product() {
            let product = products
                .get(&product_id)
                .ok_or(DomainError::UnknownProduct(product_id))?;
            product.ensure_available(requested)?;
        }

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = products
                .get(&line.product_id)
                .ok_or(DomainError::UnknownProduct(line.product_id))?;
            items.push(LineItem::snapshot(product, line.quantity)?);
        }

        let mut order = Self {
            id: OrderId::new(),
            number,
            user_id: request.user_id,
            items,
            subtotal: Money::zero(),
            discount: Money::zero(),
            total: Money::zero(),
            state: OrderState::Pending,
            shipping: request.shipping.clone(),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: None,
        };
        order.compute_totals()?;
        Ok(order)
    }

    /// Sets `subtotal` to the sum of item subtotals and `total` to
    /// `subtotal - discount`.
    fn compute_totals(&mut self) -> Result<(), DomainError> {
        let too_large = || DomainError::validation("total", "exceeds the maximum amount");
        self.subtotal = self
            .items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.subtotal()))
            .ok_or_else(too_large)?;
        self.total = self
            .subtotal
            .checked_sub(self.discount)
            .ok_or_else(too_large)?;
        Ok(())
    }

    /// Moves the order to `target`.
    ///
    /// Returns the units to put back into stock: every line whose product
    /// still exists when the order is being canceled, nothing otherwise.
    /// The order is left untouched when the transition is rejected.
    pub fn transition_to(
        &mut self,
        target: OrderState,
        now: DateTime<Utc>,
    ) -> Result<Vec<(ProductId, u32)>, DomainError> {
        self.state.ensure_can_transition(target)?;

        let restock = if target == OrderState::Canceled {
            self.items
                .iter()
                .filter_map(|item| item.product_id.map(|id| (id, item.quantity)))
                .collect()
        } else {
            Vec::new()
        };

        self.state = target;
        self.updated_at = Some(now);
        Ok(restock)
    }

    /// Returns the total number of units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}
