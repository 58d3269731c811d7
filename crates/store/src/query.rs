//! Filters for list operations.
//!
//! Text filters are case-insensitive substring matches. Every query knows how
//! to test a single entity so the in-memory store and the tests agree with the
//! SQL the PostgreSQL store generates.

use chrono::{DateTime, Utc};
use common::{CategoryId, UserId};
use domain::{Faq, Order, OrderState, Product, Role, User};

/// Builder for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Only active products.
    pub active_only: bool,

    /// Filter by category.
    pub category_id: Option<CategoryId>,

    /// Substring of the product name.
    pub name_contains: Option<String>,

    /// Only products at or below their critical stock.
    pub low_stock_only: bool,
}

impl ProductQuery {
    /// Creates a query matching every product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query matching active products.
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn name_contains(mut self, text: impl Into<String>) -> Self {
        self.name_contains = Some(text.into());
        self
    }

    pub fn low_stock(mut self) -> Self {
        self.low_stock_only = true;
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        (!self.active_only || product.active)
            && self
                .category_id
                .is_none_or(|id| product.category_id == Some(id))
            && self
                .name_contains
                .as_deref()
                .is_none_or(|text| contains_ignore_case(&product.name, text))
            && (!self.low_stock_only || product.is_low_stock())
    }
}

/// Builder for user listings.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub role: Option<Role>,

    /// Substring of the first or last names.
    pub name_contains: Option<String>,
}

impl UserQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn name_contains(mut self, text: impl Into<String>) -> Self {
        self.name_contains = Some(text.into());
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        self.role.is_none_or(|role| user.role == role)
            && self
                .name_contains
                .as_deref()
                .is_none_or(|text| user.name_matches(text))
    }
}

/// Builder for order listings. Results are always newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub user_id: Option<UserId>,
    pub state: Option<OrderState>,

    /// Orders created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,

    /// Orders created at or before this instant.
    pub created_to: Option<DateTime<Utc>>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,
}

impl OrderQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn in_state(state: OrderState) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }

    pub fn state(mut self, state: OrderState) -> Self {
        self.state = Some(state);
        self
    }

    /// Restricts to orders created within `[from, to]`.
    pub fn created_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self.created_to = Some(to);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.is_none_or(|id| order.user_id == id)
            && self.state.is_none_or(|state| order.state == state)
            && self.created_from.is_none_or(|from| order.created_at >= from)
            && self.created_to.is_none_or(|to| order.created_at <= to)
    }
}

/// Builder for FAQ listings. Results are ordered by display order.
#[derive(Debug, Clone, Default)]
pub struct FaqQuery {
    pub active_only: bool,
    pub category: Option<String>,

    /// Substring of the question.
    pub question_contains: Option<String>,
}

impl FaqQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn question_contains(mut self, text: impl Into<String>) -> Self {
        self.question_contains = Some(text.into());
        self
    }

    pub fn matches(&self, faq: &Faq) -> bool {
        (!self.active_only || faq.active)
            && self
                .category
                .as_deref()
                .is_none_or(|category| faq.category.as_deref() == Some(category))
            && self
                .question_contains
                .as_deref()
                .is_none_or(|text| faq.question_matches(text))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
