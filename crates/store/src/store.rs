use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CategoryId, ComunaId, FaqId, OrderId, ProductId, RegionId, UserId};
use domain::{
    Category, Comuna, Faq, Money, Order, OrderNumber, OrderState, PlaceOrder, Product,
    ProductPatch, Region, User,
};

use crate::{FaqQuery, OrderQuery, ProductQuery, Result, UserQuery};

/// Outcome of an order state change.
#[derive(Debug, Clone)]
pub struct StateChange {
    /// The order after the change.
    pub order: Order,

    /// The state the order was in before.
    pub previous: OrderState,

    /// Units returned to stock (non-zero only on cancellation).
    pub restocked_units: u64,
}

/// Users and their cascading delete.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with `Conflict` on a duplicate email or RUN.
    async fn insert_user(&self, user: User) -> Result<User>;

    /// Replaces a stored user. Fails with `NotFound` or `Conflict`.
    async fn update_user(&self, user: User) -> Result<User>;

    /// Deletes a user together with their orders and line items.
    async fn delete_user(&self, id: UserId) -> Result<()>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Lists users by registration time.
    async fn list_users(&self, query: UserQuery) -> Result<Vec<User>>;
}

/// Categories, products, and stock.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a category. Fails with `Conflict` on a duplicate name.
    async fn insert_category(&self, category: Category) -> Result<Category>;

    async fn update_category(&self, category: Category) -> Result<Category>;

    /// Deletes a category. Fails with `CategoryInUse` while products reference it.
    async fn delete_category(&self, id: CategoryId) -> Result<()>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Lists categories by name.
    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>>;

    /// Number of products (active or not) per category. Empty categories are absent.
    async fn product_counts_by_category(&self) -> Result<HashMap<CategoryId, u64>>;

    /// Inserts a product. Fails with `Conflict` on a duplicate code.
    async fn insert_product(&self, product: Product) -> Result<Product>;

    /// Applies `patch` to the current stored product in one atomic step.
    ///
    /// Stock changes only when the patch sets it, so concurrent order
    /// placements and cancellations are never overwritten.
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product>;

    /// Deletes a product. Line items keep their snapshot but lose the reference.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    async fn get_product_by_code(&self, code: &str) -> Result<Option<Product>>;

    /// Lists products by creation time.
    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>>;

    /// Adds `delta` to a product's stock atomically. The result must not be negative.
    async fn adjust_stock(&self, id: ProductId, delta: i32) -> Result<Product>;
}

/// Orders and the inventory effects of their lifecycle.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Places an order in one unit of work.
    ///
    /// Checks the user, loads and locks every referenced product, builds the
    /// order with [`Order::place`], decrements stock by the summed quantity
    /// per product, and persists the order with its items. Any failure leaves
    /// stock untouched and persists nothing.
    async fn place_order(
        &self,
        request: PlaceOrder,
        number: OrderNumber,
        now: DateTime<Utc>,
    ) -> Result<Order>;

    /// Moves an order to `target` in one unit of work, restoring stock when
    /// the order is canceled.
    async fn transition_order(
        &self,
        id: OrderId,
        target: OrderState,
        now: DateTime<Utc>,
    ) -> Result<StateChange>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    async fn get_order_by_number(&self, number: &str) -> Result<Option<Order>>;

    /// Lists orders newest first.
    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>>;

    /// Number of orders per state. States without orders are absent.
    async fn count_orders_by_state(&self) -> Result<HashMap<OrderState, u64>>;

    /// Sum of `total` over the orders matching `query` (limit ignored).
    async fn sum_order_totals(&self, query: OrderQuery) -> Result<Money>;
}

/// Frequently asked questions.
#[async_trait]
pub trait FaqStore: Send + Sync {
    async fn insert_faq(&self, faq: Faq) -> Result<Faq>;

    async fn update_faq(&self, faq: Faq) -> Result<Faq>;

    async fn delete_faq(&self, id: FaqId) -> Result<()>;

    async fn get_faq(&self, id: FaqId) -> Result<Option<Faq>>;

    /// Lists FAQs by display order.
    async fn list_faqs(&self, query: FaqQuery) -> Result<Vec<Faq>>;

    /// Distinct non-empty categories of active FAQs, sorted.
    async fn faq_categories(&self) -> Result<Vec<String>>;
}

/// Regions and comunas.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Inserts regions with their comunas in one unit of work: either every
    /// region lands or none does. Fails with `Conflict` on a duplicate name.
    async fn insert_regions(&self, regions: Vec<(Region, Vec<Comuna>)>) -> Result<()>;

    async fn count_regions(&self) -> Result<u64>;

    /// Lists regions by code.
    async fn list_regions(&self, active_only: bool) -> Result<Vec<Region>>;

    async fn get_region(&self, id: RegionId) -> Result<Option<Region>>;

    /// Lists comunas by name, optionally restricted to one region.
    async fn list_comunas(&self, region_id: Option<RegionId>, active_only: bool)
    -> Result<Vec<Comuna>>;

    async fn get_comuna(&self, id: ComunaId) -> Result<Option<Comuna>>;
}

/// Everything the services need from persistence.
pub trait Store:
    UserStore + CatalogStore + OrderStore + FaqStore + LocationStore + Clone + 'static
{
}

impl<T> Store for T where
    T: UserStore + CatalogStore + OrderStore + FaqStore + LocationStore + Clone + 'static
{
}
