use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CategoryId, ComunaId, FaqId, OrderId, ProductId, RegionId, UserId};
use domain::{
    Category, Comuna, DomainError, Faq, Money, Order, OrderNumber, OrderState, PlaceOrder,
    Product, ProductPatch, Region, User,
};
use tokio::sync::RwLock;

use crate::{
    FaqQuery, OrderQuery, ProductQuery, Result, StoreError, UserQuery,
    store::{CatalogStore, FaqStore, LocationStore, OrderStore, StateChange, UserStore},
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    faqs: HashMap<FaqId, Faq>,
    regions: HashMap<RegionId, Region>,
    comunas: HashMap<ComunaId, Comuna>,
}

impl Tables {
    fn ensure_unique_user(&self, user: &User) -> Result<()> {
        for other in self.users.values().filter(|other| other.id != user.id) {
            if other.email == user.email {
                return Err(StoreError::Conflict(format!(
                    "Email already registered: {}",
                    user.email
                )));
            }
            if user.run.is_some() && other.run == user.run {
                return Err(StoreError::Conflict(format!(
                    "RUN already registered: {}",
                    user.run.as_deref().unwrap_or_default()
                )));
            }
        }
        Ok(())
    }

    fn ensure_unique_category(&self, category: &Category) -> Result<()> {
        if self
            .categories
            .values()
            .any(|other| other.id != category.id && other.name == category.name)
        {
            return Err(StoreError::Conflict(format!(
                "Category name already exists: {}",
                category.name
            )));
        }
        Ok(())
    }

    fn ensure_unique_product(&self, product: &Product) -> Result<()> {
        if self
            .products
            .values()
            .any(|other| other.id != product.id && other.code == product.code)
        {
            return Err(StoreError::Conflict(format!(
                "Product code already exists: {}",
                product.code
            )));
        }
        Ok(())
    }
}

/// In-memory store for tests and single-process runs.
///
/// All tables sit behind one lock, so every mutating operation validates and
/// applies under a single write guard.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Removes every row from every table.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

fn sort_orders(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.number.as_str().cmp(a.number.as_str()))
    });
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        let mut tables = self.tables.write().await;
        tables.ensure_unique_user(&user)?;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> Result<User> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(StoreError::not_found("User", user.id));
        }
        tables.ensure_unique_user(&user)?;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(StoreError::not_found("User", id));
        }
        tables.orders.retain(|_, order| order.user_id != id);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self, query: UserQuery) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|user| query.matches(user))
            .cloned()
            .collect();
        users.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.email.cmp(&b.email))
        });
        Ok(users)
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_category(&self, category: Category) -> Result<Category> {
        let mut tables = self.tables.write().await;
        tables.ensure_unique_category(&category)?;
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, category: Category) -> Result<Category> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&category.id) {
            return Err(StoreError::not_found("Category", category.id));
        }
        tables.ensure_unique_category(&category)?;
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Err(StoreError::not_found("Category", id));
        }
        if tables
            .products
            .values()
            .any(|product| product.category_id == Some(id))
        {
            return Err(StoreError::CategoryInUse(id));
        }
        tables.categories.remove(&id);
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|category| !active_only || category.active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn product_counts_by_category(&self) -> Result<HashMap<CategoryId, u64>> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for category_id in tables.products.values().filter_map(|p| p.category_id) {
            *counts.entry(category_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn insert_product(&self, product: Product) -> Result<Product> {
        let mut tables = self.tables.write().await;
        tables.ensure_unique_product(&product)?;
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product.apply(patch)?;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Err(StoreError::not_found("Product", id));
        }
        for item in tables
            .orders
            .values_mut()
            .flat_map(|order| order.items.iter_mut())
            .filter(|item| item.product_id == Some(id))
        {
            item.product_id = None;
        }
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn get_product_by_code(&self, code: &str) -> Result<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .find(|product| product.code == code)
            .cloned())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|product| query.matches(product))
            .cloned()
            .collect();
        products.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(products)
    }

    async fn adjust_stock(&self, id: ProductId, delta: i32) -> Result<Product> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product.stock = product.adjusted_stock(delta)?;
        Ok(product.clone())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(
        &self,
        request: PlaceOrder,
        number: OrderNumber,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        request.validate()?;

        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&request.user_id) {
            return Err(StoreError::not_found("User", request.user_id));
        }
        if tables
            .orders
            .values()
            .any(|order| order.number == number)
        {
            return Err(StoreError::Conflict(format!(
                "Order number already exists: {number}"
            )));
        }

        let products: HashMap<ProductId, Product> = request
            .product_ids()
            .into_iter()
            .filter_map(|id| tables.products.get(&id).map(|p| (id, p.clone())))
            .collect();
        let order = Order::place(&request, &products, number, now)?;

        let mut new_stock = Vec::with_capacity(products.len());
        for (product_id, quantity) in request.quantities_by_product() {
            if let Some(product) = products.get(&product_id) {
                let delta = i32::try_from(quantity).unwrap_or(i32::MAX);
                new_stock.push((product_id, product.adjusted_stock(-delta)?));
            }
        }
        for (product_id, stock) in new_stock {
            if let Some(product) = tables.products.get_mut(&product_id) {
                product.stock = stock;
            }
        }

        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn transition_order(
        &self,
        id: OrderId,
        target: OrderState,
        now: DateTime<Utc>,
    ) -> Result<StateChange> {
        let mut tables = self.tables.write().await;
        let mut order = tables
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Order", id))?;
        let previous = order.state;
        let restock = order.transition_to(target, now)?;

        // Work on copies so a failed restock leaves every table untouched.
        let mut restocked: HashMap<ProductId, Product> = HashMap::new();
        let mut restocked_units = 0;
        for (product_id, quantity) in restock {
            let product = match restocked.entry(product_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => match tables.products.get(&product_id) {
                    Some(product) => entry.insert(product.clone()),
                    None => continue,
                },
            };
            product.restock(quantity)?;
            restocked_units += u64::from(quantity);
        }
        for (product_id, product) in restocked {
            if let Some(stored) = tables.products.get_mut(&product_id) {
                stored.stock = product.stock;
            }
        }

        tables.orders.insert(id, order.clone());
        Ok(StateChange {
            order,
            previous,
            restocked_units,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn get_order_by_number(&self, number: &str) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .find(|order| order.number.as_str() == number)
            .cloned())
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| query.matches(order))
            .cloned()
            .collect();
        sort_orders(&mut orders);
        if let Some(limit) = query.limit {
            orders.truncate(limit);
        }
        Ok(orders)
    }

    async fn count_orders_by_state(&self) -> Result<HashMap<OrderState, u64>> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for order in tables.orders.values() {
            *counts.entry(order.state).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn sum_order_totals(&self, query: OrderQuery) -> Result<Money> {
        let tables = self.tables.read().await;
        tables
            .orders
            .values()
            .filter(|order| query.matches(order))
            .try_fold(Money::zero(), |acc, order| acc.checked_add(order.total))
            .ok_or_else(|| {
                StoreError::Domain(DomainError::validation(
                    "total",
                    "exceeds the maximum amount",
                ))
            })
    }
}

#[async_trait]
impl FaqStore for InMemoryStore {
    async fn insert_faq(&self, faq: Faq) -> Result<Faq> {
        self.tables.write().await.faqs.insert(faq.id, faq.clone());
        Ok(faq)
    }

    async fn update_faq(&self, faq: Faq) -> Result<Faq> {
        let mut tables = self.tables.write().await;
        if !tables.faqs.contains_key(&faq.id) {
            return Err(StoreError::not_found("Faq", faq.id));
        }
        tables.faqs.insert(faq.id, faq.clone());
        Ok(faq)
    }

    async fn delete_faq(&self, id: FaqId) -> Result<()> {
        match self.tables.write().await.faqs.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("Faq", id)),
        }
    }

    async fn get_faq(&self, id: FaqId) -> Result<Option<Faq>> {
        Ok(self.tables.read().await.faqs.get(&id).cloned())
    }

    async fn list_faqs(&self, query: FaqQuery) -> Result<Vec<Faq>> {
        let tables = self.tables.read().await;
        let mut faqs: Vec<Faq> = tables
            .faqs
            .values()
            .filter(|faq| query.matches(faq))
            .cloned()
            .collect();
        faqs.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.question.cmp(&b.question))
        });
        Ok(faqs)
    }

    async fn faq_categories(&self) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        let categories: BTreeSet<String> = tables
            .faqs
            .values()
            .filter(|faq| faq.active)
            .filter_map(|faq| faq.category.clone())
            .filter(|category| !category.trim().is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }
}

#[async_trait]
impl LocationStore for InMemoryStore {
    async fn insert_regions(&self, regions: Vec<(Region, Vec<Comuna>)>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let mut names: BTreeSet<&str> =
            tables.regions.values().map(|r| r.name.as_str()).collect();
        for (region, _) in &regions {
            if !names.insert(region.name.as_str()) {
                return Err(StoreError::Conflict(format!(
                    "Region already exists: {}",
                    region.name
                )));
            }
        }
        for (region, comunas) in regions {
            for comuna in comunas {
                tables.comunas.insert(comuna.id, comuna);
            }
            tables.regions.insert(region.id, region);
        }
        Ok(())
    }

    async fn count_regions(&self) -> Result<u64> {
        Ok(self.tables.read().await.regions.len() as u64)
    }

    async fn list_regions(&self, active_only: bool) -> Result<Vec<Region>> {
        let tables = self.tables.read().await;
        let mut regions: Vec<Region> = tables
            .regions
            .values()
            .filter(|region| !active_only || region.active)
            .cloned()
            .collect();
        regions.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(regions)
    }

    async fn get_region(&self, id: RegionId) -> Result<Option<Region>> {
        Ok(self.tables.read().await.regions.get(&id).cloned())
    }

    async fn list_comunas(
        &self,
        region_id: Option<RegionId>,
        active_only: bool,
    ) -> Result<Vec<Comuna>> {
        let tables = self.tables.read().await;
        let mut comunas: Vec<Comuna> = tables
            .comunas
            .values()
            .filter(|comuna| region_id.is_none_or(|id| comuna.region_id == id))
            .filter(|comuna| !active_only || comuna.active)
            .cloned()
            .collect();
        comunas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(comunas)
    }

    async fn get_comuna(&self, id: ComunaId) -> Result<Option<Comuna>> {
        Ok(self.tables.read().await.comunas.get(&id).cloned())
    }
}
