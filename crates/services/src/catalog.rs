//! Products, categories, and manual stock adjustment.

use std::collections::HashMap;

use chrono::Utc;
use common::{CategoryId, ProductId};
use domain::{Category, CategoryPatch, NewCategory, NewProduct, Product, ProductPatch};
use store::{ProductQuery, Store};

use crate::error::{Result, ServiceError};

/// A category together with how many products reference it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryView {
    pub category: Category,
    pub product_count: u64,
}

/// A product with the name of its category, when it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductView {
    pub product: Product,
    pub category_name: Option<String>,
}

pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn ensure_category(&self, id: CategoryId) -> Result<()> {
        match self.store.get_category(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("Category", id)),
        }
    }

    // Products

    /// Resolves category names for `products`, reading categories once.
    pub async fn describe_products(&self, products: Vec<Product>) -> Result<Vec<ProductView>> {
        let names: HashMap<CategoryId, String> = self
            .store
            .list_categories(false)
            .await?
            .into_iter()
            .map(|category| (category.id, category.name))
            .collect();
        Ok(products
            .into_iter()
            .map(|product| ProductView {
                category_name: product.category_id.and_then(|id| names.get(&id).cloned()),
                product,
            })
            .collect())
    }

    pub async fn describe_product(&self, product: Product) -> Result<ProductView> {
        let category_name = match product.category_id {
            Some(id) => self.store.get_category(id).await?.map(|category| category.name),
            None => None,
        };
        Ok(ProductView {
            product,
            category_name,
        })
    }

    pub async fn active_products(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products(ProductQuery::active()).await?)
    }

    pub async fn all_products(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products(ProductQuery::new()).await?)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    pub async fn get_product_by_code(&self, code: &str) -> Result<Product> {
        self.store
            .get_product_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", code))
    }

    pub async fn products_in_category(&self, category_id: CategoryId) -> Result<Vec<Product>> {
        Ok(self
            .store
            .list_products(ProductQuery::active().category(category_id))
            .await?)
    }

    /// Active products whose name contains `name`, ignoring case.
    pub async fn search_products(&self, name: &str) -> Result<Vec<Product>> {
        Ok(self
            .store
            .list_products(ProductQuery::active().name_contains(name))
            .await?)
    }

    /// Active products at or below their critical stock.
    pub async fn low_stock_products(&self) -> Result<Vec<Product>> {
        Ok(self
            .store
            .list_products(ProductQuery::active().low_stock())
            .await?)
    }

    #[tracing::instrument(skip(self, new), fields(code = %new.code))]
    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        if let Some(category_id) = new.category_id {
            self.ensure_category(category_id).await?;
        }
        let product = Product::create(new, Utc::now())?;
        let product = self.store.insert_product(product).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        if let Some(category_id) = patch.category_id {
            self.ensure_category(category_id).await?;
        }
        Ok(self.store.update_product(id, patch).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        self.store.delete_product(id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    pub async fn deactivate_product(&self, id: ProductId) -> Result<Product> {
        let patch = ProductPatch {
            active: Some(false),
            ..Default::default()
        };
        Ok(self.store.update_product(id, patch).await?)
    }

    /// Adds `delta` units (negative removes). Stock never goes below zero.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_stock(&self, id: ProductId, delta: i32) -> Result<Product> {
        let product = self.store.adjust_stock(id, delta).await?;
        tracing::info!(product_id = %id, delta, stock = product.stock, "Stock adjusted");
        Ok(product)
    }

    // Categories

    pub async fn categories(&self, active_only: bool) -> Result<Vec<CategoryView>> {
        let categories = self.store.list_categories(active_only).await?;
        let counts = self.store.product_counts_by_category().await?;
        Ok(categories
            .into_iter()
            .map(|category| CategoryView {
                product_count: counts.get(&category.id).copied().unwrap_or(0),
                category,
            })
            .collect())
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<CategoryView> {
        let category = self
            .store
            .get_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;
        self.view(category).await
    }

    async fn view(&self, category: Category) -> Result<CategoryView> {
        let counts = self.store.product_counts_by_category().await?;
        Ok(CategoryView {
            product_count: counts.get(&category.id).copied().unwrap_or(0),
            category,
        })
    }

    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_category(&self, new: NewCategory) -> Result<CategoryView> {
        let category = self.store.insert_category(Category::create(new)?).await?;
        Ok(CategoryView {
            category,
            product_count: 0,
        })
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> Result<CategoryView> {
        let mut category = self.get_category(id).await?.category;
        category.apply(patch)?;
        let category = self.store.update_category(category).await?;
        self.view(category).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        Ok(self.store.delete_category(id).await?)
    }
}
