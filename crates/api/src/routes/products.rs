//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{CategoryId, ProductId};
use domain::{Money, NewProduct, Product, ProductPatch};
use serde::{Deserialize, Serialize};
use services::ProductView;
use store::Store;

use super::{MessageResponse, parse_id, required};
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub critical_stock: Option<i32>,
    pub image: Option<String>,
    pub category_id: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub critical_stock: Option<i32>,
    pub image: Option<String>,
    pub category_id: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct StockParams {
    pub delta: Option<i32>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub critical_stock: i32,
    pub low_stock: bool,
    pub image: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ProductView> for ProductResponse {
    fn from(view: ProductView) -> Self {
        let product = view.product;
        Self {
            low_stock: product.is_low_stock(),
            id: product.id.to_string(),
            code: product.code,
            name: product.name,
            description: product.description,
            price: product.price.amount(),
            stock: product.stock,
            critical_stock: product.critical_stock,
            image: product.image,
            category_id: product.category_id.map(|id| id.to_string()),
            category_name: view.category_name,
            active: product.active,
            created_at: product.created_at,
        }
    }
}

fn category(raw: Option<String>) -> Result<Option<CategoryId>, ApiError> {
    raw.map(|id| parse_id(&id)).transpose()
}

async fn respond<S: Store>(
    state: &AppState<S>,
    product: Product,
) -> Result<Json<ProductResponse>, ApiError> {
    Ok(Json(state.catalog.describe_product(product).await?.into()))
}

async fn respond_all<S: Store>(
    state: &AppState<S>,
    products: Vec<Product>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let views = state.catalog.describe_products(products).await?;
    Ok(Json(views.into_iter().map(ProductResponse::from).collect()))
}

/// GET /products: active products.
pub async fn list_active<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.active_products().await?;
    respond_all(&state, products).await
}

/// GET /products/all: active and inactive products.
pub async fn list_all<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.all_products().await?;
    respond_all(&state, products).await
}

pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state.catalog.get_product(id).await?;
    respond(&state, product).await
}

pub async fn by_code<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(code): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get_product_by_code(&code).await?;
    respond(&state, product).await
}

pub async fn by_category<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(category_id): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let category_id: CategoryId = parse_id(&category_id)?;
    let products = state.catalog.products_in_category(category_id).await?;
    respond_all(&state, products).await
}

/// GET /products/search?name=
pub async fn search<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let name = required(params.name, "name")?;
    let products = state.catalog.search_products(&name).await?;
    respond_all(&state, products).await
}

/// GET /products/low-stock: active products at or below critical stock.
pub async fn low_stock<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.low_stock_products().await?;
    respond_all(&state, products).await
}

#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let new = NewProduct {
        code: req.code,
        name: req.name,
        description: req.description,
        price: Money::new(req.price),
        stock: req.stock,
        critical_stock: req.critical_stock,
        image: req.image,
        category_id: category(req.category_id)?,
        active: req.active,
    };
    let product = state.catalog.create_product(new).await?;
    Ok((StatusCode::CREATED, respond(&state, product).await?))
}

#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let patch = ProductPatch {
        name: req.name,
        description: req.description,
        price: req.price.map(Money::new),
        stock: req.stock,
        critical_stock: req.critical_stock,
        image: req.image,
        category_id: category(req.category_id)?,
        active: req.active,
    };
    let product = state.catalog.update_product(id, patch).await?;
    respond(&state, product).await
}

#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    state.catalog.delete_product(id).await?;
    Ok(Json(MessageResponse::new("Product deleted")))
}

pub async fn deactivate<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let product = state.catalog.deactivate_product(id).await?;
    respond(&state, product).await
}

/// PATCH /products/{id}/stock?delta=: add (or remove) units.
#[tracing::instrument(skip(state, params))]
pub async fn adjust_stock<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(params): Query<StockParams>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id: ProductId = parse_id(&id)?;
    let delta = required(params.delta, "delta")?;
    let product = state.catalog.adjust_stock(id, delta).await?;
    respond(&state, product).await
}
