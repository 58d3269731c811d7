//! Category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CategoryId;
use domain::{CategoryPatch, NewCategory};
use serde::{Deserialize, Serialize};
use services::CategoryView;
use store::Store;

use super::{MessageResponse, parse_id};
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub product_count: u64,
}

impl From<CategoryView> for CategoryResponse {
    fn from(view: CategoryView) -> Self {
        Self {
            id: view.category.id.to_string(),
            name: view.category.name,
            description: view.category.description,
            active: view.category.active,
            product_count: view.product_count,
        }
    }
}

fn to_responses(views: Vec<CategoryView>) -> Json<Vec<CategoryResponse>> {
    Json(views.into_iter().map(CategoryResponse::from).collect())
}

pub async fn list_active<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    Ok(to_responses(state.catalog.categories(true).await?))
}

pub async fn list_all<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    Ok(to_responses(state.catalog.categories(false).await?))
}

pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id: CategoryId = parse_id(&id)?;
    Ok(Json(state.catalog.get_category(id).await?.into()))
}

#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let new = NewCategory {
        name: req.name.unwrap_or_default(),
        description: req.description,
        active: req.active,
    };
    let view = state.catalog.create_category(new).await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id: CategoryId = parse_id(&id)?;
    let patch = CategoryPatch {
        name: req.name,
        description: req.description,
        active: req.active,
    };
    Ok(Json(state.catalog.update_category(id, patch).await?.into()))
}

/// DELETE /categories/{id}: refused while products still reference it.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: CategoryId = parse_id(&id)?;
    state.catalog.delete_category(id).await?;
    Ok(Json(MessageResponse::new("Category deleted")))
}
