//! FAQ endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::FaqId;
use domain::{Faq, FaqPatch, NewFaq};
use serde::Deserialize;
use store::Store;

use super::{MessageResponse, parse_id, required};
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct FaqRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<String>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub text: Option<String>,
}

pub async fn list_active<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Faq>>, ApiError> {
    Ok(Json(state.faqs.active_faqs().await?))
}

pub async fn list_all<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Faq>>, ApiError> {
    Ok(Json(state.faqs.all_faqs().await?))
}

pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Faq>, ApiError> {
    let id: FaqId = parse_id(&id)?;
    Ok(Json(state.faqs.get_faq(id).await?))
}

pub async fn by_category<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Faq>>, ApiError> {
    Ok(Json(state.faqs.faqs_in_category(&category).await?))
}

pub async fn search<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Faq>>, ApiError> {
    let text = required(params.text, "text")?;
    Ok(Json(state.faqs.search_faqs(&text).await?))
}

/// GET /faqs/categories: distinct categories of active FAQs.
pub async fn categories<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.faqs.categories().await?))
}

#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<FaqRequest>,
) -> Result<(StatusCode, Json<Faq>), ApiError> {
    let new = NewFaq {
        question: req.question.unwrap_or_default(),
        answer: req.answer.unwrap_or_default(),
        category: req.category,
        display_order: req.display_order,
        active: req.active,
    };
    let faq = state.faqs.create_faq(new).await?;
    Ok((StatusCode::CREATED, Json(faq)))
}

#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<FaqRequest>,
) -> Result<Json<Faq>, ApiError> {
    let id: FaqId = parse_id(&id)?;
    let patch = FaqPatch {
        question: req.question,
        answer: req.answer,
        category: req.category,
        display_order: req.display_order,
        active: req.active,
    };
    Ok(Json(state.faqs.update_faq(id, patch).await?))
}

#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: FaqId = parse_id(&id)?;
    state.faqs.delete_faq(id).await?;
    Ok(Json(MessageResponse::new("FAQ deleted")))
}
