//! User account endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{ComunaId, RegionId, UserId};
use domain::{NewUser, Role, User, UserPatch};
use serde::{Deserialize, Serialize};
use services::UserView;
use store::Store;

use super::{MessageResponse, parse_id, required};
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub run: Option<String>,
    pub first_names: String,
    pub last_names: String,
    pub email: String,
    pub role: Option<String>,
    pub address: Option<String>,
    pub region_id: Option<String>,
    pub comuna_id: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub run: Option<String>,
    pub first_names: Option<String>,
    pub last_names: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub address: Option<String>,
    pub region_id: Option<String>,
    pub comuna_id: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub text: Option<String>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub run: Option<String>,
    pub first_names: String,
    pub last_names: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub address: Option<String>,
    pub region_id: Option<String>,
    pub region_name: Option<String>,
    pub comuna_id: Option<String>,
    pub comuna_name: Option<String>,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub active: bool,
}

impl From<UserView> for UserResponse {
    fn from(view: UserView) -> Self {
        let user = view.user;
        Self {
            full_name: user.full_name(),
            id: user.id.to_string(),
            run: user.run,
            first_names: user.first_names,
            last_names: user.last_names,
            email: user.email,
            role: user.role,
            address: user.address,
            region_id: user.region_id.map(|id| id.to_string()),
            region_name: view.region_name,
            comuna_id: user.comuna_id.map(|id| id.to_string()),
            comuna_name: view.comuna_name,
            phone: user.phone,
            registered_at: user.registered_at,
            active: user.active,
        }
    }
}

async fn respond<S: Store>(
    state: &AppState<S>,
    user: User,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(state.users.describe_user(user).await?.into()))
}

async fn respond_all<S: Store>(
    state: &AppState<S>,
    users: Vec<User>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let views = state.users.describe_users(users).await?;
    Ok(Json(views.into_iter().map(UserResponse::from).collect()))
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse()
        .map_err(|e: domain::DomainError| ApiError::BadRequest(e.to_string()))
}

fn optional_role(raw: Option<String>) -> Result<Option<Role>, ApiError> {
    raw.map(|r| parse_role(&r)).transpose()
}

fn optional_id<T: From<uuid::Uuid>>(raw: Option<String>) -> Result<Option<T>, ApiError> {
    raw.map(|id| parse_id(&id)).transpose()
}

pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list_users().await?;
    respond_all(&state, users).await
}

pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id: UserId = parse_id(&id)?;
    let user = state.users.get_user(id).await?;
    respond(&state, user).await
}

/// GET /users/role/{role}: role names are case-insensitive.
pub async fn by_role<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(role): Path<String>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let role = parse_role(&role)?;
    let users = state.users.users_with_role(role).await?;
    respond_all(&state, users).await
}

/// GET /users/search?text=: match on first or last names.
pub async fn search<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let text = required(params.text, "text")?;
    let users = state.users.search_users(&text).await?;
    respond_all(&state, users).await
}

#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let new = NewUser {
        run: req.run,
        first_names: req.first_names,
        last_names: req.last_names,
        email: req.email,
        role: optional_role(req.role)?,
        address: req.address,
        region_id: optional_id::<RegionId>(req.region_id)?,
        comuna_id: optional_id::<ComunaId>(req.comuna_id)?,
        phone: req.phone,
    };
    let user = state.users.create_user(new).await?;
    Ok((StatusCode::CREATED, respond(&state, user).await?))
}

#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id: UserId = parse_id(&id)?;
    let patch = UserPatch {
        run: req.run,
        first_names: req.first_names,
        last_names: req.last_names,
        email: req.email,
        role: optional_role(req.role)?,
        address: req.address,
        region_id: optional_id::<RegionId>(req.region_id)?,
        comuna_id: optional_id::<ComunaId>(req.comuna_id)?,
        phone: req.phone,
        active: req.active,
    };
    let user = state.users.update_user(id, patch).await?;
    respond(&state, user).await
}

/// DELETE /users/{id}: also removes the user's orders.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: UserId = parse_id(&id)?;
    state.users.delete_user(id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}

pub async fn deactivate<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id: UserId = parse_id(&id)?;
    let user = state.users.deactivate_user(id).await?;
    respond(&state, user).await
}
