//! Order placement, state changes, and order queries.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{LineItem, Order, OrderState, PlaceOrder, RequestedItem, ShippingDetails};
use serde::{Deserialize, Serialize};
use services::OrderView;
use store::Store;

use super::{parse_id, required};
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Option<String>,
    pub shipping_region: Option<String>,
    pub shipping_comuna: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct StateParams {
    pub state: Option<String>,
}

#[derive(Deserialize)]
pub struct SalesParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub number: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub state: OrderState,
    pub items: Vec<LineItemResponse>,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub shipping_address: Option<String>,
    pub shipping_region: Option<String>,
    pub shipping_comuna: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub id: String,
    pub product_id: Option<String>,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub subtotal: i64,
}

#[derive(Serialize)]
pub struct SalesResponse {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total: i64,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.map(|id| id.to_string()),
            product_name: item.product_name.clone(),
            unit_price: item.unit_price.amount(),
            quantity: item.quantity,
            subtotal: item.subtotal().amount(),
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(view: OrderView) -> Self {
        let order = view.order;
        Self {
            id: order.id.to_string(),
            number: order.number.to_string(),
            user_id: order.user_id.to_string(),
            user_name: view.user_name,
            state: order.state,
            items: order.items.iter().map(LineItemResponse::from).collect(),
            subtotal: order.subtotal.amount(),
            discount: order.discount.amount(),
            total: order.total.amount(),
            shipping_address: order.shipping.address,
            shipping_region: order.shipping.region,
            shipping_comuna: order.shipping.comuna,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

async fn respond<S: Store>(
    state: &AppState<S>,
    order: Order,
) -> Result<Json<OrderResponse>, ApiError> {
    Ok(Json(state.orders.describe_order(order).await?.into()))
}

async fn respond_all<S: Store>(
    state: &AppState<S>,
    orders: Vec<Order>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let views = state.orders.describe_orders(orders).await?;
    Ok(Json(views.into_iter().map(OrderResponse::from).collect()))
}

fn parse_state(raw: &str) -> Result<OrderState, ApiError> {
    raw.parse()
        .map_err(|e: domain::DomainError| ApiError::BadRequest(e.to_string()))
}

fn parse_instant(raw: &str, name: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ApiError::BadRequest(format!("Invalid {name}: {e}")))
}

// -- Handlers --

/// POST /orders: place an order and decrement stock.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user_id: UserId = parse_id(&req.user_id)?;
    let items = req
        .items
        .iter()
        .map(|item| {
            let product_id: ProductId = parse_id(&item.product_id)?;
            Ok(RequestedItem::new(product_id, item.quantity))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let mut request = PlaceOrder::new(user_id, items);
    request.shipping = ShippingDetails {
        address: req.shipping_address,
        region: req.shipping_region,
        comuna: req.shipping_comuna,
    };
    request.notes = req.notes;

    let order = state
        .orders
        .place_order(request)
        .await
        .map_err(ApiError::rejected)?;
    Ok((StatusCode::CREATED, respond(&state, order).await?))
}

/// GET /orders: every order, newest first.
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders().await?;
    respond_all(&state, orders).await
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state.orders.get_order(id).await?;
    respond(&state, order).await
}

/// GET /orders/number/{number}
pub async fn by_number<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(number): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_order_by_number(&number).await?;
    respond(&state, order).await
}

/// GET /orders/user/{user_id}
pub async fn by_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user_id: UserId = parse_id(&user_id)?;
    let orders = state.orders.orders_for_user(user_id).await?;
    respond_all(&state, orders).await
}

/// GET /orders/state/{state}
pub async fn by_state<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let order_state = parse_state(&name)?;
    let orders = state.orders.orders_in_state(order_state).await?;
    respond_all(&state, orders).await
}

/// GET /orders/recent
pub async fn recent<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.recent_orders().await?;
    respond_all(&state, orders).await
}

/// GET /orders/stats: order count per state, keyed by lowercase state name.
pub async fn stats<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<BTreeMap<String, u64>>, ApiError> {
    let stats = state.orders.stats().await?;
    Ok(Json(
        stats
            .counts
            .into_iter()
            .map(|(s, count)| (s.as_str().to_ascii_lowercase(), count))
            .collect(),
    ))
}

/// GET /orders/sales?from=&to=: total of paid orders created in the range.
#[tracing::instrument(skip(state, params))]
pub async fn sales<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SalesParams>,
) -> Result<Json<SalesResponse>, ApiError> {
    let from = parse_instant(&required(params.from, "from")?, "from")?;
    let to = parse_instant(&required(params.to, "to")?, "to")?;
    let total = state.orders.paid_sales_between(from, to).await?;
    Ok(Json(SalesResponse {
        from,
        to,
        total: total.amount(),
    }))
}

/// PATCH /orders/{id}/state?state=: move an order to another state.
#[tracing::instrument(skip(state, params))]
pub async fn change_state<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(params): Query<StateParams>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let target = parse_state(&required(params.state, "state")?)?;
    let order = state.orders.change_state(id, target).await?;
    respond(&state, order).await
}
