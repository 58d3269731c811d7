//! Order lifecycle: placement, state changes, and order queries.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{DomainError, Money, Order, OrderNumber, OrderState, PlaceOrder};
use store::{OrderQuery, Store};

use crate::error::{Result, ServiceError};

/// How many orders the recent-orders listing returns.
pub const RECENT_ORDERS: usize = 10;

/// Order count for every state, in lifecycle order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStats {
    pub counts: Vec<(OrderState, u64)>,
}

impl OrderStats {
    pub fn count(&self, state: OrderState) -> u64 {
        self.counts
            .iter()
            .find(|(s, _)| *s == state)
            .map_or(0, |(_, count)| *count)
    }
}

/// An order with its customer's full name.
///
/// `user_name` is `None` only if the user vanished between reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub order: Order,
    pub user_name: Option<String>,
}

/// Places orders and drives them through their lifecycle.
///
/// Stock changes happen inside the store's unit of work; this layer assigns
/// order numbers, maps errors, and records logs and metrics.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order, decrementing stock for every line.
    ///
    /// Either the whole order is accepted or nothing changes.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id, lines = request.items.len()))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<Order> {
        let started = Instant::now();
        let now = Utc::now();
        let number = OrderNumber::generate(now);

        match self.store.place_order(request, number, now).await {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                metrics::histogram!("order_placement_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.number,
                    total = order.total.amount(),
                    "Order placed"
                );
                Ok(order)
            }
            Err(e) => {
                let err = ServiceError::from(e);
                metrics::counter!("orders_rejected_total", "reason" => err.reason()).increment(1);
                tracing::warn!(error = %err, "Order rejected");
                Err(err)
            }
        }
    }

    /// Moves an order to `target`. Canceling returns its units to stock.
    #[tracing::instrument(skip(self))]
    pub async fn change_state(&self, id: OrderId, target: OrderState) -> Result<Order> {
        let change = self.store.transition_order(id, target, Utc::now()).await?;

        metrics::counter!("order_state_changes_total", "to" => target.as_str()).increment(1);
        if change.restocked_units > 0 {
            metrics::counter!("stock_restored_units_total").increment(change.restocked_units);
        }
        tracing::info!(
            order_id = %id,
            from = %change.previous,
            to = %target,
            restocked_units = change.restocked_units,
            "Order state changed"
        );
        Ok(change.order)
    }

    /// Attaches customer names to `orders`, reading each user once.
    pub async fn describe_orders(&self, orders: Vec<Order>) -> Result<Vec<OrderView>> {
        let mut names: HashMap<UserId, Option<String>> = HashMap::new();
        for order in &orders {
            if !names.contains_key(&order.user_id) {
                let name = self.store.get_user(order.user_id).await?.map(|u| u.full_name());
                names.insert(order.user_id, name);
            }
        }
        Ok(orders
            .into_iter()
            .map(|order| OrderView {
                user_name: names.get(&order.user_id).cloned().flatten(),
                order,
            })
            .collect())
    }

    pub async fn describe_order(&self, order: Order) -> Result<OrderView> {
        let user_name = self
            .store
            .get_user(order.user_id)
            .await?
            .map(|user| user.full_name());
        Ok(OrderView { order, user_name })
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))
    }

    pub async fn get_order_by_number(&self, number: &str) -> Result<Order> {
        self.store
            .get_order_by_number(number)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", number))
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.store.list_orders(OrderQuery::new()).await?)
    }

    /// Orders of one user, newest first.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders(OrderQuery::for_user(user_id)).await?)
    }

    /// Orders in one state, newest first.
    pub async fn orders_in_state(&self, state: OrderState) -> Result<Vec<Order>> {
        Ok(self.store.list_orders(OrderQuery::in_state(state)).await?)
    }

    pub async fn recent_orders(&self) -> Result<Vec<Order>> {
        Ok(self
            .store
            .list_orders(OrderQuery::new().limit(RECENT_ORDERS))
            .await?)
    }

    pub async fn stats(&self) -> Result<OrderStats> {
        let counts = self.store.count_orders_by_state().await?;
        Ok(OrderStats {
            counts: OrderState::ALL
                .into_iter()
                .map(|state| (state, counts.get(&state).copied().unwrap_or(0)))
                .collect(),
        })
    }

    /// Sum of totals of paid orders created within `[from, to]`.
    #[tracing::instrument(skip(self))]
    pub async fn paid_sales_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Money> {
        if from > to {
            return Err(DomainError::validation("from", "must not be after to").into());
        }
        let query = OrderQuery::in_state(OrderState::Paid).created_between(from, to);
        Ok(self.store.sum_order_totals(query).await?)
    }
}
