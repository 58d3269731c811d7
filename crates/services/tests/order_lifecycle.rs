//! Integration tests for order placement, state changes, and stock.

use chrono::{Duration, Utc};
use common::{OrderId, ProductId};
use domain::{
    DomainError, Money, NewProduct, NewUser, OrderState, PlaceOrder, ProductPatch, RequestedItem,
    ShippingDetails,
};
use services::{CatalogService, OrderService, ServiceError, UserService};
use store::InMemoryStore;

struct TestHarness {
    orders: OrderService<InMemoryStore>,
    catalog: CatalogService<InMemoryStore>,
    users: UserService<InMemoryStore>,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryStore::new();
        Self {
            orders: OrderService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            users: UserService::new(store),
        }
    }

    async fn customer(&self) -> common::UserId {
        self.users
            .create_user(NewUser {
                first_names: "Valentina".to_string(),
                last_names: "Muñoz".to_string(),
                email: format!("{}@example.cl", common::UserId::new()),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn product(&self, code: &str, price: i64, stock: i32) -> ProductId {
        self.catalog
            .create_product(NewProduct {
                code: code.to_string(),
                name: format!("Producto {code}"),
                price: Money::new(price),
                stock,
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn stock(&self, id: ProductId) -> i32 {
        self.catalog.get_product(id).await.unwrap().stock
    }
}

#[tokio::test]
async fn test_place_then_cancel_restores_stock() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let product = h.product("P-1", 4990, 10).await;

    let order = h
        .orders
        .place_order(PlaceOrder::new(user, vec![RequestedItem::new(product, 3)]))
        .await
        .unwrap();

    assert_eq!(order.state, OrderState::Pending);
    assert_eq!(order.total, Money::new(4990 * 3));
    assert_eq!(Some(order.total), order.subtotal.checked_sub(order.discount));
    assert!(order.number.as_str().starts_with("ORD-"));
    assert_eq!(h.stock(product).await, 7);

    let canceled = h
        .orders
        .change_state(order.id, OrderState::Canceled)
        .await
        .unwrap();
    assert_eq!(canceled.state, OrderState::Canceled);
    assert_eq!(canceled.total, order.total);
    assert_eq!(h.stock(product).await, 10);
}

#[tokio::test]
async fn test_over_stock_request_persists_nothing() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let pen = h.product("P-1", 500, 10).await;
    let book = h.product("B-1", 12990, 10).await;

    let result = h
        .orders
        .place_order(PlaceOrder::new(
            user,
            vec![RequestedItem::new(pen, 2), RequestedItem::new(book, 11)],
        ))
        .await;

    assert!(matches!(
        result,
        Err(ServiceError::Domain(DomainError::InsufficientStock {
            requested: 11,
            available: 10,
            ..
        }))
    ));
    assert_eq!(h.stock(pen).await, 10);
    assert_eq!(h.stock(book).await, 10);
    assert!(h.orders.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_order_amount_overflow_is_a_validation_error() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let gold = h.product("G-1", i64::MAX / 2 + 1, 10).await;

    let result = h
        .orders
        .place_order(PlaceOrder::new(user, vec![RequestedItem::new(gold, 2)]))
        .await;

    assert!(matches!(
        result,
        Err(ServiceError::Domain(DomainError::Validation {
            field: "subtotal",
            ..
        }))
    ));
    assert_eq!(h.stock(gold).await, 10);
    assert!(h.orders.list_orders().await.unwrap().is_empty());

    let order = h
        .orders
        .place_order(PlaceOrder::new(user, vec![RequestedItem::new(gold, 1)]))
        .await
        .unwrap();
    assert_eq!(order.total, Money::new(i64::MAX / 2 + 1));
    assert_eq!(h.stock(gold).await, 9);
}

#[tokio::test]
async fn test_product_edits_keep_stock_taken_by_orders() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let product = h.product("P-1", 4990, 10).await;

    let loaded = h.catalog.get_product(product).await.unwrap();
    h.orders
        .place_order(PlaceOrder::new(user, vec![RequestedItem::new(product, 3)]))
        .await
        .unwrap();

    let renamed = h
        .catalog
        .update_product(
            loaded.id,
            ProductPatch {
                name: Some(format!("{} v2", loaded.name)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.stock, 7);

    let deactivated = h.catalog.deactivate_product(product).await.unwrap();
    assert!(!deactivated.active);
    assert_eq!(deactivated.name, renamed.name);
    assert_eq!(h.stock(product).await, 7);
}

#[tokio::test]
async fn test_unknown_product_and_user_are_not_found() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let missing = ProductId::new();

    let result = h
        .orders
        .place_order(PlaceOrder::new(user, vec![RequestedItem::new(missing, 1)]))
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound { entity: "Product", .. })));

    let product = h.product("P-1", 500, 10).await;
    let result = h
        .orders
        .place_order(PlaceOrder::new(
            common::UserId::new(),
            vec![RequestedItem::new(product, 1)],
        ))
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound { entity: "User", .. })));
    assert_eq!(h.stock(product).await, 10);
}

#[tokio::test]
async fn test_request_shape_is_validated() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let product = h.product("P-1", 500, 10).await;

    let empty = h.orders.place_order(PlaceOrder::new(user, vec![])).await;
    assert!(matches!(empty, Err(ServiceError::Domain(DomainError::NoItems))));

    let zero = h
        .orders
        .place_order(PlaceOrder::new(user, vec![RequestedItem::new(product, 0)]))
        .await;
    assert!(matches!(
        zero,
        Err(ServiceError::Domain(DomainError::InvalidQuantity { quantity: 0 }))
    ));
}

#[tokio::test]
async fn test_shipping_details_are_kept() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let product = h.product("P-1", 500, 10).await;

    let mut request = PlaceOrder::new(user, vec![RequestedItem::new(product, 1)]);
    request.shipping = ShippingDetails {
        address: Some("Av. Alemania 0671".to_string()),
        region: Some("Araucania".to_string()),
        comuna: Some("Temuco".to_string()),
    };
    request.notes = Some("Dejar en conserjería".to_string());

    let order = h.orders.place_order(request).await.unwrap();
    let stored = h.orders.get_order(order.id).await.unwrap();
    assert_eq!(stored.shipping.comuna.as_deref(), Some("Temuco"));
    assert_eq!(stored.notes.as_deref(), Some("Dejar en conserjería"));
}

#[tokio::test]
async fn test_sink_states_reject_transitions() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let product = h.product("P-1", 500, 10).await;

    let order = h
        .orders
        .place_order(PlaceOrder::new(user, vec![RequestedItem::new(product, 2)]))
        .await
        .unwrap();
    for state in [OrderState::Paid, OrderState::InPreparation, OrderState::Shipped] {
        h.orders.change_state(order.id, state).await.unwrap();
    }
    let delivered = h
        .orders
        .change_state(order.id, OrderState::Delivered)
        .await
        .unwrap();

    let result = h.orders.change_state(order.id, OrderState::Canceled).await;
    assert!(matches!(
        result,
        Err(ServiceError::Domain(DomainError::InvalidTransition {
            from: OrderState::Delivered,
            to: OrderState::Canceled,
        }))
    ));

    let stored = h.orders.get_order(order.id).await.unwrap();
    assert_eq!(stored.state, OrderState::Delivered);
    assert_eq!(stored.updated_at, delivered.updated_at);
    assert_eq!(h.stock(product).await, 8);
}

#[tokio::test]
async fn test_missing_order_transition_is_not_found() {
    let h = TestHarness::new();
    let result = h
        .orders
        .change_state(OrderId::new(), OrderState::Paid)
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound { entity: "Order", .. })));
}

#[tokio::test]
async fn test_line_items_keep_snapshot_after_catalog_edit() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let product = h.product("P-1", 500, 10).await;

    let order = h
        .orders
        .place_order(PlaceOrder::new(user, vec![RequestedItem::new(product, 1)]))
        .await
        .unwrap();
    h.catalog
        .update_product(
            product,
            domain::ProductPatch {
                name: Some("Renombrado".to_string()),
                price: Some(Money::new(9999)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stored = h.orders.get_order(order.id).await.unwrap();
    assert_eq!(stored.items[0].product_name, "Producto P-1");
    assert_eq!(stored.items[0].unit_price, Money::new(500));
}

#[tokio::test]
async fn test_order_numbers_increase() {
    let h = TestHarness::new();
    let user = h.customer().await;
    let product = h.product("P-1", 500, 100).await;

    let mut previous: Option<i64> = None;
    for _ in 0..5 {
        let order = h
            .orders
            .place_order(PlaceOrder::new(user, vec![RequestedItem::new(product, 1)]))
            .await
            .unwrap();
        let value: i64 = order.number.as_str()["ORD-".len()..].parse().unwrap();
        if let Some(previous) = previous {
            assert!(value > previous);
        }
        previous = Some(value);
    }
}

#[tokio::test]
async fn test_queries_stats_and_sales() {
    let h = TestHarness::new();
    let ana = h.customer().await;
    let ben = h.customer().await;
    let product = h.product("P-1", 1000, 100).await;

    let first = h
        .orders
        .place_order(PlaceOrder::new(ana, vec![RequestedItem::new(product, 1)]))
        .await
        .unwrap();
    let second = h
        .orders
        .place_order(PlaceOrder::new(ben, vec![RequestedItem::new(product, 2)]))
        .await
        .unwrap();
    let third = h
        .orders
        .place_order(PlaceOrder::new(ana, vec![RequestedItem::new(product, 4)]))
        .await
        .unwrap();

    h.orders.change_state(first.id, OrderState::Paid).await.unwrap();
    h.orders.change_state(third.id, OrderState::Paid).await.unwrap();
    h.orders
        .change_state(second.id, OrderState::Canceled)
        .await
        .unwrap();

    let anas: Vec<OrderId> = h
        .orders
        .orders_for_user(ana)
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(anas, vec![third.id, first.id]);

    let paid = h.orders.orders_in_state(OrderState::Paid).await.unwrap();
    assert_eq!(paid.len(), 2);

    let stats = h.orders.stats().await.unwrap();
    assert_eq!(stats.counts.len(), 6);
    assert_eq!(stats.count(OrderState::Paid), 2);
    assert_eq!(stats.count(OrderState::Canceled), 1);
    assert_eq!(stats.count(OrderState::Shipped), 0);

    let now = Utc::now();
    let total = h
        .orders
        .paid_sales_between(now - Duration::hours(1), now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(total, Money::new(5000));

    let none = h
        .orders
        .paid_sales_between(now + Duration::hours(1), now + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(none, Money::zero());

    assert!(h
        .orders
        .paid_sales_between(now, now - Duration::hours(1))
        .await
        .is_err());

    assert_eq!(h.orders.recent_orders().await.unwrap().len(), 3);
    assert_eq!(
        h.orders
            .get_order_by_number(second.number.as_str())
            .await
            .unwrap()
            .id,
        second.id
    );
}
