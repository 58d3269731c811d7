//! Behaviour every store implementation must share.
//!
//! Each function takes a fresh, empty store.

use chrono::{DateTime, Duration, Utc};
use domain::{
    Category, Comuna, DomainError, Faq, Money, NewCategory, NewFaq, NewProduct, NewUser,
    OrderNumber, OrderState, PlaceOrder, Product, ProductPatch, Region, RequestedItem, Role,
    User,
};
use store::{FaqQuery, OrderQuery, ProductQuery, Store, StoreError, UserQuery};

fn user(email: &str, run: Option<&str>) -> User {
    User::register(
        NewUser {
            run: run.map(str::to_string),
            first_names: "Camila".to_string(),
            last_names: "Soto".to_string(),
            email: email.to_string(),
            ..Default::default()
        },
        Utc::now(),
    )
    .unwrap()
}

fn product(code: &str, price: i64, stock: i32) -> Product {
    Product::create(
        NewProduct {
            code: code.to_string(),
            name: format!("Producto {code}"),
            price: Money::new(price),
            stock,
            ..Default::default()
        },
        Utc::now(),
    )
    .unwrap()
}

fn number(n: u32) -> OrderNumber {
    OrderNumber::from_string(format!("ORD-{n}"))
}

fn ids(products: Vec<Product>) -> Vec<common::ProductId> {
    products.into_iter().map(|p| p.id).collect()
}

async fn stock_of<S: Store>(store: &S, product: &Product) -> i32 {
    store.get_product(product.id).await.unwrap().unwrap().stock
}

pub async fn user_uniqueness<S: Store>(store: S) {
    store.insert_user(user("a@example.cl", Some("11111111K"))).await.unwrap();

    let duplicate_email = store.insert_user(user("a@example.cl", None)).await;
    assert!(matches!(duplicate_email, Err(StoreError::Conflict(_))));

    let duplicate_run = store
        .insert_user(user("b@example.cl", Some("11111111K")))
        .await;
    assert!(matches!(duplicate_run, Err(StoreError::Conflict(_))));

    store.insert_user(user("c@example.cl", None)).await.unwrap();
    store.insert_user(user("d@example.cl", None)).await.unwrap();
    assert_eq!(store.list_users(UserQuery::new()).await.unwrap().len(), 3);
}

pub async fn user_queries<S: Store>(store: S) {
    let mut seller = user("seller@example.cl", None);
    seller.role = Role::Seller;
    seller.last_names = "Fuentealba".to_string();
    store.insert_user(seller.clone()).await.unwrap();
    store.insert_user(user("buyer@example.cl", None)).await.unwrap();

    let sellers = store
        .list_users(UserQuery::new().role(Role::Seller))
        .await
        .unwrap();
    assert_eq!(sellers.len(), 1);
    assert_eq!(sellers[0].id, seller.id);

    let found = store
        .list_users(UserQuery::new().name_contains("FUENTE"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, seller.id);

    let missing = user("ghost@example.cl", None);
    assert!(matches!(
        store.update_user(missing).await,
        Err(StoreError::NotFound { .. })
    ));
}

pub async fn category_lifecycle<S: Store>(store: S) {
    let tools = Category::create(NewCategory {
        name: "Herramientas".to_string(),
        ..Default::default()
    })
    .unwrap();
    let books = Category::create(NewCategory {
        name: "Libros".to_string(),
        ..Default::default()
    })
    .unwrap();
    store.insert_category(books.clone()).await.unwrap();
    store.insert_category(tools.clone()).await.unwrap();

    let names: Vec<String> = store
        .list_categories(false)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Herramientas", "Libros"]);

    let mut renamed = books.clone();
    renamed.name = "Herramientas".to_string();
    assert!(matches!(
        store.update_category(renamed).await,
        Err(StoreError::Conflict(_))
    ));

    let mut hammer = product("H-1", 9990, 5);
    hammer.category_id = Some(tools.id);
    store.insert_product(hammer).await.unwrap();

    let counts = store.product_counts_by_category().await.unwrap();
    assert_eq!(counts.get(&tools.id), Some(&1));
    assert_eq!(counts.get(&books.id), None);

    assert!(matches!(
        store.delete_category(tools.id).await,
        Err(StoreError::CategoryInUse(id)) if id == tools.id
    ));
    store.delete_category(books.id).await.unwrap();
    assert!(store.get_category(books.id).await.unwrap().is_none());
    assert!(matches!(
        store.delete_category(books.id).await,
        Err(StoreError::NotFound { .. })
    ));
}

pub async fn product_queries<S: Store>(store: S) {
    let pen = product("P-1", 500, 3);
    let mut hidden = product("P-2", 700, 50);
    hidden.active = false;
    hidden.name = "Lápiz oculto".to_string();
    store.insert_product(pen.clone()).await.unwrap();
    store.insert_product(hidden.clone()).await.unwrap();

    assert!(matches!(
        store.insert_product(product("P-1", 100, 1)).await,
        Err(StoreError::Conflict(_))
    ));

    assert_eq!(store.list_products(ProductQuery::new()).await.unwrap().len(), 2);
    assert_eq!(ids(store.list_products(ProductQuery::active()).await.unwrap()), vec![pen.id]);
    assert_eq!(
        ids(store
            .list_products(ProductQuery::active().low_stock())
            .await
            .unwrap()),
        vec![pen.id]
    );
    assert!(
        store
            .list_products(ProductQuery::active().name_contains("lápiz"))
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        store.get_product_by_code("P-2").await.unwrap().map(|p| p.id),
        Some(hidden.id)
    );
}

pub async fn stock_adjustment<S: Store>(store: S) {
    let pen = product("P-1", 500, 3);
    store.insert_product(pen.clone()).await.unwrap();

    let updated = store.adjust_stock(pen.id, 7).await.unwrap();
    assert_eq!(updated.stock, 10);

    let result = store.adjust_stock(pen.id, -11).await;
    assert!(matches!(
        result,
        Err(StoreError::Domain(DomainError::InsufficientStock { .. }))
    ));
    assert_eq!(stock_of(&store, &pen).await, 10);

    let unsaved = product("X-1", 100, 0);
    assert!(matches!(
        store.adjust_stock(unsaved.id, 1).await,
        Err(StoreError::NotFound { .. })
    ));
}

pub async fn place_and_cancel<S: Store>(store: S) {
    let buyer = user("buyer@example.cl", None);
    let pen = product("P-1", 500, 10);
    store.insert_user(buyer.clone()).await.unwrap();
    store.insert_product(pen.clone()).await.unwrap();

    let request = PlaceOrder::new(buyer.id, vec![RequestedItem::new(pen.id, 3)]);
    let order = store.place_order(request, number(1), Utc::now()).await.unwrap();

    assert_eq!(order.state, OrderState::Pending);
    assert_eq!(order.total, Money::new(1500));
    assert_eq!(stock_of(&store, &pen).await, 7);

    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.items, order.items);
    assert_eq!(stored.number, order.number);
    assert_eq!(
        store.get_order_by_number("ORD-1").await.unwrap().map(|o| o.id),
        Some(order.id)
    );

    let change = store
        .transition_order(order.id, OrderState::Canceled, Utc::now())
        .await
        .unwrap();
    assert_eq!(change.order.state, OrderState::Canceled);
    assert_eq!(change.restocked_units, 3);
    assert!(change.order.updated_at.is_some());
    assert_eq!(stock_of(&store, &pen).await, 10);

    let again = store
        .transition_order(order.id, OrderState::Pending, Utc::now())
        .await;
    assert!(matches!(
        again,
        Err(StoreError::Domain(DomainError::InvalidTransition {
            from: OrderState::Canceled,
            ..
        }))
    ));
    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.state, OrderState::Canceled);
    assert_eq!(stock_of(&store, &pen).await, 10);
}

pub async fn product_patch_keeps_stock_moved_by_orders<S: Store>(store: S) {
    let buyer = user("buyer@example.cl", None);
    let pen = product("P-1", 500, 10);
    store.insert_user(buyer.clone()).await.unwrap();
    store.insert_product(pen.clone()).await.unwrap();

    // An editor loads the product, then an order lands before the edit is saved.
    let before_edit = store.get_product(pen.id).await.unwrap().unwrap();
    assert_eq!(before_edit.stock, 10);
    let request = PlaceOrder::new(buyer.id, vec![RequestedItem::new(pen.id, 3)]);
    let order = store.place_order(request, number(1), Utc::now()).await.unwrap();

    let renamed = store
        .update_product(
            pen.id,
            ProductPatch {
                name: Some("Lápiz grafito".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Lápiz grafito");
    assert_eq!(renamed.stock, 7);
    assert_eq!(stock_of(&store, &pen).await, 7);

    store
        .transition_order(order.id, OrderState::Canceled, Utc::now())
        .await
        .unwrap();
    let deactivated = store
        .update_product(
            pen.id,
            ProductPatch {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!deactivated.active);
    assert_eq!(deactivated.stock, 10);

    let restocked = store
        .update_product(
            pen.id,
            ProductPatch {
                stock: Some(25),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(restocked.stock, 25);
    assert_eq!(stock_of(&store, &pen).await, 25);

    let rejected = store
        .update_product(
            pen.id,
            ProductPatch {
                price: Some(Money::zero()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        rejected,
        Err(StoreError::Domain(DomainError::Validation { field: "price", .. }))
    ));
    let unsaved = product("X-1", 100, 0);
    assert!(matches!(
        store.update_product(unsaved.id, ProductPatch::default()).await,
        Err(StoreError::NotFound { .. })
    ));
}

pub async fn cancel_rejects_restock_past_stock_limit<S: Store>(store: S) {
    let buyer = user("buyer@example.cl", None);
    let crate_of_pens = product("P-1", 500, i32::MAX);
    store.insert_user(buyer.clone()).await.unwrap();
    store.insert_product(crate_of_pens.clone()).await.unwrap();

    let request = PlaceOrder::new(buyer.id, vec![RequestedItem::new(crate_of_pens.id, 5)]);
    let order = store.place_order(request, number(1), Utc::now()).await.unwrap();
    store.adjust_stock(crate_of_pens.id, 5).await.unwrap();
    assert_eq!(stock_of(&store, &crate_of_pens).await, i32::MAX);

    let result = store
        .transition_order(order.id, OrderState::Canceled, Utc::now())
        .await;
    assert!(matches!(
        result,
        Err(StoreError::Domain(DomainError::Validation { field: "stock", .. }))
    ));
    assert_eq!(stock_of(&store, &crate_of_pens).await, i32::MAX);
    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.state, OrderState::Pending);
}

pub async fn failed_placement_is_atomic<S: Store>(store: S) {
    let buyer = user("buyer@example.cl", None);
    let pen = product("P-1", 500, 10);
    let book = product("B-1", 12990, 1);
    store.insert_user(buyer.clone()).await.unwrap();
    store.insert_product(pen.clone()).await.unwrap();
    store.insert_product(book.clone()).await.unwrap();

    let request = PlaceOrder::new(
        buyer.id,
        vec![RequestedItem::new(pen.id, 4), RequestedItem::new(book.id, 2)],
    );
    let result = store.place_order(request, number(1), Utc::now()).await;
    assert!(matches!(
        result,
        Err(StoreError::Domain(DomainError::InsufficientStock {
            requested: 2,
            available: 1,
            ..
        }))
    ));
    assert_eq!(stock_of(&store, &pen).await, 10);
    assert_eq!(stock_of(&store, &book).await, 1);
    assert!(store.list_orders(OrderQuery::new()).await.unwrap().is_empty());

    let missing = Product::create(
        NewProduct {
            code: "GONE".to_string(),
            name: "Gone".to_string(),
            price: Money::new(1),
            ..Default::default()
        },
        Utc::now(),
    )
    .unwrap();
    let request = PlaceOrder::new(
        buyer.id,
        vec![RequestedItem::new(pen.id, 1), RequestedItem::new(missing.id, 1)],
    );
    assert!(matches!(
        store.place_order(request, number(2), Utc::now()).await,
        Err(StoreError::Domain(DomainError::UnknownProduct(id))) if id == missing.id
    ));
    assert_eq!(stock_of(&store, &pen).await, 10);

    let stranger = user("stranger@example.cl", None);
    let request = PlaceOrder::new(stranger.id, vec![RequestedItem::new(pen.id, 1)]);
    assert!(matches!(
        store.place_order(request, number(3), Utc::now()).await,
        Err(StoreError::NotFound { entity: "User", .. })
    ));
}

pub async fn order_queries<S: Store>(store: S) {
    let ana = user("ana@example.cl", None);
    let ben = user("ben@example.cl", None);
    let pen = product("P-1", 1000, 100);
    store.insert_user(ana.clone()).await.unwrap();
    store.insert_user(ben.clone()).await.unwrap();
    store.insert_product(pen.clone()).await.unwrap();

    // Whole seconds, so database timestamp precision cannot move an order
    // across a range boundary.
    let start = DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap() - Duration::hours(3);
    let mut ids = Vec::new();
    for (i, (buyer, qty)) in [(&ana, 1), (&ben, 2), (&ana, 3)].into_iter().enumerate() {
        let request = PlaceOrder::new(buyer.id, vec![RequestedItem::new(pen.id, qty)]);
        let at = start + Duration::hours(i as i64);
        let order = store
            .place_order(request, number(i as u32 + 1), at)
            .await
            .unwrap();
        ids.push(order.id);
    }
    store
        .transition_order(ids[0], OrderState::Paid, Utc::now())
        .await
        .unwrap();
    store
        .transition_order(ids[2], OrderState::Paid, Utc::now())
        .await
        .unwrap();

    let anas: Vec<_> = store
        .list_orders(OrderQuery::for_user(ana.id))
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(anas, vec![ids[2], ids[0]]);

    let recent = store.list_orders(OrderQuery::new().limit(2)).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, ids[2]);

    let counts = store.count_orders_by_state().await.unwrap();
    assert_eq!(counts.get(&OrderState::Paid), Some(&2));
    assert_eq!(counts.get(&OrderState::Pending), Some(&1));
    assert_eq!(counts.get(&OrderState::Shipped), None);

    let all_paid = OrderQuery::in_state(OrderState::Paid)
        .created_between(start, start + Duration::hours(2));
    assert_eq!(store.sum_order_totals(all_paid).await.unwrap(), Money::new(4000));

    let first_hour =
        OrderQuery::in_state(OrderState::Paid).created_between(start, start + Duration::minutes(30));
    assert_eq!(store.sum_order_totals(first_hour).await.unwrap(), Money::new(1000));

    let empty = OrderQuery::in_state(OrderState::Delivered);
    assert_eq!(store.sum_order_totals(empty).await.unwrap(), Money::zero());
}

pub async fn deletes_cascade<S: Store>(store: S) {
    let ana = user("ana@example.cl", None);
    let pen = product("P-1", 1000, 10);
    store.insert_user(ana.clone()).await.unwrap();
    store.insert_product(pen.clone()).await.unwrap();

    let request = PlaceOrder::new(ana.id, vec![RequestedItem::new(pen.id, 2)]);
    let order = store.place_order(request, number(1), Utc::now()).await.unwrap();

    store.delete_product(pen.id).await.unwrap();
    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.items[0].product_id, None);
    assert_eq!(stored.items[0].product_name, "Producto P-1");
    assert_eq!(stored.total, Money::new(2000));

    let change = store
        .transition_order(order.id, OrderState::Canceled, Utc::now())
        .await
        .unwrap();
    assert_eq!(change.restocked_units, 0);

    store.delete_user(ana.id).await.unwrap();
    assert!(store.get_order(order.id).await.unwrap().is_none());
    assert!(matches!(
        store.delete_user(ana.id).await,
        Err(StoreError::NotFound { .. })
    ));
}

pub async fn faqs<S: Store>(store: S) {
    let make = |question: &str, category: Option<&str>, order: i32, active: bool| {
        Faq::create(NewFaq {
            question: question.to_string(),
            answer: "Respuesta".to_string(),
            category: category.map(str::to_string),
            display_order: Some(order),
            active: Some(active),
        })
        .unwrap()
    };
    store.insert_faq(make("¿Cómo pago?", Some("Pagos"), 2, true)).await.unwrap();
    store.insert_faq(make("¿Hacen envíos?", Some("Envíos"), 1, true)).await.unwrap();
    store.insert_faq(make("¿Oculta?", Some("Interno"), 0, false)).await.unwrap();
    store.insert_faq(make("¿Sin categoría?", None, 3, true)).await.unwrap();

    let active: Vec<i32> = store
        .list_faqs(FaqQuery::active())
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.display_order)
        .collect();
    assert_eq!(active, vec![1, 2, 3]);

    assert_eq!(
        store.faq_categories().await.unwrap(),
        vec!["Envíos".to_string(), "Pagos".to_string()]
    );
    assert_eq!(
        store
            .list_faqs(FaqQuery::active().question_contains("ENVÍOS"))
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        store
            .list_faqs(FaqQuery::active().category("Interno"))
            .await
            .unwrap()
            .len(),
        0
    );
}

pub async fn locations<S: Store>(store: S) {
    assert_eq!(store.count_regions().await.unwrap(), 0);

    let north = Region::new("Norte", "01");
    let south = Region::new("Sur", "02");
    let mut closed = Comuna::new("Cerrada", north.id);
    closed.active = false;
    store
        .insert_regions(vec![
            (south.clone(), vec![Comuna::new("Valdivia", south.id)]),
            (
                north.clone(),
                vec![Comuna::new("Putre", north.id), Comuna::new("Arica", north.id), closed],
            ),
        ])
        .await
        .unwrap();

    assert_eq!(store.count_regions().await.unwrap(), 2);
    let codes: Vec<String> = store
        .list_regions(true)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.code)
        .collect();
    assert_eq!(codes, vec!["01", "02"]);

    let names: Vec<String> = store
        .list_comunas(Some(north.id), true)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Arica", "Putre"]);
    assert_eq!(store.list_comunas(None, true).await.unwrap().len(), 3);
    assert_eq!(store.list_comunas(None, false).await.unwrap().len(), 4);
    assert_eq!(store.get_region(south.id).await.unwrap(), Some(south));
}

pub async fn region_insert_is_all_or_nothing<S: Store>(store: S) {
    let north = Region::new("Norte", "01");
    let twin = Region::new("Norte", "02");
    let result = store
        .insert_regions(vec![
            (north.clone(), vec![Comuna::new("Putre", north.id)]),
            (twin.clone(), vec![Comuna::new("Arica", twin.id)]),
        ])
        .await;

    assert!(matches!(result, Err(StoreError::Conflict(_))));
    assert_eq!(store.count_regions().await.unwrap(), 0);
    assert!(store.list_comunas(None, false).await.unwrap().is_empty());

    store
        .insert_regions(vec![(north.clone(), vec![Comuna::new("Putre", north.id)])])
        .await
        .unwrap();
    assert_eq!(store.count_regions().await.unwrap(), 1);
    assert!(matches!(
        store.insert_regions(vec![(twin, Vec::new())]).await,
        Err(StoreError::Conflict(_))
    ));
    assert_eq!(store.count_regions().await.unwrap(), 1);
}
