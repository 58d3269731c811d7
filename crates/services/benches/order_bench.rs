use common::{ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Money, NewProduct, NewUser, OrderState, PlaceOrder, RequestedItem};
use services::{CatalogService, OrderService, UserService};
use store::InMemoryStore;

async fn seeded_store(products: usize) -> (InMemoryStore, UserId, Vec<ProductId>) {
    let store = InMemoryStore::new();
    let users = UserService::new(store.clone());
    let catalog = CatalogService::new(store.clone());

    let user = users
        .create_user(NewUser {
            first_names: "Bench".to_string(),
            last_names: "User".to_string(),
            email: "bench@example.cl".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut ids = Vec::with_capacity(products);
    for i in 0..products {
        let product = catalog
            .create_product(NewProduct {
                code: format!("BENCH-{i}"),
                name: format!("Bench product {i}"),
                price: Money::new(1990),
                stock: i32::MAX / 2,
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(product.id);
    }
    (store, user.id, ids)
}

fn bench_place_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, user, products) = rt.block_on(seeded_store(1));
    let orders = OrderService::new(store);

    c.bench_function("orders/place_single_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                orders
                    .place_order(PlaceOrder::new(
                        user,
                        vec![RequestedItem::new(products[0], 1)],
                    ))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_place_ten_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, user, products) = rt.block_on(seeded_store(10));
    let orders = OrderService::new(store);

    c.bench_function("orders/place_ten_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let items = products
                    .iter()
                    .map(|id| RequestedItem::new(*id, 2))
                    .collect();
                orders
                    .place_order(PlaceOrder::new(user, items))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_place_and_cancel(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, user, products) = rt.block_on(seeded_store(3));
    let orders = OrderService::new(store);

    c.bench_function("orders/place_and_cancel", |b| {
        b.iter(|| {
            rt.block_on(async {
                let items = products
                    .iter()
                    .map(|id| RequestedItem::new(*id, 1))
                    .collect();
                let order = orders
                    .place_order(PlaceOrder::new(user, items))
                    .await
                    .unwrap();
                orders
                    .change_state(order.id, OrderState::Canceled)
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_place_single_line,
    bench_place_ten_lines,
    bench_place_and_cancel
);
criterion_main!(benches);
