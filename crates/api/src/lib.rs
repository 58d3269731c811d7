//! HTTP API server with observability for the storefront backend.
//!
//! Provides REST endpoints for orders, catalog, users, FAQs and locations,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};
use metrics_exporter_prometheus::PrometheusHandle;
use services::{CatalogService, FaqService, LocationService, OrderService, UserService};
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderService<S>,
    pub catalog: CatalogService<S>,
    pub users: UserService<S>,
    pub faqs: FaqService<S>,
    pub locations: LocationService<S>,
}

impl<S: Store> AppState<S> {
    /// Builds every service on top of one shared store.
    pub fn new(store: S) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            users: UserService::new(store.clone()),
            faqs: FaqService::new(store.clone()),
            locations: LocationService::new(store),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    use routes::{categories, faqs, locations, orders, products, users};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Orders
        .route("/orders", get(orders::list::<S>).post(orders::create::<S>))
        .route("/orders/recent", get(orders::recent::<S>))
        .route("/orders/stats", get(orders::stats::<S>))
        .route("/orders/sales", get(orders::sales::<S>))
        .route("/orders/number/{number}", get(orders::by_number::<S>))
        .route("/orders/user/{user_id}", get(orders::by_user::<S>))
        .route("/orders/state/{state}", get(orders::by_state::<S>))
        .route("/orders/{id}", get(orders::get::<S>))
        .route("/orders/{id}/state", patch(orders::change_state::<S>))
        // Products
        .route(
            "/products",
            get(products::list_active::<S>).post(products::create::<S>),
        )
        .route("/products/all", get(products::list_all::<S>))
        .route("/products/search", get(products::search::<S>))
        .route("/products/low-stock", get(products::low_stock::<S>))
        .route("/products/code/{code}", get(products::by_code::<S>))
        .route(
            "/products/category/{category_id}",
            get(products::by_category::<S>),
        )
        .route(
            "/products/{id}",
            get(products::get::<S>)
                .put(products::update::<S>)
                .delete(products::delete::<S>),
        )
        .route("/products/{id}/deactivate", patch(products::deactivate::<S>))
        .route("/products/{id}/stock", patch(products::adjust_stock::<S>))
        // Categories
        .route(
            "/categories",
            get(categories::list_active::<S>).post(categories::create::<S>),
        )
        .route("/categories/all", get(categories::list_all::<S>))
        .route(
            "/categories/{id}",
            get(categories::get::<S>)
                .put(categories::update::<S>)
                .delete(categories::delete::<S>),
        )
        // Users
        .route("/users", get(users::list::<S>).post(users::create::<S>))
        .route("/users/search", get(users::search::<S>))
        .route("/users/role/{role}", get(users::by_role::<S>))
        .route(
            "/users/{id}",
            get(users::get::<S>)
                .put(users::update::<S>)
                .delete(users::delete::<S>),
        )
        .route("/users/{id}/deactivate", patch(users::deactivate::<S>))
        // FAQs
        .route("/faqs", get(faqs::list_active::<S>).post(faqs::create::<S>))
        .route("/faqs/all", get(faqs::list_all::<S>))
        .route("/faqs/search", get(faqs::search::<S>))
        .route("/faqs/categories", get(faqs::categories::<S>))
        .route("/faqs/category/{category}", get(faqs::by_category::<S>))
        .route(
            "/faqs/{id}",
            get(faqs::get::<S>)
                .put(faqs::update::<S>)
                .delete(faqs::delete::<S>),
        )
        // Locations
        .route("/locations/regions", get(locations::regions::<S>))
        .route("/locations/regions/full", get(locations::regions_full::<S>))
        .route("/locations/regions/{id}", get(locations::region::<S>))
        .route(
            "/locations/regions/{id}/comunas",
            get(locations::region_comunas::<S>),
        )
        .route("/locations/comunas", get(locations::comunas::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

