//! HTTP API server for the food ordering checkout.
//!
//! Provides the order placement, payment verification and order listing
//! endpoints, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryCartStore, InMemoryOrderStore};
use payment::InMemoryPaymentGateway;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use workflow::CheckoutSettings;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let order_routes = Router::new()
        .route("/place-order", post(routes::orders::place_order))
        .route("/verify-order", post(routes::orders::verify_order))
        .route("/user-orders", post(routes::orders::user_orders))
        .route("/list-orders", get(routes::orders::list_orders))
        .route("/update-status", post(routes::orders::update_status))
        .route("/retry-payment", post(routes::orders::retry_payment))
        .route("/webhook", post(routes::webhook::receive))
        .route("/{order_id}", get(routes::orders::get_order));

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api/order", order_routes)
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

/// Creates application state backed entirely by in-memory collaborators.
pub fn create_default_state(settings: CheckoutSettings) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(InMemoryCartStore::new()),
        Arc::new(InMemoryPaymentGateway::new()),
        settings,
        None,
    ))
}
