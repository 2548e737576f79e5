//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::routes::orders::{AppState, SharedCartStore, SharedGateway, SharedOrderStore};
use order_store::{InMemoryCartStore, InMemoryOrderStore, PostgresCartStore, PostgresOrderStore};
use payment::{InMemoryPaymentGateway, StripeCheckoutGateway, StripeConfig};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Picks the order and cart backends from `DATABASE_URL`.
async fn order_backends(config: &Config) -> (SharedOrderStore, SharedCartStore) {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, orders are kept in memory");
        return (
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryCartStore::new()),
        );
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.call_timeout())
        .connect(url)
        .await
        .expect("failed to connect to PostgreSQL");

    let store = PostgresOrderStore::new(pool.clone());
    store
        .run_migrations()
        .await
        .expect("failed to run migrations");
    tracing::info!("using PostgreSQL order store");

    (Arc::new(store), Arc::new(PostgresCartStore::new(pool)))
}

/// Picks the payment gateway from `STRIPE_SECRET_KEY`.
fn payment_gateway(config: &Config) -> SharedGateway {
    let Some(key) = config.stripe_secret_key.as_deref() else {
        tracing::warn!("STRIPE_SECRET_KEY not set, checkout sessions are simulated");
        return Arc::new(InMemoryPaymentGateway::new());
    };

    let stripe = StripeConfig::new(key).with_timeout(config.call_timeout());
    let gateway = StripeCheckoutGateway::new(stripe).expect("failed to build Stripe client");
    tracing::info!("using Stripe checkout gateway");
    Arc::new(gateway)
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(config.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(
                "order_placement_duration_seconds".to_string(),
            ),
            &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .and_then(|builder| builder.install_recorder())
        .expect("failed to install Prometheus recorder");

    // 3. Wire collaborators
    let (store, carts) = order_backends(&config).await;
    let gateway = payment_gateway(&config);
    if config.stripe_webhook_secret.is_none() {
        tracing::info!("STRIPE_WEBHOOK_SECRET not set, webhook endpoint disabled");
    }

    let state = Arc::new(AppState::new(
        store,
        carts,
        gateway,
        config.checkout_settings(),
        config.stripe_webhook_secret.clone(),
    ));

    // 4. Build the application
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(
        %addr,
        currency = %config.currency,
        delivery_charge = config.delivery_charge_minor,
        timeout = ?config.call_timeout(),
        "starting API server"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
