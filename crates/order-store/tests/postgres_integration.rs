//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p order-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{OrderId, UserId, Version};
use domain::{Money, Order, OrderItem, OrderStatus, PlaceOrder};
use order_store::{
    CartStore, OrderFilter, OrderStore, PostgresCartStore, PostgresOrderStore, StoreError,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_orders_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh pool with cleared tables
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, user_carts")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn new_order(user: &str) -> Order {
    PlaceOrder::new(
        user,
        vec![
            OrderItem::new("food-1", "Masala dosa", 2, Money::from_minor(500)),
            OrderItem::new("food-2", "Filter coffee", 1, Money::from_minor(300)),
        ],
        "4 Temple Street",
    )
    .into_order(Money::from_minor(2000))
    .unwrap()
}

#[tokio::test]
async fn create_and_get_roundtrips_structured_items() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = new_order("user-1");

    store.create(&order).await.unwrap();
    let loaded = store.get(order.id).await.unwrap();

    assert_eq!(loaded.items, order.items);
    assert_eq!(loaded.amount, Money::from_minor(3300));
    assert_eq!(loaded.status, OrderStatus::Pending);
    assert!(!loaded.payment);
    assert_eq!(loaded.version, Version::first());
}

#[tokio::test]
async fn create_duplicate_id_fails() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = new_order("user-1");

    store.create(&order).await.unwrap();
    let result = store.create(&order).await;
    assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
}

#[tokio::test]
async fn get_missing_order_is_not_found() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let result = store.get(OrderId::new()).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn update_marks_paid_and_bumps_version() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = new_order("user-1");
    store.create(&order).await.unwrap();

    let updated = store
        .update(order.id, order.mark_paid().unwrap(), Version::first())
        .await
        .unwrap();
    assert!(updated.payment);
    assert_eq!(updated.status, OrderStatus::Paid);
    assert_eq!(updated.version, Version::new(2));

    let loaded = store.get(order.id).await.unwrap();
    assert!(loaded.payment);
    assert_eq!(loaded.version, Version::new(2));
}

#[tokio::test]
async fn update_with_stale_version_conflicts() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = new_order("user-1");
    store.create(&order).await.unwrap();

    let changes = order.mark_paid().unwrap();
    store
        .update(order.id, changes, Version::first())
        .await
        .unwrap();

    let result = store.update(order.id, changes, Version::first()).await;
    assert!(matches!(
        result,
        Err(StoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
async fn delete_then_delete_again_is_not_found() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = new_order("user-1");
    store.create(&order).await.unwrap();

    store.delete(order.id, Version::first()).await.unwrap();
    let again = store.delete(order.id, Version::first()).await;
    assert!(matches!(again, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn delete_with_stale_version_conflicts() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = new_order("user-1");
    store.create(&order).await.unwrap();
    store
        .update(order.id, order.mark_paid().unwrap(), Version::first())
        .await
        .unwrap();

    let result = store.delete(order.id, Version::first()).await;
    assert!(matches!(
        result,
        Err(StoreError::ConcurrencyConflict { .. })
    ));
    assert!(store.get(order.id).await.is_ok());
}

#[tokio::test]
async fn list_by_owner_returns_only_that_users_orders_in_insertion_order() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let a1 = new_order("alice");
    let b1 = new_order("bob");
    let a2 = new_order("alice");
    for order in [&a1, &b1, &a2] {
        store.create(order).await.unwrap();
    }

    let alice = store
        .list(OrderFilter::ByOwner(UserId::new("alice")))
        .await
        .unwrap();
    assert_eq!(
        alice.iter().map(|o| o.id).collect::<Vec<_>>(),
        vec![a1.id, a2.id]
    );

    let all = store.list(OrderFilter::All).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].id, b1.id);
}

#[tokio::test]
async fn clear_cart_empties_stored_cart() {
    let pool = get_test_pool().await;
    sqlx::query("INSERT INTO user_carts (user_id, cart_data) VALUES ($1, $2)")
        .bind("user-1")
        .bind(serde_json::json!({"food-1": 2, "food-2": 1}))
        .execute(&pool)
        .await
        .unwrap();

    let carts = PostgresCartStore::new(pool.clone());
    carts.clear_cart(&UserId::new("user-1")).await.unwrap();

    let cart: serde_json::Value =
        sqlx::query_scalar("SELECT cart_data FROM user_carts WHERE user_id = $1")
            .bind("user-1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(cart, serde_json::json!({}));

    // Unknown users are a no-op.
    carts.clear_cart(&UserId::new("ghost")).await.unwrap();
}
