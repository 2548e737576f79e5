use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, UserId, Version};
use domain::{Money, Order, OrderChanges, OrderItem, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{CartStore, OrderFilter, Result, StoreError, store::OrderStore};

const ORDER_COLUMNS: &str = "id, user_id, items, amount, delivery_charge, address, payment, status, created_at, updated_at, version";

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("order store migrations applied");
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let items: Vec<OrderItem> = serde_json::from_value(row.try_get("items")?)?;
        let status: String = row.try_get("status")?;
        let status = status.parse::<OrderStatus>().map_err(|e| StoreError::InvalidRecord {
            order_id,
            reason: e.to_string(),
        })?;

        Ok(Order {
            id: order_id,
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            items,
            amount: Money::from_minor(row.try_get("amount")?),
            delivery_charge: Money::from_minor(row.try_get("delivery_charge")?),
            address: row.try_get("address")?,
            payment: row.try_get("payment")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            version: Version::new(row.try_get("version")?),
        })
    }

    /// Distinguishes a missing row from a version mismatch after a guarded
    /// write matched nothing.
    async fn missed_write(&self, order_id: OrderId, expected: Version) -> StoreError {
        let current: std::result::Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await;

        match current {
            Ok(Some(actual)) => StoreError::ConcurrencyConflict {
                order_id,
                expected,
                actual: Version::new(actual),
            },
            Ok(None) => StoreError::NotFound(order_id),
            Err(e) => StoreError::Database(e),
        }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: &Order) -> Result<OrderId> {
        let items = serde_json::to_value(&order.items)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, amount, delivery_charge, address, payment, status, created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(items)
        .bind(order.amount.minor())
        .bind(order.delivery_charge.minor())
        .bind(&order.address)
        .bind(order.payment)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.version.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::AlreadyExists(order.id);
            }
            StoreError::Database(e)
        })?;

        tracing::debug!(order_id = %order.id, "order inserted");
        Ok(order.id)
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(order_id))?;

        Self::row_to_order(row)
    }

    async fn update(
        &self,
        order_id: OrderId,
        changes: OrderChanges,
        expected_version: Version,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound(order_id))?;

        let mut order = Self::row_to_order(row)?;
        if order.version != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                order_id,
                expected: expected_version,
                actual: order.version,
            });
        }

        order.apply(&changes, Utc::now());
        order.version = order.version.next();

        sqlx::query(
            r#"
            UPDATE orders
            SET payment = $2, status = $3, updated_at = $4, version = $5
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.payment)
        .bind(order.status.as_str())
        .bind(order.updated_at)
        .bind(order.version.as_i64())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn delete(&self, order_id: OrderId, expected_version: Version) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND version = $2")
            .bind(order_id.as_uuid())
            .bind(expected_version.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_write(order_id, expected_version).await);
        }
        Ok(())
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let rows = match filter {
            OrderFilter::All => {
                sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY seq ASC"))
                    .fetch_all(&self.pool)
                    .await?
            }
            OrderFilter::ByOwner(user_id) => {
                sqlx::query(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY seq ASC"
                ))
                .bind(user_id.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Self::row_to_order).collect()
    }
}

/// Cart store backed by the `user_carts` table.
#[derive(Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn clear_cart(&self, user_id: &UserId) -> Result<()> {
        sqlx::query(
            "UPDATE user_carts SET cart_data = '{}'::jsonb, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Cart {
            user_id: user_id.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
