use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, Version};
use domain::{Order, OrderChanges};
use tokio::sync::RwLock;

use crate::{OrderFilter, Result, StoreError, store::OrderStore};

/// In-memory order store.
///
/// Orders are kept in a vector so listings come back in insertion order,
/// mirroring the `seq` column of the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Removes all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

fn check_version(order: &Order, expected: Version) -> Result<()> {
    if order.version != expected {
        return Err(StoreError::ConcurrencyConflict {
            order_id: order.id,
            expected,
            actual: order.version,
        });
    }
    Ok(())
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<OrderId> {
        let mut orders = self.orders.write().await;
        if orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::AlreadyExists(order.id));
        }
        orders.push(order.clone());
        Ok(order.id)
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        let orders = self.orders.read().await;
        orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or(StoreError::NotFound(order_id))
    }

    async fn update(
        &self,
        order_id: OrderId,
        changes: OrderChanges,
        expected_version: Version,
    ) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(StoreError::NotFound(order_id))?;

        check_version(order, expected_version)?;

        order.apply(&changes, Utc::now());
        order.version = order.version.next();
        Ok(order.clone())
    }

    async fn delete(&self, order_id: OrderId, expected_version: Version) -> Result<()> {
        let mut orders = self.orders.write().await;
        let index = orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or(StoreError::NotFound(order_id))?;

        check_version(&orders[index], expected_version)?;

        orders.remove(index);
        Ok(())
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect())
    }
}
