use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId, Version};
use domain::{Order, OrderChanges};

use crate::Result;

/// Which orders a listing should return.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrderFilter {
    /// Every order, for the admin panel.
    #[default]
    All,
    /// Only orders placed by one user.
    ByOwner(UserId),
}

impl OrderFilter {
    /// Returns true if `order` passes the filter.
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            OrderFilter::All => true,
            OrderFilter::ByOwner(user_id) => &order.user_id == user_id,
        }
    }
}

/// Core trait for order persistence.
///
/// Every operation touches a single record and is atomic at that level:
/// readers never observe a partially applied field-set. Writes to an
/// existing record carry the version the caller read; a mismatch fails with
/// `ConcurrencyConflict` and writes nothing.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order and returns its id.
    async fn create(&self, order: &Order) -> Result<OrderId>;

    /// Loads an order, failing with `NotFound` if it does not exist.
    async fn get(&self, order_id: OrderId) -> Result<Order>;

    /// Applies a field-set to an existing order.
    ///
    /// Returns the updated order with its version bumped.
    async fn update(
        &self,
        order_id: OrderId,
        changes: OrderChanges,
        expected_version: Version,
    ) -> Result<Order>;

    /// Removes an order.
    async fn delete(&self, order_id: OrderId, expected_version: Version) -> Result<()>;

    /// Lists orders matching the filter in insertion order.
    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn create(&self, order: &Order) -> Result<OrderId> {
        (**self).create(order).await
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        (**self).get(order_id).await
    }

    async fn update(
        &self,
        order_id: OrderId,
        changes: OrderChanges,
        expected_version: Version,
    ) -> Result<Order> {
        (**self).update(order_id, changes, expected_version).await
    }

    async fn delete(&self, order_id: OrderId, expected_version: Version) -> Result<()> {
        (**self).delete(order_id, expected_version).await
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        (**self).list(filter).await
    }
}
