//! Read side and fulfillment status updates.

use std::time::Duration;

use common::{OrderId, UserId};
use domain::{Order, OrderError, OrderStatus};
use order_store::{OrderFilter, OrderStore};

use crate::settings::bounded;
use crate::Result;

/// Order listings for customers and staff, plus the status setter.
pub struct OrderQueries<S: OrderStore> {
    store: S,
    call_timeout: Duration,
}

impl<S: OrderStore> OrderQueries<S> {
    pub fn new(store: S, call_timeout: Duration) -> Self {
        Self {
            store,
            call_timeout,
        }
    }

    /// Orders placed by `user_id`, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        if user_id.is_blank() {
            return Err(OrderError::UserIdRequired.into());
        }
        bounded(
            self.call_timeout,
            "list_orders",
            self.store.list(OrderFilter::ByOwner(user_id.clone())),
        )
        .await
    }

    /// Every order, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        bounded(self.call_timeout, "list_orders", self.store.list(OrderFilter::All)).await
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        bounded(self.call_timeout, "get_order", self.store.get(order_id)).await
    }

    /// Moves an order along the fulfillment lifecycle.
    ///
    /// Setting the current status again is a no-op. A concurrent writer
    /// surfaces as a conflict; the caller decides whether to retry.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(&self, order_id: OrderId, next: OrderStatus) -> Result<Order> {
        let order = self.get_order(order_id).await?;

        let Some(changes) = order.change_status(next).inspect_err(|e| {
            tracing::info!(error = %e, "status change refused");
        })?
        else {
            return Ok(order);
        };

        let updated = bounded(
            self.call_timeout,
            "update_order",
            self.store.update(order_id, changes, order.version),
        )
        .await?;

        metrics::counter!("order_status_changes_total", "status" => next.as_str()).increment(1);
        tracing::info!(from = %order.status, to = %next, "order status changed");
        Ok(updated)
    }
}
