//! Order record.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId, Version};
use serde::{Deserialize, Serialize};

use super::{Money, OrderError, OrderItem, OrderStatus};

/// A placed order as persisted by the order store.
///
/// Fields are written only through [`Order::apply`] once the record exists,
/// which keeps the payment flag monotonic: it goes from false to true at
/// most once and never back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    /// Sum of line totals plus `delivery_charge`.
    pub amount: Money,
    pub delivery_charge: Money,
    pub address: String,
    pub payment: bool,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

/// Field-set written to an existing order by a single store update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderChanges {
    /// Sets the payment flag. There is no way to clear it.
    pub mark_paid: bool,
    pub status: Option<OrderStatus>,
}

impl OrderChanges {
    pub fn is_empty(&self) -> bool {
        !self.mark_paid && self.status.is_none()
    }
}

impl Order {
    /// Returns the sum of the line totals, without delivery, or `None` if
    /// any line or the sum overflows.
    pub fn subtotal(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total()?))
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// True while the order still waits for the provider's verdict.
    pub fn is_awaiting_payment(&self) -> bool {
        !self.payment && self.status == OrderStatus::Pending
    }

    /// Changes that record a confirmed payment.
    ///
    /// Returns `None` when the order is already paid, so repeated
    /// confirmations write nothing. A pending order also moves to `Paid`;
    /// a status the restaurant already advanced is left alone.
    pub fn mark_paid(&self) -> Option<OrderChanges> {
        if self.payment {
            return None;
        }
        Some(OrderChanges {
            mark_paid: true,
            status: (self.status == OrderStatus::Pending).then_some(OrderStatus::Paid),
        })
    }

    /// Checks that a failed payment may remove this order.
    pub fn ensure_discardable(&self) -> Result<(), OrderError> {
        if self.payment {
            return Err(OrderError::AlreadyPaid);
        }
        Ok(())
    }

    /// Checks that a fresh payment session may be issued for this order.
    pub fn ensure_awaiting_payment(&self) -> Result<(), OrderError> {
        if !self.is_awaiting_payment() {
            return Err(OrderError::NotAwaitingPayment {
                status: self.status,
                paid: self.payment,
            });
        }
        Ok(())
    }

    /// Changes that move the order to `next`.
    ///
    /// Returns `Ok(None)` when the order is already in `next`. `Paid` and
    /// every later fulfillment step need a recorded payment, so an unpaid
    /// order can only be cancelled.
    pub fn change_status(&self, next: OrderStatus) -> Result<Option<OrderChanges>, OrderError> {
        if self.status == next {
            return Ok(None);
        }
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        if !self.payment && next != OrderStatus::Cancelled {
            return Err(OrderError::PaymentRequired { to: next });
        }
        Ok(Some(OrderChanges {
            mark_paid: false,
            status: Some(next),
        }))
    }

    /// Applies a field-set in place. Does not touch `version`.
    pub fn apply(&mut self, changes: &OrderChanges, now: DateTime<Utc>) {
        if changes.mark_paid {
            self.payment = true;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}
