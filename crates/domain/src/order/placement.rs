//! Order placement request: validation and pricing.

use chrono::Utc;
use common::{OrderId, UserId, Version};

use super::{Money, Order, OrderError, OrderItem, OrderStatus};

/// Request to place an order from the contents of a user's cart.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub address: String,
}

impl PlaceOrder {
    pub fn new(
        user_id: impl Into<UserId>,
        items: Vec<OrderItem>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            items,
            address: address.into(),
        }
    }

    /// Validates the request and builds a pending, unpaid order.
    ///
    /// Lines for the same product are merged into one line. The amount is
    /// computed from unit prices and quantities plus `delivery_charge`; no
    /// client-supplied total is consulted.
    pub fn into_order(self, delivery_charge: Money) -> Result<Order, OrderError> {
        if self.user_id.is_blank() {
            return Err(OrderError::UserIdRequired);
        }
        if self.address.trim().is_empty() {
            return Err(OrderError::AddressRequired);
        }

        let items = collapse_lines(self.items)?;
        let amount = price(&items, delivery_charge)?;
        let now = Utc::now();

        Ok(Order {
            id: OrderId::new(),
            user_id: self.user_id,
            items,
            amount,
            delivery_charge,
            address: self.address.trim().to_string(),
            payment: false,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            version: Version::first(),
        })
    }
}

/// Validates each line and merges duplicates, keeping first-seen order.
fn collapse_lines(items: Vec<OrderItem>) -> Result<Vec<OrderItem>, OrderError> {
    if items.is_empty() {
        return Err(OrderError::NoItems);
    }

    let mut lines: Vec<OrderItem> = Vec::with_capacity(items.len());
    for item in items {
        let product_id = item.product_id.to_string();
        if item.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                product_id,
                quantity: item.quantity,
            });
        }
        if !item.unit_price.is_positive() {
            return Err(OrderError::InvalidPrice {
                product_id,
                price: item.unit_price.minor(),
            });
        }
        if item.name.trim().is_empty() {
            return Err(OrderError::ItemNameRequired { product_id });
        }

        match lines.iter_mut().find(|l| l.product_id == item.product_id) {
            Some(line) if line.unit_price != item.unit_price => {
                return Err(OrderError::ConflictingPrice { product_id });
            }
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(OrderError::AmountOverflow)?;
            }
            None => lines.push(item),
        }
    }
    Ok(lines)
}

/// Sum of line totals plus the delivery charge, with overflow checks.
fn price(items: &[OrderItem], delivery_charge: Money) -> Result<Money, OrderError> {
    items
        .iter()
        .try_fold(delivery_charge, |acc, item| {
            item.line_total().and_then(|line| acc.checked_add(line))
        })
        .ok_or(OrderError::AmountOverflow)
}
