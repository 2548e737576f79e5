//! Checkout session request and response types.

use common::OrderId;
use domain::{Money, Order};
use serde::Serialize;

/// Name shown for the synthetic delivery line on the checkout page.
pub const DELIVERY_LINE_NAME: &str = "Delivery Charges";

/// One line on the provider's checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub name: String,
    pub unit_amount: Money,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(name: impl Into<String>, unit_amount: Money, quantity: u32) -> Self {
        Self {
            name: name.into(),
            unit_amount,
            quantity,
        }
    }
}

/// Builds the provider redirect targets for an order.
///
/// Both URLs carry the order id, so the verification page can resume the
/// flow without any server-side session lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectUrls {
    frontend_url: String,
}

impl RedirectUrls {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn success_url(&self, order_id: OrderId) -> String {
        format!("{}/verify?success=true&orderId={order_id}", self.frontend_url)
    }

    pub fn cancel_url(&self, order_id: OrderId) -> String {
        format!("{}/verify?success=false&orderId={order_id}", self.frontend_url)
    }
}

/// Everything the gateway needs to open a checkout session for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    pub line_items: Vec<LineItem>,
    pub delivery_charge: Money,
    pub success_url: String,
    pub cancel_url: String,
    /// ISO 4217 code, lowercase (`inr`, `usd`).
    pub currency: String,
}

impl CheckoutRequest {
    /// Builds a request with one line per order line.
    pub fn for_order(order: &Order, redirects: &RedirectUrls, currency: &str) -> Self {
        Self {
            order_id: order.id,
            line_items: order
                .items
                .iter()
                .map(|item| LineItem::new(item.name.clone(), item.unit_price, item.quantity))
                .collect(),
            delivery_charge: order.delivery_charge,
            success_url: redirects.success_url(order.id),
            cancel_url: redirects.cancel_url(order.id),
            currency: currency.to_ascii_lowercase(),
        }
    }

    /// Product lines followed by the synthetic delivery line.
    pub fn all_line_items(&self) -> Vec<LineItem> {
        let mut lines = self.line_items.clone();
        lines.push(LineItem::new(DELIVERY_LINE_NAME, self.delivery_charge, 1));
        lines
    }

    /// Total the customer will be charged.
    pub fn total(&self) -> Option<Money> {
        self.all_line_items().iter().try_fold(Money::zero(), |acc, line| {
            line.unit_amount
                .checked_mul(line.quantity)
                .and_then(|total| acc.checked_add(total))
        })
    }
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSession {
    /// Provider handle for the session.
    pub session_id: String,
    /// Hosted payment page the customer is sent to.
    pub redirect_url: String,
}
