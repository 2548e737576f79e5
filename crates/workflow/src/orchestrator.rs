//! Order placement and payment verification.

use std::time::Instant;

use common::OrderId;
use domain::{Money, PlaceOrder};
use order_store::{CartStore, OrderStore};
use payment::{CheckoutRequest, CheckoutSession, PaymentGateway};

use crate::error::WorkflowError;
use crate::settings::{CheckoutSettings, bounded};
use crate::Result;

/// Guarded writes are retried this many times before a conflict is surfaced.
const MAX_VERIFY_ATTEMPTS: u32 = 3;

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub session_id: String,
    /// Hosted checkout page to send the customer to.
    pub redirect_url: String,
    pub amount: Money,
    /// False when the cart could not be emptied. The order stands either way.
    pub cart_cleared: bool,
}

/// What a verification call did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The order was marked paid by this call.
    Paid,
    /// The order had already been marked paid.
    AlreadyPaid,
    /// The unpaid order was removed by this call.
    Cancelled,
    /// Nothing left to do: the order is gone, or it is paid and a failure
    /// report arrived late.
    AlreadyResolved,
}

impl VerifyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyOutcome::Paid => "paid",
            VerifyOutcome::AlreadyPaid => "already_paid",
            VerifyOutcome::Cancelled => "cancelled",
            VerifyOutcome::AlreadyResolved => "already_resolved",
        }
    }

    /// True when the order ends up paid.
    pub fn is_paid(&self) -> bool {
        matches!(self, VerifyOutcome::Paid | VerifyOutcome::AlreadyPaid)
    }
}

/// Drives an order from placement through payment verification.
pub struct OrderWorkflow<S, C, G>
where
    S: OrderStore,
    C: CartStore,
    G: PaymentGateway,
{
    store: S,
    carts: C,
    gateway: G,
    settings: CheckoutSettings,
}

impl<S, C, G> OrderWorkflow<S, C, G>
where
    S: OrderStore,
    C: CartStore,
    G: PaymentGateway,
{
    pub fn new(store: S, carts: C, gateway: G, settings: CheckoutSettings) -> Self {
        Self {
            store,
            carts,
            gateway,
            settings,
        }
    }

    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// Validates, prices and records an order, then opens a checkout session.
    ///
    /// A gateway failure leaves the pending order in the store; it can be
    /// picked up again with [`OrderWorkflow::reissue_session`].
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<PlacedOrder> {
        let started = Instant::now();
        let timeout = self.settings.call_timeout;

        let order = request
            .into_order(self.settings.delivery_charge)
            .inspect_err(|e| tracing::info!(error = %e, "order rejected"))?;
        let order_id = order.id;

        bounded(timeout, "create_order", self.store.create(&order)).await?;
        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(%order_id, amount = %order.amount, lines = order.items.len(), "order recorded");

        let cart_cleared =
            match bounded(timeout, "clear_cart", self.carts.clear_cart(&order.user_id)).await {
                Ok(()) => true,
                Err(e) => {
                    metrics::counter!("cart_clear_failures_total").increment(1);
                    tracing::warn!(%order_id, error = %e, "cart not cleared");
                    false
                }
            };

        let checkout =
            CheckoutRequest::for_order(&order, &self.settings.redirects, &self.settings.currency);
        let session = self.open_session(order_id, checkout).await?;

        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(PlacedOrder {
            order_id,
            session_id: session.session_id,
            redirect_url: session.redirect_url,
            amount: order.amount,
            cart_cleared,
        })
    }

    /// Applies the provider's verdict to an order.
    ///
    /// Safe to call repeatedly and concurrently: each attempt re-reads the
    /// order and writes under its version, retrying when another writer
    /// got there first.
    #[tracing::instrument(skip(self))]
    pub async fn verify_order(&self, order_id: OrderId, success: bool) -> Result<VerifyOutcome> {
        let mut attempt = 1;
        loop {
            let result = if success {
                self.confirm_payment(order_id).await
            } else {
                self.discard_order(order_id).await
            };

            match result {
                Err(e) if e.is_concurrency_conflict() && attempt < MAX_VERIFY_ATTEMPTS => {
                    tracing::debug!(attempt, "verification raced another writer, retrying");
                    attempt += 1;
                }
                Ok(outcome) => {
                    metrics::counter!("order_verifications_total", "outcome" => outcome.as_str())
                        .increment(1);
                    tracing::info!(outcome = outcome.as_str(), "order verified");
                    return Ok(outcome);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Opens a new checkout session for an order still waiting for payment.
    #[tracing::instrument(skip(self))]
    pub async fn reissue_session(&self, order_id: OrderId) -> Result<CheckoutSession> {
        let order = bounded(
            self.settings.call_timeout,
            "get_order",
            self.store.get(order_id),
        )
        .await?;
        order.ensure_awaiting_payment()?;

        let checkout =
            CheckoutRequest::for_order(&order, &self.settings.redirects, &self.settings.currency);
        let session = self.open_session(order_id, checkout).await?;
        metrics::counter!("checkout_sessions_reissued_total").increment(1);
        Ok(session)
    }

    async fn open_session(
        &self,
        order_id: OrderId,
        checkout: CheckoutRequest,
    ) -> Result<CheckoutSession> {
        match bounded(
            self.settings.call_timeout,
            "create_session",
            self.gateway.create_session(checkout),
        )
        .await
        {
            Ok(session) => {
                tracing::info!(%order_id, session_id = %session.session_id, "checkout session issued");
                Ok(session)
            }
            Err(e) => {
                metrics::counter!("checkout_session_failures_total").increment(1);
                tracing::error!(%order_id, error = %e, "checkout session failed, order left pending");
                Err(e)
            }
        }
    }

    async fn confirm_payment(&self, order_id: OrderId) -> Result<VerifyOutcome> {
        let timeout = self.settings.call_timeout;
        let order = match bounded(timeout, "get_order", self.store.get(order_id)).await {
            Ok(order) => order,
            Err(WorkflowError::NotFound(_)) => {
                tracing::warn!(%order_id, "payment confirmed for an order that no longer exists");
                return Ok(VerifyOutcome::AlreadyResolved);
            }
            Err(e) => return Err(e),
        };

        let Some(changes) = order.mark_paid() else {
            return Ok(VerifyOutcome::AlreadyPaid);
        };

        bounded(
            timeout,
            "update_order",
            self.store.update(order_id, changes, order.version),
        )
        .await?;
        Ok(VerifyOutcome::Paid)
    }

    async fn discard_order(&self, order_id: OrderId) -> Result<VerifyOutcome> {
        let timeout = self.settings.call_timeout;
        let order = match bounded(timeout, "get_order", self.store.get(order_id)).await {
            Ok(order) => order,
            Err(WorkflowError::NotFound(_)) => return Ok(VerifyOutcome::AlreadyResolved),
            Err(e) => return Err(e),
        };

        if let Err(e) = order.ensure_discardable() {
            tracing::warn!(%order_id, error = %e, "payment failure reported for a paid order, keeping it");
            return Ok(VerifyOutcome::AlreadyResolved);
        }

        match bounded(
            timeout,
            "delete_order",
            self.store.delete(order_id, order.version),
        )
        .await
        {
            Ok(()) => Ok(VerifyOutcome::Cancelled),
            Err(WorkflowError::NotFound(_)) => Ok(VerifyOutcome::AlreadyResolved),
            Err(e) => Err(e),
        }
    }
}
