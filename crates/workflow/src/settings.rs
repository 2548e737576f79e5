//! Checkout settings and the call timeout helper.

use std::future::Future;
use std::time::Duration;

use domain::Money;
use payment::RedirectUrls;

use crate::{Result, WorkflowError};

/// Knobs applied to every placed order.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Flat fee added to every order.
    pub delivery_charge: Money,
    pub currency: String,
    pub redirects: RedirectUrls,
    /// Upper bound for each store, cart and gateway call.
    pub call_timeout: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            delivery_charge: Money::from_minor(2000),
            currency: "inr".to_string(),
            redirects: RedirectUrls::new("http://localhost:5174"),
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// Runs `call`, failing with [`WorkflowError::Timeout`] once `limit` elapses.
pub(crate) async fn bounded<T, E, F>(limit: Duration, operation: &'static str, call: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    WorkflowError: From<E>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(WorkflowError::from),
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "call timed out");
            metrics::counter!("workflow_call_timeouts_total", "operation" => operation)
                .increment(1);
            Err(WorkflowError::Timeout { operation })
        }
    }
}
