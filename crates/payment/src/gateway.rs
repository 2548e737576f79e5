//! Payment gateway trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::session::{CheckoutRequest, CheckoutSession};

/// Adapter to an external hosted-checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout session the customer is redirected to.
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for Arc<T> {
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        (**self).create_session(request).await
    }
}
