//! In-memory gateway for tests and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::gateway::PaymentGateway;
use crate::session::{CheckoutRequest, CheckoutSession};
use crate::{GatewayError, Result};

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    requests: Vec<CheckoutRequest>,
    next_id: u32,
    fail_on_create: bool,
}

/// Gateway that records requests and hands back a local redirect.
///
/// The redirect points straight at the success URL, so a local run can
/// walk the whole flow without a provider account.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to reject subsequent session requests.
    pub async fn set_fail_on_create(&self, fail: bool) {
        self.state.write().await.fail_on_create = fail;
    }

    /// Returns the number of sessions created.
    pub async fn session_count(&self) -> usize {
        self.state.read().await.requests.len()
    }

    /// Returns every request that produced a session, oldest first.
    pub async fn requests(&self) -> Vec<CheckoutRequest> {
        self.state.read().await.requests.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let mut state = self.state.write().await;

        if state.fail_on_create {
            return Err(GatewayError::Rejected {
                status: 402,
                message: "Checkout declined".to_string(),
            });
        }

        state.next_id += 1;
        let session = CheckoutSession {
            session_id: format!("cs_local_{:04}", state.next_id),
            redirect_url: request.success_url.clone(),
        };
        state.requests.push(request);

        Ok(session)
    }
}
