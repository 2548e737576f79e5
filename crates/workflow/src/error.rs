//! Workflow error types.

use common::OrderId;
use domain::OrderError;
use order_store::StoreError;
use payment::GatewayError;
use thiserror::Error;

/// Errors that can occur while placing, verifying or querying orders.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The request or transition breaks an order rule.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Order not found.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// Order store error.
    #[error("Order store error: {0}")]
    Store(StoreError),

    /// Payment gateway error.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A collaborator did not answer within the call timeout.
    #[error("Timed out waiting for {operation}")]
    Timeout { operation: &'static str },
}

impl WorkflowError {
    /// True when a guarded write lost a race with another writer.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            WorkflowError::Store(StoreError::ConcurrencyConflict { .. })
        )
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(order_id) => WorkflowError::NotFound(order_id),
            other => WorkflowError::Store(other),
        }
    }
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
