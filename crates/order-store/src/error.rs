use common::{OrderId, UserId, Version};
use thiserror::Error;

/// Errors that can occur when reading or writing orders and carts.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order with this id exists.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The record changed since it was read.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// An order with this id already exists.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// A stored row could not be turned back into an order.
    #[error("Invalid stored record for order {order_id}: {reason}")]
    InvalidRecord { order_id: OrderId, reason: String },

    /// The cart collaborator could not be updated.
    #[error("Cart update failed for user {user_id}: {reason}")]
    Cart { user_id: UserId, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
