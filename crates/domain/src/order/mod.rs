//! Order record and related types.

mod model;
mod placement;
mod status;
mod value_objects;

pub use model::{Order, OrderChanges};
pub use placement::PlaceOrder;
pub use status::OrderStatus;
pub use value_objects::{Money, OrderItem, ProductId};

use thiserror::Error;

/// Errors raised when an order request or transition violates the order rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// User ID is required.
    #[error("User ID is required")]
    UserIdRequired,

    /// Delivery address is required.
    #[error("Delivery address is required")]
    AddressRequired,

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Item has no display name.
    #[error("Item {product_id} has no name")]
    ItemNameRequired { product_id: String },

    /// Invalid quantity.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// Invalid price.
    #[error("Invalid price for {product_id}: {price} (must be greater than 0)")]
    InvalidPrice { product_id: String, price: i64 },

    /// The same product was submitted twice with different unit prices.
    #[error("Conflicting unit prices for {product_id}")]
    ConflictingPrice { product_id: String },

    /// Order total does not fit the money representation.
    #[error("Order amount overflows")]
    AmountOverflow,

    /// Unrecognized status name.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    /// Status change not allowed by the fulfillment lifecycle.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// The order has been paid and can no longer be discarded.
    #[error("Order is already paid")]
    AlreadyPaid,

    /// Only cancellation is open to an order whose payment is not recorded.
    #[error("Order must be paid before moving to {to}")]
    PaymentRequired { to: OrderStatus },

    /// A new payment session can only be issued for an unpaid pending order.
    #[error("Order is not awaiting payment (status {status}, paid: {paid})")]
    NotAwaitingPayment { status: OrderStatus, paid: bool },
}

impl OrderError {
    /// True for errors caused by the order's current state rather than by
    /// malformed input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            OrderError::InvalidStatusTransition { .. }
                | OrderError::AlreadyPaid
                | OrderError::PaymentRequired { .. }
                | OrderError::NotAwaitingPayment { .. }
        )
    }
}
