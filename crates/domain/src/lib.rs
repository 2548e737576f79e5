//! Domain layer for the food ordering service.
//!
//! This crate provides the order model shared by the store, the payment
//! gateway and the checkout workflow:
//! - `Money` in integer minor currency units
//! - `OrderStatus` fulfillment lifecycle with validated transitions
//! - `Order` record and the `OrderChanges` field-set applied on update
//! - `PlaceOrder` validation and pricing

pub mod order;

pub use order::{
    Money, Order, OrderChanges, OrderError, OrderItem, OrderStatus, PlaceOrder, ProductId,
};
