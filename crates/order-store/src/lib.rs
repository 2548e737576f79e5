//! Persistence for placed orders and the user cart collaborator.
//!
//! Two backends implement the same traits: an in-memory store used by tests
//! and local runs, and a PostgreSQL store.

pub mod cart;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cart::{CartStore, InMemoryCartStore};
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::{PostgresCartStore, PostgresOrderStore};
pub use store::{OrderFilter, OrderStore};
