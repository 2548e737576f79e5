//! User cart collaborator.
//!
//! The cart itself is owned by the user service; checkout only needs to
//! empty it once an order has been recorded.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use tokio::sync::RwLock;

use crate::{Result, StoreError};

/// Cart contents: product id to quantity.
pub type CartContents = HashMap<String, u32>;

/// Access to users' stored carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Empties the user's cart. Clearing an unknown user's cart is a no-op.
    async fn clear_cart(&self, user_id: &UserId) -> Result<()>;
}

#[async_trait]
impl<T: CartStore + ?Sized> CartStore for Arc<T> {
    async fn clear_cart(&self, user_id: &UserId) -> Result<()> {
        (**self).clear_cart(user_id).await
    }
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<UserId, CartContents>,
    fail_on_clear: bool,
}

/// In-memory cart store for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a user's cart contents.
    pub async fn set_cart(&self, user_id: UserId, contents: CartContents) {
        self.state.write().await.carts.insert(user_id, contents);
    }

    /// Returns a copy of the user's cart, empty if unknown.
    pub async fn cart(&self, user_id: &UserId) -> CartContents {
        self.state
            .read()
            .await
            .carts
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes subsequent `clear_cart` calls fail.
    pub async fn set_fail_on_clear(&self, fail: bool) {
        self.state.write().await.fail_on_clear = fail;
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn clear_cart(&self, user_id: &UserId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_clear {
            return Err(StoreError::Cart {
                user_id: user_id.clone(),
                reason: "cart backend unavailable".to_string(),
            });
        }
        if let Some(cart) = state.carts.get_mut(user_id) {
            cart.clear();
        }
        Ok(())
    }
}
