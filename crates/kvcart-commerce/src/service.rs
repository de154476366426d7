//! Cache-backed cart service.

use std::sync::Arc;
use std::time::Duration;

use kvcart_cache::CacheManager;

use crate::cart::{Cart, CartItem, CartPricing};
use crate::error::CommerceError;
use crate::ids::{CartId, ItemId};

/// Read-modify-write operations on a single cart.
///
/// The cart is stored as one JSON record under its ID. Every mutation loads
/// the cart, changes it in memory and writes it back while holding the cache
/// manager's lock for the cart key, so concurrent mutations through the same
/// [`CacheManager`] never overwrite each other.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use kvcart_cache::{CacheManager, MemoryStore};
/// use kvcart_commerce::prelude::*;
///
/// let cache = Arc::new(CacheManager::from_store(MemoryStore::new()));
/// let service = CartService::new(cache, "user123-cart");
///
/// service.add_item(CartItem::new("item1", "Widget", 10.0, 2)?).await?;
/// service.increment_quantity(&ItemId::new("item1")).await?;
///
/// let cart = service.get_cart().await;
/// assert_eq!(cart.items[0].quantity, 3);
/// ```
#[derive(Debug, Clone)]
pub struct CartService {
    cache: Arc<CacheManager>,
    cart_id: CartId,
    ttl: Option<Duration>,
}

impl CartService {
    /// Create a service for one cart.
    pub fn new(cache: Arc<CacheManager>, cart_id: impl Into<CartId>) -> Self {
        Self {
            cache,
            cart_id: cart_id.into(),
            ttl: None,
        }
    }

    /// Expire the stored cart after `ttl` of inactivity.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// The cart this service operates on.
    pub fn cart_id(&self) -> &CartId {
        &self.cart_id
    }

    /// Load the cart.
    ///
    /// A missing entry, a backend failure and an undecodable record all
    /// yield an empty cart with this service's ID. Stored records with
    /// zero quantities or repeated item IDs are normalized on the way in.
    pub async fn get_cart(&self) -> Cart {
        match self.cache.get::<Cart>(self.cart_id.as_str()).await {
            Ok(Some(mut cart)) => {
                if cart.normalize() {
                    tracing::warn!(cart_id = %self.cart_id, "normalized stored cart items");
                }
                cart
            }
            Ok(None) => Cart::new(self.cart_id.clone()),
            Err(e) => {
                tracing::warn!(cart_id = %self.cart_id, error = %e, "using empty cart");
                Cart::new(self.cart_id.clone())
            }
        }
    }

    /// Store the full cart state under the cart key.
    pub async fn save_cart(&self, cart: &Cart) -> Result<(), CommerceError> {
        self.cache
            .set(self.cart_id.as_str(), cart, self.ttl)
            .await
            .map_err(CommerceError::from)
    }

    /// Add an item, merging quantities with an existing item of the same ID.
    pub async fn add_item(&self, item: CartItem) -> Result<Cart, CommerceError> {
        let item_id = item.id.clone();
        let cart = self.update(|cart| cart.add_item(item)).await?;
        tracing::debug!(cart_id = %self.cart_id, item_id = %item_id, "added item");
        Ok(cart)
    }

    /// Remove an item. Saves even if the item wasn't present.
    pub async fn remove_item(&self, item_id: &ItemId) -> Result<Cart, CommerceError> {
        let cart = self
            .update(|cart| {
                cart.remove_item(item_id);
                Ok(())
            })
            .await?;
        tracing::debug!(cart_id = %self.cart_id, item_id = %item_id, "removed item");
        Ok(cart)
    }

    /// Increase an item's quantity by one. Saves even if the item wasn't present.
    pub async fn increment_quantity(&self, item_id: &ItemId) -> Result<Cart, CommerceError> {
        let cart = self
            .update(|cart| cart.increment_quantity(item_id).map(|_| ()))
            .await?;
        tracing::debug!(cart_id = %self.cart_id, item_id = %item_id, "incremented quantity");
        Ok(cart)
    }

    /// Decrease an item's quantity by one, removing it at zero.
    ///
    /// Saves even if the item wasn't present.
    pub async fn decrement_quantity(&self, item_id: &ItemId) -> Result<Cart, CommerceError> {
        let cart = self
            .update(|cart| {
                cart.decrement_quantity(item_id);
                Ok(())
            })
            .await?;
        tracing::debug!(cart_id = %self.cart_id, item_id = %item_id, "decremented quantity");
        Ok(cart)
    }

    /// Set the discount applied to the whole cart.
    pub async fn apply_overall_discount(&self, discount: f64) -> Result<Cart, CommerceError> {
        self.update(|cart| cart.set_overall_discount(discount)).await
    }

    /// Replace the cart with an empty one under the same key.
    pub async fn clear_cart(&self) -> Result<Cart, CommerceError> {
        let cart = self
            .update(|cart| {
                cart.clear();
                Ok(())
            })
            .await?;
        tracing::debug!(cart_id = %self.cart_id, "cleared cart");
        Ok(cart)
    }

    /// Pricing breakdown of the current cart.
    pub async fn pricing(&self) -> CartPricing {
        self.get_cart().await.calculate_pricing()
    }

    /// Load, mutate and save the cart under the key lock.
    ///
    /// Nothing is written if `f` fails.
    async fn update<F>(&self, f: F) -> Result<Cart, CommerceError>
    where
        F: FnOnce(&mut Cart) -> Result<(), CommerceError>,
    {
        let _guard = self.cache.lock(self.cart_id.as_str()).await;
        let mut cart = self.get_cart().await;
        f(&mut cart)?;
        self.save_cart(&cart).await?;
        Ok(cart)
    }
}
