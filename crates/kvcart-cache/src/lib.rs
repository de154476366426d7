//! JSON-aware cache manager over a key-value store.
//!
//! Provides a small, typed API for keeping serde values in a key-value
//! backend, with Redis for production and an in-process store for
//! development and tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kvcart_cache::{CacheManager, RedisConfig, RedisStore};
//!
//! let store = RedisStore::connect(&RedisConfig::new("redis://127.0.0.1:6379")).await?;
//! let cache = Arc::new(CacheManager::from_store(store));
//!
//! // Store a value
//! cache.set("cart:user123", &cart, None).await?;
//!
//! // Retrieve a value
//! let cart: Option<Cart> = cache.get("cart:user123").await?;
//!
//! // Delete a value
//! cache.delete("cart:user123").await?;
//! ```

mod error;
mod manager;
mod redis_store;
mod store;

pub use error::{CacheError, CacheResult, StoreError};
pub use manager::{CacheManager, KeyGuard};
pub use redis_store::{RedisConfig, RedisStore};
pub use store::{MemoryStore, Store, StoreResult};
