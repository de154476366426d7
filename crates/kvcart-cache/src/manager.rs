//! JSON-aware cache manager.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{CacheError, CacheResult, Store};

/// Typed cache over a [`Store`].
///
/// Values are encoded as JSON before they are written and decoded after they
/// are read. Every failure is logged here before it is returned, so callers
/// only decide what to do with it.
///
/// # Example
///
/// ```rust,ignore
/// let cache = CacheManager::from_store(MemoryStore::new());
///
/// cache.set("cart:user123", &cart, None).await?;
/// let cart: Option<Cart> = cache.get("cart:user123").await?;
/// cache.delete("cart:user123").await?;
/// ```
pub struct CacheManager {
    store: Arc<dyn Store>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager").finish_non_exhaustive()
    }
}

/// Exclusive access to one cache key, released on drop.
///
/// Only coordinates callers sharing the same [`CacheManager`]; other
/// processes writing to the backend are not excluded.
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

impl KeyGuard {
    /// The locked key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl CacheManager {
    /// Create a manager over a shared store handle.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a manager that owns its store.
    pub fn from_store<S: Store + 'static>(store: S) -> Self {
        Self::new(Arc::new(store))
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Get and decode a value.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::warn!(key, "no data found for key");
                return Ok(None);
            }
            Err(e) => {
                tracing::error!(key, error = %e, "cannot get cache data");
                return Err(e.into());
            }
        };
        decode(key, raw).map(Some)
    }

    /// Encode and store a value, optionally expiring after `ttl`.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let encoded = serde_json::to_string(value).map_err(|e| {
            tracing::error!(key, error = %e, "cannot encode cache data");
            CacheError::Encode(e)
        })?;
        self.store.set(key, encoded, ttl).await.map_err(|e| {
            tracing::error!(key, error = %e, "cannot set cache data");
            e.into()
        })
    }

    /// Delete a value.
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.store.delete(key).await.map_err(|e| {
            tracing::error!(key, error = %e, "cannot delete cache data");
            e.into()
        })
    }

    /// Atomically read, decode and remove a value.
    ///
    /// Returns `Ok(None)` if the key doesn't exist. The key is removed even
    /// when decoding fails.
    pub async fn get_delete<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.store.get_delete(key).await {
            Ok(Some(raw)) => decode(key, raw).map(Some),
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::error!(key, error = %e, "cannot get-delete cache data");
                Err(e.into())
            }
        }
    }

    /// Set one field of a cached JSON object and write it back.
    ///
    /// Fails with [`CacheError::NotFound`] when the key is absent and
    /// [`CacheError::NotAMapping`] when the cached value isn't an object.
    /// Runs inside the key's lock scope, so it must not be called while
    /// holding a [`KeyGuard`] for the same key.
    pub async fn update_field<V: Serialize + ?Sized>(
        &self,
        key: &str,
        field: &str,
        value: &V,
    ) -> CacheResult<()> {
        let _guard = self.lock(key).await;

        let mut cached = match self.get::<serde_json::Value>(key).await? {
            Some(serde_json::Value::Object(map)) => map,
            Some(_) => {
                tracing::error!(key, "cached data is not a dictionary");
                return Err(CacheError::NotAMapping(key.to_string()));
            }
            None => return Err(CacheError::NotFound(key.to_string())),
        };

        let value = serde_json::to_value(value).map_err(|e| {
            tracing::error!(key, field, error = %e, "cannot encode field value");
            CacheError::Encode(e)
        })?;
        cached.insert(field.to_string(), value);

        self.set(key, &cached, None).await
    }

    /// Get every field of a hash.
    pub async fn hash_get_all(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        self.store.hash_get_all(key).await.map_err(|e| {
            tracing::error!(key, error = %e, "cannot hgetall cache data");
            e.into()
        })
    }

    /// Set several hash fields at once.
    pub async fn hash_set_many(
        &self,
        key: &str,
        fields: &HashMap<String, String>,
    ) -> CacheResult<()> {
        self.store.hash_set_many(key, fields).await.map_err(|e| {
            tracing::error!(key, error = %e, "cannot hset cache data");
            e.into()
        })
    }

    /// Acquire the lock scope for `key`.
    ///
    /// Read-modify-write sequences run under this guard cannot interleave
    /// with each other for the same key.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let slot = {
            let mut locks = self.locks.lock().await;
            // Drop slots nobody holds or waits on
            locks.retain(|k, slot| k == key || Arc::strong_count(slot) > 1);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        KeyGuard {
            key: key.to_string(),
            _guard: slot.lock_owned().await,
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: String) -> CacheResult<T> {
    serde_json::from_str(&raw).map_err(|source| {
        tracing::error!(key, error = %source, "error decoding JSON");
        CacheError::Decode {
            key: key.to_string(),
            raw,
            source,
        }
    })
}
