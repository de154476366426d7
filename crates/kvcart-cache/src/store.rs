//! Key-value store adapter.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::StoreError;

/// Result type for store primitives.
pub type StoreResult<T> = Result<T, StoreError>;

/// Primitive operations against a key-value backend.
///
/// Values are raw strings; encoding is the caller's concern. Implementations
/// make a single attempt per call and report failures as [`StoreError`].
#[async_trait]
pub trait Store: Send + Sync {
    /// Get a string value. Returns `None` if the key doesn't exist.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set a string value, optionally expiring after `expire` (whole seconds).
    async fn set(&self, key: &str, value: String, expire: Option<Duration>) -> StoreResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Get every field of a hash. Missing keys yield an empty map.
    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// Set several hash fields at once.
    async fn hash_set_many(&self, key: &str, fields: &HashMap<String, String>) -> StoreResult<()>;

    /// Atomically read and remove a string value.
    async fn get_delete(&self, key: &str) -> StoreResult<Option<String>>;
}

/// Expiry in whole seconds, or `None` for no expiration.
///
/// A sub-second (zero) expiry is treated as no expiry, matching how the
/// backend rejects `SETEX` with a zero TTL.
pub(crate) fn expiry_secs(expire: Option<Duration>) -> Option<u64> {
    expire.map(|d| d.as_secs()).filter(|secs| *secs > 0)
}

#[derive(Debug, Clone)]
enum MemoryValue {
    String(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: MemoryValue,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process store for development and tests.
///
/// Mirrors the backend's typing rules: string commands against a hash key
/// (and vice versa) fail with a `WRONGTYPE` command error. Expired entries
/// are purged lazily on access.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Whether the store holds no live keys.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Check whether a live key exists.
    pub async fn contains_key(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        live_entry(&mut entries, key).is_some()
    }
}

/// Look up a key, dropping it first if it has expired.
fn live_entry<'a>(
    entries: &'a mut HashMap<String, MemoryEntry>,
    key: &str,
) -> Option<&'a mut MemoryEntry> {
    let now = Instant::now();
    if entries.get(key).is_some_and(|e| e.is_expired(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        match live_entry(&mut entries, key).map(|e| &e.value) {
            Some(MemoryValue::String(s)) => Ok(Some(s.clone())),
            Some(MemoryValue::Hash(_)) => Err(StoreError::command("GET", WRONG_TYPE)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, expire: Option<Duration>) -> StoreResult<()> {
        let expires_at = expiry_secs(expire).map(|secs| Instant::now() + Duration::from_secs(secs));
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: MemoryValue::String(value),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut entries = self.entries.lock().await;
        match live_entry(&mut entries, key).map(|e| &e.value) {
            Some(MemoryValue::Hash(h)) => Ok(h.clone()),
            Some(MemoryValue::String(_)) => Err(StoreError::command("HGETALL", WRONG_TYPE)),
            None => Ok(HashMap::new()),
        }
    }

    async fn hash_set_many(&self, key: &str, fields: &HashMap<String, String>) -> StoreResult<()> {
        // Same as the server: no fields, no key
        if fields.is_empty() {
            return Ok(());
        }
        let mut entries = self.entries.lock().await;
        match live_entry(&mut entries, key) {
            Some(MemoryEntry {
                value: MemoryValue::Hash(h),
                ..
            }) => {
                h.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(())
            }
            Some(_) => Err(StoreError::command("HSET", WRONG_TYPE)),
            None => {
                entries.insert(
                    key.to_string(),
                    MemoryEntry {
                        value: MemoryValue::Hash(fields.clone()),
                        expires_at: None,
                    },
                );
                Ok(())
            }
        }
    }

    async fn get_delete(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        match live_entry(&mut entries, key).map(|e| &e.value) {
            Some(MemoryValue::String(_)) => match entries.remove(key).map(|e| e.value) {
                Some(MemoryValue::String(s)) => Ok(Some(s)),
                _ => Ok(None),
            },
            Some(MemoryValue::Hash(_)) => Err(StoreError::command("GETDEL", WRONG_TYPE)),
            None => Ok(None),
        }
    }
}
