//! Redis-backed store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};

use crate::store::{expiry_secs, Store, StoreResult};
use crate::StoreError;

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Connection URL (e.g. `redis://:password@127.0.0.1:6379/0`).
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

impl RedisConfig {
    /// Create a config for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// [`Store`] implementation over a multiplexed Redis connection.
///
/// The connection is opened once and cloned per command; clones share the
/// same underlying socket.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let store = RedisStore::connect(&RedisConfig::new("redis://127.0.0.1:6379")).await?;
    /// ```
    pub async fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        tracing::info!(url = %redacted(&config.url), "connected to redis");
        Ok(Self { conn })
    }
}

/// Strip credentials from a connection URL for logging.
fn redacted(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| StoreError::command("GET", e.to_string()))
    }

    async fn set(&self, key: &str, value: String, expire: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        match expiry_secs(expire) {
            Some(secs) => conn
                .set_ex::<_, _, ()>(key, value, secs)
                .await
                .map_err(|e| StoreError::command("SETEX", e.to_string())),
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(|e| StoreError::command("SET", e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| StoreError::command("DEL", e.to_string()))
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        conn.hgetall(key)
            .await
            .map_err(|e| StoreError::command("HGETALL", e.to_string()))
    }

    async fn hash_set_many(&self, key: &str, fields: &HashMap<String, String>) -> StoreResult<()> {
        // HSET with no fields is a syntax error on the server
        if fields.is_empty() {
            return Ok(());
        }
        let items: Vec<(&str, &str)> = fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let mut conn = self.conn.clone();
        conn.hset_multiple::<_, _, _, ()>(key, &items)
            .await
            .map_err(|e| StoreError::command("HSET", e.to_string()))
    }

    async fn get_delete(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get_del(key)
            .await
            .map_err(|e| StoreError::command("GETDEL", e.to_string()))
    }
}
