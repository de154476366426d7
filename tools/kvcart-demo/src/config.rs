//! Demo server configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use kvcart_cache::RedisConfig;
use kvcart_observability::LogConfig;
use serde::{Deserialize, Serialize};

/// File names searched for when no config path is given.
pub const CONFIG_NAMES: [&str; 3] = ["kvcart.toml", ".kvcart.toml", "kvcart.json"];

/// Demo configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Which store backs the cache.
    #[serde(default)]
    pub store: StoreConfig,

    /// Redis connection, used when `store.backend` is `redis`.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Cart served by the demo.
    #[serde(default)]
    pub cart: CartConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LogConfig,
}

impl DemoConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Find a config file in `start` or its parent directories.
    pub fn find(start: &Path) -> Result<Option<Self>> {
        for dir in start.ancestors() {
            for name in CONFIG_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    tracing::debug!(path = %candidate.display(), "using config file");
                    return Self::load(&candidate).map(Some);
                }
            }
        }
        Ok(None)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Store backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redis server.
    #[default]
    Redis,
    /// In-process store; data is lost on exit.
    Memory,
}

/// Store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend to use.
    #[serde(default)]
    pub backend: StoreBackend,
}

/// Cart configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartConfig {
    /// Cart identifier, also its cache key.
    #[serde(default = "default_cart_id")]
    pub id: String,

    /// Expire the stored cart after this many seconds without changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

fn default_cart_id() -> String {
    "user123-cart".to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            id: default_cart_id(),
            ttl_secs: None,
        }
    }
}

impl CartConfig {
    /// Cart TTL, if configured.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}
