//! kvcart demo - a single shopping cart served over HTTP.
//!
//! Routes:
//! - `GET /` - Render the cart
//! - `POST /add-item/` - Add an item (merges by title)
//! - `GET /remove-item/{id}/` - Remove a line item
//! - `GET /increment/{id}/`, `GET /decrement/{id}/` - Adjust quantity
//! - `GET /clear-cart/` - Empty the cart
//! - `POST /apply-overall-discount/` - Set the cart-wide discount

mod config;
mod render;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kvcart_cache::{CacheManager, MemoryStore, RedisStore, Store};
use kvcart_commerce::CartService;
use kvcart_observability::{LogFormat, LogLevel};

use config::{DemoConfig, StoreBackend};

/// Serve a Redis-backed shopping cart
#[derive(Parser)]
#[command(name = "kvcart-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (defaults to searching for kvcart.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// Redis connection URL
    #[arg(long, env = "KVCART_REDIS_URL")]
    redis_url: Option<String>,

    /// Use the in-process store instead of Redis
    #[arg(long)]
    memory: bool,

    /// Cart identifier
    #[arg(long)]
    cart_id: Option<String>,

    /// Minimum log level
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Log output format (json or human)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Cli {
    /// Resolve the config file and apply command-line overrides.
    fn config(&self) -> Result<DemoConfig> {
        let mut config = match &self.config {
            Some(path) => DemoConfig::load(path)?,
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                DemoConfig::find(&cwd)?.unwrap_or_default()
            }
        };

        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(url) = &self.redis_url {
            config.redis.url = url.clone();
        }
        if self.memory {
            config.store.backend = StoreBackend::Memory;
        }
        if let Some(id) = &self.cart_id {
            config.cart.id = id.clone();
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        Ok(config)
    }
}

async fn open_store(config: &DemoConfig) -> Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.redis)
                .await
                .context("Failed to connect to Redis")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-process store; cart data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;

    kvcart_observability::init(&config.logging)?;

    let store = open_store(&config).await?;
    let cache = Arc::new(CacheManager::new(store));

    let mut service = CartService::new(cache, config.cart.id.as_str());
    if let Some(ttl) = config.cart.ttl() {
        service = service.with_ttl(ttl);
    }

    let app = server::router(server::AppState { service });

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(
        addr = %config.server.bind,
        cart = %config.cart.id,
        backend = ?config.store.backend,
        "kvcart demo listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
