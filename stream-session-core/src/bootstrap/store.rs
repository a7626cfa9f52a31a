//! Record store initialization

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use tracing::{info, warn};

use crate::config::RedisConfig;
use crate::repository::{MemoryStreamRepository, RedisStreamRepository, StreamRepository};

/// Connect the record store
///
/// An empty `redis.url` selects the in-process store; records then live only
/// as long as the process.
pub async fn init_repository(config: &RedisConfig) -> Result<Arc<dyn StreamRepository>> {
    if config.url.is_empty() {
        warn!("No Redis URL configured, stream records will not survive a restart");
        return Ok(Arc::new(MemoryStreamRepository::new()));
    }

    let client = redis::Client::open(config.url.as_str())
        .with_context(|| format!("Invalid Redis URL {}", config.redacted_url()))?;
    let conn = tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_seconds),
        ConnectionManager::new(client),
    )
    .await
    .with_context(|| format!("Timed out connecting to Redis at {}", config.redacted_url()))?
    .with_context(|| format!("Failed to connect to Redis at {}", config.redacted_url()))?;

    info!(url = %config.redacted_url(), "Connected to Redis");

    Ok(Arc::new(RedisStreamRepository::new(
        conn,
        config.key_prefix.clone(),
        Duration::from_secs(config.operation_timeout_seconds),
    )))
}
