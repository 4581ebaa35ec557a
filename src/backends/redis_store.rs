//! Redis-backed shared store.
//!
//! The store for multi-instance deployments: every instance reads the
//! entries every other instance writes, and Redis expires them server-side.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::error::CacheError;
use crate::traits::ResponseStore;

/// Redis store with `ConnectionManager` for automatic reconnection.
pub struct RedisStore {
    /// Handles reconnection automatically; cloning shares the underlying
    /// multiplexed connection.
    conn_manager: ConnectionManager,
}

impl RedisStore {
    /// Connect using `REDIS_URL`, falling back to a local instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created or the connection
    /// check fails.
    pub async fn new() -> Result<Self, CacheError> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        Self::with_url(&redis_url).await
    }

    /// Connect to a specific Redis instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created or the connection
    /// check fails.
    pub async fn with_url(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)
            .with_context(|| format!("failed to create Redis client for {redis_url}"))
            .map_err(CacheError::store)?;

        let conn_manager = ConnectionManager::new(client)
            .await
            .context("failed to establish Redis connection manager")
            .map_err(CacheError::store)?;

        let mut conn = conn_manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis PING failed")
            .map_err(CacheError::store)?;

        info!(redis_url = %redis_url, "redis store connected");

        Ok(Self { conn_manager })
    }
}

#[async_trait]
impl ResponseStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.conn_manager.clone();

        let value: Option<Vec<u8>> = conn.get(key).await.map_err(CacheError::store)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();

        // SETEX rejects a zero expiry; clamp up rather than fail the write.
        let ttl_secs = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(key, value.as_ref(), ttl_secs)
            .await
            .map_err(CacheError::store)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
