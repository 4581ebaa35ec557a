//! Moka-backed in-memory store.
//!
//! Capacity-bounded alternative to [`MemoryStore`](super::MemoryStore) for
//! single-process deployments with large keyspaces.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use tracing::info;

use crate::error::CacheError;
use crate::traits::ResponseStore;

/// A stored payload with its expiry instant.
///
/// Moka's own `time_to_live` is a single cache-wide setting; per-entry TTLs
/// are enforced by stamping each entry and checking on read.
#[derive(Debug, Clone)]
struct StoredEntry {
    value: Bytes,
    expires_at: Instant,
}

impl StoredEntry {
    fn new(value: Bytes, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Configuration for [`MokaStore`].
#[derive(Debug, Clone, Copy)]
pub struct MokaStoreConfig {
    /// Max number of entries before eviction kicks in.
    pub max_capacity: u64,
    /// Cache-wide ceiling on entry lifetime, applied on top of per-entry
    /// TTLs.
    pub time_to_live: Duration,
    /// How long an unread entry survives.
    pub time_to_idle: Duration,
}

impl Default for MokaStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 2000,
            time_to_live: Duration::from_secs(3600),
            time_to_idle: Duration::from_secs(600),
        }
    }
}

/// Capacity-bounded in-memory store with per-key TTL support.
pub struct MokaStore {
    cache: Cache<String, StoredEntry>,
}

impl MokaStore {
    pub fn new(config: MokaStoreConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.time_to_live)
            .time_to_idle(config.time_to_idle)
            .build();

        info!(capacity = config.max_capacity, "moka store initialized");

        Self { cache }
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MokaStore {
    fn default() -> Self {
        Self::new(MokaStoreConfig::default())
    }
}

#[async_trait]
impl ResponseStore for MokaStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        if let Some(entry) = self.cache.get(key).await {
            if entry.is_expired() {
                self.cache.remove(key).await;
                return Ok(None);
            }
            return Ok(Some(entry.value));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let entry = StoredEntry::new(value, ttl);
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "moka"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn per_entry_ttl_wins_over_cache_ceiling() {
        let store = MokaStore::default();
        store
            .set("k", Bytes::from_static(b"v"), Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn live_entries_are_served() {
        let store = MokaStore::default();
        store
            .set("k", Bytes::from_static(b"v"), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            store.get("k").await.unwrap(),
            Some(Bytes::from_static(b"v"))
        );
    }
}
