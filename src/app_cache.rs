//! Application-level response cache.
//!
//! Wraps handler invocations with read-through caching against an injected
//! key-value store. The cache is an accelerator, not a dependency: every
//! store failure degrades to normal uncached operation, and the handler's
//! own errors pass through without touching the store.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::context::{CallContext, CallOutcome};
use crate::key::CacheKeyBuilder;
use crate::traits::{CacheCodec, ResponseStore};

/// Entry lifetime when a call site does not specify one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

/// Per-call-site configuration for [`ApplicationCache::wrap`].
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Override for the namespace segment of the derived key.
    pub key: Option<String>,
    /// Entry lifetime; `None` selects the cache's default.
    pub ttl: Option<Duration>,
    /// Input fields excluded from key derivation.
    pub exclude_keys: Vec<String>,
}

/// Counter snapshot from [`ApplicationCache::stats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub store_errors: u64,
}

impl CacheStats {
    /// Hit ratio over all lookups, or 0 when nothing was looked up yet.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.hits as f64 / total as f64
        }
    }
}

/// Read-through response cache over an injected store and codec.
pub struct ApplicationCache {
    store: Arc<dyn ResponseStore>,
    codec: Arc<dyn CacheCodec>,
    keys: CacheKeyBuilder,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    store_errors: AtomicU64,
}

impl ApplicationCache {
    pub fn new(
        store: Arc<dyn ResponseStore>,
        codec: Arc<dyn CacheCodec>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            codec,
            keys: CacheKeyBuilder::new(namespace),
            default_ttl: DEFAULT_TTL,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
        }
    }

    /// Replace the fallback TTL used when a call site sets none.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Wrap a handler invocation with read-through caching.
    ///
    /// On a hit the handler never runs and the payload comes back tagged
    /// [`CallOutcome::Hit`]. On a miss the handler runs; a successful result
    /// is stored only when the call opted in via
    /// [`CallContext::allow_caching`], then comes back tagged
    /// [`CallOutcome::Miss`]. Handler errors are returned unchanged and
    /// nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns exactly the handler's error. Store trouble never surfaces
    /// here; it degrades to a miss or a dropped write.
    pub async fn wrap<T, E, F, Fut>(
        &self,
        operation_path: &str,
        input: &Value,
        opts: &CacheOptions,
        ctx: &CallContext,
        handler: F,
    ) -> Result<CallOutcome<T>, E>
    where
        T: Serialize + DeserializeOwned + Send,
        E: Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let key = self.derive_key(operation_path, input, opts);

        if let Some(payload) = self.get::<T>(&key).await {
            debug!(key = %key, "application cache hit, handler skipped");
            return Ok(CallOutcome::Hit(payload));
        }

        let payload = handler().await?;

        if ctx.can_cache() {
            let ttl = opts.ttl.unwrap_or(self.default_ttl);
            self.set(&key, &payload, ttl).await;
        } else {
            debug!(key = %key, "call did not opt into caching, result not stored");
        }

        Ok(CallOutcome::Miss(payload))
    }

    /// Look up and decode a cached payload.
    ///
    /// Store failures and undecodable entries degrade to a miss; the caller
    /// cannot distinguish them from plain absence.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(err) => {
                self.store_errors.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!(
                    key = %key,
                    store = self.store.name(),
                    error = %err,
                    "store get failed, serving as miss"
                );
                return None;
            }
        };

        let value = match self.codec.decode(&bytes) {
            Ok(value) => value,
            Err(err) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!(
                    key = %key,
                    codec = self.codec.name(),
                    error = %err,
                    "cached entry failed to decode, serving as miss"
                );
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(payload) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(payload)
            }
            Err(err) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!(
                    key = %key,
                    error = %err,
                    "cached entry does not match requested type, serving as miss"
                );
                None
            }
        }
    }

    /// Encode and store a payload, waiting for the write to finish.
    ///
    /// The write runs as its own task so a caller aborted mid-response
    /// cannot cancel a write the handler already earned. Failures are logged
    /// and swallowed; the response was already computed and must still reach
    /// the caller.
    pub async fn set<T: Serialize>(&self, key: &str, payload: &T, ttl: Duration) {
        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, error = %err, "payload not serializable, response not cached");
                return;
            }
        };
        let bytes = match self.codec.encode(&value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    key = %key,
                    codec = self.codec.name(),
                    error = %err,
                    "payload failed to encode, response not cached"
                );
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let owned_key = key.to_string();
        let write = tokio::spawn(async move { store.set(&owned_key, bytes, ttl).await });

        match write.await {
            Ok(Ok(())) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, ttl_secs = ttl.as_secs(), "response cached");
            }
            Ok(Err(err)) => {
                self.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!(
                    key = %key,
                    store = self.store.name(),
                    error = %err,
                    "store set failed, response not cached"
                );
            }
            Err(err) => {
                warn!(key = %key, error = %err, "cache write task failed");
            }
        }
    }

    /// Derive the store key for a call, honoring a per-call namespace
    /// override.
    pub fn derive_key(&self, operation_path: &str, input: &Value, opts: &CacheOptions) -> String {
        match opts.key.as_deref() {
            Some(namespace) => {
                CacheKeyBuilder::new(namespace).for_input(operation_path, input, &opts.exclude_keys)
            }
            None => self.keys.for_input(operation_path, input, &opts.exclude_keys),
        }
    }

    /// Snapshot of the hit/miss/write counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }
}
