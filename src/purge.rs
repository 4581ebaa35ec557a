//! Purge-on-write invalidation.
//!
//! Mutations that change edge-cached content purge the matching tags right
//! after they succeed, instead of waiting out the edge TTL.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::traits::EdgePurger;

/// Middleware that purges edge tags after successful mutations.
pub struct PurgeCoordinator {
    purger: Arc<dyn EdgePurger>,
}

impl PurgeCoordinator {
    pub fn new(purger: Arc<dyn EdgePurger>) -> Self {
        Self { purger }
    }

    pub fn purger_name(&self) -> &'static str {
        self.purger.name()
    }

    /// Wrap a mutating handler.
    ///
    /// A successful handler triggers exactly one purge for `tags`, awaited
    /// to completion before the result is returned. A failed handler purges
    /// nothing, keeping the edge consistent with a mutation that never
    /// happened.
    ///
    /// # Errors
    ///
    /// Returns exactly the handler's error. Purge failures are logged and
    /// swallowed; the mutation already succeeded and must not appear failed.
    pub async fn wrap<T, E, F, Fut>(&self, tags: &[String], handler: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let payload = handler().await?;
        self.purge(tags).await;
        Ok(payload)
    }

    /// Fire one purge for `tags`, logging and swallowing failures.
    ///
    /// Stale copies left behind by a failed purge expire by their edge TTL.
    pub async fn purge(&self, tags: &[String]) {
        match self.purger.purge(tags).await {
            Ok(()) => {
                debug!(
                    purger = self.purger.name(),
                    tag_count = tags.len(),
                    "edge purge issued"
                );
            }
            Err(err) => {
                warn!(
                    purger = self.purger.name(),
                    tag_count = tags.len(),
                    error = %err,
                    "edge purge failed, stale copies expire by TTL"
                );
            }
        }
    }
}

/// Purger for deployments without an edge network.
///
/// Logs and discards purge requests. The builder wires this in by default
/// so development setups work without CDN credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPurger;

#[async_trait]
impl EdgePurger for NoopPurger {
    async fn purge(&self, tags: &[String]) -> Result<(), CacheError> {
        debug!(tag_count = tags.len(), "no edge network, purge discarded");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
