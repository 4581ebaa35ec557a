//! RPC Edge Cache
//!
//! Request-pipeline middleware for an RPC service, covering:
//! - **Preference Filtering**: browsing-mode resolution plus per-viewer
//!   exclusion lists folded into call inputs before anything else runs
//! - **Application Cache**: read-through response caching against an
//!   injected key-value store, keyed by canonicalized inputs
//! - **Edge Annotation**: CDN cache-control directives for successful
//!   responses, with tag-based addressing
//! - **Purge-on-Write**: tag purges fired after successful mutations
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rpc_edge_cache::{CacheOptions, CachePipelineBuilder, CallContext};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = CachePipelineBuilder::new().build();
//!
//!     let ctx = CallContext::anonymous();
//!     let input = pipeline.preferences().apply(&json!({ "limit": 20 }), &ctx).await?;
//!
//!     ctx.allow_caching();
//!     let outcome = pipeline
//!         .app_cache()
//!         .wrap("tag.list", &input, &CacheOptions::default(), &ctx, || async {
//!             anyhow::Ok(json!({ "items": ["fog", "mist"] }))
//!         })
//!         .await?;
//!
//!     tracing::info!(hit = outcome.is_hit(), "tag.list served");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Request → PreferenceFilter → ApplicationCache → EdgeCacheAnnotator → Handler
//!           rewrite input      hit? return        attach directive
//!
//! Mutation → PurgeCoordinator → Handler → purge tags on success
//! ```
//!
//! The two caches answer different questions. The application cache stores
//! payloads itself in a store the service owns; the edge annotator stores
//! nothing and instead tells the CDN how long to keep a response and which
//! tags address it. Both key off the same canonicalized input, which by then
//! carries the viewer's browsing mode and exclusions, so no viewer can be
//! served a payload filtered for someone else.

pub mod app_cache;
pub mod backends;
pub mod builder;
pub mod canonical;
pub mod codecs;
pub mod context;
pub mod edge_cache;
pub mod error;
pub mod key;
pub mod preferences;
pub mod purge;
pub mod traits;

pub use app_cache::{ApplicationCache, CacheOptions, CacheStats, DEFAULT_TTL};
pub use builder::CachePipelineBuilder;
pub use canonical::{CanonicalInput, canonicalize, to_canonical_json};
pub use codecs::JsonCodec;
#[cfg(feature = "msgpack")]
pub use codecs::MsgpackCodec;
pub use context::{
    BrowsingMode, CacheDirective, CallContext, CallOutcome, ImageId, TagId, UserId, Viewer,
};
pub use edge_cache::{
    DEFAULT_EDGE_TTL, DISABLED_EDGE_TTL, EdgeCacheAnnotator, EdgeCacheOptions, Environment,
    TtlSetting,
};
pub use error::CacheError;
pub use key::CacheKeyBuilder;
pub use preferences::{PreferenceFilter, StaticPreferences, VisibilityExclusions, resolve_mode};
pub use purge::{NoopPurger, PurgeCoordinator};
pub use traits::{CacheCodec, EdgePurger, HiddenTags, PreferenceSource, ResponseStore};

// Re-export async_trait for user convenience
pub use async_trait::async_trait;

use std::sync::Arc;

/// Assembled middleware set for one service.
///
/// Built once at startup via [`CachePipelineBuilder`] and shared across
/// requests; per-call state lives in [`CallContext`], never here.
///
/// # Example
///
/// ```rust,no_run
/// use rpc_edge_cache::CachePipelineBuilder;
///
/// let pipeline = CachePipelineBuilder::new().build();
/// let stats = pipeline.app_cache().stats();
/// ```
pub struct CachePipeline {
    pub(crate) preferences: PreferenceFilter,
    pub(crate) app: Arc<ApplicationCache>,
    pub(crate) edge: EdgeCacheAnnotator,
    pub(crate) purge: PurgeCoordinator,
}

impl CachePipeline {
    /// Input filtering; runs before any caching.
    pub fn preferences(&self) -> &PreferenceFilter {
        &self.preferences
    }

    /// The application-level response cache.
    pub fn app_cache(&self) -> &ApplicationCache {
        &self.app
    }

    /// The edge directive annotator.
    pub fn edge_cache(&self) -> &EdgeCacheAnnotator {
        &self.edge
    }

    /// Purge-on-write coordination for mutations.
    pub fn purge(&self) -> &PurgeCoordinator {
        &self.purge
    }
}
