//! Collaborator seams for the cache layer.
//!
//! The key-value store, the CDN purge API, the preference source, and the
//! payload codec are external systems. Each is injected as a trait object so
//! deployments can wire real backends while tests wire in-memory fakes.
//!
//! # Example: Custom Store
//!
//! ```rust,ignore
//! use rpc_edge_cache::{ResponseStore, CacheError, async_trait};
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! struct MyStore {
//!     // Your implementation
//! }
//!
//! #[async_trait]
//! impl ResponseStore for MyStore {
//!     async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
//!         // Your implementation
//!     }
//!
//!     async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
//!         // Your implementation
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "my-store"
//!     }
//! }
//! ```

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::context::{ImageId, TagId, UserId};
use crate::error::CacheError;

/// Key-value store consumed by the application cache.
///
/// Implementations are expected to expire entries on their own once the `ttl`
/// passed to [`set`](ResponseStore::set) has elapsed; the cache layer never
/// deletes application-cache entries explicitly.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to support concurrent access across
/// async tasks.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Look up a previously stored payload.
    ///
    /// Returns `Ok(None)` both for keys that were never written and for keys
    /// whose entry has expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Store a payload under `key` for `ttl`.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    /// Name of this store, used in log output.
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// CDN purge API invoked after successful mutations.
///
/// Purges are tag-addressed: the CDN drops every cached response annotated
/// with any of the given tags. Calls are best effort; a failed purge leaves
/// stale copies to expire by their TTL.
#[async_trait]
pub trait EdgePurger: Send + Sync {
    /// Ask the CDN to drop all responses annotated with any of `tags`.
    async fn purge(&self, tags: &[String]) -> Result<(), CacheError>;

    /// Name of this purger, used in log output.
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// Tag sets hidden from a viewer, split by reason.
///
/// `hidden` tags were excluded by the viewer themselves; `moderated` tags are
/// platform-flagged. Both feed the same exclusion list on the way out, and
/// duplicates between the two sets are preserved as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenTags {
    pub hidden: Vec<TagId>,
    pub moderated: Vec<TagId>,
}

/// Per-viewer visibility preference lookups.
///
/// Backed by the user-preference service in production. Every method is a
/// remote call; [`PreferenceFilter`](crate::preferences::PreferenceFilter)
/// issues the per-viewer lookups concurrently.
#[async_trait]
pub trait PreferenceSource: Send + Sync {
    /// Tags this viewer has hidden, plus tags moderated away from them.
    async fn hidden_tags(&self, user: UserId) -> Result<HiddenTags, CacheError>;

    /// Users this viewer has blocked.
    async fn hidden_users(&self, user: UserId) -> Result<Vec<UserId>, CacheError>;

    /// Individual images this viewer has hidden.
    async fn hidden_images(&self, user: UserId) -> Result<Vec<ImageId>, CacheError>;

    /// System-wide moderation baseline applied in safe-for-work mode.
    async fn system_hidden_tags(&self) -> Result<HiddenTags, CacheError>;
}

/// Payload serialization seam for the application cache.
///
/// Codecs convert between the JSON value of a response payload and the raw
/// bytes handed to the store. Decode must accept exactly what encode
/// produced; entries written by a different codec surface as decode errors
/// and are served as misses.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync + Debug` to support concurrent access
/// across async tasks and provide debugging capabilities.
pub trait CacheCodec: Send + Sync + Debug {
    /// Serialize a payload value to store bytes.
    fn encode(&self, value: &Value) -> Result<Bytes, CacheError>;

    /// Deserialize store bytes back into a payload value.
    fn decode(&self, bytes: &[u8]) -> Result<Value, CacheError>;

    /// Name of this codec, used in log output.
    fn name(&self) -> &'static str;
}
