//! Error taxonomy for the cache layer.
//!
//! Handler failures are never wrapped by this type: the middleware propagates
//! them to the caller unchanged and skips the cache and purge steps for that
//! call.

use thiserror::Error;

/// Errors raised by the cache layer's collaborators.
///
/// Most variants never reach a caller. Store failures degrade to a cache miss
/// on read and are logged and swallowed on write; purge failures are logged
/// and swallowed so an already-successful mutation does not appear failed.
/// Only [`CacheError::Preferences`] fails the call: proceeding without
/// exclusion data would leak hidden content.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key-value store could not serve a get or set.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),

    /// A payload could not be encoded for storage.
    #[error("encode failed for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A stored payload could not be decoded.
    #[error("decode failed for key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The edge purge call failed.
    #[error("purge failed for {tag_count} tag(s): {source}")]
    Purge {
        tag_count: usize,
        #[source]
        source: anyhow::Error,
    },

    /// A visibility-preference lookup failed.
    #[error("preference lookup '{lookup}' failed: {source}")]
    Preferences {
        lookup: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl CacheError {
    /// Wrap a backend error as a store failure.
    pub fn store(source: impl Into<anyhow::Error>) -> Self {
        Self::StoreUnavailable(source.into())
    }

    /// Wrap a serialization error for the given key.
    pub fn encode(key: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Encode {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Wrap a deserialization error for the given key.
    pub fn decode(key: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Decode {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Wrap a CDN purge error.
    pub fn purge(tag_count: usize, source: impl Into<anyhow::Error>) -> Self {
        Self::Purge {
            tag_count,
            source: source.into(),
        }
    }

    /// Wrap a preference-source error for the named lookup.
    pub fn preferences(lookup: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Preferences {
            lookup,
            source: source.into(),
        }
    }
}
