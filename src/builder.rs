//! Pipeline builder.
//!
//! Wires stores, purgers, preference sources and codecs into a
//! [`CachePipeline`]. Defaults favor local development: everything works
//! in-process with no external services.
//!
//! # Example
//!
//! ```rust,no_run
//! use rpc_edge_cache::CachePipelineBuilder;
//!
//! let pipeline = CachePipelineBuilder::new().build();
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::CachePipeline;
use crate::app_cache::{ApplicationCache, DEFAULT_TTL};
use crate::backends::MemoryStore;
use crate::codecs::JsonCodec;
use crate::edge_cache::{EdgeCacheAnnotator, Environment};
use crate::preferences::{PreferenceFilter, StaticPreferences};
use crate::purge::{NoopPurger, PurgeCoordinator};
use crate::traits::{CacheCodec, EdgePurger, PreferenceSource, ResponseStore};

/// Builder for [`CachePipeline`].
///
/// # Default Behavior
///
/// With no customization the pipeline uses:
/// - **Store**: [`MemoryStore`], in-process
/// - **Codec**: [`JsonCodec`]
/// - **Purger**: [`NoopPurger`], which discards purges
/// - **Preferences**: empty [`StaticPreferences`]
/// - **Environment**: [`Environment::Development`]
///
/// Production deployments replace the store with a shared one, the purger
/// with a real CDN client, the preference source with the user service, and
/// set [`Environment::Production`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use rpc_edge_cache::{CachePipelineBuilder, Environment};
/// use rpc_edge_cache::backends::{HttpPurger, RedisStore};
///
/// let pipeline = CachePipelineBuilder::new()
///     .with_store(Arc::new(RedisStore::new().await?))
///     .with_purger(Arc::new(HttpPurger::new("https://cdn.example/purge")))
///     .with_preferences(Arc::new(UserServicePreferences::connect().await?))
///     .environment(Environment::Production)
///     .build();
/// ```
pub struct CachePipelineBuilder {
    store: Option<Arc<dyn ResponseStore>>,
    codec: Option<Arc<dyn CacheCodec>>,
    purger: Option<Arc<dyn EdgePurger>>,
    preferences: Option<Arc<dyn PreferenceSource>>,
    namespace: String,
    environment: Environment,
    default_ttl: Duration,
}

impl CachePipelineBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            codec: None,
            purger: None,
            preferences: None,
            namespace: "rpc".to_string(),
            environment: Environment::Development,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Use a custom key-value store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ResponseStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom payload codec.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn CacheCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Use a custom edge purger.
    #[must_use]
    pub fn with_purger(mut self, purger: Arc<dyn EdgePurger>) -> Self {
        self.purger = Some(purger);
        self
    }

    /// Use a custom preference source.
    #[must_use]
    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceSource>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Namespace segment leading every derived cache key.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Deployment environment; decides whether edge directives are emitted.
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Application-cache TTL for call sites that set none.
    #[must_use]
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Assemble the pipeline.
    pub fn build(self) -> CachePipeline {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn ResponseStore>);
        let codec = self
            .codec
            .unwrap_or_else(|| Arc::new(JsonCodec) as Arc<dyn CacheCodec>);
        let purger = self
            .purger
            .unwrap_or_else(|| Arc::new(NoopPurger) as Arc<dyn EdgePurger>);
        let preferences = self
            .preferences
            .unwrap_or_else(|| Arc::new(StaticPreferences::default()) as Arc<dyn PreferenceSource>);

        let app = Arc::new(
            ApplicationCache::new(store.clone(), codec, self.namespace.clone())
                .with_default_ttl(self.default_ttl),
        );

        info!(
            store = store.name(),
            purger = purger.name(),
            namespace = %self.namespace,
            production = self.environment.is_production(),
            "cache pipeline assembled"
        );

        CachePipeline {
            preferences: PreferenceFilter::new(preferences),
            edge: EdgeCacheAnnotator::new(self.environment, Arc::clone(&app)),
            app,
            purge: PurgeCoordinator::new(purger),
        }
    }
}

impl Default for CachePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
