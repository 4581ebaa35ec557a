//! Edge-cache directive middleware.
//!
//! Unlike the application cache this layer stores nothing itself. It
//! computes cache-control metadata for successful responses and deposits it
//! on the call context; the CDN in front of the service does the actual
//! caching once the transport layer renders the metadata into headers.
//!
//! Outside production there is no CDN to rely on, so the annotator degrades
//! to direct storage through the application cache with the same effective
//! TTL.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::app_cache::{ApplicationCache, CacheOptions};
use crate::context::{CacheDirective, CallContext, CallOutcome};

/// Edge TTL when a call site does not specify one.
pub const DEFAULT_EDGE_TTL: Duration = Duration::from_secs(180);

/// Edge TTL when per-call control is disabled.
///
/// Disabled control means "cache long and rely on purges", not "never
/// cache".
pub const DISABLED_EDGE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Ceiling on the browser-facing TTL. Browsers cannot be purged, so their
/// copies must stay short-lived however long the edge keeps one.
const BROWSER_TTL_CAP: Duration = Duration::from_secs(60);

const STALE_WHILE_REVALIDATE: Duration = Duration::from_secs(30);

/// Deployment environment, which decides whether edge metadata is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// A CDN fronts the service; emit directives.
    Production,
    /// No CDN; fall back to the application cache.
    Development,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Per-call edge TTL control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TtlSetting {
    /// Use [`DEFAULT_EDGE_TTL`].
    #[default]
    Default,
    /// Fixed TTL in seconds.
    Seconds(u64),
    /// Per-call control disabled; use [`DISABLED_EDGE_TTL`].
    Disabled,
}

/// Recomputes an absolute expiry instant for each call.
pub type ExpireAt = Arc<dyn Fn() -> SystemTime + Send + Sync>;

/// Derives invalidation tags from a call input.
pub type TagSource = Arc<dyn Fn(&Value) -> Vec<String> + Send + Sync>;

/// Per-call-site configuration for [`EdgeCacheAnnotator::wrap`].
#[derive(Clone, Default)]
pub struct EdgeCacheOptions {
    /// Override for the namespace segment of the fallback cache key.
    pub key: Option<String>,
    /// TTL control; ignored when `expire_at` is set.
    pub ttl: TtlSetting,
    /// Absolute expiry instant, recomputed per call. Useful for content
    /// that flips at a known wall-clock time, such as a leaderboard reset.
    pub expire_at: Option<ExpireAt>,
    /// Tag derivation from the call input; derived tags are normalized to
    /// slug form before they reach the directive.
    pub tags: Option<TagSource>,
    /// Input fields excluded from fallback key derivation.
    pub exclude_keys: Vec<String>,
}

impl EdgeCacheOptions {
    /// Fixed TTL in seconds.
    #[must_use]
    pub fn ttl_secs(mut self, secs: u64) -> Self {
        self.ttl = TtlSetting::Seconds(secs);
        self
    }

    /// Expire at an absolute instant, recomputed per call.
    #[must_use]
    pub fn expire_at(mut self, at: impl Fn() -> SystemTime + Send + Sync + 'static) -> Self {
        self.expire_at = Some(Arc::new(at));
        self
    }

    /// Derive invalidation tags from the call input.
    #[must_use]
    pub fn tags(mut self, tags: impl Fn(&Value) -> Vec<String> + Send + Sync + 'static) -> Self {
        self.tags = Some(Arc::new(tags));
        self
    }
}

/// Middleware that annotates successful responses with edge directives.
pub struct EdgeCacheAnnotator {
    env: Environment,
    fallback: Arc<ApplicationCache>,
}

impl EdgeCacheAnnotator {
    pub fn new(env: Environment, fallback: Arc<ApplicationCache>) -> Self {
        Self { env, fallback }
    }

    pub fn environment(&self) -> Environment {
        self.env
    }

    /// Wrap a handler invocation with edge annotation.
    ///
    /// In production the handler always runs; on success, if the call opted
    /// into caching, a [`CacheDirective`] lands on the context for the
    /// transport layer. Outside production the call is delegated to the
    /// application cache so development still exercises caching end to end.
    ///
    /// # Errors
    ///
    /// Returns exactly the handler's error; no directive is attached for
    /// failed calls.
    pub async fn wrap<T, E, F, Fut>(
        &self,
        operation_path: &str,
        input: &Value,
        opts: &EdgeCacheOptions,
        ctx: &CallContext,
        handler: F,
    ) -> Result<CallOutcome<T>, E>
    where
        T: Serialize + DeserializeOwned + Send,
        E: Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let ttl = effective_ttl(opts);

        if !self.env.is_production() {
            let app_opts = CacheOptions {
                key: opts.key.clone(),
                ttl: Some(ttl),
                exclude_keys: opts.exclude_keys.clone(),
            };
            return self.fallback.wrap(operation_path, input, &app_opts, ctx, handler).await;
        }

        let payload = handler().await?;

        if ctx.can_cache() {
            let directive = CacheDirective {
                browser_ttl: ttl.min(BROWSER_TTL_CAP),
                edge_ttl: ttl,
                stale_while_revalidate: STALE_WHILE_REVALIDATE,
                tags: derive_tags(opts, input),
            };
            debug!(
                request_id = %ctx.request_id(),
                edge_ttl_secs = directive.edge_ttl.as_secs(),
                tag_count = directive.tags.len(),
                "edge directive attached"
            );
            ctx.set_directive(directive);
        } else {
            debug!(
                request_id = %ctx.request_id(),
                "call did not opt into caching, no edge directive"
            );
        }

        Ok(CallOutcome::Miss(payload))
    }
}

/// Effective TTL for one call.
///
/// An `expire_at` override wins over the `ttl` setting and is recomputed on
/// every call; an instant already in the past yields a zero TTL rather than
/// an error.
fn effective_ttl(opts: &EdgeCacheOptions) -> Duration {
    if let Some(expire_at) = &opts.expire_at {
        return expire_at()
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);
    }
    match opts.ttl {
        TtlSetting::Default => DEFAULT_EDGE_TTL,
        TtlSetting::Seconds(secs) => Duration::from_secs(secs),
        TtlSetting::Disabled => DISABLED_EDGE_TTL,
    }
}

fn derive_tags(opts: &EdgeCacheOptions, input: &Value) -> Vec<String> {
    match &opts.tags {
        Some(tags) => tags(input).iter().map(|tag| slug::slugify(tag)).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ttl_setting_maps_to_durations() {
        let default = EdgeCacheOptions::default();
        assert_eq!(effective_ttl(&default), DEFAULT_EDGE_TTL);

        let fixed = EdgeCacheOptions::default().ttl_secs(500);
        assert_eq!(effective_ttl(&fixed), Duration::from_secs(500));

        let disabled = EdgeCacheOptions {
            ttl: TtlSetting::Disabled,
            ..Default::default()
        };
        assert_eq!(effective_ttl(&disabled), DISABLED_EDGE_TTL);
    }

    #[test]
    fn expire_at_overrides_ttl_setting() {
        let opts = EdgeCacheOptions::default()
            .ttl_secs(500)
            .expire_at(|| SystemTime::now() + Duration::from_secs(90));

        let ttl = effective_ttl(&opts);
        assert!(ttl > Duration::from_secs(85) && ttl <= Duration::from_secs(90));
    }

    #[test]
    fn past_expire_at_clamps_to_zero() {
        let opts =
            EdgeCacheOptions::default().expire_at(|| SystemTime::now() - Duration::from_secs(10));

        assert_eq!(effective_ttl(&opts), Duration::ZERO);
    }

    #[test]
    fn derived_tags_are_slug_normalized() {
        let opts = EdgeCacheOptions::default()
            .tags(|input| vec![format!("Model {}", input["id"]), "Front Page!".to_string()]);

        let tags = derive_tags(&opts, &json!({ "id": 42 }));

        assert_eq!(tags, vec!["model-42".to_string(), "front-page".to_string()]);
    }

    #[test]
    fn no_tag_source_means_no_tags() {
        let opts = EdgeCacheOptions::default();
        assert!(derive_tags(&opts, &json!({})).is_empty());
    }
}
