//! Per-call execution state shared across the middleware chain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = u64;
pub type TagId = u64;
pub type ImageId = u64;

/// Content-visibility mode for a call.
///
/// Serialized as `"all"`, `"sfw"` and `"nsfw"` when it appears inside call
/// inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrowsingMode {
    /// No content filtering.
    All,
    /// Safe-for-work: per-viewer exclusions plus the system moderation
    /// baseline.
    Sfw,
    /// Restricted-only browsing; per-viewer exclusions still apply.
    Nsfw,
}

impl BrowsingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sfw => "sfw",
            Self::Nsfw => "nsfw",
        }
    }
}

/// The authenticated caller as seen by this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub id: UserId,
    /// Whether server policy permits this viewer to browse unrestricted
    /// content. Viewers without this permission are pinned to
    /// [`BrowsingMode::Sfw`] no matter what they request.
    pub can_view_unrestricted: bool,
}

impl Viewer {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            can_view_unrestricted: false,
        }
    }

    pub fn unrestricted(id: UserId) -> Self {
        Self {
            id,
            can_view_unrestricted: true,
        }
    }
}

/// Edge cache-control metadata attached to an in-flight response.
///
/// The transport layer renders this into response headers; nothing here is
/// ever persisted alongside the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirective {
    /// How long browsers may reuse the response.
    pub browser_ttl: Duration,
    /// How long the CDN may reuse the response.
    pub edge_ttl: Duration,
    /// How long the CDN may serve a stale copy while refreshing.
    pub stale_while_revalidate: Duration,
    /// Invalidation tags, already normalized to slug form.
    pub tags: Vec<String>,
}

impl CacheDirective {
    /// Render as a `Cache-Control` header value.
    pub fn cache_control(&self) -> String {
        format!(
            "public, max-age={}, s-maxage={}, stale-while-revalidate={}",
            self.browser_ttl.as_secs(),
            self.edge_ttl.as_secs(),
            self.stale_while_revalidate.as_secs()
        )
    }

    /// Render as a `Cache-Tag` header value, or `None` when the directive
    /// carries no tags.
    pub fn cache_tag(&self) -> Option<String> {
        if self.tags.is_empty() {
            None
        } else {
            Some(self.tags.join(","))
        }
    }
}

/// Tagged result of a cache-wrapped call.
///
/// The tag records where the payload came from on this call. It exists so
/// callers can react to provenance (skip re-caching, annotate logs) and is
/// never persisted; a stored payload re-enters the next call as a plain
/// payload, not as an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    /// Served from the application cache; the handler never ran.
    Hit(T),
    /// Computed by the handler during this call.
    Miss(T),
}

impl<T> CallOutcome<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn payload(&self) -> &T {
        match self {
            Self::Hit(payload) | Self::Miss(payload) => payload,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Hit(payload) | Self::Miss(payload) => payload,
        }
    }
}

/// Mutable per-call state threaded through the middleware chain.
///
/// One context is created per incoming call and shared by reference with
/// every wrapper and the handler. Handlers opt into caching through
/// [`allow_caching`](CallContext::allow_caching); the edge annotator deposits
/// its [`CacheDirective`] here for the transport layer to pick up.
#[derive(Debug)]
pub struct CallContext {
    request_id: Uuid,
    viewer: Option<Viewer>,
    ambient_mode: Option<BrowsingMode>,
    can_cache: AtomicBool,
    directive: Mutex<Option<CacheDirective>>,
}

impl CallContext {
    /// Context for an unauthenticated call.
    pub fn anonymous() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            viewer: None,
            ambient_mode: None,
            can_cache: AtomicBool::new(false),
            directive: Mutex::new(None),
        }
    }

    /// Context for an authenticated call.
    pub fn for_viewer(viewer: Viewer) -> Self {
        Self {
            viewer: Some(viewer),
            ..Self::anonymous()
        }
    }

    /// Set the session-level browsing mode callers inherit when their input
    /// does not name one.
    #[must_use]
    pub fn with_ambient_mode(mut self, mode: BrowsingMode) -> Self {
        self.ambient_mode = Some(mode);
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn viewer(&self) -> Option<Viewer> {
        self.viewer
    }

    pub fn ambient_mode(&self) -> Option<BrowsingMode> {
        self.ambient_mode
    }

    /// Opt this call into response caching.
    ///
    /// Off by default: handlers that never call this are not cached and get
    /// no edge directive, whatever the call-site configuration says.
    pub fn allow_caching(&self) {
        self.can_cache.store(true, Ordering::Relaxed);
    }

    pub fn can_cache(&self) -> bool {
        self.can_cache.load(Ordering::Relaxed)
    }

    /// Deposit the edge directive for the transport layer. A later deposit
    /// replaces an earlier one.
    pub fn set_directive(&self, directive: CacheDirective) {
        *self.directive.lock() = Some(directive);
    }

    /// The edge directive attached to this call, if any wrapper set one.
    pub fn directive(&self) -> Option<CacheDirective> {
        self.directive.lock().clone()
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
