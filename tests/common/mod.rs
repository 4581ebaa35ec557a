//! Shared fixtures for integration tests: fake collaborators that record
//! calls, fail on demand, and serve fixed preference data.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use rpc_edge_cache::{
    CacheError, EdgePurger, HiddenTags, ImageId, PreferenceSource, ResponseStore,
    StaticPreferences, UserId,
};

/// Unique namespace per test so parallel tests never share keys.
pub fn test_namespace(name: &str) -> String {
    format!("test_{}_{}", name, rand::random::<u32>())
}

/// Purger that records every tag set it was asked to purge.
#[derive(Default)]
pub struct RecordingPurger {
    calls: Mutex<Vec<Vec<String>>>,
    fail: AtomicBool,
}

impl RecordingPurger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent purges fail.
    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::Relaxed);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl EdgePurger for RecordingPurger {
    async fn purge(&self, tags: &[String]) -> Result<(), CacheError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(CacheError::purge(tags.len(), anyhow!("purge endpoint down")));
        }
        self.calls.lock().push(tags.to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Store that fails every operation, for degradation tests.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl ResponseStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        Err(CacheError::store(anyhow!("store offline")))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::store(anyhow!("store offline")))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Preference source that serves fixed data and counts lookups.
pub struct CountingPreferences {
    inner: StaticPreferences,
    pub tag_lookups: AtomicUsize,
    pub user_lookups: AtomicUsize,
    pub image_lookups: AtomicUsize,
    pub system_lookups: AtomicUsize,
    fail_users: AtomicBool,
}

impl CountingPreferences {
    pub fn new(inner: StaticPreferences) -> Arc<Self> {
        Arc::new(Self {
            inner,
            tag_lookups: AtomicUsize::new(0),
            user_lookups: AtomicUsize::new(0),
            image_lookups: AtomicUsize::new(0),
            system_lookups: AtomicUsize::new(0),
            fail_users: AtomicBool::new(false),
        })
    }

    /// Make subsequent hidden-user lookups fail.
    pub fn fail_user_lookups(&self) {
        self.fail_users.store(true, Ordering::Relaxed);
    }

    pub fn total_lookups(&self) -> usize {
        self.tag_lookups.load(Ordering::Relaxed)
            + self.user_lookups.load(Ordering::Relaxed)
            + self.image_lookups.load(Ordering::Relaxed)
            + self.system_lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PreferenceSource for CountingPreferences {
    async fn hidden_tags(&self, user: UserId) -> Result<HiddenTags, CacheError> {
        self.tag_lookups.fetch_add(1, Ordering::Relaxed);
        self.inner.hidden_tags(user).await
    }

    async fn hidden_users(&self, user: UserId) -> Result<Vec<UserId>, CacheError> {
        self.user_lookups.fetch_add(1, Ordering::Relaxed);
        if self.fail_users.load(Ordering::Relaxed) {
            return Err(CacheError::preferences(
                "hidden_users",
                anyhow!("preference service timeout"),
            ));
        }
        self.inner.hidden_users(user).await
    }

    async fn hidden_images(&self, user: UserId) -> Result<Vec<ImageId>, CacheError> {
        self.image_lookups.fetch_add(1, Ordering::Relaxed);
        self.inner.hidden_images(user).await
    }

    async fn system_hidden_tags(&self) -> Result<HiddenTags, CacheError> {
        self.system_lookups.fetch_add(1, Ordering::Relaxed);
        self.inner.system_hidden_tags().await
    }
}

/// Preference data used across the preference-filter tests.
pub fn sample_preferences() -> StaticPreferences {
    StaticPreferences {
        hidden_tags: HiddenTags {
            hidden: vec![101, 102],
            moderated: vec![201],
        },
        hidden_users: vec![11, 12],
        hidden_images: vec![900, 901],
        system_tags: HiddenTags {
            hidden: vec![501],
            moderated: vec![502],
        },
    }
}

/// Payload shapes used across tests.
pub mod test_data {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
    pub struct Listing {
        pub items: Vec<String>,
        pub total: u64,
    }

    impl Listing {
        pub fn sample() -> Self {
            Self {
                items: vec!["fog".to_string(), "mist".to_string()],
                total: 2,
            }
        }
    }
}
