//! Store and purger implementations.
//!
//! # Available Backends
//!
//! ## Stores
//! - **Memory** - `DashMap`-based store, always available; the default for
//!   tests and single-process deployments
//! - **Moka** - concurrent in-memory store with capacity-bounded eviction
//!   (feature: `moka`)
//! - **Redis** - shared store for multi-instance deployments (feature:
//!   `redis`)
//!
//! ## Purgers
//! - **Http** - tag purges over the CDN's HTTP API (feature: `http-purge`)
//!
//! # Usage
//!
//! ```rust,ignore
//! use rpc_edge_cache::backends::{MemoryStore, RedisStore};
//!
//! // Explicit store selection
//! let memory = MemoryStore::new();
//! let redis = RedisStore::new().await?;
//! ```

pub mod memory;

#[cfg(feature = "moka")]
pub mod moka_store;

#[cfg(feature = "redis")]
pub mod redis_store;

#[cfg(feature = "http-purge")]
pub mod http_purger;

pub use memory::MemoryStore;

#[cfg(feature = "moka")]
#[cfg_attr(docsrs, doc(cfg(feature = "moka")))]
pub use moka_store::{MokaStore, MokaStoreConfig};

#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub use redis_store::RedisStore;

#[cfg(feature = "http-purge")]
#[cfg_attr(docsrs, doc(cfg(feature = "http-purge")))]
pub use http_purger::HttpPurger;
