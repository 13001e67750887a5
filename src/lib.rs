//! Tiered Cache - A persistent two-tier cache
//!
//! An in-memory TTL cache mirrored to durable storage, with per-request cache
//! policies, cache-aside fetching, and a persistent transaction register.

pub mod cache;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod persistent;
pub mod storage;
pub mod tasks;
pub mod transaction;

pub use cache::{CacheItem, CachePolicy, CacheProvider, PersistentCache, RemoteFetch, TtlMemoryCache};
pub use config::CacheConfig;
pub use lifecycle::{LifecycleEvent, LifecycleObserver};
pub use tasks::spawn_sync_task;
