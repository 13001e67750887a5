//! Cache Module
//!
//! The hot tier ([`TtlMemoryCache`]), the two-tier [`PersistentCache`] built on
//! it, the per-request [`CachePolicy`], and the cache-aside [`CacheProvider`].

mod entry;
mod memory;
mod persistent;
mod policy;
mod provider;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheItem;
pub use memory::TtlMemoryCache;
pub use persistent::{DurableTier, PersistentCache, DEFAULT_LIFETIME};
pub use policy::CachePolicy;
pub use provider::{CacheProvider, RemoteFetch};
