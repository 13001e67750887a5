//! Cache policies governing a single read or write.

use std::time::Duration;

/// How one cache operation treats the freshness metadata of the hot tier.
///
/// A policy is chosen per request and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Serve fresh entries; write with the cache's default lifetime
    #[default]
    OnlyIfCache,
    /// Treat every read as a miss; writes drop the key instead of caching
    IgnoreCache,
    /// Serve entries no older than the given age; write with that age as lifetime
    MaxAge(Duration),
    /// Serve fresh entries; write entries that never expire
    Immutable,
    /// Serve whatever is held, expired or not; writes are ignored
    OnlyCached,
}

impl CachePolicy {
    /// Whether a cache-aside fetch under this policy may call the remote source.
    pub fn allows_fetch(self) -> bool {
        !matches!(self, Self::OnlyCached)
    }
}
