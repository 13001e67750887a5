//! Cache Provider
//!
//! Cache-aside access to a [`PersistentCache`]: misses are answered by an
//! injected remote source whose results populate the cache.

use std::future::Future;
use std::hash::Hash;

use tracing::debug;

use super::{CachePolicy, PersistentCache};
use crate::persistent::{PersistentKey, PersistentValue};

// == Remote Fetch ==
/// Source of values the cache does not hold.
///
/// `Ok(None)` means the remote source has no value for the key, which the
/// provider treats as an invalidation.
pub trait RemoteFetch<K, V> {
    type Error;

    fn request(&mut self, key: K) -> impl Future<Output = Result<Option<V>, Self::Error>> + Send;
}

impl<K, V, E, F, Fut> RemoteFetch<K, V> for F
where
    F: FnMut(K) -> Fut,
    Fut: Future<Output = Result<Option<V>, E>> + Send,
{
    type Error = E;

    fn request(&mut self, key: K) -> impl Future<Output = Result<Option<V>, E>> + Send {
        self(key)
    }
}

// == Cache Provider ==
/// A cache paired with the remote source that fills it.
#[derive(Debug)]
pub struct CacheProvider<K: Eq + Hash, V, F> {
    cache: PersistentCache<K, V>,
    fetcher: F,
}

impl<K, V, F> CacheProvider<K, V, F>
where
    K: PersistentKey,
    V: PersistentValue,
    F: RemoteFetch<K, V>,
{
    pub fn new(cache: PersistentCache<K, V>, fetcher: F) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &PersistentCache<K, V> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut PersistentCache<K, V> {
        &mut self.cache
    }

    /// Resolves `key` under `policy`, calling the remote source at most once.
    ///
    /// - `OnlyIfCache`, `MaxAge` and `Immutable` serve a cached value if the
    ///   policy accepts it; otherwise the fetched result is written back under
    ///   the same policy (`Ok(None)` removes the key).
    /// - `IgnoreCache` always fetches; a value updates the cache keeping the
    ///   entry's max age, `Ok(None)` removes the key.
    /// - `OnlyCached` never fetches and returns whatever is held, fresh or not.
    ///
    /// A fetch error leaves the cache untouched and is returned as is.
    pub async fn fetch(&mut self, key: K, policy: CachePolicy) -> Result<Option<V>, F::Error> {
        if !policy.allows_fetch() {
            return Ok(self.cache.get(&key, policy).cloned());
        }

        if policy == CachePolicy::IgnoreCache {
            let fetched = self.fetcher.request(key.clone()).await?;
            match &fetched {
                Some(value) => self.cache.update(key, value.clone()),
                None => {
                    debug!("Remote source dropped the key, invalidating");
                    self.cache.remove(&key);
                }
            }
            return Ok(fetched);
        }

        if let Some(value) = self.cache.get(&key, policy).cloned() {
            return Ok(Some(value));
        }

        debug!(?policy, "Cache miss, requesting remote source");
        let fetched = self.fetcher.request(key.clone()).await?;
        self.cache.set(key, fetched.clone(), policy);
        Ok(fetched)
    }

    /// Drops every cached entry and flushes the now empty cache.
    pub fn reset(&mut self) -> bool {
        self.cache.remove_all();
        self.cache.synchronize()
    }
}
