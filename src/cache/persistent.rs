//! Persistent Cache
//!
//! Two tiers holding the same entries: a [`TtlMemoryCache`] that answers every
//! request, and a [`PersistentKeyValueStore`] that mirrors it durably. The
//! durable tier is read once, on first access to the hot tier, and rewritten
//! from the hot tier on [`PersistentCache::synchronize`].

use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{CacheItem, CachePolicy, TtlMemoryCache};
use crate::clock::{system_clock, SharedClock};
use crate::codec::CompressionAlgorithm;
use crate::config::CacheConfig;
use crate::lifecycle::LifecycleEvent;
use crate::persistent::{PersistentKey, PersistentKeyValueStore, PersistentValue};
use crate::storage::{FileStorage, Preferences};

/// Lifetime given to entries written under [`CachePolicy::OnlyIfCache`] unless
/// the cache is built with another one.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Durable tier of a cache: every entry with its freshness metadata.
pub type DurableTier<K, V> = PersistentKeyValueStore<K, CacheItem<V>>;

// == Persistent Cache ==
/// TTL cache mirrored to durable storage.
///
/// Between hydration and the next synchronize the hot tier is the only source
/// of truth. No operation locks; a cache shared between tasks must be wrapped
/// by the caller (see [`crate::tasks::spawn_sync_task`]).
pub struct PersistentCache<K: Eq + Hash, V> {
    default_lifetime: Duration,
    durable: DurableTier<K, V>,
    /// `None` until the durable tier has been loaded into it.
    hot: Option<TtlMemoryCache<K, V>>,
    clock: SharedClock,
}

impl<K: PersistentKey, V: PersistentValue> PersistentCache<K, V> {
    // == Constructor ==
    /// Creates a cache over `durable` without touching storage.
    pub fn new(durable: DurableTier<K, V>, default_lifetime: Duration) -> Self {
        Self::with_clock(durable, default_lifetime, system_clock())
    }

    /// Creates a cache that reads the time from `clock`.
    pub fn with_clock(durable: DurableTier<K, V>, default_lifetime: Duration, clock: SharedClock) -> Self {
        Self {
            default_lifetime,
            durable,
            hot: None,
            clock,
        }
    }

    /// Cache persisted to the file at `path`.
    pub fn file(
        path: impl Into<PathBuf>,
        compression: Option<CompressionAlgorithm>,
        default_lifetime: Duration,
    ) -> Self {
        Self::new(PersistentKeyValueStore::file(path, compression), default_lifetime)
    }

    /// Cache persisted to `file_name` inside the user's cache directory, or
    /// `None` when the platform has none.
    pub fn in_cache_dir(
        file_name: &str,
        compression: Option<CompressionAlgorithm>,
        default_lifetime: Duration,
    ) -> Option<Self> {
        let storage = FileStorage::in_cache_dir(file_name)?;
        Some(Self::file(storage.path(), compression, default_lifetime))
    }

    /// Cache persisted under `key` in a preferences domain.
    pub fn preferences(
        key: impl Into<String>,
        preferences: Arc<Preferences>,
        compression: Option<CompressionAlgorithm>,
        default_lifetime: Duration,
    ) -> Self {
        Self::new(
            PersistentKeyValueStore::preferences(key, preferences, compression),
            default_lifetime,
        )
    }

    /// Cache that lives only in memory.
    pub fn in_memory(default_lifetime: Duration) -> Self {
        Self::new(PersistentKeyValueStore::null(), default_lifetime)
    }

    /// File-backed cache described by `config`.
    pub fn from_config(config: &CacheConfig) -> Self {
        info!(
            "Opening persistent cache at {} (default lifetime {}s, compression {:?})",
            config.storage_path.display(),
            config.default_lifetime,
            config.compression
        );
        Self::file(
            &config.storage_path,
            config.compression,
            Duration::from_secs(config.default_lifetime),
        )
    }

    /// Lifetime used for writes under [`CachePolicy::OnlyIfCache`].
    pub fn default_lifetime(&self) -> Duration {
        self.default_lifetime
    }

    // == Hydration ==
    /// Loads the durable tier into the hot tier if that has not happened yet.
    ///
    /// Every other accessor hydrates on demand; calling this up front moves the
    /// one-time I/O to a moment of the caller's choosing.
    pub fn hydrate(&mut self) {
        self.hot_tier();
    }

    /// Whether the hot tier has been loaded.
    pub fn is_hydrated(&self) -> bool {
        self.hot.is_some()
    }

    fn hot_tier(&mut self) -> &mut TtlMemoryCache<K, V> {
        ensure_ready(&mut self.hot, &mut self.durable, &self.clock)
    }

    // == Get ==
    /// Reads `key` under `policy`.
    pub fn get(&mut self, key: &K, policy: CachePolicy) -> Option<&V> {
        let now = self.clock.now();
        let memory = self.hot_tier();
        let item = match policy {
            CachePolicy::OnlyIfCache | CachePolicy::Immutable => memory.get(key),
            CachePolicy::IgnoreCache => None,
            CachePolicy::MaxAge(age) => memory.get(key).filter(|item| item.age(now) <= age),
            CachePolicy::OnlyCached => memory.peek(key),
        };
        item.map(|item| &item.value)
    }

    /// The hot-tier entry for `key` with its metadata, fresh or not.
    pub fn peek_item(&mut self, key: &K) -> Option<&CacheItem<V>> {
        self.hot_tier().peek(key)
    }

    // == Set ==
    /// Writes `key` under `policy`. A `None` value removes the key whatever the
    /// policy.
    pub fn set(&mut self, key: K, value: Option<V>, policy: CachePolicy) {
        let now = self.clock.now();
        let default_lifetime = self.default_lifetime;
        let memory = self.hot_tier();

        let Some(value) = value else {
            memory.set(key, None);
            return;
        };

        let item = match policy {
            CachePolicy::OnlyIfCache => Some(CacheItem::new(value, now, default_lifetime)),
            CachePolicy::IgnoreCache => None,
            CachePolicy::MaxAge(age) => Some(CacheItem::new(value, now, age)),
            CachePolicy::Immutable => Some(CacheItem::immutable(value, now)),
            // Read-only policy: writing under it changes nothing.
            CachePolicy::OnlyCached => return,
        };
        memory.set(key, item);
    }

    /// Writes `key` with the default lifetime.
    pub fn insert(&mut self, key: K, value: V) {
        self.set(key, Some(value), CachePolicy::OnlyIfCache);
    }

    /// Removes `key` from the hot tier, returning its value even if expired.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.hot_tier().remove(key).map(|item| item.value)
    }

    // == Update ==
    /// Replaces the value of `key` and restarts its lifetime, keeping the max
    /// age it was stored with. An absent (or expired) key is inserted with the
    /// default lifetime.
    pub fn update(&mut self, key: K, value: V) {
        let now = self.clock.now();
        let memory = self.hot_tier();
        match memory.get(&key).map(|item| item.max_age) {
            Some(max_age) => memory.set(key, Some(CacheItem::new(value, now, max_age))),
            None => self.set(key, Some(value), CachePolicy::OnlyIfCache),
        }
    }

    // == Synchronize ==
    /// Makes the durable tier match the hot tier and writes it if anything
    /// changed.
    ///
    /// Expired durable entries and keys the hot tier no longer holds are
    /// dropped, every live hot entry is copied over, then the durable store
    /// flushes. Unchanged entries compare equal, so an idle cache writes
    /// nothing. Returns whether the durable tier is now up to date.
    pub fn synchronize(&mut self) -> bool {
        let memory = ensure_ready(&mut self.hot, &mut self.durable, &self.clock);
        memory.purge_expired();

        let now = self.clock.now();
        let stale: Vec<K> = self
            .durable
            .iter()
            .filter(|(key, item)| item.is_expired(now) || !memory.contains_key(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.durable.remove(key);
        }

        for (key, item) in memory.iter() {
            self.durable.set(key.clone(), Some(item.clone()));
        }

        let pending = self.durable.is_dirty();
        let success = self.durable.synchronize();
        if success {
            debug!(
                entries = memory.len(),
                dropped = stale.len(),
                written = pending,
                "Persistent cache synchronized"
            );
        } else {
            warn!(entries = memory.len(), "Persistent cache synchronize failed, will retry");
        }
        success
    }

    // == Lifecycle ==
    /// Reacts to a host lifecycle signal: entering the background flushes the
    /// cache, every other event is ignored. Redundant signals are harmless.
    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) -> bool {
        match event {
            LifecycleEvent::DidEnterBackground => {
                debug!("Host entered background, synchronizing cache");
                self.synchronize()
            }
            LifecycleEvent::WillEnterForeground | LifecycleEvent::DidBecomeActive => true,
        }
    }

    // == Collection ==
    /// Number of hot entries, including expired ones not yet evicted.
    pub fn len(&mut self) -> usize {
        self.hot_tier().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.hot_tier().is_empty()
    }

    pub fn capacity(&mut self) -> usize {
        self.hot_tier().capacity()
    }

    /// Drops every hot entry. The durable tier follows on the next synchronize.
    pub fn remove_all(&mut self) {
        self.hot_tier().remove_all();
    }

    /// Iterates over live `(key, value)` pairs of the hot tier.
    pub fn iter(&mut self) -> impl Iterator<Item = (&K, &V)> {
        self.hot_tier().iter().map(|(key, item)| (key, &item.value))
    }
}

/// Hydrates `hot` from `durable` on first use and returns the hot tier.
///
/// Durable entries are split against a single "now": live ones populate the
/// hot tier, expired ones are removed from the durable tier right away.
fn ensure_ready<'a, K: PersistentKey, V: PersistentValue>(
    hot: &'a mut Option<TtlMemoryCache<K, V>>,
    durable: &mut DurableTier<K, V>,
    clock: &SharedClock,
) -> &'a mut TtlMemoryCache<K, V> {
    hot.get_or_insert_with(|| {
        let now = clock.now();
        let mut memory = TtlMemoryCache::with_capacity(durable.capacity(), clock.clone());
        let mut expired = Vec::new();

        for (key, item) in durable.iter() {
            if item.is_expired(now) {
                expired.push(key.clone());
            } else {
                memory.set(key.clone(), Some(item.clone()));
            }
        }
        for key in &expired {
            durable.remove(key);
        }

        debug!(
            live = memory.len(),
            expired = expired.len(),
            "Hydrated hot tier from durable storage"
        );
        memory
    })
}

impl<K: Eq + Hash, V> fmt::Debug for PersistentCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hot = self.hot.as_ref().map(TtlMemoryCache::len);
        f.debug_struct("PersistentCache")
            .field("default_lifetime", &self.default_lifetime)
            .field("hot_entries", &hot)
            .field("durable_dirty", &self.durable.is_dirty())
            .finish()
    }
}
