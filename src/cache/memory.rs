//! TTL Memory Cache
//!
//! HashMap-backed hot tier. Every entry carries its own max age; expired
//! entries are evicted lazily, on read of that key, on a full sweep before
//! iteration, and on insert when the table has run out of room.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use super::CacheItem;
use crate::clock::SharedClock;

// == TTL Memory Cache ==
/// In-memory mapping from key to [`CacheItem`] with per-entry expiry.
///
/// Not synchronized; callers sharing it across threads must lock it.
pub struct TtlMemoryCache<K, V> {
    /// Key-item storage
    entries: HashMap<K, CacheItem<V>>,
    /// Source of "now" for expiry checks
    clock: SharedClock,
}

impl<K: Eq + Hash, V> TtlMemoryCache<K, V> {
    // == Constructor ==
    /// Creates an empty cache.
    pub fn new(clock: SharedClock) -> Self {
        Self::with_capacity(0, clock)
    }

    /// Creates an empty cache with room for at least `capacity` entries.
    pub fn with_capacity(capacity: usize, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            clock,
        }
    }

    // == Get ==
    /// Returns the entry for `key` if it is still fresh.
    ///
    /// An expired entry is removed as a side effect and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<&CacheItem<V>> {
        let now = self.clock.now();
        if self.entries.get(key).is_some_and(|item| item.is_expired(now)) {
            self.entries.remove(key);
            trace!("Evicted expired entry on read");
            return None;
        }
        self.entries.get(key)
    }

    /// Returns the entry for `key` without checking or evicting on expiry.
    pub fn peek(&self, key: &K) -> Option<&CacheItem<V>> {
        self.entries.get(key)
    }

    /// Whether `key` is held, fresh or not.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    // == Set ==
    /// Inserts or overwrites `key`; `None` removes it.
    ///
    /// When the table is at its allocated capacity, every expired entry is
    /// swept first so dead entries never force the table to grow.
    pub fn set(&mut self, key: K, item: Option<CacheItem<V>>) {
        let Some(item) = item else {
            self.entries.remove(&key);
            return;
        };

        if self.entries.len() >= self.entries.capacity() {
            self.purge_expired();
        }
        self.entries.insert(key, item);
    }

    /// Removes `key`, returning its entry regardless of freshness.
    pub fn remove(&mut self, key: &K) -> Option<CacheItem<V>> {
        self.entries.remove(key)
    }

    // == Purge Expired ==
    /// Removes every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, item| !item.is_expired(now));

        let removed = before - self.entries.len();
        if removed > 0 {
            trace!(removed, "Swept expired entries");
        }
        removed
    }

    // == Iterate ==
    /// Sweeps expired entries, then iterates over what remains.
    ///
    /// Each call sweeps again, so a fresh iteration never yields entries that
    /// expired since the last one.
    pub fn iter(&mut self) -> impl Iterator<Item = (&K, &CacheItem<V>)> {
        self.purge_expired();
        self.entries.iter()
    }

    // == Length ==
    /// Number of entries held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries the table can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Drops every entry.
    pub fn remove_all(&mut self) {
        self.entries.clear();
    }
}

impl<K, V> std::fmt::Debug for TtlMemoryCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlMemoryCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.capacity())
            .finish()
    }
}
