//! Persistent Key-Value Store
//!
//! An in-memory mapping mirrored to one storage slot. The mapping is loaded on
//! first access, never at construction, and written back wholesale by
//! [`PersistentKeyValueStore::synchronize`] only when it changed.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{PersistentKey, PersistentStorage, PersistentValue, Snapshot};
use crate::codec::CompressionAlgorithm;
use crate::storage::Preferences;

// == Persistent Key-Value Store ==
/// Mapping from `K` to `V` persisted as a single snapshot.
///
/// Every accessor may trigger the one-time load, so reads take `&mut self`.
/// There is no internal locking: callers sharing a store across threads must
/// wrap it in their own lock.
#[derive(Debug)]
pub struct PersistentKeyValueStore<K: Eq + Hash, V> {
    storage: PersistentStorage<Snapshot<K, V>>,
    /// `None` until the first access loads it.
    table: Option<Snapshot<K, V>>,
    dirty: bool,
}

impl<K: Eq + Hash, V> PersistentKeyValueStore<K, V> {
    /// Whether the table has been read from storage.
    pub fn is_hydrated(&self) -> bool {
        self.table.is_some()
    }

    /// Whether the table differs from what was last written.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl<K: PersistentKey, V: PersistentValue> PersistentKeyValueStore<K, V> {
    // == Constructor ==
    /// Wraps `storage` without reading it.
    pub fn new(storage: PersistentStorage<Snapshot<K, V>>) -> Self {
        Self {
            storage,
            table: None,
            dirty: false,
        }
    }

    /// Store backed by the JSON file at `path`.
    pub fn file(path: impl Into<PathBuf>, compression: Option<CompressionAlgorithm>) -> Self {
        Self::new(PersistentStorage::file(path, compression))
    }

    /// Store backed by one key of a preferences domain.
    pub fn preferences(
        key: impl Into<String>,
        preferences: Arc<Preferences>,
        compression: Option<CompressionAlgorithm>,
    ) -> Self {
        Self::new(PersistentStorage::preferences(key, preferences, compression))
    }

    /// Store that never persists anything.
    pub fn null() -> Self {
        Self::new(PersistentStorage::null())
    }

    // == Hydration ==
    /// Loads the table from storage if that has not happened yet. A missing or
    /// unreadable slot yields an empty table.
    pub fn hydrate(&mut self) {
        self.table_mut();
    }

    /// Loaded table. Callers that mutate it keep `dirty` up to date themselves.
    fn table_mut(&mut self) -> &mut HashMap<K, V> {
        let storage = &self.storage;
        self.table
            .get_or_insert_with(|| {
                let snapshot = storage.read().unwrap_or_default();
                debug!(entries = snapshot.as_map().len(), "Loaded persistent table");
                snapshot
            })
            .as_map_mut()
    }

    // == Accessors ==
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table_mut().get(key)
    }

    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table_mut().contains_key(key)
    }

    pub fn len(&mut self) -> usize {
        self.table_mut().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.table_mut().is_empty()
    }

    pub fn capacity(&mut self) -> usize {
        self.table_mut().capacity()
    }

    /// Iterates over every pair in unspecified order.
    pub fn iter(&mut self) -> impl Iterator<Item = (&K, &V)> {
        self.table_mut().iter()
    }

    // == Mutation ==
    /// Stores `value` under `key`, or removes `key` when `value` is `None`.
    ///
    /// Writing the value already present, or removing an absent key, leaves
    /// the store clean.
    pub fn set(&mut self, key: K, value: Option<V>) {
        let table = self.table_mut();
        let changed = match value {
            Some(value) => {
                if table.get(&key) == Some(&value) {
                    false
                } else {
                    table.insert(key, value);
                    true
                }
            }
            None => table.remove(&key).is_some(),
        };

        if changed {
            self.dirty = true;
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.table_mut().remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Drops every pair. An already empty table stays clean.
    pub fn remove_all(&mut self) {
        let table = self.table_mut();
        if !table.is_empty() {
            table.clear();
            self.dirty = true;
        }
    }

    // == Synchronize ==
    /// Writes the whole table if it changed since the last successful write.
    ///
    /// An empty table deletes the slot. On failure the store stays dirty so the
    /// next call retries.
    pub fn synchronize(&mut self) -> bool {
        if !self.dirty {
            return true;
        }

        let snapshot = self.table.as_ref().filter(|snapshot| !snapshot.as_map().is_empty());

        let success = self.storage.write(snapshot);
        if success {
            debug!(
                entries = snapshot.map_or(0, |s| s.as_map().len()),
                "Persistent table synchronized"
            );
        } else {
            warn!("Persistent table write failed, keeping changes for retry");
        }

        self.dirty = !success;
        success
    }
}
