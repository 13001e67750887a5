//! Persistent Module
//!
//! Typed values on top of byte storage: [`PersistentStorage`] reads and writes
//! one value to one slot, and [`PersistentKeyValueStore`] keeps a whole mapping
//! in memory, writing it back to a single slot on demand.

mod key_value;
mod scalar;
mod snapshot;

pub use key_value::PersistentKeyValueStore;
pub use scalar::PersistentStorage;
pub use snapshot::Snapshot;

use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key usable in a persisted mapping.
pub trait PersistentKey: Eq + Hash + Clone + Serialize + DeserializeOwned {}

impl<T> PersistentKey for T where T: Eq + Hash + Clone + Serialize + DeserializeOwned {}

/// Value usable in a persisted mapping.
pub trait PersistentValue: PartialEq + Clone + Serialize + DeserializeOwned {}

impl<T> PersistentValue for T where T: PartialEq + Clone + Serialize + DeserializeOwned {}
