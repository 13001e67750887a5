//! Preferences Backend
//!
//! A [`Preferences`] domain holds many named byte slots and is persisted as one
//! JSON document. [`PreferencesStorage`] exposes a single slot of a shared
//! domain through the [`ByteStorage`] contract, so several caches can live side
//! by side in one preferences file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use super::{ByteStorage, FileStorage};
use crate::error::{Result, StoreError};

// == Preferences ==
/// Named byte slots shared between storage handles.
///
/// Writing the domain file holds `io` from encoding to rename, so flushes
/// from different slots never interleave.
#[derive(Debug)]
pub struct Preferences {
    backing: Option<FileStorage>,
    values: Mutex<HashMap<String, Vec<u8>>>,
    io: Mutex<()>,
}

impl Preferences {
    /// Creates a domain that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            backing: None,
            values: Mutex::new(HashMap::new()),
            io: Mutex::new(()),
        }
    }

    /// Opens the domain stored at `path`. A missing or unreadable file starts an
    /// empty domain.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let backing = FileStorage::new(path);
        let values = backing
            .read()
            .and_then(|bytes| match Self::decode(&bytes) {
                Ok(values) => Some(values),
                Err(err) => {
                    warn!(path = %backing.path().display(), error = %err, "Discarding unreadable preferences");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            backing: Some(backing),
            values: Mutex::new(values),
            io: Mutex::new(()),
        }
    }

    fn decode(bytes: &[u8]) -> Result<HashMap<String, Vec<u8>>> {
        serde_json::from_slice(bytes).map_err(|err| StoreError::Decode(err.to_string()))
    }

    /// Returns a copy of the bytes stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.lock().get(key).cloned()
    }

    /// Stores `bytes` under `key`.
    pub fn set(&self, key: &str, bytes: Vec<u8>) {
        self.values.lock().insert(key.to_string(), bytes);
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.values.lock().remove(key).is_some()
    }

    /// Writes the whole domain to its backing file. In-memory domains always
    /// succeed.
    pub fn synchronize(&self) -> bool {
        let Some(backing) = &self.backing else {
            return true;
        };

        let _io = self.io.lock();
        let encoded = {
            let values = self.values.lock();
            if values.is_empty() {
                None
            } else {
                match serde_json::to_vec(&*values) {
                    Ok(bytes) => Some(bytes),
                    Err(err) => {
                        warn!(error = %err, "Failed to encode preferences");
                        return false;
                    }
                }
            }
        };

        backing.write(encoded.as_deref())
    }
}

// == Preferences Storage ==
/// One slot of a [`Preferences`] domain.
#[derive(Debug, Clone)]
pub struct PreferencesStorage {
    key: String,
    preferences: Arc<Preferences>,
}

impl PreferencesStorage {
    pub fn new(key: impl Into<String>, preferences: Arc<Preferences>) -> Self {
        let key = key.into();
        debug_assert!(!key.is_empty(), "key can't be empty string");
        Self { key, preferences }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl ByteStorage for PreferencesStorage {
    fn read(&self) -> Option<Vec<u8>> {
        self.preferences.get(&self.key)
    }

    fn write(&self, bytes: Option<&[u8]>) -> bool {
        match bytes {
            Some(bytes) => self.preferences.set(&self.key, bytes.to_vec()),
            None => {
                self.preferences.remove(&self.key);
            }
        }
        self.preferences.synchronize()
    }
}
