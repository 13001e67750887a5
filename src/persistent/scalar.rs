//! Persistent Scalar Store
//!
//! Reads and writes one typed value to one storage slot. This is where storage,
//! codec and compression failures stop: they are logged and surface only as a
//! missing value or a failed write.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{Codec, CompressionAlgorithm, JsonCodec, NullCodec};
use crate::error::Result;
use crate::storage::{ByteStorage, FileStorage, NullStorage, Preferences, PreferencesStorage};

// == Persistent Storage ==
/// A typed value stored in a single byte slot.
pub struct PersistentStorage<T> {
    storage: Box<dyn ByteStorage>,
    compression: Option<CompressionAlgorithm>,
    codec: Box<dyn Codec<T>>,
}

impl<T> PersistentStorage<T> {
    // == Constructor ==
    /// Creates a store from its parts.
    pub fn new(
        storage: impl ByteStorage + 'static,
        compression: Option<CompressionAlgorithm>,
        codec: impl Codec<T> + 'static,
    ) -> Self {
        Self {
            storage: Box::new(storage),
            compression,
            codec: Box::new(codec),
        }
    }

    /// Memory-only store: every read misses and every write succeeds.
    pub fn null() -> Self {
        Self::new(NullStorage, None, NullCodec)
    }

    // == Read ==
    /// Loads the stored value. Absent, unreadable, undecompressable and
    /// undecodable slots all read as `None`.
    pub fn read(&self) -> Option<T> {
        let bytes = self.storage.read()?;
        match self.decode(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, bytes = bytes.len(), "Discarding unreadable stored value");
                None
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        match self.compression {
            Some(algo) => self.codec.decode(&algo.decompress(bytes)?),
            None => self.codec.decode(bytes),
        }
    }

    // == Write ==
    /// Stores `value`, or deletes the slot when `value` is `None`. Returns
    /// whether the slot now holds what was asked for.
    pub fn write(&self, value: Option<&T>) -> bool {
        let Some(value) = value else {
            return self.storage.write(None);
        };

        match self.encode(value) {
            Ok(bytes) => self.storage.write(Some(&bytes)),
            Err(err) => {
                warn!(error = %err, "Failed to encode value for storage");
                false
            }
        }
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        let encoded = self.codec.encode(value)?;
        let Some(algo) = self.compression else {
            debug!("PersistentStorage: {} bytes to write", encoded.len());
            return Ok(encoded);
        };

        let compressed = algo.compress(&encoded)?;
        debug!(
            "PersistentStorage: {} bytes to write, uncompressed/compressed {}/{} ({})",
            compressed.len(),
            encoded.len(),
            compressed.len(),
            algo
        );
        Ok(compressed)
    }
}

impl<T> PersistentStorage<T>
where
    T: Serialize + DeserializeOwned,
{
    /// JSON value stored in the file at `path`.
    pub fn file(path: impl Into<PathBuf>, compression: Option<CompressionAlgorithm>) -> Self {
        Self::new(FileStorage::new(path), compression, JsonCodec)
    }

    /// JSON value stored under `key` in a preferences domain.
    pub fn preferences(
        key: impl Into<String>,
        preferences: Arc<Preferences>,
        compression: Option<CompressionAlgorithm>,
    ) -> Self {
        Self::new(PreferencesStorage::new(key, preferences), compression, JsonCodec)
    }
}

impl<T> fmt::Debug for PersistentStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentStorage")
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}
