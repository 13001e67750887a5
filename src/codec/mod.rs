//! Codec Module
//!
//! Reversible transforms between structured values and bytes, plus the optional
//! byte-to-byte compression layered on top.

mod compression;

pub use compression::CompressionAlgorithm;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Turns a value into bytes and back.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

// == JSON Codec ==
/// Default structural codec built on `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|err| StoreError::Encode(err.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|err| StoreError::Decode(err.to_string()))
    }
}

// == Null Codec ==
/// Encodes everything to zero bytes and never decodes. Paired with
/// [`NullStorage`](crate::storage::NullStorage) for memory-only stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodec;

impl<T> Codec<T> for NullCodec {
    fn encode(&self, _value: &T) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn decode(&self, _bytes: &[u8]) -> Result<T> {
        Err(StoreError::Decode("null codec holds no values".to_string()))
    }
}
