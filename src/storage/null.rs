//! Backend that persists nothing.

use super::ByteStorage;

/// Always empty, always accepts writes. Lets a cache run purely in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStorage;

impl ByteStorage for NullStorage {
    fn read(&self) -> Option<Vec<u8>> {
        None
    }

    fn write(&self, _bytes: Option<&[u8]>) -> bool {
        true
    }
}
