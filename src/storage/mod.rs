//! Byte Storage Module
//!
//! Durable backends that persist one opaque blob in a single slot. They know
//! nothing about the structure of what they store.
//!
//! # Backends
//! - [`FileStorage`]: one file on disk
//! - [`PreferencesStorage`]: one key inside a shared [`Preferences`] domain
//! - [`NullStorage`]: stores nothing, reports success

mod file;
mod null;
mod preferences;

pub use file::FileStorage;
pub use null::NullStorage;
pub use preferences::{Preferences, PreferencesStorage};

/// Read/write contract every durable backend satisfies.
///
/// Neither method panics or returns an error: an absent or unreadable slot reads
/// as `None`, and a failed write reports `false`.
pub trait ByteStorage: Send + Sync {
    /// Returns the stored bytes, or `None` when the slot is empty or unreadable.
    fn read(&self) -> Option<Vec<u8>>;

    /// Replaces the slot's contents. `None` deletes the slot; deleting an empty
    /// slot succeeds. Missing intermediate locations are created.
    fn write(&self, bytes: Option<&[u8]>) -> bool;
}

impl<S: ByteStorage + ?Sized> ByteStorage for Box<S> {
    fn read(&self) -> Option<Vec<u8>> {
        (**self).read()
    }

    fn write(&self, bytes: Option<&[u8]>) -> bool {
        (**self).write(bytes)
    }
}
