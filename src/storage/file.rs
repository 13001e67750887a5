//! File System Backend
//!
//! Stores the blob in a single file. Writes land in a staging file next to the
//! target and are renamed over it, so a crash mid-write leaves the previous
//! contents intact.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use super::ByteStorage;
use crate::error::Result;

// == File Storage ==
/// Byte storage backed by one file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    // == Constructor ==
    /// Creates a backend for `path`. The file and its parent directories are
    /// only created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug_assert!(
            path.file_name().is_some(),
            "file storage path must name a file, got {}",
            path.display()
        );
        Self { path }
    }

    /// Creates a backend for `file_name` inside the user's cache directory.
    ///
    /// Returns `None` when the platform has no cache directory.
    pub fn in_cache_dir(file_name: &str) -> Option<Self> {
        debug_assert!(!file_name.is_empty(), "file name can't be empty");
        dirs::cache_dir().map(|dir| Self::new(dir.join(file_name)))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn try_write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let staging = self.staging_path();
        fs::write(&staging, bytes)?;
        if let Err(err) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }
        Ok(())
    }

    fn try_remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

impl ByteStorage for FileStorage {
    fn read(&self) -> Option<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to read cache file");
                None
            }
        }
    }

    fn write(&self, bytes: Option<&[u8]>) -> bool {
        let result = match bytes {
            Some(bytes) => self.try_write(bytes),
            None => self.try_remove(),
        };

        match result {
            Ok(()) => {
                trace!(path = %self.path.display(), deleted = bytes.is_none(), "Cache file written");
                true
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to write cache file");
                false
            }
        }
    }
}
