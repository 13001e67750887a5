//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::codec::CompressionAlgorithm;

/// Persistent cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// File the durable tier is written to
    pub storage_path: PathBuf,
    /// Lifetime in seconds of entries written without an explicit max age
    pub default_lifetime: u64,
    /// Compression applied to the durable snapshot
    pub compression: Option<CompressionAlgorithm>,
    /// Background flush interval in seconds; 0 disables periodic flushing
    pub sync_interval: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_STORAGE_PATH` - Durable tier file (default: persistent_cache.json)
    /// - `CACHE_DEFAULT_LIFETIME` - Default entry lifetime in seconds (default: 604800)
    /// - `CACHE_COMPRESSION` - `none`, `lz4` or `zstd` (default: none)
    /// - `CACHE_SYNC_INTERVAL` - Flush interval in seconds, 0 disables (default: 60)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storage_path: env::var("CACHE_STORAGE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            default_lifetime: env::var("CACHE_DEFAULT_LIFETIME")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_lifetime),
            compression: env::var("CACHE_COMPRESSION")
                .ok()
                .map_or(defaults.compression, |v| parse_compression(&v)),
            sync_interval: env::var("CACHE_SYNC_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sync_interval),
        }
    }

    /// Periodic flush interval, `None` when disabled.
    pub fn sync_interval(&self) -> Option<Duration> {
        (self.sync_interval > 0).then(|| Duration::from_secs(self.sync_interval))
    }
}

fn parse_compression(value: &str) -> Option<CompressionAlgorithm> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "none" | "off" => None,
        other => other.parse().ok(),
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("persistent_cache.json"),
            default_lifetime: 7 * 24 * 60 * 60,
            compression: None,
            sync_interval: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.storage_path, PathBuf::from("persistent_cache.json"));
        assert_eq!(config.default_lifetime, 604_800);
        assert_eq!(config.compression, None);
        assert_eq!(config.sync_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_config_from_env() {
        // Single test touching the environment so parallel tests never race on it.
        env::remove_var("CACHE_STORAGE_PATH");
        env::remove_var("CACHE_DEFAULT_LIFETIME");
        env::remove_var("CACHE_COMPRESSION");
        env::remove_var("CACHE_SYNC_INTERVAL");
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());

        env::set_var("CACHE_STORAGE_PATH", "/tmp/cache.bin");
        env::set_var("CACHE_DEFAULT_LIFETIME", "120");
        env::set_var("CACHE_COMPRESSION", "LZ4");
        env::set_var("CACHE_SYNC_INTERVAL", "0");
        let config = CacheConfig::from_env();
        assert_eq!(config.storage_path, PathBuf::from("/tmp/cache.bin"));
        assert_eq!(config.default_lifetime, 120);
        assert_eq!(config.compression, Some(CompressionAlgorithm::Lz4));
        assert_eq!(config.sync_interval(), None);

        env::set_var("CACHE_DEFAULT_LIFETIME", "soon");
        env::set_var("CACHE_COMPRESSION", "brotli");
        let config = CacheConfig::from_env();
        assert_eq!(config.default_lifetime, 604_800);
        assert_eq!(config.compression, None);

        env::remove_var("CACHE_STORAGE_PATH");
        env::remove_var("CACHE_DEFAULT_LIFETIME");
        env::remove_var("CACHE_COMPRESSION");
        env::remove_var("CACHE_SYNC_INTERVAL");
    }

    #[test]
    fn test_parse_compression() {
        assert_eq!(parse_compression("none"), None);
        assert_eq!(parse_compression(" zstd "), Some(CompressionAlgorithm::Zstd));
        assert_eq!(parse_compression("unknown"), None);
    }
}
