//! Compression transforms applied after encoding and before decoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// zstd level used for stored snapshots.
const ZSTD_LEVEL: i32 = 19;

/// Upper bound of the LZ4 block format's expansion on decompression.
const LZ4_MAX_RATIO: usize = 255;

/// Supported compression algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// Fast block compression with the uncompressed size prepended
    Lz4,
    /// High-ratio general purpose compression
    #[default]
    Zstd,
}

impl CompressionAlgorithm {
    /// Compresses `data`. Empty input produces a non-empty frame that
    /// decompresses back to empty.
    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
            Self::Zstd => zstd::stream::encode_all(data, ZSTD_LEVEL)
                .map_err(|err| StoreError::Compression(err.to_string())),
        }
    }

    /// Decompresses `data`. Zero-length input is rejected: no valid frame is
    /// empty, so it can only mean the stored bytes were lost.
    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(StoreError::Compression(format!(
                "{self} cannot decompress empty input"
            )));
        }

        match self {
            Self::Lz4 => {
                // A corrupt size prefix must not drive a giant allocation.
                let claimed = match data {
                    [a, b, c, d, ..] => u32::from_le_bytes([*a, *b, *c, *d]) as usize,
                    _ => usize::MAX,
                };
                if claimed > data.len().saturating_mul(LZ4_MAX_RATIO) {
                    return Err(StoreError::Compression(format!(
                        "lz4 frame claims {claimed} bytes from {} bytes of input",
                        data.len()
                    )));
                }
                lz4_flex::decompress_size_prepended(data)
                    .map_err(|err| StoreError::Compression(err.to_string()))
            }
            Self::Zstd => zstd::stream::decode_all(data)
                .map_err(|err| StoreError::Compression(err.to_string())),
        }
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lz4 => f.write_str("lz4"),
            Self::Zstd => f.write_str("zstd"),
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lz4" => Ok(Self::Lz4),
            "zstd" => Ok(Self::Zstd),
            other => Err(format!("unknown compression algorithm: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALGORITHMS: [CompressionAlgorithm; 2] =
        [CompressionAlgorithm::Lz4, CompressionAlgorithm::Zstd];

    #[test]
    fn test_roundtrip_repetitive_payload() {
        let payload = "cache entry ".repeat(512).into_bytes();

        for algo in ALGORITHMS {
            let compressed = algo.compress(&payload).unwrap();
            assert!(compressed.len() < payload.len(), "{algo} did not shrink input");
            assert_eq!(algo.decompress(&compressed).unwrap(), payload);
        }
    }

    #[test]
    fn test_empty_input_roundtrip() {
        for algo in ALGORITHMS {
            let compressed = algo.compress(&[]).unwrap();
            assert!(!compressed.is_empty());
            assert!(algo.decompress(&compressed).unwrap().is_empty());
        }
    }

    #[test]
    fn test_decompress_empty_is_error() {
        for algo in ALGORITHMS {
            assert!(matches!(
                algo.decompress(&[]),
                Err(StoreError::Compression(_))
            ));
        }
    }

    #[test]
    fn test_decompress_garbage_is_error() {
        let garbage = b"definitely not a compressed frame".to_vec();
        assert!(CompressionAlgorithm::Zstd.decompress(&garbage).is_err());
        assert!(CompressionAlgorithm::Lz4.decompress(&garbage).is_err());
    }

    #[test]
    fn test_lz4_rejects_oversized_prefix() {
        let mut frame = u32::MAX.to_le_bytes().to_vec();
        frame.extend_from_slice(b"tail");

        assert!(matches!(
            CompressionAlgorithm::Lz4.decompress(&frame),
            Err(StoreError::Compression(_))
        ));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("LZ4".parse::<CompressionAlgorithm>(), Ok(CompressionAlgorithm::Lz4));
        assert_eq!(" zstd ".parse::<CompressionAlgorithm>(), Ok(CompressionAlgorithm::Zstd));
        assert!("brotli".parse::<CompressionAlgorithm>().is_err());
        assert_eq!(CompressionAlgorithm::default().to_string(), "zstd");
    }
}
