//! Scanner configuration.

use serde::{Deserialize, Serialize};

/// Default number of identifiers kept for name lookup.
pub const DEFAULT_LOOKBACK_CAPACITY: usize = 128;

/// Default read size for byte sources.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Options controlling a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    /// Report `interface` declarations as `Interface` instead of `Class`.
    pub distinct_interfaces: bool,
    /// Number of identifiers remembered while waiting for a terminator.
    pub lookback_capacity: usize,
    /// Bytes requested per read from a byte source.
    pub chunk_size: usize,
}

impl ScanOptions {
    /// Chunk size clamped to at least one byte.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            distinct_interfaces: true,
            lookback_capacity: DEFAULT_LOOKBACK_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
