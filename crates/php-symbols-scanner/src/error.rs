//! Scan errors.

use std::io;
use std::path::PathBuf;

/// Failure of a whole scan. A scan that finds nothing is not an error.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read source: {0}")]
    Read(#[from] io::Error),
}

