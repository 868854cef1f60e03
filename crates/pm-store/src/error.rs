//! Persistence errors

use std::path::PathBuf;

/// Errors raised by blob stores and the snapshot codec
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be encoded
    #[error("failed to encode snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Blob is not a readable snapshot
    #[error("failed to decode snapshot: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// Key is empty or contains characters outside `[A-Za-z0-9._-]`
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    /// Snapshot was written by a newer format
    #[error("unsupported snapshot schema {found} (this build reads up to {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
