//! Error types for PM Core

use pm_model::{CodeError, PhaseId, WbsCode};
use pm_store::StoreError;
use std::path::PathBuf;

/// Main PM Core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Persistence failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`WorkspaceConfig`](crate::WorkspaceConfig)
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// User-supplied code is malformed
    #[error("invalid code: {0}")]
    InvalidCode(#[from] CodeError),

    /// No node carries this code
    #[error("no work package with code {0}")]
    UnknownCode(WbsCode),

    /// No phase carries this id
    #[error("no phase with id {0}")]
    UnknownPhase(PhaseId),
}

impl CoreError {
    /// Check if the error names something that does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownCode(_) | Self::UnknownPhase(_))
    }
}

/// Result type for PM Core operations
pub type Result<T> = std::result::Result<T, CoreError>;
