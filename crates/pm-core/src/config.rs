//! Workspace configuration
//!
//! Loaded from an optional TOML file; every field has a default, so an empty
//! file (or none at all) yields [`WorkspaceConfig::default`].
//!
//! ```toml
//! store_dir = ".pm"
//! project_key = "website"
//! methodology = "agile"
//! autosave = true
//! pretty_json = false
//! ```

use crate::error::{CoreError, Result};
use pm_model::Methodology;
use pm_store::FileBlobStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where and how project state is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory holding one snapshot file per project
    pub store_dir: PathBuf,
    /// Project to operate on
    pub project_key: String,
    /// Methodology for newly created projects
    pub methodology: Methodology,
    /// Persist after every successful mutation
    pub autosave: bool,
    /// Indent snapshot JSON
    pub pretty_json: bool,
}

impl WorkspaceConfig {
    /// Default file name looked up in the working directory
    pub const FILE_NAME: &'static str = "pm.toml";

    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`CoreError::ConfigParse`] for invalid TOML or field types
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| CoreError::ConfigParse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`CoreError::ConfigIo`] if the file cannot be read, or
    /// [`CoreError::ConfigParse`] if it is not valid
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CoreError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else `pm.toml` in the working directory if present, else defaults
    ///
    /// # Errors
    /// Same as [`load`](Self::load); an absent default file is not an error
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(Self::FILE_NAME);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// With store directory
    #[inline]
    #[must_use]
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    /// With project key
    #[inline]
    #[must_use]
    pub fn with_project_key(mut self, key: impl Into<String>) -> Self {
        self.project_key = key.into();
        self
    }

    /// With methodology
    #[inline]
    #[must_use]
    pub fn with_methodology(mut self, methodology: Methodology) -> Self {
        self.methodology = methodology;
        self
    }

    /// With autosave
    #[inline]
    #[must_use]
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Open the file-backed blob store under [`store_dir`](Self::store_dir)
    ///
    /// # Errors
    /// Returns a store error if the directory cannot be created
    pub fn open_blob_store(&self) -> Result<FileBlobStore> {
        Ok(FileBlobStore::open(&self.store_dir)?)
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".pm"),
            project_key: "default".to_string(),
            methodology: Methodology::Hybrid,
            autosave: true,
            pretty_json: true,
        }
    }
}
