//! Key/value blob stores
//!
//! A blob store maps a project key to the raw bytes of its snapshot. The
//! in-memory store serves tests and embedding; the file store keeps one
//! `<key>.json` per project under a directory.

use crate::error::StoreError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Longest key accepted by [`validate_key`]
pub const MAX_KEY_LEN: usize = 128;

/// Byte storage addressed by key
pub trait BlobStore: Send + Sync + Debug {
    /// Read the blob stored under `key`
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidKey`] for a malformed key, or an I/O error
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the blob stored under `key`
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidKey`] for a malformed key, or an I/O error
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Remove the blob stored under `key`, reporting whether it existed
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidKey`] for a malformed key, or an I/O error
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Keys currently stored, sorted
    ///
    /// # Errors
    /// Returns an I/O error if the backing storage cannot be listed
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Check that `key` is usable as a blob key
///
/// Keys are 1 to [`MAX_KEY_LEN`] characters of `[A-Za-z0-9._-]` and may not
/// start with a dot.
///
/// # Errors
/// Returns [`StoreError::InvalidKey`] when the key breaks those rules
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let well_formed = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if well_formed {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Process-local blob store
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Check if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        Ok(self.blobs.read().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        self.blobs.write().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.blobs.write().remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self.blobs.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Directory-backed blob store
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so readers never observe a half-written blob.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    const EXTENSION: &'static str = "json";

    /// Open (creating if needed) a store rooted at `dir`
    ///
    /// # Errors
    /// Returns an I/O error if the directory cannot be created
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tracing::debug!("Opened blob store at {}", dir.display());
        Ok(Self { dir })
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the blob for `key`
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidKey`] for a malformed key
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{}", Self::EXTENSION)))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension(format!("{}.tmp", Self::EXTENSION));
        fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                tracing::warn!("Failed to remove {}: {}", tmp.display(), cleanup);
            }
            return Err(StoreError::io(&path, e));
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(Self::EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
