//! PM Store
//!
//! Persistence for project state: a small key/value [`BlobStore`] seam plus
//! the JSON [`ProjectSnapshot`] written through it.
//!
//! # Core Concepts
//!
//! - [`BlobStore`]: Bytes addressed by project key
//! - [`MemoryBlobStore`] / [`FileBlobStore`]: In-process and directory backends
//! - [`ProjectSnapshot`]: Versioned, camelCase JSON image of a project
//! - [`Fingerprint`]: Blake3 digest used to notice concurrent writers
//!
//! # Example
//!
//! ```rust
//! use pm_model::Methodology;
//! use pm_store::{BlobStore, MemoryBlobStore, ProjectSnapshot};
//!
//! let store = MemoryBlobStore::new();
//! let snapshot = ProjectSnapshot::new("demo", Methodology::Agile, vec![], vec![]);
//! store.put("demo", &snapshot.to_bytes(true)?)?;
//!
//! let bytes = store.get("demo")?.unwrap_or_default();
//! assert_eq!(ProjectSnapshot::from_bytes(&bytes)?.methodology, Methodology::Agile);
//! # Ok::<(), pm_store::StoreError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod blob;
mod error;
mod fingerprint;
mod snapshot;

pub use blob::{validate_key, BlobStore, FileBlobStore, MemoryBlobStore, MAX_KEY_LEN};
pub use error::StoreError;
pub use fingerprint::Fingerprint;
pub use snapshot::{ProjectSnapshot, SCHEMA_VERSION};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
