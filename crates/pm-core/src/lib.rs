//! PM Core
//!
//! Explicit state container for one project: the WBS tree, the phase
//! sequence and their persistence.
//!
//! # Core Concepts
//!
//! - [`ProjectStateStore`]: Owns the tree and phases; all mutation goes through it
//! - [`WorkspaceConfig`]: Store location, project key and write behaviour
//! - [`CoreError`]: Persistence, config and lookup failures
//!
//! Structural edits themselves never fail; errors come only from persistence
//! and from resolving user-supplied codes or ids.
//!
//! # Example
//!
//! ```rust
//! use pm_core::ProjectStateStore;
//! use pm_model::{Methodology, NewNode};
//! use pm_store::MemoryBlobStore;
//!
//! let mut project = ProjectStateStore::load(
//!     Box::new(MemoryBlobStore::new()),
//!     "website",
//!     Methodology::Agile,
//! )?;
//! let root = project.add_node(NewNode::new("Website"), None)?;
//! project.add_node(NewNode::new("Design"), Some(root))?;
//!
//! assert_eq!(project.resolve_code("1.1")?, project.tree().outline()[1].id);
//! # Ok::<(), pm_core::CoreError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod error;
mod state;

pub use config::WorkspaceConfig;
pub use error::{CoreError, Result};
pub use state::ProjectStateStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
