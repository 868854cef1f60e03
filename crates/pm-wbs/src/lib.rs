//! PM Work Breakdown Structure
//!
//! Mutable tree of work packages with stable hierarchical codes.
//!
//! # Core Concepts
//!
//! - [`WbsTree`]: Flat node collection plus the structural edits over it
//! - [`CodeGenerator`]: Issues `parent.code + "." + n` codes by rescanning siblings
//! - [`MoveOutcome`]: Result of re-homing a subtree
//! - [`TreeViolation`]: Broken invariant reported by [`WbsTree::verify`]
//! - [`Rollup`]: Budget, hours and progress aggregated over a subtree
//!
//! Edits never fail. Unknown ids turn updates, deletes and moves into no-ops,
//! and malformed codes read as `0` when computing the next code.
//!
//! # Example
//!
//! ```rust
//! use pm_model::NewNode;
//! use pm_wbs::WbsTree;
//!
//! let mut tree = WbsTree::new();
//! let project = tree.add_node(NewNode::new("Website"), None);
//! let design = tree.add_node(NewNode::new("Design"), Some(project));
//! assert_eq!(tree.get(design).unwrap().code.as_str(), "1.1");
//!
//! let removed = tree.delete_node(project);
//! assert_eq!(removed.len(), 2);
//! assert!(tree.is_empty());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod codegen;
mod query;
mod tree;
mod verify;

pub use codegen::CodeGenerator;
pub use query::Rollup;
pub use tree::{MoveOutcome, WbsTree};
pub use verify::{RepairReport, TreeViolation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
