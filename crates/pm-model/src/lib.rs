//! PM Model
//!
//! Data model shared by the work breakdown and phase sequencing crates.
//!
//! # Core Concepts
//!
//! - [`WbsNode`]: A work package with a hierarchical [`WbsCode`]
//! - [`NewNode`] / [`NodePatch`]: Caller data for creating and updating nodes
//! - [`Phase`]: A base or custom project phase with a sort `order`
//! - [`Methodology`]: Selects the fixed base phase set
//!
//! # Example
//!
//! ```rust
//! use pm_model::{Methodology, WbsCode};
//!
//! let code = WbsCode::root(2).child(1);
//! assert_eq!(code.to_string(), "2.1");
//!
//! let phases = Methodology::Waterfall.base_phases();
//! assert_eq!(phases[0].id.as_str(), "initiation");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod code;
mod ids;
mod node;
mod phase;

pub use code::{CodeError, WbsCode};
pub use ids::{NodeId, PhaseId};
pub use node::{NewNode, NodePatch, NodeStatus, WbsNode};
pub use phase::{Methodology, MethodologyError, NewPhase, Phase, PhasePatch};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
