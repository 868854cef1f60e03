//! PM Phase Sequencing
//!
//! Orders user-defined custom phases among the fixed base phases of a
//! project methodology.
//!
//! # Core Concepts
//!
//! - [`PhaseSequencer`]: Base + custom phase set with a merged view
//! - [`InsertPosition`]: "after phase X" or the tail of the sequence
//!
//! Custom phase orders are renormalized to whole numbers after every
//! insertion, deletion and move, so repeated insertion between the same two
//! neighbours never runs out of key space.
//!
//! # Example
//!
//! ```rust
//! use pm_model::{Methodology, NewPhase};
//! use pm_phase::{InsertPosition, PhaseSequencer};
//!
//! let mut phases = PhaseSequencer::for_methodology(Methodology::Waterfall);
//! let kickoff = phases.add_custom_phase(
//!     NewPhase::new("Kickoff"),
//!     InsertPosition::after("initiation"),
//! );
//!
//! assert_eq!(phases.position_of(&kickoff), Some(2));
//! assert_eq!(phases.sequence()[2].name, "Planning");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod position;
mod sequencer;

pub use position::{InsertPosition, END_SENTINEL};
pub use sequencer::PhaseSequencer;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
