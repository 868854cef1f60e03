//! Insertion points for custom phases

use pm_model::PhaseId;
use std::fmt;

/// Sentinel accepted in place of a phase id to mean "append at the tail"
pub const END_SENTINEL: &str = "end";

/// Where a custom phase goes in the merged sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum InsertPosition {
    /// Immediately after the phase with this id
    After(PhaseId),
    /// After every existing phase
    #[default]
    End,
}

impl InsertPosition {
    /// Interpret an optional "insert after" id as given by callers
    ///
    /// `None`, an empty string and [`END_SENTINEL`] all mean [`End`](Self::End).
    #[must_use]
    pub fn from_after(after: Option<&str>) -> Self {
        match after.map(str::trim) {
            None | Some("") | Some(END_SENTINEL) => Self::End,
            Some(id) => Self::After(PhaseId::new(id)),
        }
    }

    /// Position right after `id`
    #[inline]
    #[must_use]
    pub fn after(id: impl Into<PhaseId>) -> Self {
        Self::After(id.into())
    }
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::After(id) => write!(f, "after {id}"),
            Self::End => f.write_str(END_SENTINEL),
        }
    }
}
