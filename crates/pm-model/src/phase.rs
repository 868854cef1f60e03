//! Project phases
//!
//! Base phases are fixed per [`Methodology`]; custom phases are created by
//! users and slotted between them.

use crate::ids::PhaseId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery methodology of a project
///
/// Selects the base phase set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Methodology {
    /// Sequential PMBOK process groups
    Waterfall,
    /// Iterative delivery
    Agile,
    /// Predictive planning with iterative delivery
    #[default]
    Hybrid,
}

impl Methodology {
    /// Lowercase name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Waterfall => "waterfall",
            Self::Agile => "agile",
            Self::Hybrid => "hybrid",
        }
    }

    /// Base phases for this methodology, orders `1..=N`
    #[must_use]
    pub fn base_phases(&self) -> Vec<Phase> {
        let defs: &[(&str, &str)] = match self {
            Self::Waterfall => &[
                ("initiation", "Initiation"),
                ("planning", "Planning"),
                ("execution", "Execution"),
                ("monitoring", "Monitoring & Controlling"),
                ("closure", "Closure"),
            ],
            Self::Agile => &[
                ("discovery", "Discovery"),
                ("backlog-refinement", "Backlog Refinement"),
                ("sprint-delivery", "Sprint Delivery"),
                ("review", "Review & Retrospective"),
                ("release", "Release"),
            ],
            Self::Hybrid => &[
                ("initiation", "Initiation"),
                ("planning", "Planning"),
                ("iterative-delivery", "Iterative Delivery"),
                ("monitoring", "Monitoring & Controlling"),
                ("closure", "Closure"),
            ],
        };

        defs.iter()
            .zip(1u32..)
            .map(|(&(id, name), order)| Phase::base(id, name, f64::from(order), *self))
            .collect()
    }
}

impl fmt::Display for Methodology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Methodology {
    type Err = MethodologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "waterfall" => Ok(Self::Waterfall),
            "agile" => Ok(Self::Agile),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(MethodologyError::Unknown(s.to_string())),
        }
    }
}

/// Unknown methodology name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MethodologyError {
    #[error("unknown methodology: {0} (expected waterfall, agile or hybrid)")]
    Unknown(String),
}

/// A phase in the project sequence
///
/// `order` is a sort key. It is integral after every sequencer operation but
/// may briefly hold a fractional provisional value while a phase is slotted in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: PhaseId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: f64,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub methodology: Methodology,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Phase {
    /// Base phase with a fixed order
    #[must_use]
    pub fn base(
        id: impl Into<PhaseId>,
        name: impl Into<String>,
        order: f64,
        methodology: Methodology,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            order,
            is_custom: false,
            methodology,
            color: None,
        }
    }

    /// Custom phase built from caller data
    #[must_use]
    pub fn custom(id: PhaseId, data: NewPhase, order: f64, methodology: Methodology) -> Self {
        Self {
            id,
            name: data.name,
            description: data.description,
            order,
            is_custom: true,
            methodology,
            color: data.color,
        }
    }
}

/// Attributes for a custom phase being created
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPhase {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl NewPhase {
    /// Create phase data with a name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With display color
    #[inline]
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Attribute update for a custom phase
///
/// `order` is owned by the sequencer and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhasePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl PhasePatch {
    /// Merge the set fields over `phase`
    pub fn apply_to(self, phase: &mut Phase) {
        if let Some(name) = self.name {
            phase.name = name;
        }
        if let Some(description) = self.description {
            phase.description = Some(description);
        }
        if let Some(color) = self.color {
            phase.color = Some(color);
        }
    }
}
