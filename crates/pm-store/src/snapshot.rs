//! Versioned project snapshot codec

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use pm_model::{Methodology, Phase, WbsNode};
use serde::{Deserialize, Serialize};

/// Newest snapshot layout this build reads and the one it writes
pub const SCHEMA_VERSION: u32 = 1;

/// Everything persisted for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub schema_version: u32,
    pub project_key: String,
    #[serde(default)]
    pub methodology: Methodology,
    #[serde(default)]
    pub nodes: Vec<WbsNode>,
    #[serde(default)]
    pub custom_phases: Vec<Phase>,
    pub saved_at: DateTime<Utc>,
}

/// Just enough of a snapshot to decide whether the rest is readable
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaHeader {
    #[serde(default = "legacy_schema")]
    schema_version: u32,
}

fn legacy_schema() -> u32 {
    SCHEMA_VERSION
}

impl ProjectSnapshot {
    /// Snapshot stamped with the current schema and time
    #[must_use]
    pub fn new(
        project_key: impl Into<String>,
        methodology: Methodology,
        nodes: Vec<WbsNode>,
        custom_phases: Vec<Phase>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            project_key: project_key.into(),
            methodology,
            nodes,
            custom_phases,
            saved_at: Utc::now(),
        }
    }

    /// Encode as JSON
    ///
    /// # Errors
    /// Returns [`StoreError::Serialize`] if encoding fails
    pub fn to_bytes(&self, pretty: bool) -> Result<Vec<u8>, StoreError> {
        let encoded = if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        };
        encoded.map_err(StoreError::Serialize)
    }

    /// Decode JSON written by [`to_bytes`](Self::to_bytes)
    ///
    /// The schema version is checked before the body is decoded, so snapshots
    /// from newer builds are reported as such rather than as malformed.
    ///
    /// # Errors
    /// Returns [`StoreError::UnsupportedSchema`] for a newer layout, or
    /// [`StoreError::Deserialize`] for malformed input
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let header: SchemaHeader =
            serde_json::from_slice(bytes).map_err(StoreError::Deserialize)?;
        if header.schema_version > SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: header.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        let mut snapshot: Self = serde_json::from_slice(bytes).map_err(StoreError::Deserialize)?;
        snapshot.schema_version = SCHEMA_VERSION;
        Ok(snapshot)
    }
}
