//! Work breakdown nodes
//!
//! Defines the persisted [`WbsNode`] record together with:
//! - [`NewNode`] - caller-supplied attributes for a node being created
//! - [`NodePatch`] - shallow attribute updates for an existing node
//! - [`NodeStatus`] - lifecycle status of a work package

use crate::code::WbsCode;
use crate::ids::NodeId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a work package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStatus {
    /// Not started yet
    #[default]
    NotStarted,
    /// Work underway
    InProgress,
    /// Done
    Completed,
    /// Paused
    OnHold,
    /// Abandoned
    Cancelled,
}

impl NodeStatus {
    /// Parse from the kebab-case name used in snapshots
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "not-started" => Some(Self::NotStarted),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "on-hold" => Some(Self::OnHold),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Kebab-case name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::OnHold => "on-hold",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A work package in the breakdown tree
///
/// `parent_id`, `level` and `children` are structural and only change through
/// tree operations. Everything else is a plain attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WbsNode {
    pub id: NodeId,
    pub code: WbsCode,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub task_ids: Vec<String>,
    #[serde(default)]
    pub backlog_item_ids: Vec<String>,
    #[serde(default)]
    pub requirement_ids: Vec<String>,
    #[serde(default)]
    pub risk_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WbsNode {
    /// Build a node from caller data and the structural fields computed by the tree
    #[must_use]
    pub fn create(
        id: NodeId,
        code: WbsCode,
        parent_id: Option<NodeId>,
        level: u32,
        data: NewNode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            code,
            name: data.name,
            description: data.description,
            parent_id,
            level,
            children: Vec::new(),
            status: data.status.unwrap_or_default(),
            progress: data.progress.map_or(0, clamp_progress),
            budget: data.budget,
            estimated_hours: data.estimated_hours,
            start_date: data.start_date,
            end_date: data.end_date,
            assignee: data.assignee,
            deliverables: data.deliverables,
            task_ids: data.task_ids,
            backlog_item_ids: data.backlog_item_ids,
            requirement_ids: data.requirement_ids,
            risk_ids: data.risk_ids,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if node sits at the root of the tree
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Attributes for a node being created
///
/// Everything is optional; `NewNode::default()` yields an unnamed,
/// not-started package with zero progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewNode {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<NodeStatus>,
    pub progress: Option<u8>,
    pub budget: Option<f64>,
    pub estimated_hours: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    pub deliverables: Vec<String>,
    pub task_ids: Vec<String>,
    pub backlog_item_ids: Vec<String>,
    pub requirement_ids: Vec<String>,
    pub risk_ids: Vec<String>,
}

impl NewNode {
    /// Create node data with a name
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

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// With progress percentage
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// With budget
    #[inline]
    #[must_use]
    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    /// With estimated hours
    #[inline]
    #[must_use]
    pub fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    /// With assignee
    #[inline]
    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }
}

/// Shallow attribute update for an existing node
///
/// Only fields set to `Some` are applied. Structural fields (`id`, `code`,
/// `parent_id`, `level`, `children`) are not representable here; reparenting
/// goes through the tree's move operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<NodeStatus>,
    pub progress: Option<u8>,
    pub budget: Option<f64>,
    pub estimated_hours: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    pub deliverables: Option<Vec<String>>,
    pub task_ids: Option<Vec<String>>,
    pub backlog_item_ids: Option<Vec<String>>,
    pub requirement_ids: Option<Vec<String>>,
    pub risk_ids: Option<Vec<String>>,
}

impl NodePatch {
    /// Create empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set name
    #[inline]
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set status
    #[inline]
    #[must_use]
    pub fn status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set progress percentage
    #[inline]
    #[must_use]
    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set budget
    #[inline]
    #[must_use]
    pub fn budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Set estimated hours
    #[inline]
    #[must_use]
    pub fn estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    /// Check if the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields over `node` and stamp `updated_at`
    pub fn apply_to(self, node: &mut WbsNode, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            node.name = name;
        }
        if let Some(description) = self.description {
            node.description = Some(description);
        }
        if let Some(status) = self.status {
            node.status = status;
        }
        if let Some(progress) = self.progress {
            node.progress = clamp_progress(progress);
        }
        if let Some(budget) = self.budget {
            node.budget = Some(budget);
        }
        if let Some(hours) = self.estimated_hours {
            node.estimated_hours = Some(hours);
        }
        if let Some(date) = self.start_date {
            node.start_date = Some(date);
        }
        if let Some(date) = self.end_date {
            node.end_date = Some(date);
        }
        if let Some(assignee) = self.assignee {
            node.assignee = Some(assignee);
        }
        if let Some(list) = self.deliverables {
            node.deliverables = list;
        }
        if let Some(list) = self.task_ids {
            node.task_ids = list;
        }
        if let Some(list) = self.backlog_item_ids {
            node.backlog_item_ids = list;
        }
        if let Some(list) = self.requirement_ids {
            node.requirement_ids = list;
        }
        if let Some(list) = self.risk_ids {
            node.risk_ids = list;
        }
        node.updated_at = now;
    }
}

fn clamp_progress(progress: u8) -> u8 {
    progress.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn sample_node() -> WbsNode {
        WbsNode::create(
            NodeId::new(),
            WbsCode::from("1.2"),
            Some(NodeId::new()),
            1,
            NewNode::new("Design").with_budget(500.0),
            Utc::now(),
        )
    }

    #[test]
    fn create_applies_defaults() {
        let node = WbsNode::create(
            NodeId::new(),
            WbsCode::root(1),
            None,
            0,
            NewNode::default(),
            Utc::now(),
        );

        assert_eq!(node.status, NodeStatus::NotStarted);
        assert_eq!(node.progress, 0);
        assert!(node.children.is_empty());
        assert!(node.task_ids.is_empty());
        assert!(node.risk_ids.is_empty());
        assert!(node.is_root());
        assert_eq!(node.created_at, node.updated_at);
    }

    #[test]
    fn create_clamps_progress() {
        let node = WbsNode::create(
            NodeId::new(),
            WbsCode::root(1),
            None,
            0,
            NewNode::new("x").with_progress(250),
            Utc::now(),
        );
        assert_eq!(node.progress, 100);
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let mut node = sample_node();
        let before = node.clone();
        let later = node.updated_at + Duration::seconds(5);

        NodePatch::new()
            .status(NodeStatus::InProgress)
            .progress(40)
            .apply_to(&mut node, later);

        assert_eq!(node.status, NodeStatus::InProgress);
        assert_eq!(node.progress, 40);
        assert_eq!(node.name, before.name);
        assert_eq!(node.budget, before.budget);
        assert_eq!(node.code, before.code);
        assert_eq!(node.parent_id, before.parent_id);
        assert_eq!(node.updated_at, later);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(NodePatch::new().is_empty());
        assert!(!NodePatch::new().name("n").is_empty());
    }

    #[test]
    fn status_uses_kebab_case() {
        let json = serde_json::to_string(&NodeStatus::NotStarted).unwrap();
        assert_eq!(json, "\"not-started\"");
        assert_eq!(NodeStatus::from_name("on-hold"), Some(NodeStatus::OnHold));
        assert_eq!(NodeStatus::OnHold.name(), "on-hold");
        assert_eq!(NodeStatus::from_name("done"), None);
    }

    #[test]
    fn node_serializes_camel_case() {
        let node = sample_node();
        let value = serde_json::to_value(&node).unwrap();
        assert!(value.get("parentId").is_some());
        assert!(value.get("estimatedHours").is_some());
        assert!(value.get("backlogItemIds").is_some());

        let back: WbsNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }
}
