//! Work breakdown tree
//!
//! [`WbsTree`] owns the flat node collection and applies every structural
//! edit to it:
//! - `add_node` issues a code and patches the parent's `children`
//! - `update_node` merges attributes only
//! - `delete_node` removes a whole subtree
//! - `move_node` re-homes a subtree and re-codes it under the new parent

use crate::codegen::CodeGenerator;
use chrono::Utc;
use indexmap::IndexMap;
use pm_model::{NewNode, NodeId, NodePatch, WbsCode, WbsNode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Flat collection of work breakdown nodes keyed by id
///
/// Insertion order is preserved and is the order nodes are persisted in.
/// `parent_id` is authoritative; each node's `children` list is a cache of
/// the reverse relation kept in step by every edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<WbsNode>", into = "Vec<WbsNode>")]
pub struct WbsTree {
    pub(crate) nodes: IndexMap<NodeId, WbsNode>,
}

/// Result of a reparent request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Subtree moved and re-coded
    Moved {
        old_code: WbsCode,
        new_code: WbsCode,
        /// Nodes whose code or level changed, including the moved node
        affected: usize,
    },
    /// Node already sits under the requested parent
    Unchanged,
    /// Node to move does not exist
    NotFound,
    /// Requested parent does not exist
    TargetNotFound,
    /// Requested parent is the node itself or one of its descendants
    WouldCycle,
}

impl MoveOutcome {
    /// Check if the tree changed
    #[inline]
    #[must_use]
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

impl WbsTree {
    /// Create empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from persisted nodes, keeping their order
    ///
    /// Later duplicates of an id replace earlier ones.
    #[must_use]
    pub fn from_nodes(nodes: Vec<WbsNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|node| (node.id, node)).collect(),
        }
    }

    /// Nodes in collection order
    #[must_use]
    pub fn to_nodes(&self) -> Vec<WbsNode> {
        self.nodes.values().cloned().collect()
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over nodes in collection order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &WbsNode> {
        self.nodes.values()
    }

    /// Lookup node by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&WbsNode> {
        self.nodes.get(&id)
    }

    /// Check if node exists
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Insert a new node under `parent_id` (or at the root)
    ///
    /// An unknown `parent_id` falls back to a root-level insert so the new
    /// node never points at a missing parent.
    pub fn add_node(&mut self, data: NewNode, parent_id: Option<NodeId>) -> NodeId {
        let parent = match parent_id {
            Some(pid) => {
                let found = self.nodes.get(&pid).map(|p| (p.id, p.level + 1));
                if found.is_none() {
                    tracing::warn!("Parent {} not found, inserting at root level", pid);
                }
                found
            }
            None => None,
        };
        let (parent_id, level) = parent.map_or((None, 0), |(pid, level)| (Some(pid), level));

        let code = CodeGenerator::next_code(self, parent_id);
        let id = NodeId::new();
        tracing::debug!("Issued code {} for node {}", code, id);

        let node = WbsNode::create(id, code, parent_id, level, data, Utc::now());

        if let Some(parent) = parent_id.and_then(|pid| self.nodes.get_mut(&pid)) {
            parent.children.push(id);
        }
        self.nodes.insert(id, node);

        id
    }

    /// Merge `patch` over the node's attributes
    ///
    /// Returns `false` (and changes nothing) if the node does not exist.
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                patch.apply_to(node, Utc::now());
                true
            }
            None => {
                tracing::debug!("Update ignored for unknown node {}", id);
                false
            }
        }
    }

    /// Remove a node together with all of its descendants
    ///
    /// Returns the removed ids, the target first. Deleting an unknown id is a
    /// no-op returning an empty list, so repeated deletes are harmless.
    pub fn delete_node(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(former_parent) = self.nodes.get(&id).map(|node| node.parent_id) else {
            tracing::debug!("Delete ignored for unknown node {}", id);
            return Vec::new();
        };

        let mut removed = vec![id];
        removed.extend(self.descendant_ids(id));

        let doomed: HashSet<NodeId> = removed.iter().copied().collect();
        self.nodes.retain(|nid, _| !doomed.contains(nid));

        if let Some(parent) = former_parent.and_then(|pid| self.nodes.get_mut(&pid)) {
            parent.children.retain(|child| *child != id);
        }

        removed
    }

    /// Re-home a node (and its subtree) under `new_parent`, or at the root
    ///
    /// The moved node takes the next free code under its new parent and every
    /// descendant keeps its own last segment below the new prefix. Levels are
    /// recomputed for the whole subtree.
    pub fn move_node(&mut self, id: NodeId, new_parent: Option<NodeId>) -> MoveOutcome {
        let Some(node) = self.nodes.get(&id) else {
            return MoveOutcome::NotFound;
        };
        let old_parent = node.parent_id;
        let old_code = node.code.clone();

        if let Some(pid) = new_parent {
            if !self.nodes.contains_key(&pid) {
                return MoveOutcome::TargetNotFound;
            }
        }
        if old_parent == new_parent {
            return MoveOutcome::Unchanged;
        }

        let descendants = self.descendant_ids(id);
        if let Some(pid) = new_parent {
            if pid == id || descendants.contains(&pid) {
                return MoveOutcome::WouldCycle;
            }
        }

        let new_code = CodeGenerator::next_code(self, new_parent);
        let new_level = new_parent
            .and_then(|pid| self.nodes.get(&pid))
            .map_or(0, |parent| parent.level + 1);
        let now = Utc::now();

        if let Some(parent) = old_parent.and_then(|pid| self.nodes.get_mut(&pid)) {
            parent.children.retain(|child| *child != id);
        }
        if let Some(parent) = new_parent.and_then(|pid| self.nodes.get_mut(&pid)) {
            parent.children.push(id);
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent_id = new_parent;
            node.code = new_code.clone();
            node.level = new_level;
            node.updated_at = now;
        }

        // Breadth-first order guarantees a parent is re-coded before its children.
        let mut placed: HashMap<NodeId, (WbsCode, u32)> = HashMap::new();
        placed.insert(id, (new_code.clone(), new_level));
        for desc_id in &descendants {
            let Some(desc) = self.nodes.get(desc_id) else {
                continue;
            };
            let Some((parent_code, parent_level)) =
                desc.parent_id.and_then(|pid| placed.get(&pid)).cloned()
            else {
                continue;
            };
            let segment = desc.code.last_segment().unwrap_or("0").to_string();
            let code = parent_code.child_segment(&segment);
            let level = parent_level + 1;

            if let Some(desc) = self.nodes.get_mut(desc_id) {
                desc.code = code.clone();
                desc.level = level;
                desc.updated_at = now;
            }
            placed.insert(*desc_id, (code, level));
        }

        tracing::debug!("Moved {} to {} ({} nodes)", old_code, new_code, placed.len());

        MoveOutcome::Moved {
            old_code,
            new_code,
            affected: placed.len(),
        }
    }

    /// Ids of every transitive descendant of `id`, breadth-first
    ///
    /// Follows `parent_id` rather than the cached `children` lists. Nodes
    /// caught in a parent cycle are visited once.
    #[must_use]
    pub fn descendant_ids(&self, id: NodeId) -> Vec<NodeId> {
        let index = self.child_index();
        let mut seen: HashSet<NodeId> = HashSet::from([id]);
        let mut queue: VecDeque<NodeId> = VecDeque::from([id]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for child in index.get(&current).into_iter().flatten() {
                if seen.insert(*child) {
                    out.push(*child);
                    queue.push_back(*child);
                }
            }
        }

        out
    }

    /// Map of parent id to child ids derived from `parent_id`, in collection order
    pub(crate) fn child_index(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut index: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in self.nodes.values() {
            if let Some(pid) = node.parent_id {
                index.entry(pid).or_default().push(node.id);
            }
        }
        index
    }
}

impl From<Vec<WbsNode>> for WbsTree {
    fn from(nodes: Vec<WbsNode>) -> Self {
        Self::from_nodes(nodes)
    }
}

impl From<WbsTree> for Vec<WbsNode> {
    fn from(tree: WbsTree) -> Self {
        tree.nodes.into_values().collect()
    }
}
