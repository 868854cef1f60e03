//! Structural invariant checks and repair
//!
//! Trees built only through [`WbsTree`] edits always verify clean. Snapshots
//! written by other tools may not, so loading code can detect drift with
//! [`WbsTree::verify`] and fix the derived fields with [`WbsTree::repair`].

use crate::tree::WbsTree;
use pm_model::{NodeId, WbsCode};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A broken structural invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeViolation {
    /// `parent_id` names a node that does not exist
    DanglingParent { node: NodeId, parent: NodeId },

    /// `level` is not one more than the parent's (or non-zero on a root)
    LevelMismatch { node: NodeId, expected: u32, actual: u32 },

    /// Child points at parent but the parent does not list it
    MissingChildRef { parent: NodeId, child: NodeId },

    /// Parent lists a child that does not point back (or does not exist)
    StrayChildRef { parent: NodeId, child: NodeId },

    /// Parent lists the same child more than once
    DuplicateChildRef { parent: NodeId, child: NodeId },

    /// Two siblings share a code
    DuplicateSiblingCode { parent: Option<NodeId>, code: WbsCode },

    /// Following `parent_id` from this node loops back on itself
    Cycle { node: NodeId },
}

impl fmt::Display for TreeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingParent { node, parent } => {
                write!(f, "node {node} points at missing parent {parent}")
            }
            Self::LevelMismatch {
                node,
                expected,
                actual,
            } => write!(f, "node {node} has level {actual}, expected {expected}"),
            Self::MissingChildRef { parent, child } => {
                write!(f, "parent {parent} does not list child {child}")
            }
            Self::StrayChildRef { parent, child } => {
                write!(f, "parent {parent} lists {child} which is not its child")
            }
            Self::DuplicateChildRef { parent, child } => {
                write!(f, "parent {parent} lists child {child} more than once")
            }
            Self::DuplicateSiblingCode { parent, code } => match parent {
                Some(parent) => write!(f, "code {code} used twice under {parent}"),
                None => write!(f, "root code {code} used twice"),
            },
            Self::Cycle { node } => write!(f, "node {node} is part of a parent cycle"),
        }
    }
}

/// What [`WbsTree::repair`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Nodes detached from a missing parent or a cycle
    pub promoted_to_root: usize,
    /// `children` lists rewritten
    pub children_rebuilt: usize,
    /// Levels corrected
    pub levels_fixed: usize,
}

impl RepairReport {
    /// Check if anything changed
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

impl WbsTree {
    /// Check every structural invariant
    #[must_use]
    pub fn verify(&self) -> Vec<TreeViolation> {
        let mut violations = Vec::new();
        let cyclic = self.cyclic_nodes();

        for node in self.iter() {
            if cyclic.contains(&node.id) {
                violations.push(TreeViolation::Cycle { node: node.id });
                continue;
            }

            let expected_level = match node.parent_id {
                Some(pid) => match self.get(pid) {
                    Some(parent) => {
                        if !parent.children.contains(&node.id) {
                            violations.push(TreeViolation::MissingChildRef {
                                parent: pid,
                                child: node.id,
                            });
                        }
                        Some(parent.level + 1)
                    }
                    None => {
                        violations.push(TreeViolation::DanglingParent {
                            node: node.id,
                            parent: pid,
                        });
                        None
                    }
                },
                None => Some(0),
            };

            if let Some(expected) = expected_level {
                if expected != node.level {
                    violations.push(TreeViolation::LevelMismatch {
                        node: node.id,
                        expected,
                        actual: node.level,
                    });
                }
            }

            let mut listed = HashSet::new();
            for child in &node.children {
                if !listed.insert(*child) {
                    violations.push(TreeViolation::DuplicateChildRef {
                        parent: node.id,
                        child: *child,
                    });
                    continue;
                }
                let points_back = self
                    .get(*child)
                    .is_some_and(|c| c.parent_id == Some(node.id));
                if !points_back {
                    violations.push(TreeViolation::StrayChildRef {
                        parent: node.id,
                        child: *child,
                    });
                }
            }
        }

        let mut codes: HashSet<(Option<NodeId>, &WbsCode)> = HashSet::new();
        for node in self.iter() {
            if !codes.insert((node.parent_id, &node.code)) {
                violations.push(TreeViolation::DuplicateSiblingCode {
                    parent: node.parent_id,
                    code: node.code.clone(),
                });
            }
        }

        violations
    }

    /// Check if [`verify`](Self::verify) finds nothing
    #[inline]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.verify().is_empty()
    }

    /// Rebuild the derived structural fields from `parent_id`
    ///
    /// Nodes with a missing parent, and one node per parent cycle, are
    /// promoted to the root. Every `children` list is rebuilt in collection
    /// order and levels are recomputed. Codes are left untouched.
    pub fn repair(&mut self) -> RepairReport {
        let mut report = RepairReport::default();

        let dangling: Vec<NodeId> = self
            .iter()
            .filter(|node| node.parent_id.is_some_and(|pid| !self.contains(pid)))
            .map(|node| node.id)
            .collect();
        for id in dangling {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.parent_id = None;
                report.promoted_to_root += 1;
            }
        }

        loop {
            let cyclic = self.cyclic_nodes();
            let Some(breaker) = self.iter().map(|node| node.id).find(|id| cyclic.contains(id))
            else {
                break;
            };
            if let Some(node) = self.nodes.get_mut(&breaker) {
                node.parent_id = None;
                report.promoted_to_root += 1;
            }
        }

        let index = self.child_index();
        for node in self.nodes.values_mut() {
            let rebuilt = index.get(&node.id).cloned().unwrap_or_default();
            if node.children != rebuilt {
                node.children = rebuilt;
                report.children_rebuilt += 1;
            }
        }

        let levels = self.computed_levels();
        for node in self.nodes.values_mut() {
            if let Some(level) = levels.get(&node.id) {
                if node.level != *level {
                    node.level = *level;
                    report.levels_fixed += 1;
                }
            }
        }

        if !report.is_clean() {
            tracing::warn!(
                "Repaired tree: {} promoted, {} children lists, {} levels",
                report.promoted_to_root,
                report.children_rebuilt,
                report.levels_fixed
            );
        }

        report
    }

    /// Nodes whose `parent_id` chain loops
    fn cyclic_nodes(&self) -> HashSet<NodeId> {
        let mut cyclic = HashSet::new();
        let mut settled: HashSet<NodeId> = HashSet::new();

        for start in self.iter().map(|node| node.id) {
            if settled.contains(&start) {
                continue;
            }
            let mut path: Vec<NodeId> = Vec::new();
            let mut on_path: HashSet<NodeId> = HashSet::new();
            let mut current = Some(start);

            while let Some(id) = current {
                if settled.contains(&id) {
                    break;
                }
                if !on_path.insert(id) {
                    let loop_start = path.iter().position(|p| *p == id).unwrap_or(0);
                    cyclic.extend(path[loop_start..].iter().copied());
                    break;
                }
                path.push(id);
                current = self.get(id).and_then(|node| node.parent_id);
            }

            settled.extend(path);
        }

        cyclic
    }

    /// Depth of every node reachable from a root, following `parent_id`
    fn computed_levels(&self) -> HashMap<NodeId, u32> {
        let index = self.child_index();
        let mut levels = HashMap::new();
        let mut stack: Vec<(NodeId, u32)> = self
            .iter()
            .filter(|node| node.is_root())
            .map(|node| (node.id, 0))
            .collect();

        while let Some((id, level)) = stack.pop() {
            if levels.insert(id, level).is_some() {
                continue;
            }
            for child in index.get(&id).into_iter().flatten() {
                stack.push((*child, level + 1));
            }
        }

        levels
    }
}
