//! Read-only tree queries and roll-ups

use crate::tree::WbsTree;
use pm_model::{NodeId, WbsCode, WbsNode};
use std::collections::HashSet;

/// Aggregated figures for a subtree
///
/// Budget and hours are summed over leaves (the work packages proper);
/// `progress` is the mean leaf progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rollup {
    pub node_count: usize,
    pub leaf_count: usize,
    pub budget: f64,
    pub estimated_hours: f64,
    pub progress: f64,
}

impl WbsTree {
    /// Lookup node by code
    #[must_use]
    pub fn find_by_code(&self, code: &WbsCode) -> Option<&WbsNode> {
        self.iter().find(|node| &node.code == code)
    }

    /// Root nodes ordered by code
    #[must_use]
    pub fn roots(&self) -> Vec<&WbsNode> {
        let mut roots: Vec<_> = self.iter().filter(|node| node.is_root()).collect();
        roots.sort_by(|a, b| a.code.cmp_numeric(&b.code));
        roots
    }

    /// Direct children of `id`, in `children` list order
    #[must_use]
    pub fn children_of(&self, id: NodeId) -> Vec<&WbsNode> {
        self.get(id)
            .map(|node| node.children.iter().filter_map(|c| self.get(*c)).collect())
            .unwrap_or_default()
    }

    /// Every transitive descendant of `id`, breadth-first
    #[must_use]
    pub fn descendants_of(&self, id: NodeId) -> Vec<&WbsNode> {
        self.descendant_ids(id)
            .into_iter()
            .filter_map(|desc| self.get(desc))
            .collect()
    }

    /// Ancestors of `id`, nearest first
    #[must_use]
    pub fn ancestors_of(&self, id: NodeId) -> Vec<&WbsNode> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.get(id).and_then(|node| node.parent_id);

        while let Some(pid) = current {
            if !seen.insert(pid) {
                break;
            }
            let Some(parent) = self.get(pid) else {
                break;
            };
            out.push(parent);
            current = parent.parent_id;
        }

        out
    }

    /// Pre-order walk with siblings ordered by code
    ///
    /// This is the order a WBS outline is displayed in.
    #[must_use]
    pub fn outline(&self) -> Vec<&WbsNode> {
        let index = self.child_index();
        let mut out = Vec::with_capacity(self.len());
        let mut seen = HashSet::new();
        let mut stack: Vec<&WbsNode> = self.roots().into_iter().rev().collect();

        while let Some(node) = stack.pop() {
            if !seen.insert(node.id) {
                continue;
            }
            out.push(node);

            let mut children: Vec<&WbsNode> = index
                .get(&node.id)
                .into_iter()
                .flatten()
                .filter_map(|c| self.get(*c))
                .collect();
            children.sort_by(|a, b| a.code.cmp_numeric(&b.code));
            stack.extend(children.into_iter().rev());
        }

        out
    }

    /// Roll up budget, hours and progress over the subtree rooted at `id`
    #[must_use]
    pub fn rollup(&self, id: NodeId) -> Option<Rollup> {
        let root = self.get(id)?;
        let subtree = std::iter::once(root).chain(self.descendants_of(id));
        Some(Self::rollup_nodes(subtree, &self.child_index()))
    }

    /// Roll up the whole project
    #[must_use]
    pub fn project_rollup(&self) -> Rollup {
        Self::rollup_nodes(self.iter(), &self.child_index())
    }

    fn rollup_nodes<'a>(
        nodes: impl Iterator<Item = &'a WbsNode>,
        index: &std::collections::HashMap<NodeId, Vec<NodeId>>,
    ) -> Rollup {
        let mut rollup = Rollup::default();
        let mut progress_sum = 0.0;

        for node in nodes {
            rollup.node_count += 1;
            if index.contains_key(&node.id) {
                continue;
            }
            rollup.leaf_count += 1;
            rollup.budget += node.budget.unwrap_or(0.0);
            rollup.estimated_hours += node.estimated_hours.unwrap_or(0.0);
            progress_sum += f64::from(node.progress);
        }

        if rollup.leaf_count > 0 {
            #[allow(clippy::cast_precision_loss)]
            let leaves = rollup.leaf_count as f64;
            rollup.progress = progress_sum / leaves;
        }

        rollup
    }
}
