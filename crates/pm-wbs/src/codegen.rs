//! Hierarchical code generation
//!
//! Issues the next sibling code for a node about to be inserted.

use crate::tree::WbsTree;
use pm_model::{NodeId, WbsCode};

/// Computes codes for new nodes from the current collection
///
/// Holds no counters: every call rescans the tree, so codes issued one after
/// another against the same parent never collide or skip, and data loaded
/// from a snapshot needs no warm-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator;

impl CodeGenerator {
    /// Next code under `parent_id`, or at the root when `None`
    ///
    /// - Root: `1 + max(root codes read as integers)`
    /// - Child: `parent.code + "." + (1 + max(sibling suffixes))`
    /// - Unknown parent: `"1"`
    ///
    /// Malformed codes count as `0`.
    #[must_use]
    pub fn next_code(tree: &WbsTree, parent_id: Option<NodeId>) -> WbsCode {
        let Some(parent_id) = parent_id else {
            let max = tree
                .iter()
                .filter(|node| node.parent_id.is_none())
                .map(|node| node.code.as_number())
                .max()
                .unwrap_or(0);
            return WbsCode::root(max.saturating_add(1));
        };

        let Some(parent) = tree.get(parent_id) else {
            tracing::debug!("Code requested under unknown parent {}", parent_id);
            return WbsCode::root(1);
        };

        let max = tree
            .iter()
            .filter(|node| node.parent_id == Some(parent_id))
            .map(|node| node.code.suffix_number())
            .max()
            .unwrap_or(0);

        parent.code.child(max.saturating_add(1))
    }
}
