//! Testing utilities for the PM workspace
//!
//! Shared fixtures and assertions.

#![allow(missing_docs)]

use chrono::Utc;
use pm_model::{Methodology, NewNode, NewPhase, NodeId, WbsCode, WbsNode};
use pm_phase::{InsertPosition, PhaseSequencer};
use pm_store::{BlobStore, MemoryBlobStore, ProjectSnapshot};
use pm_wbs::WbsTree;

/// Ids of the nodes in [`sample_tree`]
#[derive(Debug, Clone, Copy)]
pub struct SampleIds {
    pub one: NodeId,
    pub one_one: NodeId,
    pub one_two: NodeId,
    pub one_two_one: NodeId,
    pub one_two_two: NodeId,
    pub two: NodeId,
}

/// Tree with codes `1`, `1.1`, `1.2`, `1.2.1`, `1.2.2`, `2`
///
/// Leaves carry budgets and hours so roll-ups have something to sum;
/// `1.2.1` is assigned to `dana`.
pub fn sample_tree() -> (WbsTree, SampleIds) {
    let mut tree = WbsTree::new();
    let one = tree.add_node(NewNode::new("Website"), None);
    let one_one = tree.add_node(
        NewNode::new("Design")
            .with_budget(1000.0)
            .with_estimated_hours(40.0)
            .with_progress(100),
        Some(one),
    );
    let one_two = tree.add_node(NewNode::new("Build"), Some(one));
    let one_two_one = tree.add_node(
        NewNode::new("Frontend")
            .with_budget(3000.0)
            .with_estimated_hours(120.0)
            .with_progress(50)
            .with_assignee("dana"),
        Some(one_two),
    );
    let one_two_two = tree.add_node(
        NewNode::new("Backend")
            .with_budget(2000.0)
            .with_estimated_hours(80.0),
        Some(one_two),
    );
    let two = tree.add_node(NewNode::new("Launch"), None);

    let ids = SampleIds {
        one,
        one_one,
        one_two,
        one_two_one,
        one_two_two,
        two,
    };
    (tree, ids)
}

/// Waterfall phases with a custom "Kickoff" right after initiation
pub fn sample_phases() -> PhaseSequencer {
    let mut phases = PhaseSequencer::for_methodology(Methodology::Waterfall);
    phases.add_custom_phase(
        NewPhase::new("Kickoff").with_color("#ffaa00"),
        InsertPosition::after("initiation"),
    );
    phases
}

/// Node with hand-picked structural fields, for building inconsistent trees
pub fn raw_node(code: &str, parent_id: Option<NodeId>, level: u32) -> WbsNode {
    WbsNode::create(
        NodeId::new(),
        WbsCode::from(code),
        parent_id,
        level,
        NewNode::new(format!("node {code}")),
        Utc::now(),
    )
}

/// Memory store already holding a snapshot of `tree` and `phases` under `key`
pub fn seeded_store(key: &str, tree: &WbsTree, phases: &PhaseSequencer) -> MemoryBlobStore {
    let store = MemoryBlobStore::new();
    let snapshot = ProjectSnapshot::new(
        key,
        phases.methodology(),
        tree.to_nodes(),
        phases.custom_phases().to_vec(),
    );
    let bytes = snapshot.to_bytes(true).unwrap();
    store.put(key, &bytes).unwrap();
    store
}

/// Codes of the tree in outline order
pub fn outline_codes(tree: &WbsTree) -> Vec<String> {
    tree.outline()
        .into_iter()
        .map(|node| node.code.to_string())
        .collect()
}

/// Panic with the violations if `tree` is not structurally consistent
pub fn assert_tree_consistent(tree: &WbsTree) {
    let violations = tree.verify();
    assert!(
        violations.is_empty(),
        "tree violates invariants: {}",
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    );
}
