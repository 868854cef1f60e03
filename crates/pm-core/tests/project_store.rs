use pm_core::{CoreError, ProjectStateStore, WorkspaceConfig};
use pm_model::{Methodology, NewNode, NewPhase, NodePatch, NodeStatus, PhaseId, WbsCode};
use pm_phase::InsertPosition;
use pm_store::{BlobStore, MemoryBlobStore, ProjectSnapshot, StoreError};
use pm_test_utils::{
    assert_tree_consistent, outline_codes, raw_node, sample_phases, sample_tree, seeded_store,
};
use pm_wbs::{MoveOutcome, WbsTree};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn load(blobs: &MemoryBlobStore) -> ProjectStateStore {
    ProjectStateStore::load(Box::new(blobs.clone()), "sample", Methodology::Hybrid).unwrap()
}

#[test]
fn loads_seeded_project() {
    let (tree, _) = sample_tree();
    let phases = sample_phases();
    let blobs = seeded_store("sample", &tree, &phases);

    let project = load(&blobs);
    assert!(project.is_persisted());
    assert_eq!(project.methodology(), Methodology::Waterfall);
    assert_eq!(
        outline_codes(project.tree()),
        vec!["1", "1.1", "1.2", "1.2.1", "1.2.2", "2"]
    );
    assert_eq!(project.phases().sequence(), phases.sequence());
    assert_eq!(
        project.node_by_code(&"1.2.1".into()).unwrap().assignee.as_deref(),
        Some("dana")
    );
}

#[test]
fn delete_by_code_cascades_and_persists() {
    let (tree, ids) = sample_tree();
    let blobs = seeded_store("sample", &tree, &sample_phases());
    let mut project = load(&blobs);

    let target = project.resolve_code("1.2").unwrap();
    let removed = project.delete_node(target).unwrap();
    assert_eq!(removed.len(), 3);

    let reloaded = load(&blobs);
    assert_eq!(outline_codes(reloaded.tree()), vec!["1", "1.1", "2"]);
    assert!(!reloaded.tree().get(ids.one).unwrap().children.contains(&ids.one_two));
    assert!(matches!(
        reloaded.resolve_code("1.2.1"),
        Err(CoreError::UnknownCode(_))
    ));
}

#[test]
fn move_recodes_subtree() {
    let (tree, ids) = sample_tree();
    let blobs = seeded_store("sample", &tree, &sample_phases());
    let mut project = load(&blobs);

    let outcome = project.move_node(ids.one_two, Some(ids.two)).unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Moved {
            old_code: WbsCode::from("1.2"),
            new_code: WbsCode::from("2.1"),
            affected: 3,
        }
    );
    assert_eq!(
        outline_codes(project.tree()),
        vec!["1", "1.1", "2", "2.1", "2.1.1", "2.1.2"]
    );
    assert_tree_consistent(project.tree());

    let rejected = project.move_node(ids.one, Some(ids.one_one)).unwrap();
    assert_eq!(rejected, MoveOutcome::WouldCycle);
}

#[test]
fn update_and_rollup() {
    let (tree, ids) = sample_tree();
    let blobs = seeded_store("sample", &tree, &sample_phases());
    let mut project = load(&blobs);

    let patch = NodePatch::new().status(NodeStatus::InProgress).progress(100);
    assert!(project.update_node(ids.one_two_two, patch).unwrap());

    let rollup = project.tree().rollup(ids.one_two).unwrap();
    assert_eq!(rollup.budget, 5000.0);
    assert_eq!(rollup.estimated_hours, 200.0);
    assert_eq!(rollup.leaf_count, 2);
    assert_eq!(rollup.progress, 75.0);

    let reloaded = load(&blobs);
    let node = reloaded.node_by_code(&WbsCode::from("1.2.2")).unwrap();
    assert_eq!(node.status, NodeStatus::InProgress);
}

#[test]
fn phase_operations_round_trip() {
    let blobs = MemoryBlobStore::new();
    let mut project =
        ProjectStateStore::load(Box::new(blobs.clone()), "phases", Methodology::Waterfall).unwrap();

    let review = project
        .add_custom_phase(NewPhase::new("Design Review"), InsertPosition::after("planning"))
        .unwrap();
    let tail = project
        .add_custom_phase(NewPhase::new("Retro"), InsertPosition::from_after(Some("end")))
        .unwrap();
    assert_eq!(project.phases().position_of(&review), Some(3));
    assert_eq!(project.phases().position_of(&tail), Some(7));

    assert!(project
        .move_custom_phase(&tail, InsertPosition::after("initiation"))
        .unwrap());
    assert!(project.delete_phase(&review).unwrap().is_some());

    let reloaded =
        ProjectStateStore::load(Box::new(blobs), "phases", Methodology::Waterfall).unwrap();
    let ids: Vec<String> = reloaded
        .phases()
        .sequence()
        .into_iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(ids[0], "initiation");
    assert_eq!(ids[1], tail.to_string());
    assert_eq!(ids[2], "planning");
    assert_eq!(ids.len(), 6);
    assert!(reloaded.phase(&PhaseId::new("closure")).is_ok());
}

#[test]
fn inconsistent_snapshot_is_repaired_on_load() {
    let root = raw_node("1", None, 0);
    let child = raw_node("1.1", Some(root.id), 4);
    let blobs = MemoryBlobStore::new();
    let snapshot = ProjectSnapshot::new("broken", Methodology::Agile, vec![root, child], vec![]);
    blobs.put("broken", &snapshot.to_bytes(false).unwrap()).unwrap();

    let project =
        ProjectStateStore::load(Box::new(blobs), "broken", Methodology::Agile).unwrap();
    assert_tree_consistent(project.tree());
}

#[test]
fn newer_schema_is_refused() {
    let blobs = MemoryBlobStore::new();
    blobs.put("future", br#"{"schemaVersion": 99}"#).unwrap();

    let err = ProjectStateStore::load(Box::new(blobs), "future", Methodology::Hybrid).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Store(StoreError::UnsupportedSchema { found: 99, .. })
    ));
}

#[test]
fn opens_file_store_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = WorkspaceConfig::new()
        .with_store_dir(dir.path().join("state"))
        .with_project_key("site")
        .with_methodology(Methodology::Agile);

    let mut project = ProjectStateStore::open(&config).unwrap();
    project.add_node(NewNode::new("Website"), None).unwrap();
    assert!(dir.path().join("state").join("site.json").is_file());

    let reopened = ProjectStateStore::open(&config.clone().with_methodology(Methodology::Waterfall))
        .unwrap();
    assert_eq!(reopened.methodology(), Methodology::Agile);
    assert_eq!(reopened.tree().len(), 1);
}

proptest! {
    #[test]
    fn prop_reload_preserves_tree(parents in proptest::collection::vec(proptest::option::of(any::<usize>()), 1..30)) {
        let blobs = MemoryBlobStore::new();
        let mut project = load(&blobs);
        for pick in parents {
            let ids: Vec<_> = project.tree().iter().map(|n| n.id).collect();
            let parent = pick.and_then(|i| (!ids.is_empty()).then(|| ids[i % ids.len()]));
            project.add_node(NewNode::default(), parent).unwrap();
        }

        let reloaded = load(&blobs);
        let expected: &WbsTree = project.tree();
        prop_assert_eq!(reloaded.tree(), expected);
        prop_assert!(reloaded.tree().is_consistent());
    }
}
