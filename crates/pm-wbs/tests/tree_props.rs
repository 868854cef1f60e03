use pm_model::{NewNode, NodeId, WbsCode};
use pm_wbs::WbsTree;
use proptest::prelude::*;
use std::collections::HashSet;

/// One step of a random edit script
///
/// Indices select among the nodes alive at that point (modulo their count).
#[derive(Debug, Clone)]
enum Edit {
    AddRoot,
    AddChild(usize),
    Delete(usize),
    Move(usize, Option<usize>),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        2 => Just(Edit::AddRoot),
        6 => any::<usize>().prop_map(Edit::AddChild),
        1 => any::<usize>().prop_map(Edit::Delete),
        1 => (any::<usize>(), proptest::option::of(any::<usize>()))
            .prop_map(|(a, b)| Edit::Move(a, b)),
    ]
}

fn pick(ids: &[NodeId], i: usize) -> Option<NodeId> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[i % ids.len()])
    }
}

fn apply(tree: &mut WbsTree, edit: &Edit) {
    let ids: Vec<NodeId> = tree.iter().map(|n| n.id).collect();
    match edit {
        Edit::AddRoot => {
            tree.add_node(NewNode::new("root"), None);
        }
        Edit::AddChild(i) => {
            let parent = pick(&ids, *i);
            tree.add_node(NewNode::new("child"), parent);
        }
        Edit::Delete(i) => {
            if let Some(id) = pick(&ids, *i) {
                tree.delete_node(id);
            }
        }
        Edit::Move(i, target) => {
            if let Some(id) = pick(&ids, *i) {
                let target = target.and_then(|t| pick(&ids, t));
                tree.move_node(id, target);
            }
        }
    }
}

#[test]
fn add_under_parent_code_format() {
    let mut tree = WbsTree::new();
    let two = {
        tree.add_node(NewNode::new("1"), None);
        tree.add_node(NewNode::new("2"), None)
    };
    let two_one = tree.add_node(NewNode::new("2.1"), Some(two));
    assert_eq!(tree.get(two_one).unwrap().code.as_str(), "2.1");

    let fresh = tree.add_node(NewNode::default(), Some(two_one));
    let code = tree.get(fresh).unwrap().code.clone();
    let rest = code.as_str().strip_prefix("2.1.").unwrap();
    assert!(rest.parse::<u64>().unwrap() >= 1);
}

#[test]
fn delete_scenario_from_outline() {
    let mut tree = WbsTree::new();
    let one = tree.add_node(NewNode::new("1"), None);
    tree.add_node(NewNode::new("1.1"), Some(one));
    let one_two = tree.add_node(NewNode::new("1.2"), Some(one));
    tree.add_node(NewNode::new("1.2.1"), Some(one_two));
    tree.add_node(NewNode::new("1.2.2"), Some(one_two));

    tree.delete_node(one_two);

    for code in ["1.2", "1.2.1", "1.2.2"] {
        assert!(tree.find_by_code(&WbsCode::from(code)).is_none());
    }
    assert!(!tree.get(one).unwrap().children.contains(&one_two));
    assert!(tree.is_consistent());
}

proptest! {
    #[test]
    fn prop_sibling_codes_strictly_increase(count in 1usize..40) {
        let mut tree = WbsTree::new();
        let parent = tree.add_node(NewNode::new("parent"), None);

        let mut last = 0;
        let mut seen = HashSet::new();
        for _ in 0..count {
            let id = tree.add_node(NewNode::default(), Some(parent));
            let code = tree.get(id).unwrap().code.clone();
            prop_assert!(seen.insert(code.clone()));
            prop_assert!(code.suffix_number() > last);
            last = code.suffix_number();
        }
    }

    #[test]
    fn prop_random_edits_keep_invariants(edits in proptest::collection::vec(edit_strategy(), 1..60)) {
        let mut tree = WbsTree::new();
        for edit in &edits {
            apply(&mut tree, edit);
            let violations = tree.verify();
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", edit, violations);
        }

        for node in tree.iter() {
            match node.parent_id {
                None => prop_assert_eq!(node.level, 0),
                Some(pid) => {
                    let parent = tree.get(pid).unwrap();
                    prop_assert_eq!(node.level, parent.level + 1);
                    let expected_prefix = format!("{}.", parent.code);
                    prop_assert!(node.code.as_str().starts_with(&expected_prefix));
                }
            }
        }
    }

    #[test]
    fn prop_delete_removes_exactly_the_subtree(
        edits in proptest::collection::vec(edit_strategy(), 1..40),
        victim in any::<usize>(),
    ) {
        let mut tree = WbsTree::new();
        for edit in &edits {
            apply(&mut tree, edit);
        }
        let ids: Vec<NodeId> = tree.iter().map(|n| n.id).collect();
        prop_assume!(!ids.is_empty());
        let target = ids[victim % ids.len()];

        let mut expected: HashSet<NodeId> = tree.descendants_of(target).iter().map(|n| n.id).collect();
        expected.insert(target);
        let former_parent = tree.get(target).unwrap().parent_id;
        let before: HashSet<NodeId> = ids.iter().copied().collect();

        let removed: HashSet<NodeId> = tree.delete_node(target).into_iter().collect();
        let after: HashSet<NodeId> = tree.iter().map(|n| n.id).collect();

        prop_assert_eq!(&removed, &expected);
        prop_assert_eq!(after, before.difference(&expected).copied().collect::<HashSet<_>>());
        if let Some(pid) = former_parent {
            prop_assert!(!tree.get(pid).unwrap().children.contains(&target));
        }

        let snapshot = tree.clone();
        prop_assert!(tree.delete_node(target).is_empty());
        prop_assert_eq!(tree, snapshot);
    }
}
