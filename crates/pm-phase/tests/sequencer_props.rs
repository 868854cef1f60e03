use pm_model::{Methodology, NewPhase, PhaseId};
use pm_phase::{InsertPosition, PhaseSequencer};
use proptest::prelude::*;

/// Reference model: plain list of ids, insert after index
fn model_insert(model: &mut Vec<PhaseId>, after: Option<&PhaseId>, id: PhaseId) {
    let at = after
        .and_then(|a| model.iter().position(|p| p == a))
        .map_or(model.len(), |i| i + 1);
    model.insert(at, id);
}

fn ids(seq: &PhaseSequencer) -> Vec<PhaseId> {
    seq.sequence().into_iter().map(|p| p.id).collect()
}

#[test]
fn repeated_insertion_between_same_neighbours() {
    let mut seq = PhaseSequencer::for_methodology(Methodology::Waterfall);
    for i in 0..12 {
        seq.add_custom_phase(
            NewPhase::new(format!("step {i}")),
            InsertPosition::after("initiation"),
        );
    }

    let sequence = seq.sequence();
    assert_eq!(sequence[0].id.as_str(), "initiation");
    assert_eq!(sequence[1].name, "step 11");
    assert_eq!(sequence[12].name, "step 0");
    assert_eq!(sequence[13].id.as_str(), "planning");
    for phase in seq.custom_phases() {
        assert_eq!(phase.order.fract(), 0.0);
    }
}

proptest! {
    #[test]
    fn prop_insertions_match_list_model(
        picks in proptest::collection::vec(proptest::option::of(any::<usize>()), 10..40),
    ) {
        let mut seq = PhaseSequencer::for_methodology(Methodology::Hybrid);
        let mut model = ids(&seq);

        for (n, pick) in picks.iter().enumerate() {
            let after = pick.map(|i| model[i % model.len()].clone());
            let position = match &after {
                Some(id) => InsertPosition::After(id.clone()),
                None => InsertPosition::End,
            };
            let id = seq.add_custom_phase(NewPhase::new(format!("custom {n}")), position);
            model_insert(&mut model, after.as_ref(), id.clone());

            let current = ids(&seq);
            prop_assert_eq!(&current, &model);

            if let Some(after) = &after {
                let a = seq.position_of(after).unwrap();
                prop_assert_eq!(seq.position_of(&id), Some(a + 1));
            }
        }

        let mut last = 0.0;
        for phase in seq.custom_phases() {
            prop_assert_eq!(phase.order.fract(), 0.0);
            prop_assert!(phase.order > last);
            last = phase.order;
        }

        let base: Vec<_> = seq.base_phases().iter().map(|p| p.order).collect();
        prop_assert_eq!(base, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn prop_delete_and_move_keep_dense_positions(
        inserts in proptest::collection::vec(proptest::option::of(any::<usize>()), 1..20),
        ops in proptest::collection::vec((any::<bool>(), any::<usize>(), proptest::option::of(any::<usize>())), 1..20),
    ) {
        let mut seq = PhaseSequencer::for_methodology(Methodology::Agile);
        for (n, pick) in inserts.iter().enumerate() {
            let current = ids(&seq);
            let position = pick
                .map(|i| InsertPosition::After(current[i % current.len()].clone()))
                .unwrap_or_default();
            seq.add_custom_phase(NewPhase::new(format!("c{n}")), position);
        }

        for (delete, victim, target) in ops {
            let customs: Vec<PhaseId> = seq.custom_phases().iter().map(|p| p.id.clone()).collect();
            if customs.is_empty() {
                break;
            }
            let victim = customs[victim % customs.len()].clone();
            if delete {
                prop_assert!(seq.delete_phase(&victim).is_some());
                prop_assert!(seq.get(&victim).is_none());
            } else {
                let current = ids(&seq);
                let position = target
                    .map(|t| InsertPosition::After(current[t % current.len()].clone()))
                    .unwrap_or_default();
                let moved = seq.move_custom_phase(&victim, position.clone());
                if moved {
                    if let InsertPosition::After(after) = &position {
                        let a = seq.position_of(after).unwrap();
                        prop_assert_eq!(seq.position_of(&victim), Some(a + 1));
                    } else {
                        prop_assert_eq!(seq.position_of(&victim), Some(seq.len()));
                    }
                }
            }

            for phase in seq.custom_phases() {
                prop_assert_eq!(seq.position_of(&phase.id), Some(phase.order as usize));
            }
            prop_assert_eq!(seq.len(), 5 + seq.custom_phases().len());
        }
    }
}
