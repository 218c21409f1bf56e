//! Property tests over random mutation sequences.
//!
//! A plain `BTreeMap` model tracks what the store should hold after each
//! commit; the store, the forest and the violation report are checked
//! against it.

use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use yoes_core::graph::{SequenceValidator, check_store};
use yoes_core::{EdgeKind, GraphStore, Level, build_hierarchy};

const NAMES: [&str; 5] = ["Atom", "Cell", "Energy", "Force", "Motion"];

fn arb_kind() -> impl Strategy<Value = EdgeKind> {
    prop::sample::select(EdgeKind::ALL.to_vec())
}

fn arb_commit() -> impl Strategy<Value = (usize, usize, EdgeKind)> {
    (0..NAMES.len(), 0..NAMES.len(), arb_kind())
}

fn arb_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::Unknown),
        Just(Level::ROOT),
        (1_u32..4).prop_map(Level::Depth),
    ]
}

fn seeded(levels: &[Level]) -> GraphStore {
    let mut store = GraphStore::new();
    for (name, level) in NAMES.iter().zip(levels) {
        store.upsert_headword(name, *level).expect("add headword");
    }
    store
}

type Model = BTreeMap<(String, String), EdgeKind>;

fn apply_to_model(model: &mut Model, from: &str, to: &str, kind: EdgeKind) {
    let (canonical, swapped) = kind.canonicalize();
    if swapped {
        model.remove(&(from.to_string(), to.to_string()));
        model.insert((to.to_string(), from.to_string()), canonical);
    } else {
        model.insert((from.to_string(), to.to_string()), canonical);
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn commit_replay_keeps_last_canonical_kind(
        commits in prop::collection::vec(arb_commit(), 0..40),
    ) {
        let mut store = seeded(&[Level::Unknown; 5]);
        let mut model = Model::new();

        for (from, to, kind) in commits {
            let (from, to) = (NAMES[from], NAMES[to]);
            let result = store.commit_edge(from, to, kind);
            if from == to {
                prop_assert!(result.is_err());
                continue;
            }
            prop_assert!(result.is_ok());
            apply_to_model(&mut model, from, to, kind);
        }

        let stored: Model = store
            .edges()
            .map(|edge| ((edge.from, edge.to), edge.kind))
            .collect();
        prop_assert_eq!(&stored, &model);
        prop_assert_eq!(store.edge_count(), model.len());
        prop_assert!(store.edges().all(|edge| edge.kind.is_canonical()));
    }

    #[test]
    fn adjacency_views_agree_with_edge_list(
        commits in prop::collection::vec(arb_commit(), 0..40),
        doomed in prop::option::of(0..NAMES.len()),
    ) {
        let mut store = seeded(&[Level::Unknown; 5]);
        for (from, to, kind) in commits {
            let _ = store.commit_edge(NAMES[from], NAMES[to], kind);
        }
        if let Some(index) = doomed {
            store.remove_headword(NAMES[index]).expect("remove");
            prop_assert!(store.edges_from(NAMES[index]).is_empty());
            prop_assert!(store.edges_to(NAMES[index]).is_empty());
        }

        let mut seen = 0;
        for name in NAMES {
            for edge in store.edges_from(name) {
                prop_assert_eq!(store.edge_kind(&edge.from, &edge.to), Some(edge.kind));
                prop_assert!(store.edges_to(&edge.to).contains(&edge));
                seen += 1;
            }
        }
        prop_assert_eq!(seen, store.edge_count());
    }

    #[test]
    fn hierarchy_is_deterministic_and_flatten_is_unique(
        levels in prop::collection::vec(arb_level(), NAMES.len()),
        commits in prop::collection::vec(arb_commit(), 0..30),
    ) {
        let mut store = seeded(&levels);
        for (from, to, kind) in commits {
            let _ = store.commit_edge(NAMES[from], NAMES[to], kind);
        }

        let forest = build_hierarchy(&store);
        prop_assert_eq!(&forest, &build_hierarchy(&store));

        let order = forest.flatten();
        let unique: HashSet<_> = order.iter().collect();
        prop_assert_eq!(unique.len(), order.len());

        // Every headword is either placed in the forest or reported unattached.
        let unattached: HashSet<_> = forest.unattached().collect();
        for name in NAMES {
            prop_assert!(
                order.iter().any(|placed| placed == name) != unattached.contains(name),
                "{} placed={:?} unattached={:?}", name, order, unattached
            );
        }

        // A cycle finding always names a stored SubClass edge.
        for (from, to) in forest.cycles() {
            prop_assert_eq!(store.edge_kind(from, to), Some(EdgeKind::SubClass));
        }
    }

    #[test]
    fn each_subclass_cycle_is_reported_once_and_forest_stays_bounded(
        levels in prop::collection::vec(arb_level(), NAMES.len()),
        commits in prop::collection::vec(arb_commit(), 0..30),
    ) {
        let mut store = seeded(&levels);
        for (from, to, kind) in commits {
            let _ = store.commit_edge(NAMES[from], NAMES[to], kind);
        }

        let forest = build_hierarchy(&store);
        prop_assert!(forest.node_count() <= store.len() + store.edge_count());

        let cycles: Vec<(&str, &str)> = forest.cycles().collect();
        let distinct: HashSet<_> = cycles.iter().collect();
        prop_assert_eq!(distinct.len(), cycles.len(), "duplicate cycle in {:?}", cycles);

        // reach[a][b]: a SubClass path leads from a to b.
        let index = |name: &str| NAMES.iter().position(|n| *n == name);
        let mut reach = [[false; NAMES.len()]; NAMES.len()];
        for edge in store.edges_of_kind(EdgeKind::SubClass) {
            if let (Some(a), Some(b)) = (index(&edge.from), index(&edge.to)) {
                reach[a][b] = true;
            }
        }
        for k in 0..NAMES.len() {
            for a in 0..NAMES.len() {
                for b in 0..NAMES.len() {
                    reach[a][b] |= reach[a][k] && reach[k][b];
                }
            }
        }

        // Every closing edge lies on a real loop.
        for (from, to) in &cycles {
            let (Some(a), Some(b)) = (index(from), index(to)) else {
                return Err(TestCaseError::fail(format!("unknown headword in {from}->{to}")));
            };
            prop_assert!(reach[b][a], "{} -> {} closes no loop", from, to);
        }

        // Every loop has a closing edge reported somewhere inside it.
        for member in 0..NAMES.len() {
            if reach[member][member] {
                let covered = cycles.iter().any(|(from, _)| {
                    index(from).is_some_and(|a| reach[member][a] && reach[a][member])
                });
                prop_assert!(covered, "loop through {} not reported: {:?}", NAMES[member], cycles);
            }
        }
    }

    #[test]
    fn violations_are_exactly_the_forward_dependencies(
        levels in prop::collection::vec(arb_level(), NAMES.len()),
        commits in prop::collection::vec(arb_commit(), 0..30),
    ) {
        let mut store = seeded(&levels);
        for (from, to, kind) in commits {
            let _ = store.commit_edge(NAMES[from], NAMES[to], kind);
        }

        let (forest, violations) = check_store(&store);
        let order = forest.flatten();
        let validator = SequenceValidator::new(&order);

        let expected: Vec<_> = store
            .depends_edges()
            .into_iter()
            .filter_map(|edge| {
                let from_pos = validator.position(&edge.from)?;
                let to_pos = validator.position(&edge.to)?;
                (to_pos > from_pos).then_some((edge.from, edge.to, from_pos, to_pos))
            })
            .collect();
        let actual: Vec<_> = violations
            .into_iter()
            .map(|v| (v.from, v.to, v.from_pos, v.to_pos))
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
