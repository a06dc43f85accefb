//! Integration tests for stowage-planner.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stowage_core::{
    contains, overlaps, CommitBatch, CommitSink, Container, Item, ItemStore, MemoryStore,
    Placement, Snapshot,
};
use stowage_planner::{
    placement_mutations, PlacementPlanner, PlacementResult, RetrievalPlanner, RetrievalStep,
};

fn cont_a() -> Container {
    Container::new("contA", "Crew Quarters", 100.0, 85.0, 200.0)
}

mod placement_tests {
    use super::*;

    #[test]
    fn test_placement_is_deterministic() {
        let items: Vec<Item> = (0..30)
            .map(|i| {
                Item::new(format!("i{}", i), "Box", 12.0, 9.0, 15.0).with_priority((i * 7 % 100) as u8)
            })
            .collect();
        let planner = PlacementPlanner::default_config();

        let first = planner.plan(&items, &[cont_a()], &[]).unwrap();
        let second = planner.plan(&items, &[cont_a()], &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_placements_stay_put() {
        let snapshot = Snapshot::new(
            vec![cont_a()],
            vec![Item::new("i1", "Food Packet", 10.0, 10.0, 20.0)
                .with_priority(80)
                .with_placement(Placement::new("contA", 0.0, 0.0, 0.0))],
        )
        .unwrap();
        let items = vec![Item::new("i2", "Water Bottle", 10.0, 10.0, 20.0).with_priority(50)];

        let results = PlacementPlanner::default_config()
            .plan_snapshot(&items, &snapshot)
            .unwrap();
        assert_eq!(placement_mutations(&results).len(), 1);

        let inserted = snapshot
            .apply(&[stowage_core::Mutation::Insert {
                item: items[0]
                    .clone()
                    .with_placement(results[0].placement().unwrap().clone()),
            }])
            .unwrap();
        assert_eq!(
            inserted.item("i1").unwrap().placement(),
            snapshot.item("i1").unwrap().placement()
        );
    }

    #[test]
    fn test_random_batches_stay_inside_and_apart() {
        let mut rng = StdRng::seed_from_u64(42);
        let containers = vec![
            cont_a(),
            Container::new("contB", "Storage", 60.0, 60.0, 60.0),
            Container::new("contC", "Medical", 40.0, 30.0, 50.0),
        ];

        for round in 0..10 {
            let items: Vec<Item> = (0..40)
                .map(|i| {
                    let mut item = Item::new(
                        format!("r{}-{}", round, i),
                        "Random",
                        rng.gen_range(2.0..40.0),
                        rng.gen_range(2.0..40.0),
                        rng.gen_range(2.0..40.0),
                    )
                    .with_priority(rng.gen_range(1..=100));
                    if rng.gen_bool(0.3) {
                        item = item.with_preferred_zone("Medical");
                    }
                    item
                })
                .collect();

            let results = PlacementPlanner::default_config()
                .plan(&items, &containers, &[])
                .unwrap();
            assert_eq!(results.len(), items.len());

            let placed: Vec<(&str, stowage_core::BoundingBox)> = results
                .iter()
                .zip(&items)
                .filter_map(|(r, item)| {
                    r.placement()
                        .map(|p| (p.container_id.as_str(), p.bounding_box(item.dimensions())))
                })
                .collect();

            for (container_id, bbox) in &placed {
                let container = containers.iter().find(|c| c.id() == container_id).unwrap();
                assert!(contains(container, bbox), "round {}: box escapes {}", round, container_id);
            }
            for (i, (ca, a)) in placed.iter().enumerate() {
                for (cb, b) in placed.iter().skip(i + 1) {
                    assert!(ca != cb || !overlaps(a, b), "round {}: overlap in {}", round, ca);
                }
            }

            // The whole batch must commit as one consistent snapshot.
            let inserts: Vec<stowage_core::Mutation> = results
                .iter()
                .zip(&items)
                .filter_map(|(r, item)| {
                    r.placement().map(|p| stowage_core::Mutation::Insert {
                        item: item.clone().with_placement(p.clone()),
                    })
                })
                .collect();
            let empty = Snapshot::new(containers.clone(), Vec::new()).unwrap();
            assert!(empty.apply(&inserts).is_ok());
        }
    }

    #[test]
    fn test_no_fit_reported_per_item() {
        let items = vec![
            Item::new("big", "Big", 500.0, 500.0, 500.0),
            Item::new("ok", "Ok", 10.0, 10.0, 10.0),
        ];
        let results = PlacementPlanner::default_config()
            .plan(&items, &[cont_a()], &[])
            .unwrap();
        assert!(matches!(results[0], PlacementResult::NoFit { .. }));
        assert!(results[1].is_placed());
    }
}

mod retrieval_tests {
    use super::*;

    fn stacked() -> Snapshot {
        Snapshot::new(
            vec![cont_a()],
            vec![
                Item::new("t", "Target", 10.0, 20.0, 10.0)
                    .with_placement(Placement::new("contA", 0.0, 40.0, 0.0)),
                Item::new("b", "Blocker", 10.0, 20.0, 10.0)
                    .with_placement(Placement::new("contA", 0.0, 20.0, 0.0)),
                Item::new("c", "Cover", 10.0, 20.0, 10.0)
                    .with_placement(Placement::new("contA", 0.0, 0.0, 0.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_blocked_item_sequence() {
        let plan = RetrievalPlanner::default_config()
            .plan("t", &stacked())
            .unwrap();
        assert_eq!(plan.blocking_items(), vec!["c", "b"]);
        assert!(matches!(plan.steps[2], RetrievalStep::Retrieve { .. }));
        let returned: Vec<&str> = plan.steps[3..].iter().map(|s| s.item_id()).collect();
        assert_eq!(returned, vec!["b", "c"]);
    }

    #[test]
    fn test_plan_is_idempotent() {
        let snapshot = stacked();
        let planner = RetrievalPlanner::default_config();
        assert_eq!(
            planner.plan("t", &snapshot).unwrap(),
            planner.plan("t", &snapshot).unwrap()
        );
    }

    #[test]
    fn test_commit_through_store() {
        let store = MemoryStore::new(stacked());
        let snapshot = store.snapshot().unwrap();
        let plan = RetrievalPlanner::default_config()
            .plan("t", &snapshot)
            .unwrap();

        store
            .commit(CommitBatch::against(&snapshot, plan.mutations()))
            .unwrap();

        let after = store.get_item("t").unwrap();
        assert!(after.placement().is_none());
        assert!(store.get_item("b").unwrap().placement().is_some());

        // The same plan against the old snapshot is now stale.
        let stale = store.commit(CommitBatch::against(&snapshot, plan.mutations()));
        assert!(stale.unwrap_err().is_retryable());
    }
}
