//! Integration tests for stowage-core.

use chrono::NaiveDate;
use std::sync::Arc;
use std::thread;
use stowage_core::geometry::{BoundingBox, Dimensions, Orientation, OrientationConstraint};
use stowage_core::{
    contains, overlaps, CommitBatch, CommitSink, Container, Error, Item, ItemStatus, ItemStore,
    MemoryStore, Mutation, Placement, Snapshot,
};

fn cont_a() -> Container {
    Container::new("contA", "Crew Quarters", 100.0, 85.0, 200.0)
}

mod geometry_tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_orientations_preserve_volume() {
        let dims = Dimensions::new(10.0, 20.0, 30.0);
        for orientation in Orientation::ALL {
            assert_relative_eq!(dims.oriented(orientation).volume(), 6000.0);
        }
    }

    #[test]
    fn test_upright_keeps_height() {
        let dims = Dimensions::new(10.0, 20.0, 30.0);
        for orientation in OrientationConstraint::Upright.allowed() {
            assert_relative_eq!(dims.oriented(orientation).height, 30.0);
        }
        assert_eq!(OrientationConstraint::Upright.allowed().len(), 2);
    }

    #[test]
    fn test_touching_faces_do_not_overlap() {
        let a = BoundingBox::from_coords(0.0, 0.0, 0.0, 10.0, 10.0, 20.0);
        let b = BoundingBox::from_coords(10.0, 0.0, 0.0, 10.0, 10.0, 20.0);
        let c = BoundingBox::from_coords(9.0, 0.0, 0.0, 10.0, 10.0, 20.0);
        assert!(!overlaps(&a, &b));
        assert!(overlaps(&a, &c));
        assert!(contains(&cont_a(), &a));
        assert!(!contains(
            &cont_a(),
            &BoundingBox::from_coords(95.0, 0.0, 0.0, 10.0, 10.0, 10.0)
        ));
    }
}

mod snapshot_tests {
    use super::*;

    #[test]
    fn test_rejects_overlap() {
        let result = Snapshot::new(
            vec![cont_a()],
            vec![
                Item::new("a", "A", 10.0, 10.0, 10.0)
                    .with_placement(Placement::new("contA", 0.0, 0.0, 0.0)),
                Item::new("b", "B", 10.0, 10.0, 10.0)
                    .with_placement(Placement::new("contA", 5.0, 5.0, 5.0)),
            ],
        );
        assert!(matches!(result, Err(Error::InconsistentSnapshot(_))));
    }

    #[test]
    fn test_rotated_placement_counts_rotated_box() {
        // A 10 x 50 x 10 rod only fits the 50 x 10 x 10 container lying along W.
        let container = Container::new("C", "Z", 50.0, 10.0, 10.0);
        let rod = Item::new("rod", "Rod", 10.0, 50.0, 10.0);
        assert!(Snapshot::new(
            vec![container.clone()],
            vec![rod
                .clone()
                .with_placement(Placement::new("C", 0.0, 0.0, 0.0))]
        )
        .is_err());
        assert!(Snapshot::new(
            vec![container],
            vec![rod.with_placement(
                Placement::new("C", 0.0, 0.0, 0.0).with_orientation(Orientation::Dwh)
            )]
        )
        .is_ok());
    }

    #[test]
    fn test_disposal_is_terminal() {
        let snapshot = Snapshot::new(
            vec![cont_a()],
            vec![Item::new("w", "Waste", 10.0, 10.0, 10.0)
                .with_status(ItemStatus::WasteExpired)
                .with_placement(Placement::new("contA", 0.0, 0.0, 0.0))],
        )
        .unwrap();

        let disposed = snapshot
            .apply(&[Mutation::Dispose {
                item_id: "w".into(),
            }])
            .unwrap();
        let item = disposed.item("w").unwrap();
        assert_eq!(item.status(), ItemStatus::Disposed);
        assert!(item.placement().is_none());

        assert!(disposed
            .apply(&[Mutation::Place {
                item_id: "w".into(),
                placement: Placement::new("contA", 0.0, 0.0, 0.0),
            }])
            .is_err());
        assert!(disposed
            .apply(&[Mutation::SetStatus {
                item_id: "w".into(),
                status: ItemStatus::Stowed,
            }])
            .is_err());
    }

    #[test]
    fn test_expiry_is_strict() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let item = Item::new("f", "Food", 1.0, 1.0, 1.0).with_expiry(date);
        assert!(!item.is_expired_on(date));
        assert!(item.is_expired_on(date.succ_opt().unwrap()));
    }
}

mod store_tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(
            Snapshot::new(
                vec![cont_a(), Container::new("contB", "Storage", 50.0, 50.0, 50.0)],
                (0..8)
                    .map(|i| Item::new(format!("i{}", i), "Box", 10.0, 10.0, 10.0))
                    .collect(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_concurrent_commits_never_overlap() {
        let store = Arc::new(store());

        // Every writer races for the same slot; exactly one may win.
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let snapshot = store.snapshot().unwrap();
                    let batch = CommitBatch::against(
                        &snapshot,
                        vec![Mutation::Place {
                            item_id: format!("i{}", i),
                            placement: Placement::new("contA", 0.0, 0.0, 0.0),
                        }],
                    );
                    store.commit(batch)
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        for outcome in outcomes.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                outcome.is_retryable() || matches!(outcome, Error::InconsistentSnapshot(_)),
                "unexpected error: {}",
                outcome
            );
        }

        let placed = store
            .list_items(None)
            .unwrap()
            .into_iter()
            .filter(|i| i.placement().is_some())
            .count();
        assert_eq!(placed, 1);
        assert_eq!(store.snapshot().unwrap().version("contA"), 1);
    }

    #[test]
    fn test_untouched_container_does_not_conflict() {
        let store = store();
        let snapshot = store.snapshot().unwrap();

        store
            .commit(CommitBatch::against(
                &snapshot,
                vec![Mutation::Place {
                    item_id: "i0".into(),
                    placement: Placement::new("contA", 0.0, 0.0, 0.0),
                }],
            ))
            .unwrap();

        // Planned against the old snapshot, but only touches contB.
        store
            .commit(CommitBatch::against(
                &snapshot,
                vec![Mutation::Place {
                    item_id: "i1".into(),
                    placement: Placement::new("contB", 0.0, 0.0, 0.0),
                }],
            ))
            .unwrap();

        assert_eq!(store.list_containers().unwrap().len(), 2);
        assert_eq!(
            store.get_item("i1").unwrap().container_id(),
            Some("contB")
        );
    }
}
