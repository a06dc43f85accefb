//! Rearrangement planner.
//!
//! When an item fits nowhere, lower-priority items can be moved out of its
//! way. For each candidate container the planner evicts stowed items of
//! strictly lower priority, lowest priority first, until the item fits,
//! then relocates every evicted item with the placement planner. The first
//! container where both succeed within the move limit wins.

use crate::placement::{candidate_order, placement_order, PlacementPlanner};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use stowage_core::audit::{ActionType, Auditable, LogEntry};
use stowage_core::snapshot::Occupancy;
use stowage_core::{Config, Error, Item, ItemId, ItemStatus, Mutation, Placement, Result, Snapshot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One item moved out of the way.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move {
    /// The moved item.
    pub item_id: ItemId,
    /// Where it was.
    pub from: Placement,
    /// Where it goes.
    pub to: Placement,
}

/// Moves that make room for an item, and the item's resulting slot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rearrangement {
    /// The item being stowed.
    pub item_id: ItemId,
    /// Relocations, in execution order.
    pub moves: Vec<Move>,
    /// Slot for the item once the moves are done.
    pub placement: Placement,
}

impl Rearrangement {
    /// Mutations that commit the rearrangement. `item` is inserted if the
    /// snapshot does not know it yet.
    pub fn mutations(&self, item: &Item, snapshot: &Snapshot) -> Vec<Mutation> {
        let mut mutations: Vec<Mutation> = self
            .moves
            .iter()
            .map(|m| Mutation::Place {
                item_id: m.item_id.clone(),
                placement: m.to.clone(),
            })
            .collect();

        if snapshot.item(item.id()).is_some() {
            mutations.push(Mutation::Place {
                item_id: item.id().clone(),
                placement: self.placement.clone(),
            });
        } else {
            mutations.push(Mutation::Insert {
                item: item.clone().with_placement(self.placement.clone()),
            });
        }
        mutations
    }
}

impl Auditable for Rearrangement {
    fn log_entries(&self, at: DateTime<Utc>, user_id: Option<&str>) -> Vec<LogEntry> {
        let mut entries: Vec<LogEntry> = self
            .moves
            .iter()
            .map(|m| {
                LogEntry::new(
                    at,
                    ActionType::Rearrangement,
                    format!(
                        "moved from {} ({}, {}, {}) to {} ({}, {}, {}) to make room for {}",
                        m.from.container_id,
                        m.from.w(),
                        m.from.d(),
                        m.from.h(),
                        m.to.container_id,
                        m.to.w(),
                        m.to.d(),
                        m.to.h(),
                        self.item_id
                    ),
                )
                .with_user(user_id)
                .with_item(m.item_id.clone())
            })
            .collect();

        entries.push(
            LogEntry::new(
                at,
                ActionType::Placement,
                format!(
                    "placed in {} at ({}, {}, {}) after {} moves",
                    self.placement.container_id,
                    self.placement.w(),
                    self.placement.d(),
                    self.placement.h(),
                    self.moves.len()
                ),
            )
            .with_user(user_id)
            .with_item(self.item_id.clone()),
        );
        entries
    }
}

/// Rearrangement planner.
#[derive(Debug, Clone, Default)]
pub struct RearrangementPlanner {
    config: Config,
}

impl RearrangementPlanner {
    /// Creates a planner with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Creates a planner with default configuration.
    pub fn default_config() -> Self {
        Self::new(Config::default())
    }

    /// Plans room for `item`. Returns `None` when no container can take it
    /// within the move limit. An item that fits as things stand gets a
    /// rearrangement without moves.
    pub fn plan(&self, item: &Item, snapshot: &Snapshot) -> Result<Option<Rearrangement>> {
        self.config.validate()?;
        item.validate()?;
        if item.status() != ItemStatus::Stowed {
            return Err(Error::InvalidState(format!(
                "Item '{}' is {} and cannot be placed",
                item.id(),
                item.status()
            )));
        }

        let placer = PlacementPlanner::new(self.config.clone());
        let mut occupancies = snapshot.occupancies();
        for occupancy in &mut occupancies {
            occupancy.remove(item.id());
        }

        if let Some((idx, position, orientation)) = placer.find_slot(item, &occupancies) {
            return Ok(Some(Rearrangement {
                item_id: item.id().clone(),
                moves: Vec::new(),
                placement: Placement {
                    container_id: occupancies[idx].container().id().clone(),
                    position,
                    orientation,
                },
            }));
        }

        for idx in candidate_order(item, &occupancies) {
            if let Some(plan) = self.try_container(item, idx, &occupancies, snapshot, &placer) {
                log::info!(
                    "making room for {} in {} with {} moves",
                    item.id(),
                    plan.placement.container_id,
                    plan.moves.len()
                );
                return Ok(Some(plan));
            }
        }

        log::info!("no rearrangement frees room for {}", item.id());
        Ok(None)
    }

    fn try_container(
        &self,
        item: &Item,
        idx: usize,
        occupancies: &[Occupancy],
        snapshot: &Snapshot,
        placer: &PlacementPlanner,
    ) -> Option<Rearrangement> {
        let container_id = occupancies[idx].container().id().clone();
        let mut evictable: Vec<&Item> = snapshot
            .items_in(occupancies[idx].container().id())
            .filter(|other| other.id() != item.id())
            .filter(|other| {
                other.status() == ItemStatus::Stowed && other.priority() < item.priority()
            })
            .collect();
        evictable.sort_by(|a, b| eviction_order(a, b));

        let mut trial = occupancies.to_vec();
        let mut evicted: Vec<&Item> = Vec::new();
        let mut slot = None;

        for candidate in evictable.into_iter().take(self.config.max_rearrangement_moves) {
            trial[idx].remove(candidate.id());
            evicted.push(candidate);
            if let Some(found) = placer.lowest_in(item, &trial[idx]) {
                slot = Some(found);
                break;
            }
        }

        let (position, orientation) = slot?;
        let placement = Placement {
            container_id,
            position,
            orientation,
        };
        trial[idx].push(item.id().clone(), placement.bounding_box(item.dimensions()));
        log::debug!(
            "{} fits in {} after evicting {} items",
            item.id(),
            placement.container_id,
            evicted.len()
        );

        evicted.sort_by(|a, b| placement_order(a, b));
        let mut moves = Vec::with_capacity(evicted.len());
        for other in evicted {
            let from = other.placement()?.clone();
            let Some((target, position, orientation)) = placer.find_slot(other, &trial) else {
                log::debug!("evicted {} has nowhere to go", other.id());
                return None;
            };
            let to = Placement {
                container_id: trial[target].container().id().clone(),
                position,
                orientation,
            };
            trial[target].push(other.id().clone(), to.bounding_box(other.dimensions()));
            moves.push(Move {
                item_id: other.id().clone(),
                from,
                to,
            });
        }

        Some(Rearrangement {
            item_id: item.id().clone(),
            moves,
            placement,
        })
    }
}

/// Lowest priority first, then the nearest to the opening, then id.
fn eviction_order(a: &Item, b: &Item) -> Ordering {
    let front = |i: &Item| i.bounding_box().map_or(f64::INFINITY, |b| b.front());
    a.priority()
        .cmp(&b.priority())
        .then_with(|| front(a).total_cmp(&front(b)))
        .then_with(|| a.id().cmp(b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::Container;

    fn crowded() -> Snapshot {
        // Small container full with one low-priority box, big container empty.
        Snapshot::new(
            vec![
                Container::new("small", "Medical", 10.0, 10.0, 10.0),
                Container::new("big", "Storage", 10.0, 10.0, 30.0),
            ],
            vec![
                Item::new("spare", "Spare Parts", 10.0, 10.0, 10.0)
                    .with_priority(10)
                    .with_placement(Placement::new("small", 0.0, 0.0, 0.0)),
                Item::new("filler", "Filler", 10.0, 10.0, 10.0)
                    .with_priority(95)
                    .with_placement(Placement::new("big", 0.0, 0.0, 0.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fits_without_moves() {
        let item = Item::new("new", "New", 10.0, 10.0, 10.0);
        let plan = RearrangementPlanner::default_config()
            .plan(&item, &crowded())
            .unwrap()
            .unwrap();
        assert!(plan.moves.is_empty());
        assert_eq!(plan.placement.container_id, "big");
    }

    #[test]
    fn test_evicted_item_needs_a_new_slot() {
        let snapshot = crowded();
        // Fill the rest of the big container.
        let snapshot = snapshot
            .apply(&[Mutation::Insert {
                item: Item::new("block", "Block", 10.0, 10.0, 20.0)
                    .with_priority(95)
                    .with_placement(Placement::new("big", 0.0, 0.0, 10.0)),
            }])
            .unwrap();

        let item = Item::new("kit", "Kit", 10.0, 10.0, 10.0)
            .with_priority(80)
            .with_preferred_zone("Medical");
        let planner = RearrangementPlanner::default_config();

        // Both containers are full; the spare has nowhere to go.
        assert!(planner.plan(&item, &snapshot).unwrap().is_none());

        // Free half of the filler column and retry.
        let snapshot = snapshot
            .apply(&[Mutation::Unplace {
                item_id: "block".into(),
            }])
            .unwrap()
            .apply(&[Mutation::Insert {
                item: Item::new("half", "Half", 10.0, 10.0, 10.0)
                    .with_priority(95)
                    .with_placement(Placement::new("big", 0.0, 0.0, 10.0)),
            }])
            .unwrap();

        let plan = planner.plan(&item, &snapshot).unwrap().unwrap();
        // Room was available in "big" directly, so nothing moves.
        assert!(plan.moves.is_empty());
        assert_eq!(plan.placement.container_id, "big");
    }

    #[test]
    fn test_relocates_evicted_item() {
        let snapshot = Snapshot::new(
            vec![
                Container::new("small", "Medical", 10.0, 10.0, 10.0),
                Container::new("shelf", "Storage", 10.0, 10.0, 5.0),
            ],
            vec![Item::new("spare", "Spare Parts", 10.0, 10.0, 5.0)
                .with_priority(10)
                .with_placement(Placement::new("small", 0.0, 0.0, 0.0))],
        )
        .unwrap();

        let item = Item::new("kit", "Kit", 10.0, 10.0, 10.0).with_priority(80);
        let plan = RearrangementPlanner::default_config()
            .plan(&item, &snapshot)
            .unwrap()
            .unwrap();

        assert_eq!(plan.placement.container_id, "small");
        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.moves[0].item_id, "spare");
        assert_eq!(plan.moves[0].to.container_id, "shelf");

        let mutations = plan.mutations(&item, &snapshot);
        let after = snapshot.apply(&mutations).unwrap();
        assert_eq!(after.item("kit").unwrap().container_id(), Some("small"));
        assert_eq!(after.item("spare").unwrap().container_id(), Some("shelf"));

        let entries = plan.log_entries(Utc::now(), None);
        assert_eq!(entries[0].action, ActionType::Rearrangement);
        assert_eq!(entries.last().unwrap().action, ActionType::Placement);
    }

    #[test]
    fn test_never_evicts_equal_priority() {
        let snapshot = Snapshot::new(
            vec![
                Container::new("small", "Medical", 10.0, 10.0, 10.0),
                Container::new("shelf", "Storage", 10.0, 10.0, 5.0),
            ],
            vec![Item::new("spare", "Spare Parts", 10.0, 10.0, 5.0)
                .with_priority(80)
                .with_placement(Placement::new("small", 0.0, 0.0, 0.0))],
        )
        .unwrap();

        let item = Item::new("kit", "Kit", 10.0, 10.0, 10.0).with_priority(80);
        assert!(RearrangementPlanner::default_config()
            .plan(&item, &snapshot)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_move_limit() {
        let snapshot = Snapshot::new(
            vec![
                Container::new("small", "Medical", 10.0, 10.0, 10.0),
                Container::new("shelf", "Storage", 20.0, 10.0, 5.0),
            ],
            vec![
                Item::new("a", "A", 10.0, 10.0, 5.0)
                    .with_priority(1)
                    .with_placement(Placement::new("small", 0.0, 0.0, 0.0)),
                Item::new("b", "B", 10.0, 10.0, 5.0)
                    .with_priority(2)
                    .with_placement(Placement::new("small", 0.0, 0.0, 5.0)),
            ],
        )
        .unwrap();

        let item = Item::new("kit", "Kit", 10.0, 10.0, 10.0).with_priority(80);
        let limited = RearrangementPlanner::new(Config::default().with_max_rearrangement_moves(1));
        assert!(limited.plan(&item, &snapshot).unwrap().is_none());

        let plan = RearrangementPlanner::default_config()
            .plan(&item, &snapshot)
            .unwrap()
            .unwrap();
        assert_eq!(plan.moves.len(), 2);
        assert_eq!(plan.moves[0].to.container_id, "shelf");
        assert_eq!(plan.moves[1].to.container_id, "shelf");
    }
}
