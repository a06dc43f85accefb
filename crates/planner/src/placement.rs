//! Placement planner.
//!
//! Assigns containers, orientations and positions to unplaced items. Items
//! are handled by priority (then volume) so that important and bulky
//! items claim the most accessible space first. Each item's outcome is
//! independent: an item that does not fit anywhere is reported as
//! [`PlacementResult::NoFit`] and the batch carries on.

use crate::anchor::AnchorSearch;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use stowage_core::audit::{ActionType, Auditable, LogEntry};
use stowage_core::geometry::{Orientation, Position};
use stowage_core::snapshot::Occupancy;
use stowage_core::{
    Config, Container, Error, Item, ItemId, ItemStatus, Mutation, Placement, Result, Snapshot,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of planning one item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "outcome", rename_all = "snake_case"))]
pub enum PlacementResult {
    /// The item has a slot.
    Placed {
        /// The planned item.
        item_id: ItemId,
        /// Container, position and orientation.
        placement: Placement,
    },
    /// No container, orientation or position fits the item.
    NoFit {
        /// The planned item.
        item_id: ItemId,
    },
}

impl PlacementResult {
    /// Returns the planned item's id.
    pub fn item_id(&self) -> &str {
        match self {
            PlacementResult::Placed { item_id, .. } | PlacementResult::NoFit { item_id } => item_id,
        }
    }

    /// Returns the placement, if any.
    pub fn placement(&self) -> Option<&Placement> {
        match self {
            PlacementResult::Placed { placement, .. } => Some(placement),
            PlacementResult::NoFit { .. } => None,
        }
    }

    /// Returns true if the item was placed.
    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementResult::Placed { .. })
    }
}

/// A planned batch, borrowed for audit logging.
#[derive(Debug, Clone, Copy)]
pub struct PlacementBatch<'a>(pub &'a [PlacementResult]);

impl Auditable for PlacementBatch<'_> {
    fn log_entries(&self, at: DateTime<Utc>, user_id: Option<&str>) -> Vec<LogEntry> {
        self.0
            .iter()
            .map(|result| {
                let details = match result {
                    PlacementResult::Placed { placement, .. } => format!(
                        "placed in {} at ({}, {}, {})",
                        placement.container_id,
                        placement.w(),
                        placement.d(),
                        placement.h()
                    ),
                    PlacementResult::NoFit { .. } => "no fitting position".to_string(),
                };
                LogEntry::new(at, ActionType::Placement, details)
                    .with_user(user_id)
                    .with_item(result.item_id())
            })
            .collect()
    }
}

/// Converts placed results into `Place` mutations.
pub fn placement_mutations(results: &[PlacementResult]) -> Vec<Mutation> {
    results
        .iter()
        .filter_map(|r| match r {
            PlacementResult::Placed { item_id, placement } => Some(Mutation::Place {
                item_id: item_id.clone(),
                placement: placement.clone(),
            }),
            PlacementResult::NoFit { .. } => None,
        })
        .collect()
}

/// Placement planner.
#[derive(Debug, Clone, Default)]
pub struct PlacementPlanner {
    config: Config,
}

impl PlacementPlanner {
    /// Creates a planner with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Creates a planner with default configuration.
    pub fn default_config() -> Self {
        Self::new(Config::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Plans positions for `items` given the containers and the items
    /// already placed in them.
    ///
    /// Returns one result per input item, in input order. Fails only on
    /// malformed input or when an existing placement names an unknown
    /// container.
    pub fn plan(
        &self,
        items: &[Item],
        containers: &[Container],
        existing: &[Item],
    ) -> Result<Vec<PlacementResult>> {
        self.config.validate()?;
        validate_batch(items)?;

        let mut occupancies: Vec<Occupancy> = Vec::with_capacity(containers.len());
        for container in containers {
            container.validate()?;
            if occupancies.iter().any(|o| o.container().id() == container.id()) {
                return Err(Error::Validation(format!(
                    "Duplicate container id '{}'",
                    container.id()
                )));
            }
            occupancies.push(Occupancy::new(container.clone()));
        }

        for item in existing {
            let (Some(container_id), Some(bbox)) = (item.container_id(), item.bounding_box())
            else {
                continue;
            };
            let occupancy = occupancies
                .iter_mut()
                .find(|o| o.container().id() == container_id)
                .ok_or_else(|| {
                    Error::InconsistentSnapshot(format!(
                        "Item '{}' references unknown container '{}'",
                        item.id(),
                        container_id
                    ))
                })?;
            occupancy.push(item.id().clone(), bbox);
        }

        Ok(self.plan_into(items, &mut occupancies))
    }

    /// Plans positions for `items` against a snapshot. Items of the batch
    /// that already hold a placement in the snapshot are planned afresh.
    pub fn plan_snapshot(&self, items: &[Item], snapshot: &Snapshot) -> Result<Vec<PlacementResult>> {
        self.config.validate()?;
        validate_batch(items)?;

        let batch: BTreeSet<&str> = items.iter().map(|i| i.id().as_str()).collect();
        let mut occupancies = snapshot.occupancies();
        for occupancy in &mut occupancies {
            for id in &batch {
                occupancy.remove(id);
            }
        }

        Ok(self.plan_into(items, &mut occupancies))
    }

    /// Plans the batch into the given occupancies, recording each accepted
    /// box so later items in the batch avoid it.
    pub fn plan_into(&self, items: &[Item], occupancies: &mut [Occupancy]) -> Vec<PlacementResult> {
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|&a, &b| placement_order(&items[a], &items[b]));

        let mut results: Vec<Option<PlacementResult>> = vec![None; items.len()];
        for idx in order {
            let item = &items[idx];
            let result = match self.find_slot(item, occupancies) {
                Some((container_idx, position, orientation)) => {
                    let occupancy = &mut occupancies[container_idx];
                    let placement = Placement {
                        container_id: occupancy.container().id().clone(),
                        position,
                        orientation,
                    };
                    occupancy.push(item.id().clone(), placement.bounding_box(item.dimensions()));
                    log::debug!(
                        "placed {} in {} at ({}, {}, {}) as {:?}",
                        item.id(),
                        placement.container_id,
                        position.x,
                        position.y,
                        position.z,
                        orientation
                    );
                    PlacementResult::Placed {
                        item_id: item.id().clone(),
                        placement,
                    }
                }
                None => {
                    log::debug!("no fitting position for {}", item.id());
                    PlacementResult::NoFit {
                        item_id: item.id().clone(),
                    }
                }
            };
            results[idx] = Some(result);
        }

        let results: Vec<PlacementResult> = results.into_iter().flatten().collect();
        log::info!(
            "placement batch: {} of {} items placed",
            results.iter().filter(|r| r.is_placed()).count(),
            results.len()
        );
        results
    }

    /// Finds the first container, in candidate order, with room for the
    /// item, and the lowest slot inside it.
    pub fn find_slot(
        &self,
        item: &Item,
        occupancies: &[Occupancy],
    ) -> Option<(usize, Position, Orientation)> {
        candidate_order(item, occupancies)
            .into_iter()
            .find_map(|idx| {
                self.lowest_in(item, &occupancies[idx])
                    .map(|(position, orientation)| (idx, position, orientation))
            })
    }

    /// Returns the lowest `(d, w, h)` slot for the item in one container
    /// across all allowed orientations; earlier orientations win ties.
    pub fn lowest_in(&self, item: &Item, occupancy: &Occupancy) -> Option<(Position, Orientation)> {
        let tol = self.config.tolerance;
        let search = AnchorSearch::new(occupancy, tol);
        let mut best: Option<(Position, Orientation)> = None;

        for orientation in self.config.orientation.allowed() {
            let size = item.dimensions().oriented(orientation);
            let d_limit = best.map_or(f64::INFINITY, |(p, _)| p.y);
            if let Some(position) = search.lowest_position_within(&size, d_limit) {
                let better = best.map_or(true, |(current, _)| {
                    position_order(&position, &current, tol) == Ordering::Less
                });
                if better {
                    best = Some((position, orientation));
                }
            }
        }

        best
    }

    /// Checks a caller-chosen placement and returns the mutations that
    /// commit it.
    pub fn check(&self, item: &Item, placement: &Placement, snapshot: &Snapshot) -> Result<Vec<Mutation>> {
        item.validate()?;
        if item.status() == ItemStatus::Disposed {
            return Err(Error::InvalidState(format!(
                "Disposed item '{}' cannot be placed",
                item.id()
            )));
        }

        let mut occupancy = snapshot.occupancy(&placement.container_id)?;
        occupancy.remove(item.id());
        let bbox = placement.bounding_box(item.dimensions());
        if !occupancy.is_free(&bbox, self.config.tolerance) {
            return Err(Error::InvalidState(format!(
                "Position ({}, {}, {}) in '{}' is out of bounds or occupied",
                placement.w(),
                placement.d(),
                placement.h(),
                placement.container_id
            )));
        }

        Ok(if snapshot.item(item.id()).is_some() {
            vec![Mutation::Place {
                item_id: item.id().clone(),
                placement: placement.clone(),
            }]
        } else {
            vec![Mutation::Insert {
                item: item.clone().with_placement(placement.clone()),
            }]
        })
    }
}

fn validate_batch(items: &[Item]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for item in items {
        item.validate()?;
        if item.status() != ItemStatus::Stowed {
            return Err(Error::InvalidState(format!(
                "Item '{}' is {} and cannot be placed",
                item.id(),
                item.status()
            )));
        }
        if !seen.insert(item.id().as_str()) {
            return Err(Error::Validation(format!(
                "Duplicate item id '{}' in batch",
                item.id()
            )));
        }
    }
    Ok(())
}

/// Priority descending, then volume descending, then id.
pub(crate) fn placement_order(a: &Item, b: &Item) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| b.volume().total_cmp(&a.volume()))
        .then_with(|| a.id().cmp(b.id()))
}

/// Preferred-zone containers first, each group by free volume descending.
pub(crate) fn candidate_order(item: &Item, occupancies: &[Occupancy]) -> Vec<usize> {
    let mut keyed: Vec<(usize, bool, f64)> = occupancies
        .iter()
        .enumerate()
        .map(|(idx, occ)| {
            let preferred = item.preferred_zone() == Some(occ.container().zone());
            (idx, preferred, occ.free_volume())
        })
        .collect();

    keyed.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.2.total_cmp(&a.2))
            .then_with(|| occupancies[a.0].container().id().cmp(occupancies[b.0].container().id()))
    });

    keyed.into_iter().map(|(idx, _, _)| idx).collect()
}

fn position_order(a: &Position, b: &Position, tol: f64) -> Ordering {
    for axis in [1, 0, 2] {
        if (a[axis] - b[axis]).abs() > tol {
            return a[axis].total_cmp(&b[axis]);
        }
    }
    Ordering::Equal
}
