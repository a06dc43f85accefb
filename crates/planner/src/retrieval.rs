//! Retrieval planner.
//!
//! Items leave a container straight out through its opening, along the D
//! axis. An item blocks the target if it starts nearer the opening and its
//! (W, H) footprint overlaps the target's, which is exactly the set of
//! boxes crossed by the pull path.

use crate::placement::PlacementPlanner;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use stowage_core::audit::{ActionType, Auditable, LogEntry};
use stowage_core::snapshot::Occupancy;
use stowage_core::spatial::footprint_overlaps;
use stowage_core::{
    Config, ContainerId, Error, Item, ItemId, ItemStatus, Mutation, Placement, Result, Snapshot,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One physical step of a retrieval.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "action", rename_all = "snake_case"))]
pub enum RetrievalStep {
    /// Pull a blocking item out of the container.
    Remove {
        /// The blocking item.
        item_id: ItemId,
    },
    /// Pull the target out.
    Retrieve {
        /// The target item.
        item_id: ItemId,
    },
    /// Return a removed item.
    PlaceBack {
        /// The removed item.
        item_id: ItemId,
        /// Where it goes.
        placement: Placement,
        /// True if its original slot was taken and a new one was planned.
        relocated: bool,
    },
    /// A removed item could not be returned anywhere.
    Stranded {
        /// The removed item.
        item_id: ItemId,
    },
}

impl RetrievalStep {
    /// Returns the item the step moves.
    pub fn item_id(&self) -> &str {
        match self {
            RetrievalStep::Remove { item_id }
            | RetrievalStep::Retrieve { item_id }
            | RetrievalStep::PlaceBack { item_id, .. }
            | RetrievalStep::Stranded { item_id } => item_id,
        }
    }
}

/// Ordered steps to extract one item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RetrievalPlan {
    /// The item to extract.
    pub item_id: ItemId,
    /// The container holding it.
    pub container_id: ContainerId,
    /// Steps in execution order.
    pub steps: Vec<RetrievalStep>,
}

impl RetrievalPlan {
    /// Returns the blocking items in removal order.
    pub fn blocking_items(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                RetrievalStep::Remove { item_id } => Some(item_id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns true if nothing blocks the item.
    pub fn is_direct(&self) -> bool {
        self.blocking_items().is_empty()
    }

    /// Mutations that record the executed plan: the target leaves its
    /// container, relocated items move, stranded items are taken out.
    pub fn mutations(&self) -> Vec<Mutation> {
        let mut mutations = Vec::new();
        for step in &self.steps {
            match step {
                RetrievalStep::Retrieve { item_id } | RetrievalStep::Stranded { item_id } => {
                    mutations.push(Mutation::Unplace {
                        item_id: item_id.clone(),
                    });
                }
                RetrievalStep::PlaceBack {
                    item_id,
                    placement,
                    relocated: true,
                } => {
                    mutations.push(Mutation::Place {
                        item_id: item_id.clone(),
                        placement: placement.clone(),
                    });
                }
                _ => {}
            }
        }
        mutations
    }
}

impl Auditable for RetrievalPlan {
    fn log_entries(&self, at: DateTime<Utc>, user_id: Option<&str>) -> Vec<LogEntry> {
        let mut entries = vec![LogEntry::new(
            at,
            ActionType::Retrieval,
            format!(
                "retrieved from {} after removing {} blocking items",
                self.container_id,
                self.blocking_items().len()
            ),
        )
        .with_user(user_id)
        .with_item(self.item_id.clone())];

        for step in &self.steps {
            let details = match step {
                RetrievalStep::PlaceBack {
                    placement,
                    relocated: true,
                    ..
                } => format!(
                    "relocated to {} at ({}, {}, {})",
                    placement.container_id,
                    placement.w(),
                    placement.d(),
                    placement.h()
                ),
                RetrievalStep::Stranded { .. } => "no slot left to return item".to_string(),
                _ => continue,
            };
            entries.push(
                LogEntry::new(at, ActionType::Rearrangement, details)
                    .with_user(user_id)
                    .with_item(step.item_id()),
            );
        }

        entries
    }
}

/// Retrieval planner.
#[derive(Debug, Clone, Default)]
pub struct RetrievalPlanner {
    config: Config,
}

impl RetrievalPlanner {
    /// Creates a planner with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Creates a planner with default configuration.
    pub fn default_config() -> Self {
        Self::new(Config::default())
    }

    /// Returns the items blocking the target, nearest the opening first.
    pub fn blocking<'a>(&self, item_id: &str, snapshot: &'a Snapshot) -> Result<Vec<&'a Item>> {
        let target = snapshot.require_item(item_id)?;
        let (Some(container_id), Some(target_box)) = (target.container_id(), target.bounding_box())
        else {
            return Err(Error::InvalidState(format!(
                "Item '{}' is {} and not inside any container",
                item_id,
                target.status()
            )));
        };

        let tol = self.config.tolerance;
        let mut blocking: Vec<&Item> = snapshot
            .items_in(container_id)
            .filter(|other| other.id() != target.id())
            .filter(|other| {
                other.bounding_box().is_some_and(|b| {
                    b.front() < target_box.front() - tol
                        && footprint_overlaps(&b, &target_box, tol)
                })
            })
            .collect();

        blocking.sort_by(|a, b| {
            front_of(a)
                .total_cmp(&front_of(b))
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(blocking)
    }

    /// Plans the extraction of one item.
    pub fn plan(&self, item_id: &str, snapshot: &Snapshot) -> Result<RetrievalPlan> {
        self.config.validate()?;
        let blocking = self.blocking(item_id, snapshot)?;
        let target = snapshot.require_item(item_id)?;
        let container_id = target
            .container_id()
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidState(format!("Item '{}' has no placement", item_id)))?;

        let mut steps: Vec<RetrievalStep> = blocking
            .iter()
            .map(|b| RetrievalStep::Remove {
                item_id: b.id().clone(),
            })
            .collect();
        steps.push(RetrievalStep::Retrieve {
            item_id: target.id().clone(),
        });

        // Everything but the target and the removed items stays put.
        let mut occupancies = snapshot.occupancies();
        for occupancy in &mut occupancies {
            occupancy.remove(target.id());
            for b in &blocking {
                occupancy.remove(b.id());
            }
        }

        for item in blocking.iter().rev() {
            steps.push(self.place_back(item, &mut occupancies));
        }

        log::debug!(
            "retrieval of {} from {}: {} blocking items",
            item_id,
            container_id,
            blocking.len()
        );

        Ok(RetrievalPlan {
            item_id: target.id().clone(),
            container_id,
            steps,
        })
    }

    /// Resolves an id or a name to one placed item and plans its
    /// retrieval. Among several items sharing a name the one with the
    /// fewest blocking items wins, then the earliest expiry, then the
    /// lowest id.
    pub fn find(&self, query: &str, snapshot: &Snapshot) -> Result<RetrievalPlan> {
        if snapshot.item(query).is_some() {
            return self.plan(query, snapshot);
        }

        let mut candidates: Vec<(usize, &Item)> = Vec::new();
        for item in snapshot
            .items()
            .filter(|i| i.name() == query && is_retrievable(i))
        {
            let blockers = self.blocking(item.id(), snapshot)?.len();
            candidates.push((blockers, item));
        }

        candidates.sort_by(|(ba, a), (bb, b)| {
            ba.cmp(bb)
                .then_with(|| expiry_order(a, b))
                .then_with(|| a.id().cmp(b.id()))
        });

        match candidates.first() {
            Some((_, item)) => self.plan(item.id(), snapshot),
            None => Err(Error::NotFound(format!("no placed item named '{}'", query))),
        }
    }

    pub(crate) fn place_back(&self, item: &Item, occupancies: &mut [Occupancy]) -> RetrievalStep {
        let (Some(original), Some(bbox)) = (item.placement(), item.bounding_box()) else {
            return RetrievalStep::Stranded {
                item_id: item.id().clone(),
            };
        };

        if let Some(occupancy) = occupancies
            .iter_mut()
            .find(|o| o.container().id() == &original.container_id)
        {
            if occupancy.is_free(&bbox, self.config.tolerance) {
                occupancy.push(item.id().clone(), bbox);
                return RetrievalStep::PlaceBack {
                    item_id: item.id().clone(),
                    placement: original.clone(),
                    relocated: false,
                };
            }
        }

        log::warn!(
            "original slot of {} in {} is taken, planning a new one",
            item.id(),
            original.container_id
        );

        let planner = PlacementPlanner::new(self.config.clone());
        match planner.find_slot(item, occupancies) {
            Some((idx, position, orientation)) => {
                let placement = Placement {
                    container_id: occupancies[idx].container().id().clone(),
                    position,
                    orientation,
                };
                occupancies[idx].push(item.id().clone(), placement.bounding_box(item.dimensions()));
                RetrievalStep::PlaceBack {
                    item_id: item.id().clone(),
                    placement,
                    relocated: true,
                }
            }
            None => RetrievalStep::Stranded {
                item_id: item.id().clone(),
            },
        }
    }
}

fn front_of(item: &Item) -> f64 {
    item.bounding_box().map_or(f64::INFINITY, |b| b.front())
}

fn expiry_order(a: &Item, b: &Item) -> Ordering {
    match (a.expiry_date(), b.expiry_date()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Returns true if an item may be handed to the crew.
pub fn is_retrievable(item: &Item) -> bool {
    item.status() != ItemStatus::Disposed && item.placement().is_some()
}
