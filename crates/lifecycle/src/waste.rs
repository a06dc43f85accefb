//! Waste classification, return planning and undocking.
//!
//! Return selection is a greedy pass over the waste items by ascending
//! volume: each item is accepted while both the volume and the mass bound
//! hold, and skipped otherwise, carrying on with the next item. The pass
//! maximizes the number of items cleared, not the volume or mass.

use crate::usage::StatusTransition;
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use stowage_core::audit::{ActionType, Auditable, LogEntry};
use stowage_core::{Config, ContainerId, Error, Item, ItemId, ItemStatus, Mutation, Result, Snapshot};
use stowage_planner::{RetrievalPlan, RetrievalPlanner};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stowed items found to be waste on a given date.
///
/// The two sets are disjoint; an item both expired and used up counts as
/// depleted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Classification {
    /// Date the items were classified against.
    pub as_of: NaiveDate,
    /// Items past their expiry date.
    pub expired: BTreeSet<ItemId>,
    /// Items with no uses left.
    pub depleted: BTreeSet<ItemId>,
}

impl Classification {
    /// Returns true if no item became waste.
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.depleted.is_empty()
    }

    /// Returns the number of classified items.
    pub fn len(&self) -> usize {
        self.expired.len() + self.depleted.len()
    }
}

/// Why a waste item was left out of a return plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SkipReason {
    /// Accepting it would exceed the volume bound.
    Volume,
    /// Accepting it would exceed the mass bound.
    Mass,
}

/// A waste item left out of a return plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkippedItem {
    /// The skipped item.
    pub item_id: ItemId,
    /// The bound it would break.
    pub reason: SkipReason,
}

/// Waste items selected for return within capacity bounds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReturnPlan {
    /// Accepted items in selection order.
    pub selected: Vec<ItemId>,
    /// Items that did not fit the bounds.
    pub skipped: Vec<SkippedItem>,
    /// Volume of the accepted items.
    pub total_volume: f64,
    /// Mass of the accepted items.
    pub total_mass: f64,
    /// Volume bound.
    pub max_volume: f64,
    /// Mass bound.
    pub max_mass: f64,
}

impl ReturnPlan {
    /// Returns true if the item was accepted.
    pub fn contains(&self, item_id: &str) -> bool {
        self.selected.iter().any(|id| id == item_id)
    }
}

/// A return plan for an undocking container, with the retrieval plan of
/// every selected item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UndockingPlan {
    /// Container leaving the station.
    pub container_id: ContainerId,
    /// Items to load.
    pub return_plan: ReturnPlan,
    /// How to get each selected placed item out, in selection order.
    pub retrievals: Vec<RetrievalPlan>,
}

/// Items disposed when an undocking completes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UndockingCompletion {
    /// Disposed items.
    pub disposed: Vec<ItemId>,
}

impl UndockingCompletion {
    /// `Dispose` mutations for every item.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.disposed
            .iter()
            .map(|id| Mutation::Dispose {
                item_id: id.clone(),
            })
            .collect()
    }
}

impl Auditable for UndockingCompletion {
    fn log_entries(&self, at: DateTime<Utc>, user_id: Option<&str>) -> Vec<LogEntry> {
        self.disposed
            .iter()
            .map(|id| {
                LogEntry::new(at, ActionType::Disposal, "disposed at undocking")
                    .with_user(user_id)
                    .with_item(id.clone())
            })
            .collect()
    }
}

/// Waste manager.
#[derive(Debug, Clone, Default)]
pub struct WasteManager {
    config: Config,
}

impl WasteManager {
    /// Creates a manager with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Classifies stowed items as of a date. Pure; statuses change only
    /// when the caller applies the result.
    pub fn classify<'a>(
        &self,
        items: impl IntoIterator<Item = &'a Item>,
        as_of: NaiveDate,
    ) -> Classification {
        let mut classification = Classification {
            as_of,
            expired: BTreeSet::new(),
            depleted: BTreeSet::new(),
        };

        for item in items {
            if item.status() != ItemStatus::Stowed {
                continue;
            }
            if item.is_depleted() {
                classification.depleted.insert(item.id().clone());
            } else if item.is_expired_on(as_of) {
                classification.expired.insert(item.id().clone());
            }
        }

        log::debug!(
            "classified {} expired and {} depleted items as of {}",
            classification.expired.len(),
            classification.depleted.len(),
            as_of
        );
        classification
    }

    /// Turns a classification into status transitions against a snapshot.
    /// Items no longer stowed in the snapshot are left alone.
    pub fn apply(
        &self,
        classification: &Classification,
        snapshot: &Snapshot,
    ) -> Result<Vec<StatusTransition>> {
        let tagged = classification
            .expired
            .iter()
            .map(|id| (id, ItemStatus::WasteExpired))
            .chain(
                classification
                    .depleted
                    .iter()
                    .map(|id| (id, ItemStatus::WasteDepleted)),
            );

        let mut transitions = Vec::new();
        for (id, to) in tagged {
            let item = snapshot.require_item(id)?;
            if item.status() != ItemStatus::Stowed {
                continue;
            }
            transitions.push(StatusTransition {
                item_id: id.clone(),
                from: item.status(),
                to,
                date: classification.as_of,
            });
        }
        transitions.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        Ok(transitions)
    }

    /// Selects waste items for return within the volume and mass bounds.
    pub fn build_return_plan(
        &self,
        waste: &[Item],
        max_volume: f64,
        max_mass: f64,
    ) -> Result<ReturnPlan> {
        self.build_return_plan_with(waste, max_volume, max_mass, &[])
    }

    /// Like [`build_return_plan`](Self::build_return_plan), but the
    /// `forced` items are accepted first. Fails with `CapacityExceeded` when
    /// the forced items alone break a bound.
    pub fn build_return_plan_with(
        &self,
        waste: &[Item],
        max_volume: f64,
        max_mass: f64,
        forced: &[ItemId],
    ) -> Result<ReturnPlan> {
        check_bound("volume", max_volume)?;
        check_bound("mass", max_mass)?;

        let mut seen = BTreeSet::new();
        for item in waste {
            if !item.status().is_waste() {
                return Err(Error::InvalidState(format!(
                    "Item '{}' is {} and not waste",
                    item.id(),
                    item.status()
                )));
            }
            if !seen.insert(item.id().as_str()) {
                return Err(Error::Validation(format!(
                    "Duplicate item id '{}' in waste list",
                    item.id()
                )));
            }
        }

        let tol = self.config.tolerance;
        let mut plan = ReturnPlan {
            selected: Vec::new(),
            skipped: Vec::new(),
            total_volume: 0.0,
            total_mass: 0.0,
            max_volume,
            max_mass,
        };

        let forced_set: BTreeSet<&str> = forced.iter().map(String::as_str).collect();
        for id in &forced_set {
            let item = waste
                .iter()
                .find(|i| i.id() == id)
                .ok_or_else(|| Error::NotFound(format!("forced item '{}' is not in the waste list", id)))?;
            plan.total_volume += item.volume();
            plan.total_mass += item.mass().unwrap_or(0.0);
            plan.selected.push(item.id().clone());
        }
        if plan.total_volume > max_volume + tol {
            return Err(Error::CapacityExceeded(format!(
                "forced items need {} volume, only {} available",
                plan.total_volume, max_volume
            )));
        }
        if plan.total_mass > max_mass + tol {
            return Err(Error::CapacityExceeded(format!(
                "forced items weigh {}, only {} allowed",
                plan.total_mass, max_mass
            )));
        }

        let mut rest: Vec<&Item> = waste
            .iter()
            .filter(|i| !forced_set.contains(i.id().as_str()))
            .collect();
        rest.sort_by(|a, b| return_order(a, b));

        for item in rest {
            let volume = plan.total_volume + item.volume();
            let mass = plan.total_mass + item.mass().unwrap_or(0.0);
            let reason = if volume > max_volume + tol {
                Some(SkipReason::Volume)
            } else if mass > max_mass + tol {
                Some(SkipReason::Mass)
            } else {
                None
            };

            match reason {
                Some(reason) => plan.skipped.push(SkippedItem {
                    item_id: item.id().clone(),
                    reason,
                }),
                None => {
                    plan.total_volume = volume;
                    plan.total_mass = mass;
                    plan.selected.push(item.id().clone());
                }
            }
        }

        log::info!(
            "return plan: {} of {} waste items, volume {}/{}, mass {}/{}",
            plan.selected.len(),
            waste.len(),
            plan.total_volume,
            max_volume,
            plan.total_mass,
            max_mass
        );
        Ok(plan)
    }

    /// Plans what to load into a container about to undock. Candidates are
    /// the waste items not already inside that container, placed or
    /// loose; the volume bound is the container's free volume.
    pub fn plan_undocking(
        &self,
        snapshot: &Snapshot,
        undocking_container_id: &str,
        max_mass: f64,
    ) -> Result<UndockingPlan> {
        let occupancy = snapshot.occupancy(undocking_container_id)?;
        let waste: Vec<Item> = snapshot
            .items()
            .filter(|i| i.status().is_waste())
            .filter(|i| i.container_id() != Some(undocking_container_id))
            .cloned()
            .collect();

        let return_plan = self.build_return_plan(&waste, occupancy.free_volume(), max_mass)?;

        // Loose items were already taken out and need no retrieval.
        let retrieval = RetrievalPlanner::new(self.config.clone());
        let mut retrievals = Vec::new();
        for id in &return_plan.selected {
            if snapshot.require_item(id)?.placement().is_some() {
                retrievals.push(retrieval.plan(id, snapshot)?);
            }
        }

        Ok(UndockingPlan {
            container_id: undocking_container_id.to_string(),
            return_plan,
            retrievals,
        })
    }

    /// Disposes the accepted items. Disposal is terminal: each item loses
    /// its placement and can never be placed again.
    pub fn complete_undocking(
        &self,
        item_ids: &[ItemId],
        snapshot: &Snapshot,
    ) -> Result<UndockingCompletion> {
        let mut seen = BTreeSet::new();
        for id in item_ids {
            let item = snapshot.require_item(id)?;
            if !item.status().is_waste() {
                return Err(Error::InvalidState(format!(
                    "Item '{}' is {} and cannot be disposed",
                    id,
                    item.status()
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(Error::Validation(format!(
                    "Duplicate item id '{}' in undocking list",
                    id
                )));
            }
        }

        log::info!("undocking disposes {} items", item_ids.len());
        Ok(UndockingCompletion {
            disposed: item_ids.to_vec(),
        })
    }
}

fn check_bound(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Validation(format!(
            "max {} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Volume ascending, then id.
fn return_order(a: &Item, b: &Item) -> Ordering {
    a.volume()
        .total_cmp(&b.volume())
        .then_with(|| a.id().cmp(b.id()))
}
