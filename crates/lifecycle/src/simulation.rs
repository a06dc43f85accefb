//! Day simulator.
//!
//! Each simulated day runs the same three steps:
//!
//! 1. Apply the usage manifest to the stowed items it names.
//! 2. Advance the date by one day.
//! 3. Re-classify waste against the new date.
//!
//! Every status change is recorded as a transition and an audit entry
//! stamped with the simulated date. The run is a pure function of its
//! inputs, so the same manifest, snapshot and start date always yield the
//! same statuses.

use crate::usage::{record_use, StatusTransition, UsageOutcome};
use crate::waste::WasteManager;
use chrono::NaiveDate;
use stowage_core::audit::{start_of_day, ActionType, LogEntry};
use stowage_core::{Config, Error, Item, ItemStatus, Mutation, Result, Snapshot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Items used every simulated day.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UsageEntry {
    /// Item id, or an item name.
    pub item: String,
    /// Uses per day.
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub uses_per_day: u32,
}

#[cfg(feature = "serde")]
fn one() -> u32 {
    1
}

impl UsageEntry {
    /// One use per day of the given item.
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            uses_per_day: 1,
        }
    }

    /// Sets the daily uses.
    pub fn with_uses(mut self, uses_per_day: u32) -> Self {
        self.uses_per_day = uses_per_day;
        self
    }
}

/// The daily usage manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UsageManifest {
    /// Entries applied in order.
    pub entries: Vec<UsageEntry>,
}

impl UsageManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn with_entry(mut self, entry: UsageEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Returns true if nothing is used.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationResult {
    /// Date the run started from.
    pub start_date: NaiveDate,
    /// Date after the last simulated day.
    pub final_date: NaiveDate,
    /// State after the run.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub snapshot: Snapshot,
    /// Usage recorded each day, in order.
    pub usage: Vec<UsageOutcome>,
    /// Status changes, in order.
    pub transitions: Vec<StatusTransition>,
    /// Mutations that bring the starting state to the final one.
    pub mutations: Vec<Mutation>,
    /// Audit entries stamped with the simulated dates.
    pub log: Vec<LogEntry>,
}

impl SimulationResult {
    /// Transitions into `waste_expired`.
    pub fn newly_expired(&self) -> impl Iterator<Item = &StatusTransition> {
        self.transitions
            .iter()
            .filter(|t| t.to == ItemStatus::WasteExpired)
    }

    /// Transitions into `waste_depleted`.
    pub fn newly_depleted(&self) -> impl Iterator<Item = &StatusTransition> {
        self.transitions
            .iter()
            .filter(|t| t.to == ItemStatus::WasteDepleted)
    }
}

/// Day simulator.
#[derive(Debug, Clone, Default)]
pub struct DaySimulator {
    config: Config,
}

impl DaySimulator {
    /// Creates a simulator with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Simulates `days` days starting at `as_of`.
    pub fn advance(
        &self,
        days: u32,
        manifest: &UsageManifest,
        snapshot: &Snapshot,
        as_of: NaiveDate,
    ) -> Result<SimulationResult> {
        let waste = WasteManager::new(self.config.clone());
        let user_id = self.config.user_id.as_deref();

        let mut current = snapshot.clone();
        let mut date = as_of;
        let mut result = SimulationResult {
            start_date: as_of,
            final_date: as_of,
            snapshot: snapshot.clone(),
            usage: Vec::new(),
            transitions: Vec::new(),
            mutations: Vec::new(),
            log: Vec::new(),
        };

        for _ in 0..days {
            let next = date
                .succ_opt()
                .ok_or_else(|| Error::InvalidState(format!("no day after {}", date)))?;
            let stamp = start_of_day(next);
            let mut day_mutations = Vec::new();
            let mut day_transitions = Vec::new();

            for entry in &manifest.entries {
                let item = resolve(&current, &entry.item)?;
                if item.status() != ItemStatus::Stowed {
                    log::debug!("skipping usage of {}: {}", item.id(), item.status());
                    continue;
                }

                let outcome = record_use(item, entry.uses_per_day, next)?;
                let mutations = outcome.mutations();
                current = current.apply(&mutations)?;
                day_mutations.extend(mutations);

                result.log.push(
                    LogEntry::new(
                        stamp,
                        ActionType::Simulation,
                        format!("used {} times", outcome.consumed),
                    )
                    .with_user(user_id)
                    .with_item(outcome.item_id.clone()),
                );
                if let Some(transition) = &outcome.transition {
                    day_transitions.push(transition.clone());
                }
                result.usage.push(outcome);
            }

            let classification = waste.classify(current.items(), next);
            let expired = waste.apply(&classification, &current)?;
            let mutations: Vec<Mutation> = expired.iter().map(StatusTransition::mutation).collect();
            current = current.apply(&mutations)?;
            day_mutations.extend(mutations);
            day_transitions.extend(expired);

            for transition in &day_transitions {
                result
                    .log
                    .push(transition.log_entry(stamp, user_id, ActionType::Simulation));
            }

            log::debug!(
                "simulated {}: {} mutations, {} transitions",
                next,
                day_mutations.len(),
                day_transitions.len()
            );
            result.mutations.extend(day_mutations);
            result.transitions.extend(day_transitions);
            date = next;
        }

        log::info!(
            "simulated {} days from {} to {}: {} items expired, {} depleted",
            days,
            as_of,
            date,
            result.newly_expired().count(),
            result.newly_depleted().count()
        );

        result.final_date = date;
        result.snapshot = current;
        Ok(result)
    }

    /// Simulates day by day until `target` is reached.
    pub fn advance_until(
        &self,
        target: NaiveDate,
        manifest: &UsageManifest,
        snapshot: &Snapshot,
        as_of: NaiveDate,
    ) -> Result<SimulationResult> {
        let days = (target - as_of).num_days();
        let days = u32::try_from(days).map_err(|_| {
            Error::Validation(format!(
                "target date {} must not precede {}",
                target, as_of
            ))
        })?;
        self.advance(days, manifest, snapshot, as_of)
    }
}

/// Resolves a manifest reference: an exact id first, then the lowest-id
/// item with that name, preferring stowed items.
fn resolve<'a>(snapshot: &'a Snapshot, reference: &str) -> Result<&'a Item> {
    if let Some(item) = snapshot.item(reference) {
        return Ok(item);
    }

    let mut named = snapshot.items().filter(|i| i.name() == reference);
    let first = named
        .next()
        .ok_or_else(|| Error::NotFound(format!("no item with id or name '{}'", reference)))?;
    if first.status() == ItemStatus::Stowed {
        return Ok(first);
    }
    Ok(named
        .find(|i| i.status() == ItemStatus::Stowed)
        .unwrap_or(first))
}
