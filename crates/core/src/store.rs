//! Read store, commit sink and clock interfaces.
//!
//! Planners never talk to storage; callers read a [`Snapshot`], plan, and
//! commit the resulting mutations through a [`CommitSink`]. Commits are
//! optimistic: each batch names the container versions it was planned
//! against and is rejected if any of them moved.

use crate::container::{Container, ContainerId};
use crate::item::{Item, ItemStatus};
use crate::mutation::Mutation;
use crate::snapshot::Snapshot;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Read access to containers and items.
pub trait ItemStore {
    /// Lists every container.
    fn list_containers(&self) -> Result<Vec<Container>>;

    /// Lists items, optionally restricted to one status.
    fn list_items(&self, status: Option<ItemStatus>) -> Result<Vec<Item>>;

    /// Returns one item.
    fn get_item(&self, id: &str) -> Result<Item>;

    /// Returns a consistent, versioned snapshot.
    fn snapshot(&self) -> Result<Snapshot>;
}

/// A batch of mutations planned against known container versions.
#[derive(Debug, Clone, Default)]
pub struct CommitBatch {
    /// Container versions the plan was computed against.
    pub expected_versions: BTreeMap<ContainerId, u64>,
    /// Mutations to apply in order.
    pub mutations: Vec<Mutation>,
}

impl CommitBatch {
    /// Builds a batch expecting the versions `snapshot` holds for every
    /// container the mutations touch.
    pub fn against(snapshot: &Snapshot, mutations: Vec<Mutation>) -> Self {
        let expected_versions = snapshot
            .touched_containers(&mutations)
            .into_iter()
            .map(|id| {
                let version = snapshot.version(&id);
                (id, version)
            })
            .collect();

        Self {
            expected_versions,
            mutations,
        }
    }

    /// Returns true if the batch holds no mutations.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Atomic sink for mutation batches.
pub trait CommitSink {
    /// Applies the batch atomically or not at all.
    fn commit(&self, batch: CommitBatch) -> Result<()>;
}

/// Source of the current simulated date.
pub trait Clock {
    /// Returns the current date.
    fn today(&self) -> NaiveDate;
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// In-memory store with per-container optimistic versioning.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    /// Creates a store seeded with a snapshot.
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Snapshot>> {
        self.state
            .read()
            .map_err(|_| Error::InvalidState("store lock poisoned".into()))
    }
}

impl ItemStore for MemoryStore {
    fn list_containers(&self) -> Result<Vec<Container>> {
        Ok(self.read()?.containers().cloned().collect())
    }

    fn list_items(&self, status: Option<ItemStatus>) -> Result<Vec<Item>> {
        Ok(self
            .read()?
            .items()
            .filter(|i| status.map_or(true, |s| i.status() == s))
            .cloned()
            .collect())
    }

    fn get_item(&self, id: &str) -> Result<Item> {
        self.read()?.require_item(id).cloned()
    }

    fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.read()?.clone())
    }
}

impl CommitSink for MemoryStore {
    fn commit(&self, batch: CommitBatch) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| Error::InvalidState("store lock poisoned".into()))?;

        for (container_id, expected) in &batch.expected_versions {
            let actual = state.version(container_id);
            if actual != *expected {
                log::debug!(
                    "rejecting commit: container {} at version {}, batch expected {}",
                    container_id,
                    actual,
                    expected
                );
                return Err(Error::ConcurrentModification {
                    container_id: container_id.clone(),
                    expected: *expected,
                    actual,
                });
            }
        }

        let touched = state.touched_containers(&batch.mutations);
        let mut next = state.apply(&batch.mutations)?;
        next.bump_versions(&touched);
        *state = next;

        log::debug!(
            "committed {} mutations across {} containers",
            batch.mutations.len(),
            touched.len()
        );
        Ok(())
    }
}
