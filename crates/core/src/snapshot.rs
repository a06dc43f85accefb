//! Immutable views of containers and items used as planner input.

use crate::container::{Container, ContainerId};
use crate::geometry::BoundingBox;
use crate::item::{Item, ItemId, ItemStatus};
use crate::mutation::Mutation;
use crate::spatial::{contains, overlaps, overlaps_with_tolerance};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// A box occupied by a placed item.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupiedBox {
    /// The item occupying the box.
    pub item_id: ItemId,
    /// The occupied region.
    pub bbox: BoundingBox,
}

/// Occupied boxes of one container.
///
/// Rebuilt from a snapshot for every planning call; planners extend their
/// own copy while working through a batch.
#[derive(Debug, Clone)]
pub struct Occupancy {
    container: Container,
    boxes: Vec<OccupiedBox>,
}

impl Occupancy {
    /// Creates an empty occupancy for a container.
    pub fn new(container: Container) -> Self {
        Self {
            container,
            boxes: Vec::new(),
        }
    }

    /// Returns the container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Returns the occupied boxes.
    pub fn boxes(&self) -> &[OccupiedBox] {
        &self.boxes
    }

    /// Adds an occupied box.
    pub fn push(&mut self, item_id: impl Into<ItemId>, bbox: BoundingBox) {
        self.boxes.push(OccupiedBox {
            item_id: item_id.into(),
            bbox,
        });
    }

    /// Removes the box of an item.
    pub fn remove(&mut self, item_id: &str) -> Option<OccupiedBox> {
        let idx = self.boxes.iter().position(|b| b.item_id == item_id)?;
        Some(self.boxes.remove(idx))
    }

    /// Returns the total occupied volume.
    pub fn used_volume(&self) -> f64 {
        self.boxes.iter().map(|b| b.bbox.volume()).sum()
    }

    /// Returns the unoccupied volume.
    pub fn free_volume(&self) -> f64 {
        (self.container.volume() - self.used_volume()).max(0.0)
    }

    /// Returns true if the box is inside the container and clear of every
    /// occupied box.
    pub fn is_free(&self, bbox: &BoundingBox, tolerance: f64) -> bool {
        crate::spatial::contains_with_tolerance(&self.container, bbox, tolerance)
            && !self
                .boxes
                .iter()
                .any(|b| overlaps_with_tolerance(&b.bbox, bbox, tolerance))
    }
}

/// A consistent, immutable view of containers and items.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    containers: BTreeMap<ContainerId, Container>,
    items: BTreeMap<ItemId, Item>,
    versions: BTreeMap<ContainerId, u64>,
}

impl Snapshot {
    /// Builds a snapshot, rejecting malformed or contradictory input.
    pub fn new(containers: Vec<Container>, items: Vec<Item>) -> Result<Self> {
        let mut container_map = BTreeMap::new();
        for container in containers {
            container.validate()?;
            let id = container.id().clone();
            if container_map.insert(id.clone(), container).is_some() {
                return Err(Error::Validation(format!("Duplicate container id '{}'", id)));
            }
        }

        let mut item_map = BTreeMap::new();
        for mut item in items {
            item.normalize();
            let id = item.id().clone();
            if item_map.insert(id.clone(), item).is_some() {
                return Err(Error::Validation(format!("Duplicate item id '{}'", id)));
            }
        }

        let versions = container_map.keys().map(|id| (id.clone(), 0)).collect();
        Self::from_parts(container_map, item_map, versions)
    }

    fn from_parts(
        containers: BTreeMap<ContainerId, Container>,
        items: BTreeMap<ItemId, Item>,
        versions: BTreeMap<ContainerId, u64>,
    ) -> Result<Self> {
        let snapshot = Self {
            containers,
            items,
            versions,
        };
        snapshot.check_consistency()?;
        Ok(snapshot)
    }

    fn check_consistency(&self) -> Result<()> {
        let mut per_container: BTreeMap<&str, Vec<(&str, BoundingBox)>> = BTreeMap::new();

        for item in self.items.values() {
            item.validate()?;

            let (Some(placement), Some(bbox)) = (item.placement(), item.bounding_box()) else {
                continue;
            };

            let container = self.containers.get(&placement.container_id).ok_or_else(|| {
                Error::InconsistentSnapshot(format!(
                    "Item '{}' references unknown container '{}'",
                    item.id(),
                    placement.container_id
                ))
            })?;

            if !contains(container, &bbox) {
                return Err(Error::InconsistentSnapshot(format!(
                    "Item '{}' extends outside container '{}'",
                    item.id(),
                    container.id()
                )));
            }

            per_container
                .entry(container.id().as_str())
                .or_default()
                .push((item.id().as_str(), bbox));
        }

        for (container_id, boxes) in per_container {
            for (i, (a_id, a)) in boxes.iter().enumerate() {
                if let Some((b_id, _)) = boxes[i + 1..].iter().find(|(_, b)| overlaps(a, b)) {
                    return Err(Error::InconsistentSnapshot(format!(
                        "Items '{}' and '{}' overlap in container '{}'",
                        a_id, b_id, container_id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Replaces the container versions.
    pub fn with_versions(mut self, versions: BTreeMap<ContainerId, u64>) -> Self {
        for (id, version) in versions {
            if self.containers.contains_key(&id) {
                self.versions.insert(id, version);
            }
        }
        self
    }

    /// Returns a container by id.
    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    /// Returns a container by id or `NotFound`.
    pub fn require_container(&self, id: &str) -> Result<&Container> {
        self.container(id)
            .ok_or_else(|| Error::NotFound(format!("container '{}'", id)))
    }

    /// Returns all containers in id order.
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    /// Returns an item by id.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Returns an item by id or `NotFound`.
    pub fn require_item(&self, id: &str) -> Result<&Item> {
        self.item(id)
            .ok_or_else(|| Error::NotFound(format!("item '{}'", id)))
    }

    /// Returns all items in id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Returns items with the given status.
    pub fn items_with_status(&self, status: ItemStatus) -> impl Iterator<Item = &Item> {
        self.items.values().filter(move |i| i.status() == status)
    }

    /// Returns the items placed in a container.
    pub fn items_in<'a>(&'a self, container_id: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.items
            .values()
            .filter(move |i| i.container_id() == Some(container_id))
    }

    /// Returns the version of a container (0 when unknown).
    pub fn version(&self, container_id: &str) -> u64 {
        self.versions.get(container_id).copied().unwrap_or(0)
    }

    /// Returns all container versions.
    pub fn versions(&self) -> &BTreeMap<ContainerId, u64> {
        &self.versions
    }

    /// Rebuilds the occupancy of one container.
    pub fn occupancy(&self, container_id: &str) -> Result<Occupancy> {
        let container = self.require_container(container_id)?;
        let mut occupancy = Occupancy::new(container.clone());
        for item in self.items_in(container_id) {
            if let Some(bbox) = item.bounding_box() {
                occupancy.push(item.id().clone(), bbox);
            }
        }
        Ok(occupancy)
    }

    /// Rebuilds the occupancy of every container, in container id order.
    pub fn occupancies(&self) -> Vec<Occupancy> {
        let mut by_container: BTreeMap<&str, Occupancy> = self
            .containers
            .values()
            .map(|c| (c.id().as_str(), Occupancy::new(c.clone())))
            .collect();

        for item in self.items.values() {
            if let (Some(container_id), Some(bbox)) = (item.container_id(), item.bounding_box()) {
                if let Some(occupancy) = by_container.get_mut(container_id) {
                    occupancy.push(item.id().clone(), bbox);
                }
            }
        }

        by_container.into_values().collect()
    }

    /// Returns the containers a batch of mutations would touch.
    pub fn touched_containers(&self, mutations: &[Mutation]) -> BTreeSet<ContainerId> {
        let mut touched = BTreeSet::new();
        for mutation in mutations {
            if let Some(current) = self.item(mutation.item_id()).and_then(|i| i.container_id()) {
                touched.insert(current.to_string());
            }
            match mutation {
                Mutation::Place { placement, .. } => {
                    touched.insert(placement.container_id.clone());
                }
                Mutation::Insert { item } => {
                    if let Some(container_id) = item.container_id() {
                        touched.insert(container_id.to_string());
                    }
                }
                _ => {}
            }
        }
        touched
    }

    /// Returns a new snapshot with the mutations applied in order.
    ///
    /// A batch that places items is checked for consistency as a whole, so
    /// one that would leave two boxes overlapping is rejected. Any other batch
    /// leaves every box where it was, so only the items it touches are
    /// revalidated.
    pub fn apply(&self, mutations: &[Mutation]) -> Result<Snapshot> {
        let mut items = self.items.clone();
        let mut moved = false;
        let mut touched: BTreeSet<ItemId> = BTreeSet::new();

        for mutation in mutations {
            match mutation {
                Mutation::Insert { item } => {
                    let mut item = item.clone();
                    item.normalize();
                    if items.contains_key(item.id()) {
                        return Err(Error::Validation(format!(
                            "Duplicate item id '{}'",
                            item.id()
                        )));
                    }
                    moved |= item.placement().is_some();
                    touched.insert(item.id().clone());
                    items.insert(item.id().clone(), item);
                }
                Mutation::Place { item_id, placement } => {
                    moved = true;
                    self.require_container(&placement.container_id)?;
                    let item = get_mut(&mut items, item_id)?;
                    if item.status() == ItemStatus::Disposed {
                        return Err(Error::InvalidState(format!(
                            "Disposed item '{}' cannot be placed",
                            item_id
                        )));
                    }
                    item.set_placement(Some(placement.clone()));
                }
                Mutation::Unplace { item_id } => {
                    get_mut(&mut items, item_id)?.set_placement(None);
                }
                Mutation::SetStatus { item_id, status } => {
                    touched.insert(item_id.clone());
                    let item = get_mut(&mut items, item_id)?;
                    if item.status() == ItemStatus::Disposed && *status != ItemStatus::Disposed {
                        return Err(Error::InvalidState(format!(
                            "Item '{}' is disposed",
                            item_id
                        )));
                    }
                    item.set_status(*status);
                }
                Mutation::SetRemainingUses { item_id, remaining } => {
                    touched.insert(item_id.clone());
                    let item = get_mut(&mut items, item_id)?;
                    if item.remaining_uses().is_some_and(|current| *remaining > current) {
                        return Err(Error::Validation(format!(
                            "Remaining uses for item '{}' cannot increase",
                            item_id
                        )));
                    }
                    item.set_remaining_uses(*remaining);
                }
                Mutation::Dispose { item_id } => {
                    let item = get_mut(&mut items, item_id)?;
                    item.set_placement(None);
                    item.set_status(ItemStatus::Disposed);
                }
            }
        }

        if moved {
            return Self::from_parts(self.containers.clone(), items, self.versions.clone());
        }

        for id in &touched {
            if let Some(item) = items.get(id) {
                item.validate()?;
            }
        }
        Ok(Self {
            containers: self.containers.clone(),
            items,
            versions: self.versions.clone(),
        })
    }

    pub(crate) fn bump_versions(&mut self, containers: &BTreeSet<ContainerId>) {
        for id in containers {
            *self.versions.entry(id.clone()).or_insert(0) += 1;
        }
    }
}

fn get_mut<'a>(items: &'a mut BTreeMap<ItemId, Item>, id: &str) -> Result<&'a mut Item> {
    items
        .get_mut(id)
        .ok_or_else(|| Error::NotFound(format!("item '{}'", id)))
}
