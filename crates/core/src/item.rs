//! Stowable items and their lifecycle status.

use crate::geometry::{BoundingBox, Dimensions};
use crate::placement::Placement;
use crate::{Error, Result};
use chrono::NaiveDate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Item identifier.
pub type ItemId = String;

/// Highest allowed priority.
pub const MAX_PRIORITY: u8 = 100;

/// Lifecycle status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ItemStatus {
    /// In service.
    #[default]
    Stowed,
    /// Past its expiry date.
    WasteExpired,
    /// No uses remaining.
    WasteDepleted,
    /// Undocked; terminal.
    Disposed,
}

impl ItemStatus {
    /// Returns true for the two waste statuses.
    pub fn is_waste(self) -> bool {
        matches!(self, ItemStatus::WasteExpired | ItemStatus::WasteDepleted)
    }

    /// Returns the wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Stowed => "stowed",
            ItemStatus::WasteExpired => "waste_expired",
            ItemStatus::WasteDepleted => "waste_depleted",
            ItemStatus::Disposed => "disposed",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical item tracked by the planner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Item {
    id: ItemId,

    name: String,

    dimensions: Dimensions,

    #[cfg_attr(feature = "serde", serde(default))]
    mass: Option<f64>,

    #[cfg_attr(feature = "serde", serde(default))]
    priority: u8,

    #[cfg_attr(feature = "serde", serde(default))]
    expiry_date: Option<NaiveDate>,

    #[cfg_attr(feature = "serde", serde(default))]
    usage_limit: Option<u32>,

    #[cfg_attr(feature = "serde", serde(default))]
    remaining_uses: Option<u32>,

    #[cfg_attr(feature = "serde", serde(default))]
    preferred_zone: Option<String>,

    #[cfg_attr(feature = "serde", serde(default))]
    status: ItemStatus,

    #[cfg_attr(feature = "serde", serde(default))]
    placement: Option<Placement>,
}

impl Item {
    /// Creates a new stowed, unplaced item.
    pub fn new(
        id: impl Into<ItemId>,
        name: impl Into<String>,
        width: f64,
        depth: f64,
        height: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            dimensions: Dimensions::new(width, depth, height),
            mass: None,
            priority: 0,
            expiry_date: None,
            usage_limit: None,
            remaining_uses: None,
            preferred_zone: None,
            status: ItemStatus::Stowed,
            placement: None,
        }
    }

    /// Sets the mass in kilograms.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Sets the priority (0-100).
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the expiry date.
    pub fn with_expiry(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    /// Sets the usage limit; remaining uses start at the limit.
    pub fn with_usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self.remaining_uses = Some(limit);
        self
    }

    /// Overrides the remaining uses.
    pub fn with_remaining_uses(mut self, remaining: u32) -> Self {
        self.remaining_uses = Some(remaining);
        self
    }

    /// Sets the preferred zone.
    pub fn with_preferred_zone(mut self, zone: impl Into<String>) -> Self {
        self.preferred_zone = Some(zone.into());
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the placement.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Returns the item id.
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the nominal dimensions.
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// Returns the volume.
    pub fn volume(&self) -> f64 {
        self.dimensions.volume()
    }

    /// Returns the mass.
    pub fn mass(&self) -> Option<f64> {
        self.mass
    }

    /// Returns the priority.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Returns the expiry date.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    /// Returns the usage limit.
    pub fn usage_limit(&self) -> Option<u32> {
        self.usage_limit
    }

    /// Returns the remaining uses.
    pub fn remaining_uses(&self) -> Option<u32> {
        self.remaining_uses
    }

    /// Returns the preferred zone.
    pub fn preferred_zone(&self) -> Option<&str> {
        self.preferred_zone.as_deref()
    }

    /// Returns the status.
    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Returns the placement, if the item is inside a container.
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// Returns the container holding the item.
    pub fn container_id(&self) -> Option<&str> {
        self.placement.as_ref().map(|p| p.container_id.as_str())
    }

    /// Returns the occupied box, if placed.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.placement
            .as_ref()
            .map(|p| p.bounding_box(&self.dimensions))
    }

    /// Returns true if the item is expired as of the given date.
    pub fn is_expired_on(&self, date: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < date)
    }

    /// Returns true if the item has a usage limit and no uses left.
    pub fn is_depleted(&self) -> bool {
        self.remaining_uses == Some(0)
    }

    /// Validates the item.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("Item id must not be empty".into()));
        }

        if !self.dimensions.is_valid() {
            return Err(Error::Validation(format!(
                "All dimensions for item '{}' must be positive",
                self.id
            )));
        }

        if let Some(mass) = self.mass {
            if !mass.is_finite() || mass < 0.0 {
                return Err(Error::Validation(format!(
                    "Mass for item '{}' cannot be negative",
                    self.id
                )));
            }
        }

        if self.priority > MAX_PRIORITY {
            return Err(Error::Validation(format!(
                "Priority for item '{}' must be within 0-{}, got {}",
                self.id, MAX_PRIORITY, self.priority
            )));
        }

        if let (Some(limit), Some(remaining)) = (self.usage_limit, self.remaining_uses) {
            if remaining > limit {
                return Err(Error::Validation(format!(
                    "Remaining uses for item '{}' exceed its usage limit ({} > {})",
                    self.id, remaining, limit
                )));
            }
        }

        if self.status == ItemStatus::Disposed && self.placement.is_some() {
            return Err(Error::Validation(format!(
                "Disposed item '{}' cannot have a placement",
                self.id
            )));
        }

        Ok(())
    }

    /// Fills remaining uses from the usage limit when only the limit is known.
    pub(crate) fn normalize(&mut self) {
        if self.remaining_uses.is_none() {
            self.remaining_uses = self.usage_limit;
        }
    }

    pub(crate) fn set_status(&mut self, status: ItemStatus) {
        self.status = status;
    }

    pub(crate) fn set_remaining_uses(&mut self, remaining: u32) {
        self.remaining_uses = Some(remaining);
    }

    pub(crate) fn set_placement(&mut self, placement: Option<Placement>) {
        self.placement = placement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_usage_limit_seeds_remaining_uses() {
        let item = Item::new("001", "Food Packet", 10.0, 10.0, 20.0).with_usage_limit(30);
        assert_eq!(item.remaining_uses(), Some(30));
        assert!(!item.is_depleted());
    }

    #[test]
    fn test_expiry_is_strict() {
        let item = Item::new("001", "Food Packet", 10.0, 10.0, 20.0).with_expiry(date(2025, 5, 20));
        assert!(!item.is_expired_on(date(2025, 5, 20)));
        assert!(item.is_expired_on(date(2025, 5, 21)));

        let no_expiry = Item::new("002", "Wrench", 5.0, 5.0, 5.0);
        assert!(!no_expiry.is_expired_on(date(2100, 1, 1)));
    }

    #[test]
    fn test_validation() {
        assert!(Item::new("A", "a", 1.0, 1.0, 1.0).validate().is_ok());
        assert!(Item::new("B", "b", 0.0, 1.0, 1.0).validate().is_err());
        assert!(Item::new("C", "c", 1.0, 1.0, 1.0)
            .with_mass(-1.0)
            .validate()
            .is_err());
        assert!(Item::new("D", "d", 1.0, 1.0, 1.0)
            .with_priority(101)
            .validate()
            .is_err());
        assert!(Item::new("E", "e", 1.0, 1.0, 1.0)
            .with_usage_limit(2)
            .with_remaining_uses(3)
            .validate()
            .is_err());
        assert!(Item::new("F", "f", 1.0, 1.0, 1.0)
            .with_status(ItemStatus::Disposed)
            .with_placement(Placement::new("C1", 0.0, 0.0, 0.0))
            .validate()
            .is_err());
    }

    #[test]
    fn test_status_names() {
        assert_eq!(ItemStatus::WasteExpired.to_string(), "waste_expired");
        assert!(ItemStatus::WasteDepleted.is_waste());
        assert!(!ItemStatus::Disposed.is_waste());
    }
}
