//! Storage containers.

use crate::geometry::{BoundingBox, Dimensions, Position};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Container identifier.
pub type ContainerId = String;

/// A fixed-size storage container with one open face at `D = 0`.
///
/// Immutable after creation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Container {
    id: ContainerId,
    zone: String,
    dimensions: Dimensions,
}

impl Container {
    /// Creates a new container.
    pub fn new(
        id: impl Into<ContainerId>,
        zone: impl Into<String>,
        width: f64,
        depth: f64,
        height: f64,
    ) -> Self {
        Self {
            id: id.into(),
            zone: zone.into(),
            dimensions: Dimensions::new(width, depth, height),
        }
    }

    /// Returns the container id.
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Returns the zone label.
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Returns the interior dimensions.
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// Returns the interior volume.
    pub fn volume(&self) -> f64 {
        self.dimensions.volume()
    }

    /// Returns the interior as a box anchored at the origin.
    pub fn interior(&self) -> BoundingBox {
        BoundingBox::new(Position::zeros(), &self.dimensions)
    }

    /// Validates the container.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("Container id must not be empty".into()));
        }

        if !self.dimensions.is_valid() {
            return Err(Error::Validation(format!(
                "All dimensions for container '{}' must be positive",
                self.id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_container_volume() {
        let container = Container::new("contA", "Crew Quarters", 100.0, 85.0, 200.0);
        assert_relative_eq!(container.volume(), 1_700_000.0, epsilon = 0.001);
        assert_eq!(container.zone(), "Crew Quarters");
    }

    #[test]
    fn test_validation() {
        assert!(Container::new("A", "Z", 1.0, 1.0, 1.0).validate().is_ok());
        assert!(Container::new("B", "Z", 0.0, 1.0, 1.0).validate().is_err());
        assert!(Container::new(" ", "Z", 1.0, 1.0, 1.0).validate().is_err());
    }
}
