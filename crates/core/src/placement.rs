//! Placement of an item inside a container.

use crate::container::ContainerId;
use crate::geometry::{BoundingBox, Dimensions, Orientation, Position};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where and how an item sits inside a container.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// The container holding the item.
    pub container_id: ContainerId,

    /// Minimum corner `(w, d, h)` of the item's box.
    pub position: Position,

    /// Rotation applied to the item's nominal dimensions.
    #[cfg_attr(feature = "serde", serde(default))]
    pub orientation: Orientation,
}

impl Placement {
    /// Creates a placement with the original orientation.
    pub fn new(container_id: impl Into<ContainerId>, w: f64, d: f64, h: f64) -> Self {
        Self {
            container_id: container_id.into(),
            position: Position::new(w, d, h),
            orientation: Orientation::default(),
        }
    }

    /// Sets the orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Returns the W coordinate.
    pub fn w(&self) -> f64 {
        self.position.x
    }

    /// Returns the D coordinate.
    pub fn d(&self) -> f64 {
        self.position.y
    }

    /// Returns the H coordinate.
    pub fn h(&self) -> f64 {
        self.position.z
    }

    /// Returns the occupied box for an item with the given nominal dimensions.
    pub fn bounding_box(&self, dimensions: &Dimensions) -> BoundingBox {
        BoundingBox::new(self.position, &dimensions.oriented(self.orientation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_coordinates() {
        let p = Placement::new("contA", 10.0, 20.0, 30.0);
        assert_eq!(p.w(), 10.0);
        assert_eq!(p.d(), 20.0);
        assert_eq!(p.h(), 30.0);
        assert_eq!(p.orientation, Orientation::Wdh);
    }

    #[test]
    fn test_bounding_box_follows_orientation() {
        let dims = Dimensions::new(10.0, 20.0, 30.0);
        let p = Placement::new("contA", 0.0, 5.0, 0.0).with_orientation(Orientation::Dwh);
        let bbox = p.bounding_box(&dims);
        assert_eq!(bbox.size.x, 20.0);
        assert_eq!(bbox.size.y, 10.0);
        assert_eq!(bbox.back(), 15.0);
    }
}
