//! Box geometry: dimensions, orientations and axis-aligned boxes.
//!
//! Axis convention: `x` is W and `z` is H, both spanning the container's
//! open face; `y` is D, the depth into the container with `D = 0` at the
//! opening.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default tolerance for floating point comparisons.
pub const EPSILON: f64 = 1e-9;

/// Position of a box's minimum corner `(w, d, h)`.
pub type Position = Vector3<f64>;

/// One of the six axis-aligned rotations of a box.
///
/// Each variant names which source extent lands on the W, D and H axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Orientation {
    /// Original orientation.
    #[default]
    Wdh,
    /// Rotated 90° around W.
    Whd,
    /// Rotated 90° around H.
    Dwh,
    /// Rotated 90° around W then H.
    Dhw,
    /// Rotated 90° around D.
    Hwd,
    /// Rotated 90° around D then W.
    Hdw,
}

impl Orientation {
    /// All six orientations in search order.
    pub const ALL: [Orientation; 6] = [
        Orientation::Wdh,
        Orientation::Whd,
        Orientation::Dwh,
        Orientation::Dhw,
        Orientation::Hwd,
        Orientation::Hdw,
    ];

    /// Source axis index for each of (W, D, H).
    pub fn axes(self) -> (usize, usize, usize) {
        match self {
            Orientation::Wdh => (0, 1, 2),
            Orientation::Whd => (0, 2, 1),
            Orientation::Dwh => (1, 0, 2),
            Orientation::Dhw => (1, 2, 0),
            Orientation::Hwd => (2, 0, 1),
            Orientation::Hdw => (2, 1, 0),
        }
    }

    /// Returns true if the original height stays vertical.
    pub fn is_upright(self) -> bool {
        self.axes().2 == 2
    }
}

/// Which orientations the planner may try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OrientationConstraint {
    /// All six axis permutations.
    #[default]
    Any,
    /// Only rotations that keep height vertical.
    Upright,
    /// No rotation.
    Fixed,
}

impl OrientationConstraint {
    /// Returns the allowed orientations in search order.
    pub fn allowed(self) -> Vec<Orientation> {
        match self {
            OrientationConstraint::Any => Orientation::ALL.to_vec(),
            OrientationConstraint::Upright => Orientation::ALL
                .iter()
                .copied()
                .filter(|o| o.is_upright())
                .collect(),
            OrientationConstraint::Fixed => vec![Orientation::Wdh],
        }
    }
}

/// Extents of a box in centimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dimensions {
    /// Extent along W.
    pub width: f64,
    /// Extent along D.
    pub depth: f64,
    /// Extent along H.
    pub height: f64,
}

impl Dimensions {
    /// Creates dimensions from width, depth and height.
    pub fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// Returns the extents as a vector.
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.width, self.depth, self.height)
    }

    /// Returns the width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the depth.
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Returns the height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the volume.
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// Returns true if every extent is positive and finite.
    pub fn is_valid(&self) -> bool {
        [self.width, self.depth, self.height]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }

    /// Returns the extents after applying an orientation.
    pub fn oriented(&self, orientation: Orientation) -> Dimensions {
        let extents = self.to_vector();
        let (w, d, h) = orientation.axes();
        Dimensions::new(extents[w], extents[d], extents[h])
    }
}

/// An axis-aligned box `[min, min + size]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Position,
    /// Extents.
    pub size: Vector3<f64>,
}

impl BoundingBox {
    /// Creates a box from its minimum corner and extents.
    pub fn new(min: Position, size: &Dimensions) -> Self {
        Self {
            min,
            size: size.to_vector(),
        }
    }

    /// Creates a box from raw coordinates.
    pub fn from_coords(w: f64, d: f64, h: f64, width: f64, depth: f64, height: f64) -> Self {
        Self {
            min: Position::new(w, d, h),
            size: Vector3::new(width, depth, height),
        }
    }

    /// Returns the maximum corner.
    pub fn max(&self) -> Position {
        self.min + self.size
    }

    /// Returns the volume.
    pub fn volume(&self) -> f64 {
        self.size.x * self.size.y * self.size.z
    }

    /// Start of the D range (distance from the opening).
    pub fn front(&self) -> f64 {
        self.min.y
    }

    /// End of the D range.
    pub fn back(&self) -> f64 {
        self.min.y + self.size.y
    }
}
