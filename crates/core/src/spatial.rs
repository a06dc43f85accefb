//! Overlap and containment primitives.
//!
//! Pure, total functions over [`BoundingBox`]; everything else composes
//! them. Shared faces never count as overlap.

use crate::container::Container;
use crate::geometry::{BoundingBox, EPSILON};

/// Returns true if the two boxes intersect with positive volume.
pub fn overlaps(a: &BoundingBox, b: &BoundingBox) -> bool {
    overlaps_with_tolerance(a, b, EPSILON)
}

/// [`overlaps`] with an explicit tolerance.
pub fn overlaps_with_tolerance(a: &BoundingBox, b: &BoundingBox, tolerance: f64) -> bool {
    (0..3).all(|axis| intervals_overlap(a, b, axis, tolerance))
}

/// Returns true if the (W, H) projections of the boxes intersect with
/// positive area.
pub fn footprint_overlaps(a: &BoundingBox, b: &BoundingBox, tolerance: f64) -> bool {
    intervals_overlap(a, b, 0, tolerance) && intervals_overlap(a, b, 2, tolerance)
}

/// Returns true if the box lies within the container's interior.
pub fn contains(container: &Container, bbox: &BoundingBox) -> bool {
    contains_with_tolerance(container, bbox, EPSILON)
}

/// [`contains`] with an explicit tolerance.
pub fn contains_with_tolerance(container: &Container, bbox: &BoundingBox, tolerance: f64) -> bool {
    let limit = container.dimensions().to_vector();
    let max = bbox.max();
    (0..3).all(|axis| bbox.min[axis] >= -tolerance && max[axis] <= limit[axis] + tolerance)
}

fn intervals_overlap(a: &BoundingBox, b: &BoundingBox, axis: usize, tolerance: f64) -> bool {
    let a_max = a.min[axis] + a.size[axis];
    let b_max = b.min[axis] + b.size[axis];
    a.min[axis] < b_max - tolerance && b.min[axis] < a_max - tolerance
}
