//! Anchor point search for box placement.
//!
//! Anchors are candidate minimum corners derived from the container origin
//! and the far faces of already placed boxes. For a box of fixed extents
//! the feasible position with the lowest `(d, w, h)` always has each
//! coordinate equal to `0` or to some placed box's far face on that axis,
//! so sweeping those coordinates in ascending order finds it exactly.
//!
//! The sweep narrows the set of boxes at each level:
//!
//! 1. D levels: `0` and every box's back face.
//! 2. At a D level, only boxes whose D range meets the candidate's slab
//!    matter; W levels come from their right faces.
//! 3. At a W level, only slab boxes whose W range meets the candidate's
//!    column matter; H levels come from their top faces.
//!
//! The first collision-free candidate is the lowest.

use stowage_core::geometry::{BoundingBox, Dimensions, Position};
use stowage_core::snapshot::Occupancy;
use stowage_core::spatial::{contains_with_tolerance, overlaps_with_tolerance};

/// Finds the lowest free position for a box inside one container.
pub struct AnchorSearch<'a> {
    occupancy: &'a Occupancy,
    tolerance: f64,
}

impl<'a> AnchorSearch<'a> {
    /// Creates a search over the given occupancy.
    pub fn new(occupancy: &'a Occupancy, tolerance: f64) -> Self {
        Self {
            occupancy,
            tolerance,
        }
    }

    /// Returns the free position with the lowest `(d, w, h)` for a box with
    /// the given (already oriented) extents.
    pub fn lowest_position(&self, size: &Dimensions) -> Option<Position> {
        self.lowest_position_within(size, f64::INFINITY)
    }

    /// Like [`lowest_position`](Self::lowest_position), but gives up once
    /// the D coordinate would exceed `d_limit`.
    pub fn lowest_position_within(&self, size: &Dimensions, d_limit: f64) -> Option<Position> {
        let tol = self.tolerance;
        let limit = self.occupancy.container().dimensions();

        if size.width > limit.width + tol
            || size.depth > limit.depth + tol
            || size.height > limit.height + tol
        {
            return None;
        }

        let boxes: Vec<&BoundingBox> = self.occupancy.boxes().iter().map(|b| &b.bbox).collect();

        let d_levels = anchor_levels(boxes.iter().map(|b| b.back()), limit.depth, size.depth, tol);
        for d in d_levels {
            if d > d_limit + tol {
                break;
            }

            let slab: Vec<&BoundingBox> = boxes
                .iter()
                .copied()
                .filter(|b| b.front() < d + size.depth - tol && b.back() > d + tol)
                .collect();

            let w_levels = anchor_levels(slab.iter().map(|b| b.max().x), limit.width, size.width, tol);
            for w in w_levels {
                let column: Vec<&BoundingBox> = slab
                    .iter()
                    .copied()
                    .filter(|b| b.min.x < w + size.width - tol && b.max().x > w + tol)
                    .collect();

                let h_levels =
                    anchor_levels(column.iter().map(|b| b.max().z), limit.height, size.height, tol);
                for h in h_levels {
                    let candidate = BoundingBox::new(Position::new(w, d, h), size);
                    if !contains_with_tolerance(self.occupancy.container(), &candidate, tol) {
                        continue;
                    }
                    if column
                        .iter()
                        .all(|b| !overlaps_with_tolerance(b, &candidate, tol))
                    {
                        return Some(candidate.min);
                    }
                }
            }
        }

        None
    }
}

/// Sorted, deduplicated anchor coordinates along one axis: `0` plus the
/// given faces, keeping only those where a box of `extent` still fits.
fn anchor_levels(
    faces: impl Iterator<Item = f64>,
    limit: f64,
    extent: f64,
    tolerance: f64,
) -> Vec<f64> {
    let mut levels: Vec<f64> = std::iter::once(0.0)
        .chain(faces)
        .filter(|v| *v >= -tolerance && v + extent <= limit + tolerance)
        .collect();
    levels.sort_by(|a, b| a.total_cmp(b));
    levels.dedup_by(|a, b| (*a - *b).abs() <= tolerance);
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::Container;

    fn occupancy(boxes: &[BoundingBox]) -> Occupancy {
        let mut occ = Occupancy::new(Container::new("C", "Z", 100.0, 85.0, 200.0));
        for (i, b) in boxes.iter().enumerate() {
            occ.push(format!("b{}", i), *b);
        }
        occ
    }

    #[test]
    fn test_empty_container_uses_origin() {
        let occ = occupancy(&[]);
        let search = AnchorSearch::new(&occ, 1e-9);
        let pos = search.lowest_position(&Dimensions::new(10.0, 10.0, 20.0)).unwrap();
        assert_eq!(pos, Position::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_prefers_lower_width_over_lower_height() {
        let occ = occupancy(&[BoundingBox::from_coords(0.0, 0.0, 0.0, 10.0, 10.0, 20.0)]);
        let search = AnchorSearch::new(&occ, 1e-9);
        let pos = search.lowest_position(&Dimensions::new(10.0, 10.0, 20.0)).unwrap();
        // D stays 0 and W = 0 is still reachable on top of the first box.
        assert_eq!(pos, Position::new(0.0, 0.0, 20.0));
    }

    #[test]
    fn test_moves_sideways_when_column_is_full() {
        let occ = occupancy(&[BoundingBox::from_coords(0.0, 0.0, 0.0, 10.0, 10.0, 200.0)]);
        let search = AnchorSearch::new(&occ, 1e-9);
        let pos = search.lowest_position(&Dimensions::new(10.0, 10.0, 20.0)).unwrap();
        assert_eq!(pos, Position::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_uses_height_before_depth() {
        // First box fills the whole opening width.
        let occ = occupancy(&[BoundingBox::from_coords(0.0, 0.0, 0.0, 100.0, 10.0, 20.0)]);
        let search = AnchorSearch::new(&occ, 1e-9);
        let pos = search.lowest_position(&Dimensions::new(10.0, 10.0, 20.0)).unwrap();
        assert_eq!(pos, Position::new(0.0, 0.0, 20.0));
    }

    #[test]
    fn test_moves_deeper_when_front_is_full() {
        let occ = occupancy(&[BoundingBox::from_coords(0.0, 0.0, 0.0, 100.0, 10.0, 200.0)]);
        let search = AnchorSearch::new(&occ, 1e-9);
        let pos = search.lowest_position(&Dimensions::new(10.0, 10.0, 20.0)).unwrap();
        assert_eq!(pos, Position::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn test_combines_faces_of_different_boxes() {
        // Two full-height towers leave a 10 cm gap at the opening.
        let occ = occupancy(&[
            BoundingBox::from_coords(0.0, 0.0, 0.0, 50.0, 40.0, 200.0),
            BoundingBox::from_coords(60.0, 0.0, 0.0, 40.0, 40.0, 200.0),
        ]);
        let search = AnchorSearch::new(&occ, 1e-9);
        let pos = search.lowest_position(&Dimensions::new(10.0, 10.0, 10.0)).unwrap();
        assert_eq!(pos, Position::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn test_respects_depth_limit() {
        let occ = occupancy(&[BoundingBox::from_coords(0.0, 0.0, 0.0, 100.0, 10.0, 200.0)]);
        let search = AnchorSearch::new(&occ, 1e-9);
        assert!(search
            .lowest_position_within(&Dimensions::new(10.0, 10.0, 20.0), 5.0)
            .is_none());
    }

    #[test]
    fn test_oversized_box() {
        let occ = occupancy(&[]);
        let search = AnchorSearch::new(&occ, 1e-9);
        assert!(search
            .lowest_position(&Dimensions::new(101.0, 10.0, 10.0))
            .is_none());
    }

    #[test]
    fn test_full_container() {
        let occ = occupancy(&[BoundingBox::from_coords(0.0, 0.0, 0.0, 100.0, 85.0, 200.0)]);
        let search = AnchorSearch::new(&occ, 1e-9);
        assert!(search.lowest_position(&Dimensions::new(1.0, 1.0, 1.0)).is_none());
    }
}
