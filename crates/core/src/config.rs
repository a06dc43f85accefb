//! Planner configuration.

use crate::geometry::{OrientationConstraint, EPSILON};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Common configuration for the planners.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Tolerance for coordinate comparisons, in centimeters.
    pub tolerance: f64,

    /// Orientations the placement planner may try.
    pub orientation: OrientationConstraint,

    /// Maximum number of items evicted to make room for one item.
    pub max_rearrangement_moves: usize,

    /// User recorded in audit entries.
    pub user_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: EPSILON,
            orientation: OrientationConstraint::Any,
            max_rearrangement_moves: 5,
            user_id: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the comparison tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the orientation constraint.
    pub fn with_orientation(mut self, orientation: OrientationConstraint) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the rearrangement move limit.
    pub fn with_max_rearrangement_moves(mut self, moves: usize) -> Self {
        self.max_rearrangement_moves = moves;
        self
    }

    /// Sets the audit user.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 || self.tolerance > 1.0 {
            return Err(Error::Config(format!(
                "tolerance must be within [0, 1], got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}
