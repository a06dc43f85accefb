//! # Stowage
//!
//! Planning engine for cargo stowage in fixed-size containers.
//!
//! This crate provides:
//! - **Placement**: positions and orientations for new items, priority first
//! - **Retrieval**: ordered steps to extract an item past its blockers
//! - **Rearrangement**: moving lower-priority items to make room
//! - **Waste**: classification, return plans and undocking
//! - **Simulation**: usage and expiry over simulated days
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stowage::{Container, Item, PlacementPlanner};
//!
//! let containers = vec![Container::new("contA", "Crew Quarters", 100.0, 85.0, 200.0)];
//! let items = vec![Item::new("i1", "Food Packet", 10.0, 10.0, 20.0).with_priority(80)];
//!
//! let results = PlacementPlanner::default_config().plan(&items, &containers, &[])?;
//! ```
//!
//! ## Feature Flags
//!
//! - `lifecycle` (default): waste manager and day simulator
//! - `serde`: Serialization support

/// Data model, spatial primitives and store interfaces.
pub use stowage_core as core;

/// Placement, retrieval and rearrangement planners.
pub use stowage_planner as planner;

/// Waste management and day simulation.
#[cfg(feature = "lifecycle")]
pub use stowage_lifecycle as lifecycle;

// Re-export commonly used types at root level
pub use stowage_core::{
    Config, Container, Error, Item, ItemStatus, Mutation, Placement, Result, Snapshot,
};
pub use stowage_planner::{PlacementPlanner, PlacementResult, RearrangementPlanner, RetrievalPlanner};

#[cfg(feature = "lifecycle")]
pub use stowage_lifecycle::{DaySimulator, UsageManifest, WasteManager};
