//! # Stowage Planner
//!
//! Placement, retrieval and rearrangement planning for container stowage.
//!
//! Every planner is a pure function of a [`Snapshot`](stowage_core::Snapshot)
//! or of explicit containers and items: it returns plan results and the
//! mutations that would commit them, and never writes anything itself.

pub mod anchor;
pub mod placement;
pub mod rearrangement;
pub mod retrieval;

// Re-exports
pub use anchor::AnchorSearch;
pub use placement::{placement_mutations, PlacementBatch, PlacementPlanner, PlacementResult};
pub use rearrangement::{Move, Rearrangement, RearrangementPlanner};
pub use retrieval::{RetrievalPlan, RetrievalPlanner, RetrievalStep};
pub use stowage_core::{Config, Error, Placement, Result, Snapshot};
