//! # Stowage Core
//!
//! Data model and shared primitives for the stowage planner.
//!
//! This crate provides the types every planner works on: containers and
//! items, the overlap and containment primitives, immutable snapshots, and
//! the store, commit and clock interfaces through which callers persist
//! planner output.
//!
//! ## Core Components
//!
//! - **Geometry**: `Dimensions`, `Orientation`, `BoundingBox`
//! - **Spatial primitives**: `overlaps`, `contains`
//! - **Data model**: `Container`, `Item`, `ItemStatus`, `Placement`
//! - **Snapshots**: `Snapshot`, `Occupancy`, `Mutation`
//! - **Interfaces**: `ItemStore`, `CommitSink`, `Clock`, `MemoryStore`
//! - **Audit log**: `LogEntry`, `ActionType`, `Auditable`, `LogSink`
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod audit;
pub mod config;
pub mod container;
pub mod error;
pub mod geometry;
pub mod item;
pub mod mutation;
pub mod placement;
pub mod snapshot;
pub mod spatial;
pub mod store;

// Re-exports
pub use audit::{ActionType, Auditable, LogEntry, LogSink, MemoryLog};
pub use config::Config;
pub use container::{Container, ContainerId};
pub use error::{Error, Result};
pub use geometry::{BoundingBox, Dimensions, Orientation, OrientationConstraint, Position};
pub use item::{Item, ItemId, ItemStatus};
pub use mutation::Mutation;
pub use placement::Placement;
pub use snapshot::{OccupiedBox, Occupancy, Snapshot};
pub use spatial::{contains, footprint_overlaps, overlaps};
pub use store::{Clock, CommitBatch, CommitSink, FixedClock, ItemStore, MemoryStore};
