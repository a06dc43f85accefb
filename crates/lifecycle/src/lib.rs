//! # Stowage Lifecycle
//!
//! What happens to items after they are stowed: usage accounting, waste
//! classification, return and undocking plans, and the day simulator that
//! ties them together.

pub mod simulation;
pub mod usage;
pub mod waste;

// Re-exports
pub use simulation::{DaySimulator, SimulationResult, UsageEntry, UsageManifest};
pub use usage::{record_use, StatusTransition, UsageOutcome};
pub use waste::{
    Classification, ReturnPlan, SkipReason, SkippedItem, UndockingCompletion, UndockingPlan,
    WasteManager,
};
