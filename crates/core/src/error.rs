//! Error types for stowage planning.

use thiserror::Error;

/// Result type alias for stowage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during planning or commit.
///
/// Expected, data-dependent outcomes (an item that does not fit, a waste
/// item skipped for capacity) are reported through result types instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Unknown item or container id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation invalid for the current status of an item.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A return plan cannot include a forced item.
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Container version changed between snapshot read and commit.
    #[error(
        "Concurrent modification of container '{container_id}': expected version {expected}, found {actual}"
    )]
    ConcurrentModification {
        /// Container whose version moved.
        container_id: String,
        /// Version the caller read.
        expected: u64,
        /// Version found at commit time.
        actual: u64,
    },

    /// Malformed input: dimensions, mass, priority or usage counts.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Snapshot contradicts itself (dangling container reference, overlap).
    #[error("Inconsistent snapshot: {0}")]
    InconsistentSnapshot(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if retrying with a fresh snapshot may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConcurrentModification { .. })
    }
}
