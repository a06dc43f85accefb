//! Audit log entries.
//!
//! Entries are append-only and never read back by the planners.

use crate::item::ItemId;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::Mutex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActionType {
    Placement,
    Retrieval,
    Rearrangement,
    Disposal,
    Import,
    Simulation,
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LogEntry {
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
    /// Who triggered it.
    pub user_id: Option<String>,
    /// What happened.
    pub action: ActionType,
    /// The item concerned.
    pub item_id: Option<ItemId>,
    /// Free-form details.
    pub details: String,
}

impl LogEntry {
    /// Creates an entry with no user or item.
    pub fn new(timestamp: DateTime<Utc>, action: ActionType, details: impl Into<String>) -> Self {
        Self {
            timestamp,
            user_id: None,
            action,
            item_id: None,
            details: details.into(),
        }
    }

    /// Sets the user.
    pub fn with_user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    /// Sets the item.
    pub fn with_item(mut self, item_id: impl Into<ItemId>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }
}

/// Midnight UTC of a simulated date.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt))
        .unwrap_or_default()
}

/// Plan results that can describe themselves as audit entries.
pub trait Auditable {
    /// Returns the audit entries for this result.
    fn log_entries(&self, at: DateTime<Utc>, user_id: Option<&str>) -> Vec<LogEntry>;
}

/// Destination for audit entries.
pub trait LogSink {
    /// Appends entries.
    fn append(&self, entries: Vec<LogEntry>);
}

/// Append-only in-memory log.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry in append order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if nothing was appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemoryLog {
    fn append(&self, entries: Vec<LogEntry>) {
        if let Ok(mut log) = self.entries.lock() {
            log.extend(entries);
        }
    }
}
