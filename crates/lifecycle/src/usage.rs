//! Usage accounting.

use chrono::{DateTime, NaiveDate, Utc};
use stowage_core::audit::{ActionType, LogEntry};
use stowage_core::{Error, Item, ItemId, ItemStatus, Mutation, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A status change caused by usage or by the passing of time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusTransition {
    /// The changed item.
    pub item_id: ItemId,
    /// Status before.
    pub from: ItemStatus,
    /// Status after.
    pub to: ItemStatus,
    /// Date the change takes effect.
    pub date: NaiveDate,
}

impl StatusTransition {
    /// Returns the mutation recording the change.
    pub fn mutation(&self) -> Mutation {
        Mutation::SetStatus {
            item_id: self.item_id.clone(),
            status: self.to,
        }
    }

    /// Describes the change as an audit entry.
    pub fn log_entry(&self, at: DateTime<Utc>, user_id: Option<&str>, action: ActionType) -> LogEntry {
        LogEntry::new(
            at,
            action,
            format!("status {} -> {} on {}", self.from, self.to, self.date),
        )
        .with_user(user_id)
        .with_item(self.item_id.clone())
    }
}

/// Result of recording uses of one item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UsageOutcome {
    /// The used item.
    pub item_id: ItemId,
    /// Uses actually consumed.
    pub consumed: u32,
    /// Remaining uses afterwards; `None` for items without a usage limit.
    pub remaining: Option<u32>,
    /// Set when the item ran out.
    pub transition: Option<StatusTransition>,
}

impl UsageOutcome {
    /// Mutations that record the usage.
    pub fn mutations(&self) -> Vec<Mutation> {
        let mut mutations = Vec::new();
        if let Some(remaining) = self.remaining {
            mutations.push(Mutation::SetRemainingUses {
                item_id: self.item_id.clone(),
                remaining,
            });
        }
        if let Some(transition) = &self.transition {
            mutations.push(transition.mutation());
        }
        mutations
    }
}

/// Records `uses` uses of a stowed item on `date`.
///
/// Remaining uses never drop below zero. Reaching zero moves the item to
/// `waste_depleted`. Items without a usage limit are unaffected.
pub fn record_use(item: &Item, uses: u32, date: NaiveDate) -> Result<UsageOutcome> {
    if item.status() != ItemStatus::Stowed {
        return Err(Error::InvalidState(format!(
            "Item '{}' is {} and cannot be used",
            item.id(),
            item.status()
        )));
    }

    let Some(current) = item.remaining_uses() else {
        return Ok(UsageOutcome {
            item_id: item.id().clone(),
            consumed: uses,
            remaining: None,
            transition: None,
        });
    };

    let remaining = current.saturating_sub(uses);
    let transition = (remaining == 0).then(|| StatusTransition {
        item_id: item.id().clone(),
        from: item.status(),
        to: ItemStatus::WasteDepleted,
        date,
    });

    if transition.is_some() {
        log::debug!("{} used up on {}", item.id(), date);
    }

    Ok(UsageOutcome {
        item_id: item.id().clone(),
        consumed: current - remaining,
        remaining: Some(remaining),
        transition,
    })
}
