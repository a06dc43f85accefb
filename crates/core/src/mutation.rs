//! Mutations produced by planners and applied by the commit sink.

use crate::item::{Item, ItemId, ItemStatus};
use crate::placement::Placement;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single change to the stored state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum Mutation {
    /// Adds a new item.
    Insert {
        /// The item to add.
        item: Item,
    },
    /// Moves an item to a placement.
    Place {
        /// Item to move.
        item_id: ItemId,
        /// Target placement.
        placement: Placement,
    },
    /// Takes an item out of its container.
    Unplace {
        /// Item to take out.
        item_id: ItemId,
    },
    /// Changes an item's status.
    SetStatus {
        /// Item to update.
        item_id: ItemId,
        /// New status.
        status: ItemStatus,
    },
    /// Changes an item's remaining uses.
    SetRemainingUses {
        /// Item to update.
        item_id: ItemId,
        /// New remaining count.
        remaining: u32,
    },
    /// Clears the placement and marks the item disposed.
    Dispose {
        /// Item to dispose.
        item_id: ItemId,
    },
}

impl Mutation {
    /// Returns the item the mutation targets.
    pub fn item_id(&self) -> &str {
        match self {
            Mutation::Insert { item } => item.id(),
            Mutation::Place { item_id, .. }
            | Mutation::Unplace { item_id }
            | Mutation::SetStatus { item_id, .. }
            | Mutation::SetRemainingUses { item_id, .. }
            | Mutation::Dispose { item_id } => item_id,
        }
    }
}
