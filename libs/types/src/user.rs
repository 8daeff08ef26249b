//! User and stock types

use crate::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A marketplace participant.
///
/// Created lazily on first interaction and never deleted. The external
/// handle is whatever the hosting chat platform calls this person; it is
/// immutable once recorded. Everything else in the system references the
/// internal [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub external_handle: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user for an external handle.
    pub fn new(external_handle: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            external_handle: external_handle.into(),
            created_at: timestamp,
        }
    }
}

/// Un-listed inventory owned by a user.
///
/// The source pool from which listings are carved. Keyed by
/// `(owner_id, item_name)`; adjusted by collaborators, not by the listing
/// flow itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub owner_id: UserId,
    pub item_name: String,
    pub quantity_total: u32,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    /// Create a new stock record.
    pub fn new(
        owner_id: UserId,
        item_name: impl Into<String>,
        quantity_total: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            item_name: item_name.into(),
            quantity_total,
            updated_at: timestamp,
        }
    }

    /// Composite key used by the store: `owner_id:item_name`.
    pub fn key_for(owner_id: &UserId, item_name: &str) -> String {
        format!("{owner_id}:{item_name}")
    }

    /// This record's store key.
    pub fn key(&self) -> String {
        Self::key_for(&self.owner_id, &self.item_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("wizard#1234", Utc::now());
        assert_eq!(user.external_handle, "wizard#1234");
    }

    #[test]
    fn test_stock_key_is_owner_and_item() {
        let owner = UserId::new();
        let stock = Stock::new(owner, "iron ingot", 64, Utc::now());
        assert_eq!(stock.key(), format!("{owner}:iron ingot"));
        assert_eq!(stock.key(), Stock::key_for(&owner, "iron ingot"));
    }
}
