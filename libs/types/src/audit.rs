//! Audit trail types

use crate::ids::{AuditEntryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One append-only record of a state-changing action.
///
/// Never mutated or deleted by business logic; retention trimming is a
/// housekeeping concern, not a correctness one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub actor_id: UserId,
    pub action: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Create a new entry. No validation: the audit log records what
    /// happened, it does not judge it.
    pub fn new(
        actor_id: UserId,
        action: impl Into<String>,
        payload: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            actor_id,
            action: action.into(),
            payload,
            created_at: timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_roundtrip() {
        let entry = AuditEntry::new(
            UserId::new(),
            "LISTING_CREATED",
            json!({"item_name": "emerald", "quantity": 5}),
            Utc::now(),
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
