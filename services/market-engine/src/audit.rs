//! Audit Log: append-only record of every state-changing action
//!
//! Logging never fails the caller: the store swallows snapshot write
//! failures internally, so an append is infallible from the business
//! operation's point of view.

use crate::MarketEngine;
use chrono::{DateTime, Utc};
use serde_json::Value;
use types::audit::AuditEntry;
use types::ids::UserId;

impl MarketEngine {
    /// Append an audit entry. Pure append: no validation, no failure
    /// propagated.
    pub fn log_action(&mut self, actor_id: UserId, action: &str, payload: Value, now: DateTime<Utc>) {
        self.store
            .append_audit(AuditEntry::new(actor_id, action, payload, now));
    }

    /// Query audit entries, newest first, with optional actor/action
    /// filters. `page` is a zero-based page index of size `limit`.
    pub fn query_logs(
        &self,
        actor: Option<&UserId>,
        action: Option<&str>,
        page: usize,
        limit: usize,
    ) -> Vec<AuditEntry> {
        let mut entries = self.store.list_audit(|e| {
            actor.map_or(true, |a| e.actor_id == *a) && action.map_or(true, |a| e.action == a)
        });
        entries.reverse();
        entries.into_iter().skip(page * limit).take(limit).collect()
    }

    /// Remove audit entries older than `cutoff`; returns how many were
    /// removed. Retention housekeeping, not a correctness concern.
    pub fn purge_logs_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        self.store.purge_audit_before(cutoff)
    }
}
