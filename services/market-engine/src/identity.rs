//! Identity resolution: external chat handle → internal user record
//!
//! Users are created lazily on first sight. All other entities reference
//! the internal id, never the handle, so references stay valid if the chat
//! platform ever changes its handle scheme.

use crate::MarketEngine;
use chrono::{DateTime, Utc};
use tracing::info;
use types::user::User;

impl MarketEngine {
    /// Map an external handle to its user record, creating one on first
    /// sight.
    pub fn resolve_user(&mut self, handle: &str, now: DateTime<Utc>) -> User {
        if let Some(user) = self.store.find_user_by_handle(handle) {
            return user.clone();
        }
        let user = self.store.create_user(handle, now);
        info!(user_id = %user.id, handle, "user created on first interaction");
        user
    }

    /// Look up a user by handle without creating one.
    pub fn find_user(&self, handle: &str) -> Option<User> {
        self.store.find_user_by_handle(handle).cloned()
    }
}
