//! Unique identifier types for marketplace entities
//!
//! All IDs use UUID v7: a millisecond timestamp in the high bits plus a
//! random tail, so ids are collision-resistant within a process lifetime and
//! sort chronologically. The canonical hex string form preserves that
//! ordering, which the store relies on for insertion-ordered iteration.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new id with the current timestamp.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id! {
    /// Unique identifier for a user.
    ///
    /// The stable internal key; all other entities reference users by this
    /// id, never by the external chat handle.
    UserId
}

entity_id! {
    /// Unique identifier for a listing.
    ListingId
}

entity_id! {
    /// Unique identifier for a deal.
    DealId
}

entity_id! {
    /// Unique identifier for an auction.
    AuctionId
}

entity_id! {
    /// Unique identifier for a bid.
    BidId
}

entity_id! {
    /// Unique identifier for an audit log entry.
    AuditEntryId
}
