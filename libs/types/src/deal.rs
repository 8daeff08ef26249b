//! Deal lifecycle types
//!
//! A deal is a two-party, mutually-confirmed purchase against a listing.
//! Currency changes hands outside the system ("in game"); the deal's job is
//! to gate the inventory decrement on mutual acknowledgement.

use crate::ids::{DealId, ListingId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Deal status
///
/// Transitions: `Pending → {Completed, Cancelled}`; any terminal state may
/// be archived to `Closed`. Nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DealStatus {
    /// Awaiting one or both confirmations
    Pending,
    /// Both parties confirmed and inventory was decremented (terminal)
    Completed,
    /// Withdrawn by either party before completion (terminal)
    Cancelled,
    /// Archived (terminal)
    Closed,
}

impl DealStatus {
    /// Check if the status is terminal (no transition other than `Closed`).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DealStatus::Completed | DealStatus::Cancelled | DealStatus::Closed
        )
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DealStatus::Pending => write!(f, "PENDING"),
            DealStatus::Completed => write!(f, "COMPLETED"),
            DealStatus::Cancelled => write!(f, "CANCELLED"),
            DealStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Which side of a deal a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealParty {
    Buyer,
    Seller,
}

/// A two-party purchase transaction against a listing.
///
/// Invariants: `buyer_id != seller_id`; `quantity` is re-validated against
/// the listing's available quantity at confirmation time, because no
/// inventory is reserved at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub listing_id: ListingId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub item_name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub status: DealStatus,
    pub buyer_confirmed: bool,
    pub seller_confirmed: bool,
    /// Opaque transport reference (e.g. a discussion thread id), stored for
    /// the transport's own later use.
    pub thread_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Create a new pending deal with both confirmation flags unset.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        listing_id: ListingId,
        buyer_id: UserId,
        seller_id: UserId,
        item_name: impl Into<String>,
        price: Decimal,
        quantity: u32,
        thread_ref: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DealId::new(),
            listing_id,
            buyer_id,
            seller_id,
            item_name: item_name.into(),
            price,
            quantity,
            status: DealStatus::Pending,
            buyer_confirmed: false,
            seller_confirmed: false,
            thread_ref,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Which side of the deal the given user is, if any.
    pub fn party_of(&self, user_id: &UserId) -> Option<DealParty> {
        if *user_id == self.buyer_id {
            Some(DealParty::Buyer)
        } else if *user_id == self.seller_id {
            Some(DealParty::Seller)
        } else {
            None
        }
    }

    /// Whether the given party has already confirmed.
    pub fn has_confirmed(&self, party: DealParty) -> bool {
        match party {
            DealParty::Buyer => self.buyer_confirmed,
            DealParty::Seller => self.seller_confirmed,
        }
    }

    /// Record one party's confirmation.
    pub fn confirm(&mut self, party: DealParty, timestamp: DateTime<Utc>) {
        match party {
            DealParty::Buyer => self.buyer_confirmed = true,
            DealParty::Seller => self.seller_confirmed = true,
        }
        self.updated_at = timestamp;
    }

    /// Whether both parties have confirmed.
    pub fn both_confirmed(&self) -> bool {
        self.buyer_confirmed && self.seller_confirmed
    }

    /// Mark the deal completed.
    pub fn complete(&mut self, timestamp: DateTime<Utc>) {
        self.status = DealStatus::Completed;
        self.updated_at = timestamp;
    }

    /// Mark the deal cancelled.
    pub fn cancel(&mut self, timestamp: DateTime<Utc>) {
        self.status = DealStatus::Cancelled;
        self.updated_at = timestamp;
    }

    /// Archive the deal.
    pub fn close(&mut self, timestamp: DateTime<Utc>) {
        self.status = DealStatus::Closed;
        self.updated_at = timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_deal() -> Deal {
        Deal::new(
            ListingId::new(),
            UserId::new(),
            UserId::new(),
            "emerald",
            Decimal::from(100),
            2,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_new_deal_is_pending_and_unconfirmed() {
        let deal = sample_deal();
        assert_eq!(deal.status, DealStatus::Pending);
        assert!(!deal.buyer_confirmed);
        assert!(!deal.seller_confirmed);
        assert!(!deal.both_confirmed());
    }

    #[test]
    fn test_party_resolution() {
        let deal = sample_deal();
        assert_eq!(deal.party_of(&deal.buyer_id), Some(DealParty::Buyer));
        assert_eq!(deal.party_of(&deal.seller_id), Some(DealParty::Seller));
        assert_eq!(deal.party_of(&UserId::new()), None);
    }

    #[test]
    fn test_confirmation_flags() {
        let mut deal = sample_deal();
        deal.confirm(DealParty::Buyer, Utc::now());
        assert!(deal.has_confirmed(DealParty::Buyer));
        assert!(!deal.has_confirmed(DealParty::Seller));
        assert!(!deal.both_confirmed());

        deal.confirm(DealParty::Seller, Utc::now());
        assert!(deal.both_confirmed());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!DealStatus::Pending.is_terminal());
        assert!(DealStatus::Completed.is_terminal());
        assert!(DealStatus::Cancelled.is_terminal());
        assert!(DealStatus::Closed.is_terminal());
    }
}
