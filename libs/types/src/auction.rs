//! Auction and bid types

use crate::ids::{AuctionId, BidId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Auction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    /// Accepting bids until `end_time`
    Active,
    /// Resolved with a winner (terminal)
    Ended,
    /// Resolved without any bids (terminal)
    EndedNoBids,
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuctionStatus::Active => write!(f, "ACTIVE"),
            AuctionStatus::Ended => write!(f, "ENDED"),
            AuctionStatus::EndedNoBids => write!(f, "ENDED_NO_BIDS"),
        }
    }
}

/// A time-boxed competitive bidding process for an item.
///
/// Invariants: `end_time > start_time`; once the status leaves `Active` the
/// auction accepts no further bids and is never re-resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub creator_id: UserId,
    pub item_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub min_price: Decimal,
    pub description: Option<String>,
    pub status: AuctionStatus,
    pub winner_id: Option<UserId>,
    pub winning_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    /// Create a new active auction.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        creator_id: UserId,
        item_name: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        min_price: Decimal,
        description: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuctionId::new(),
            creator_id,
            item_name: item_name.into(),
            start_time,
            end_time,
            min_price,
            description,
            status: AuctionStatus::Active,
            winner_id: None,
            winning_amount: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Whether the auction is still accepting bids at `now`.
    pub fn accepts_bids_at(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Active && now < self.end_time
    }

    /// Whether the auction's bidding window has elapsed at `now`.
    pub fn has_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now
    }

    /// Finalize with a winning bid.
    pub fn finalize_with_winner(
        &mut self,
        winner_id: UserId,
        winning_amount: Decimal,
        timestamp: DateTime<Utc>,
    ) {
        self.status = AuctionStatus::Ended;
        self.winner_id = Some(winner_id);
        self.winning_amount = Some(winning_amount);
        self.updated_at = timestamp;
    }

    /// Finalize an auction that received no bids.
    pub fn finalize_no_bids(&mut self, timestamp: DateTime<Utc>) {
        self.status = AuctionStatus::EndedNoBids;
        self.updated_at = timestamp;
    }
}

/// A single sealed offer by one participant on one auction.
///
/// Immutable once created; at most one bid per `(auction_id, bidder_id)`
/// pair. The `sequence` is a store-assigned monotonic counter that makes
/// arrival-order tie-breaking deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub bidder_id: UserId,
    pub amount: Decimal,
    #[serde(default)]
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    /// Create a new bid. The sequence is assigned by the store on insert.
    pub fn new(
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            bidder_id,
            amount,
            sequence: 0,
            created_at: timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_auction(now: DateTime<Utc>) -> Auction {
        Auction::new(
            UserId::new(),
            "enchanted sword",
            now,
            now + Duration::hours(1),
            Decimal::from(50),
            Some("barely used".to_string()),
            now,
        )
    }

    #[test]
    fn test_new_auction_accepts_bids() {
        let now = Utc::now();
        let auction = sample_auction(now);
        assert_eq!(auction.status, AuctionStatus::Active);
        assert!(auction.accepts_bids_at(now));
        assert!(!auction.has_expired_at(now));
    }

    #[test]
    fn test_auction_rejects_bids_after_end_time() {
        let now = Utc::now();
        let auction = sample_auction(now);
        let after_end = now + Duration::hours(2);
        assert!(!auction.accepts_bids_at(after_end));
        assert!(auction.has_expired_at(after_end));
    }

    #[test]
    fn test_end_time_boundary_is_exclusive() {
        let now = Utc::now();
        let auction = sample_auction(now);
        // At exactly end_time the window has elapsed.
        assert!(!auction.accepts_bids_at(auction.end_time));
        assert!(auction.has_expired_at(auction.end_time));
    }

    #[test]
    fn test_finalize_with_winner() {
        let now = Utc::now();
        let mut auction = sample_auction(now);
        let winner = UserId::new();
        auction.finalize_with_winner(winner, Decimal::from(80), now);
        assert_eq!(auction.status, AuctionStatus::Ended);
        assert_eq!(auction.winner_id, Some(winner));
        assert_eq!(auction.winning_amount, Some(Decimal::from(80)));
        assert!(!auction.accepts_bids_at(now));
    }

    #[test]
    fn test_finalize_no_bids() {
        let now = Utc::now();
        let mut auction = sample_auction(now);
        auction.finalize_no_bids(now);
        assert_eq!(auction.status, AuctionStatus::EndedNoBids);
        assert_eq!(auction.winner_id, None);
        assert_eq!(auction.winning_amount, None);
    }
}
