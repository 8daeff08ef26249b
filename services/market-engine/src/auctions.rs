//! Auction Service: create auctions and record sealed one-shot bids
//!
//! Bidding is one-shot: a bidder places a single offer and cannot raise it.
//! The bid ordering exposed here — amount descending, ties broken by
//! arrival order — is the sole rule the resolver uses to pick a winner.

use crate::MarketEngine;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;
use types::auction::{Auction, AuctionStatus, Bid};
use types::errors::{AuctionError, MarketError, ValidationError};
use types::ids::AuctionId;

impl MarketEngine {
    /// Create an active auction.
    ///
    /// Preconditions: `end_time > start_time`, `min_price > 0`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_auction(
        &mut self,
        creator_handle: &str,
        item_name: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        min_price: Decimal,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Auction, MarketError> {
        if end_time <= start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: start_time.to_rfc3339(),
                end: end_time.to_rfc3339(),
            }
            .into());
        }
        if min_price <= Decimal::ZERO {
            return Err(ValidationError::InvalidPrice(min_price).into());
        }

        let creator = self.resolve_user(creator_handle, now);
        let auction = self.store.create_auction(Auction::new(
            creator.id,
            item_name,
            start_time,
            end_time,
            min_price,
            description,
            now,
        ));

        info!(
            auction_id = %auction.id,
            creator_id = %creator.id,
            item_name,
            end_time = %end_time,
            "auction created"
        );
        self.log_action(
            creator.id,
            "AUCTION_CREATED",
            json!({
                "auction_id": auction.id.to_string(),
                "item_name": auction.item_name,
                "min_price": auction.min_price,
                "end_time": auction.end_time.to_rfc3339(),
            }),
            now,
        );
        Ok(auction)
    }

    /// Place a bid on an active auction.
    ///
    /// Checked in order: auction exists; status is active; the bidding
    /// window has not elapsed; the amount meets the floor; the bidder has
    /// no existing bid. None of these are retried automatically.
    pub fn make_bid(
        &mut self,
        auction_id: &AuctionId,
        bidder_handle: &str,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Bid, MarketError> {
        let auction = self
            .store
            .get_auction(auction_id)
            .cloned()
            .ok_or(AuctionError::NotFound {
                auction_id: *auction_id,
            })?;
        if auction.status != AuctionStatus::Active {
            return Err(AuctionError::NotActive {
                auction_id: *auction_id,
            }
            .into());
        }
        if auction.has_expired_at(now) {
            return Err(AuctionError::Ended {
                auction_id: *auction_id,
            }
            .into());
        }
        if amount < auction.min_price {
            return Err(AuctionError::BidTooLow {
                amount,
                min_price: auction.min_price,
            }
            .into());
        }

        let bidder = self.resolve_user(bidder_handle, now);
        if self.store.has_bid(auction_id, &bidder.id) {
            return Err(AuctionError::DuplicateBid {
                auction_id: *auction_id,
                bidder_id: bidder.id,
            }
            .into());
        }

        let bid = self
            .store
            .create_bid(Bid::new(*auction_id, bidder.id, amount, now));

        info!(
            bid_id = %bid.id,
            auction_id = %auction_id,
            bidder_id = %bidder.id,
            amount = %amount,
            "bid placed"
        );
        self.log_action(
            bidder.id,
            "BID_PLACED",
            json!({
                "bid_id": bid.id.to_string(),
                "auction_id": auction_id.to_string(),
                "amount": amount,
            }),
            now,
        );
        Ok(bid)
    }

    /// Look up an auction.
    pub fn get_auction(&self, id: &AuctionId) -> Option<Auction> {
        self.store.get_auction(id).cloned()
    }

    /// All auctions still accepting bids, in insertion order.
    pub fn list_active_auctions(&self) -> Vec<Auction> {
        self.store
            .list_auctions(|a| a.status == AuctionStatus::Active)
    }

    /// Bids for an auction, sorted by amount descending with ties broken by
    /// arrival order. An unknown auction simply has no bids.
    pub fn get_auction_bids(&self, auction_id: &AuctionId) -> Vec<Bid> {
        let mut bids = self.store.list_bids_for_auction(auction_id);
        // Stable sort over arrival order: equal amounts keep earliest first.
        bids.sort_by(|a, b| b.amount.cmp(&a.amount));
        bids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn engine(tmp: &TempDir) -> MarketEngine {
        MarketEngine::open(tmp.path().join("market.json")).unwrap()
    }

    fn auction_of(engine: &mut MarketEngine, now: DateTime<Utc>) -> AuctionId {
        engine
            .create_auction(
                "seller#1",
                "enchanted sword",
                now,
                now + Duration::hours(1),
                Decimal::from(50),
                None,
                now,
            )
            .unwrap()
            .id
    }

    #[test]
    fn test_create_auction_validations() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine(&tmp);
        let now = Utc::now();

        let err = engine
            .create_auction("seller#1", "sword", now, now, Decimal::from(50), None, now)
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::Validation(ValidationError::InvalidTimeRange { .. })
        ));

        let err = engine
            .create_auction(
                "seller#1",
                "sword",
                now,
                now + Duration::hours(1),
                Decimal::ZERO,
                None,
                now,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::Validation(ValidationError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_bid_floor_enforced() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine(&tmp);
        let now = Utc::now();
        let auction_id = auction_of(&mut engine, now);

        let err = engine
            .make_bid(&auction_id, "bidder#1", Decimal::from(49), now)
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::Auction(AuctionError::BidTooLow { .. })
        ));

        // Exactly the floor is allowed.
        let bid = engine
            .make_bid(&auction_id, "bidder#1", Decimal::from(50), now)
            .unwrap();
        assert_eq!(bid.amount, Decimal::from(50));
    }

    #[test]
    fn test_one_shot_bidding() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine(&tmp);
        let now = Utc::now();
        let auction_id = auction_of(&mut engine, now);

        engine
            .make_bid(&auction_id, "bidder#1", Decimal::from(60), now)
            .unwrap();
        // Raising one's own bid is rejected outright.
        let err = engine
            .make_bid(&auction_id, "bidder#1", Decimal::from(80), now)
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::Auction(AuctionError::DuplicateBid { .. })
        ));
    }

    #[test]
    fn test_bid_after_end_time_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine(&tmp);
        let now = Utc::now();
        let auction_id = auction_of(&mut engine, now);

        let late = now + Duration::hours(2);
        let err = engine
            .make_bid(&auction_id, "bidder#1", Decimal::from(60), late)
            .unwrap_err();
        assert!(matches!(err, MarketError::Auction(AuctionError::Ended { .. })));
    }

    #[test]
    fn test_bid_on_unknown_auction() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine(&tmp);
        let err = engine
            .make_bid(&AuctionId::new(), "bidder#1", Decimal::from(60), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::Auction(AuctionError::NotFound { .. })
        ));
    }

    #[test]
    fn test_bids_sorted_by_amount_then_arrival() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine(&tmp);
        let now = Utc::now();
        let auction_id = auction_of(&mut engine, now);

        let u1 = engine
            .make_bid(&auction_id, "u1", Decimal::from(50), now)
            .unwrap();
        let u2 = engine
            .make_bid(&auction_id, "u2", Decimal::from(80), now)
            .unwrap();
        let u3 = engine
            .make_bid(&auction_id, "u3", Decimal::from(80), now)
            .unwrap();

        let bids = engine.get_auction_bids(&auction_id);
        let ids: Vec<_> = bids.iter().map(|b| b.id).collect();
        // u2 and u3 tie at 80; u2 arrived first and stays ahead.
        assert_eq!(ids, vec![u2.id, u3.id, u1.id]);
    }
}
