//! Auction Resolution: expired-auction scan and the periodic loop
//!
//! A fixed-interval timer scans all active auctions whose end time has
//! passed and finalizes each one: top bid wins (amount descending, ties by
//! arrival), or the auction ends with no bids. The durable result record is
//! written before any chat notification happens, so administrative review
//! never depends on transport success.
//!
//! Resolution is idempotent by construction: the scan only ever selects
//! `Active` auctions, and finalizing moves an auction out of `Active`, so a
//! second scan is a no-op for it. The single-writer model (one engine
//! behind a mutex) guarantees no scan observes a half-finalized auction.

use crate::MarketEngine;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;
use types::auction::{Auction, AuctionStatus, Bid};
use types::errors::{AuctionError, MarketError};
use types::ids::{AuctionId, UserId};

/// Final result of one auction.
#[derive(Debug, Clone, Serialize)]
pub struct AuctionOutcome {
    pub auction_id: AuctionId,
    pub status: AuctionStatus,
    pub winner_id: Option<UserId>,
    pub winning_amount: Option<Decimal>,
    /// All bids, in winner-selection order.
    pub bids: Vec<Bid>,
}

impl MarketEngine {
    /// Finalize every active auction whose end time has passed.
    ///
    /// The only autonomous (non-request-driven) write path in the system.
    pub fn resolve_due_auctions(&mut self, now: DateTime<Utc>) -> Vec<AuctionOutcome> {
        let due = self
            .store
            .list_auctions(|a| a.status == AuctionStatus::Active && a.has_expired_at(now));
        due.into_iter()
            .map(|auction| self.finalize_auction(auction, now))
            .collect()
    }

    /// End an active auction before its end time, picking the current
    /// highest bid. Creator only.
    pub fn end_auction(
        &mut self,
        auction_id: &AuctionId,
        acting_handle: &str,
        now: DateTime<Utc>,
    ) -> Result<AuctionOutcome, MarketError> {
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
        let actor = self.resolve_user(acting_handle, now);
        if actor.id != auction.creator_id {
            return Err(AuctionError::NotCreator {
                auction_id: *auction_id,
            }
            .into());
        }
        Ok(self.finalize_auction(auction, now))
    }

    fn finalize_auction(&mut self, auction: Auction, now: DateTime<Utc>) -> AuctionOutcome {
        let bids = self.get_auction_bids(&auction.id);

        let (status, winner_id, winning_amount) = match bids.first() {
            Some(top) => (AuctionStatus::Ended, Some(top.bidder_id), Some(top.amount)),
            None => (AuctionStatus::EndedNoBids, None, None),
        };

        self.store.update_auction(&auction.id, |a| match winner_id {
            Some(winner) => a.finalize_with_winner(
                winner,
                winning_amount.unwrap_or(a.min_price),
                now,
            ),
            None => a.finalize_no_bids(now),
        });

        info!(
            auction_id = %auction.id,
            status = %status,
            bid_count = bids.len(),
            "auction finalized"
        );
        // Durable result record: retained even if posting the result to
        // chat later fails.
        self.log_action(
            auction.creator_id,
            "AUCTION_RESOLVED",
            json!({
                "auction_id": auction.id.to_string(),
                "item_name": auction.item_name,
                "status": status.to_string(),
                "winner_id": winner_id.map(|w| w.to_string()),
                "winning_amount": winning_amount,
                "bids": bids
                    .iter()
                    .map(|b| json!({
                        "bidder_id": b.bidder_id.to_string(),
                        "amount": b.amount,
                    }))
                    .collect::<Vec<_>>(),
            }),
            now,
        );

        AuctionOutcome {
            auction_id: auction.id,
            status,
            winner_id,
            winning_amount,
            bids,
        }
    }
}

/// The periodic resolution loop.
///
/// Polling at a fixed interval trades a small end-time slack (bounded by
/// the interval) for simple idempotence reasoning; there are no per-auction
/// timers. Start/stop-able as a unit.
pub struct ResolutionLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ResolutionLoop {
    /// Spawn the loop on the current tokio runtime.
    pub fn spawn(engine: Arc<Mutex<MarketEngine>>, poll_interval: Duration) -> Self {
        let (shutdown, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_ms = poll_interval.as_millis() as u64, "resolution loop started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let outcomes = engine.lock().await.resolve_due_auctions(Utc::now());
                        for outcome in &outcomes {
                            info!(
                                auction_id = %outcome.auction_id,
                                status = %outcome.status,
                                "expired auction resolved"
                            );
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("resolution loop stopped");
        });
        Self { shutdown, handle }
    }

    /// Signal shutdown and wait for the task to finish. Any resolution pass
    /// already running completes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
