//! The persistent store: load-on-start, save-on-mutation
//!
//! Owns the canonical copy of every entity. Every mutating call is followed
//! by a full snapshot write; a failed write is logged and the in-memory
//! state stays authoritative until the next successful write (weak
//! durability, accepted and surfaced via [`MarketStore::is_dirty`]).
//!
//! Startup is self-healing: an unreadable or malformed snapshot resets the
//! store to an empty state, which is persisted immediately. Data loss in
//! that case is an explicit tradeoff, and it is logged.

use crate::snapshot::{self, SnapshotError};
use crate::state::MarketState;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use types::audit::AuditEntry;
use types::auction::{Auction, Bid};
use types::deal::Deal;
use types::ids::{AuctionId, AuditEntryId, BidId, DealId, ListingId, UserId};
use types::listing::Listing;
use types::user::{Stock, User};

/// Single-writer persistent store backed by one snapshot file.
pub struct MarketStore {
    path: PathBuf,
    state: MarketState,
    /// True when the last snapshot write failed and memory is ahead of disk.
    dirty: bool,
}

impl MarketStore {
    /// Open the store, loading the snapshot at `path` if one exists.
    ///
    /// A corrupt or unreadable snapshot degrades to an empty state rather
    /// than failing startup; the empty state is persisted at once. Only a
    /// failure to write that initial snapshot is returned as an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let path = path.into();

        let state = if path.exists() {
            match snapshot::read(&path) {
                Ok(state) => {
                    info!(path = %path.display(), "snapshot loaded");
                    state
                }
                Err(err) => {
                    error!(
                        path = %path.display(),
                        error = %err,
                        "snapshot unreadable; resetting to empty state (data loss)"
                    );
                    MarketState::empty()
                }
            }
        } else {
            info!(path = %path.display(), "no snapshot found; starting empty");
            MarketState::empty()
        };

        let mut store = Self {
            path,
            state,
            dirty: false,
        };
        // Establish a valid snapshot on disk before accepting writes.
        snapshot::write(&store.path, &store.state, Utc::now())?;
        store.dirty = false;
        Ok(store)
    }

    /// Path of the backing snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the in-memory state is ahead of the last durable snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the current state to disk, propagating failure.
    ///
    /// Called at shutdown for a deterministic flush; routine persistence
    /// happens automatically after every mutation.
    pub fn flush(&mut self) -> Result<(), SnapshotError> {
        snapshot::write(&self.path, &self.state, Utc::now())?;
        self.dirty = false;
        Ok(())
    }

    /// Persist after a mutation. Failure is logged, never propagated: the
    /// in-memory state remains authoritative for the rest of the process.
    fn persist(&mut self) {
        match snapshot::write(&self.path, &self.state, Utc::now()) {
            Ok(()) => self.dirty = false,
            Err(err) => {
                self.dirty = true;
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "snapshot write failed; durability lost until next successful write"
                );
            }
        }
    }

    // ── Users ───────────────────────────────────────────────────────

    /// Insert a new user record.
    pub fn create_user(&mut self, handle: &str, now: DateTime<Utc>) -> User {
        let user = User::new(handle, now);
        self.state.users.insert(user.id.to_string(), user.clone());
        self.persist();
        user
    }

    /// Look up a user by internal id.
    pub fn get_user(&self, id: &UserId) -> Option<&User> {
        self.state.users.get(&id.to_string())
    }

    /// Look up a user by external chat handle.
    pub fn find_user_by_handle(&self, handle: &str) -> Option<&User> {
        self.state
            .users
            .values()
            .find(|u| u.external_handle == handle)
    }

    /// All users matching a predicate, in insertion order.
    pub fn list_users(&self, predicate: impl Fn(&User) -> bool) -> Vec<User> {
        self.state
            .users
            .values()
            .filter(|u| predicate(u))
            .cloned()
            .collect()
    }

    // ── Stock ───────────────────────────────────────────────────────

    /// Insert a stock record for `(owner, item)`.
    pub fn create_stock(
        &mut self,
        owner_id: UserId,
        item_name: &str,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Stock {
        let stock = Stock::new(owner_id, item_name, quantity, now);
        self.state.stock.insert(stock.key(), stock.clone());
        self.persist();
        stock
    }

    /// Look up stock by `(owner, item)`.
    pub fn get_stock(&self, owner_id: &UserId, item_name: &str) -> Option<&Stock> {
        self.state.stock.get(&Stock::key_for(owner_id, item_name))
    }

    /// Patch a stock record; returns the updated record, or `None` if
    /// absent.
    pub fn update_stock(
        &mut self,
        owner_id: &UserId,
        item_name: &str,
        patch: impl FnOnce(&mut Stock),
    ) -> Option<Stock> {
        let key = Stock::key_for(owner_id, item_name);
        let updated = self.state.stock.get_mut(&key).map(|stock| {
            patch(stock);
            stock.clone()
        })?;
        self.persist();
        Some(updated)
    }

    // ── Listings ────────────────────────────────────────────────────

    /// Insert a new listing.
    pub fn create_listing(&mut self, listing: Listing) -> Listing {
        self.state
            .listings
            .insert(listing.id.to_string(), listing.clone());
        self.persist();
        listing
    }

    /// Look up a listing; absence is a normal outcome, not an error.
    pub fn get_listing(&self, id: &ListingId) -> Option<&Listing> {
        self.state.listings.get(&id.to_string())
    }

    /// All listings matching a predicate, in insertion order.
    pub fn list_listings(&self, predicate: impl Fn(&Listing) -> bool) -> Vec<Listing> {
        self.state
            .listings
            .values()
            .filter(|l| predicate(l))
            .cloned()
            .collect()
    }

    /// Patch a listing; returns the updated record, or `None` if absent.
    pub fn update_listing(
        &mut self,
        id: &ListingId,
        patch: impl FnOnce(&mut Listing),
    ) -> Option<Listing> {
        let updated = self.state.listings.get_mut(&id.to_string()).map(|l| {
            patch(l);
            l.clone()
        })?;
        self.persist();
        Some(updated)
    }

    // ── Deals ───────────────────────────────────────────────────────

    /// Insert a new deal.
    pub fn create_deal(&mut self, deal: Deal) -> Deal {
        self.state.deals.insert(deal.id.to_string(), deal.clone());
        self.persist();
        deal
    }

    /// Look up a deal.
    pub fn get_deal(&self, id: &DealId) -> Option<&Deal> {
        self.state.deals.get(&id.to_string())
    }

    /// All deals matching a predicate, in insertion order.
    pub fn list_deals(&self, predicate: impl Fn(&Deal) -> bool) -> Vec<Deal> {
        self.state
            .deals
            .values()
            .filter(|d| predicate(d))
            .cloned()
            .collect()
    }

    /// Patch a deal; returns the updated record, or `None` if absent.
    pub fn update_deal(&mut self, id: &DealId, patch: impl FnOnce(&mut Deal)) -> Option<Deal> {
        let updated = self.state.deals.get_mut(&id.to_string()).map(|d| {
            patch(d);
            d.clone()
        })?;
        self.persist();
        Some(updated)
    }

    // ── Auctions ────────────────────────────────────────────────────

    /// Insert a new auction.
    pub fn create_auction(&mut self, auction: Auction) -> Auction {
        self.state
            .auctions
            .insert(auction.id.to_string(), auction.clone());
        self.persist();
        auction
    }

    /// Look up an auction.
    pub fn get_auction(&self, id: &AuctionId) -> Option<&Auction> {
        self.state.auctions.get(&id.to_string())
    }

    /// All auctions matching a predicate, in insertion order.
    pub fn list_auctions(&self, predicate: impl Fn(&Auction) -> bool) -> Vec<Auction> {
        self.state
            .auctions
            .values()
            .filter(|a| predicate(a))
            .cloned()
            .collect()
    }

    /// Patch an auction; returns the updated record, or `None` if absent.
    pub fn update_auction(
        &mut self,
        id: &AuctionId,
        patch: impl FnOnce(&mut Auction),
    ) -> Option<Auction> {
        let updated = self.state.auctions.get_mut(&id.to_string()).map(|a| {
            patch(a);
            a.clone()
        })?;
        self.persist();
        Some(updated)
    }

    // ── Bids ────────────────────────────────────────────────────────

    /// Insert a new bid, stamping the arrival sequence. Bids are immutable
    /// once created; there is no update.
    pub fn create_bid(&mut self, mut bid: Bid) -> Bid {
        bid.sequence = self.state.next_sequence;
        self.state.next_sequence += 1;
        self.state.bids.insert(bid.id.to_string(), bid.clone());
        self.persist();
        bid
    }

    /// Look up a bid.
    pub fn get_bid(&self, id: &BidId) -> Option<&Bid> {
        self.state.bids.get(&id.to_string())
    }

    /// All bids for an auction, in arrival order.
    pub fn list_bids_for_auction(&self, auction_id: &AuctionId) -> Vec<Bid> {
        let mut bids: Vec<Bid> = self
            .state
            .bids
            .values()
            .filter(|b| b.auction_id == *auction_id)
            .cloned()
            .collect();
        bids.sort_by_key(|b| b.sequence);
        bids
    }

    /// Whether a bidder already has a bid on an auction.
    pub fn has_bid(&self, auction_id: &AuctionId, bidder_id: &UserId) -> bool {
        self.state
            .bids
            .values()
            .any(|b| b.auction_id == *auction_id && b.bidder_id == *bidder_id)
    }

    // ── Audit log ───────────────────────────────────────────────────

    /// Append an audit entry. Append-only: no update, no targeted delete.
    pub fn append_audit(&mut self, entry: AuditEntry) -> AuditEntry {
        self.state
            .audit_log
            .insert(entry.id.to_string(), entry.clone());
        self.persist();
        entry
    }

    /// Look up an audit entry.
    pub fn get_audit(&self, id: &AuditEntryId) -> Option<&AuditEntry> {
        self.state.audit_log.get(&id.to_string())
    }

    /// All audit entries matching a predicate, in insertion order.
    pub fn list_audit(&self, predicate: impl Fn(&AuditEntry) -> bool) -> Vec<AuditEntry> {
        self.state
            .audit_log
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Remove audit entries created before `cutoff`; returns how many were
    /// removed. Housekeeping only.
    pub fn purge_audit_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.state.audit_log.len();
        self.state.audit_log.retain(|_, e| e.created_at >= cutoff);
        let removed = before - self.state.audit_log.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn open_store(tmp: &TempDir) -> MarketStore {
        MarketStore::open(tmp.path().join("market.json")).unwrap()
    }

    #[test]
    fn test_open_empty_persists_initial_snapshot() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        assert!(store.path().exists());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_state_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let user_id;
        {
            let mut store = open_store(&tmp);
            let user = store.create_user("trader#1", Utc::now());
            user_id = user.id;
        }
        let store = open_store(&tmp);
        let user = store.get_user(&user_id).unwrap();
        assert_eq!(user.external_handle, "trader#1");
    }

    #[test]
    fn test_failed_write_marks_dirty_and_flush_recovers() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("market.json");
        let mut store = MarketStore::open(&path).unwrap();

        // A directory squatting on the tmp path makes the atomic write fail.
        let tmp_path = path.with_extension("tmp");
        std::fs::create_dir(&tmp_path).unwrap();

        let user = store.create_user("trader#1", Utc::now());
        assert!(store.is_dirty());
        // The mutation failed to persist but memory stays authoritative.
        assert_eq!(store.get_user(&user.id).unwrap().external_handle, "trader#1");

        // Audit appends return normally while the disk is unwritable.
        store.append_audit(AuditEntry::new(
            user.id,
            "LISTING_CREATED",
            serde_json::json!({}),
            Utc::now(),
        ));
        assert!(store.is_dirty());

        std::fs::remove_dir(&tmp_path).unwrap();
        store.flush().unwrap();
        assert!(!store.is_dirty());

        let reopened = MarketStore::open(&path).unwrap();
        assert!(reopened.find_user_by_handle("trader#1").is_some());
        assert_eq!(reopened.list_audit(|_| true).len(), 1);
    }

    #[test]
    fn test_corrupt_snapshot_self_heals() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("market.json");
        {
            let mut store = MarketStore::open(&path).unwrap();
            store.create_user("trader#1", Utc::now());
        }
        std::fs::write(&path, b"garbage").unwrap();

        // Reset to empty and re-persisted a valid snapshot.
        let store = MarketStore::open(&path).unwrap();
        assert!(store.find_user_by_handle("trader#1").is_none());
        drop(store);
        assert!(snapshot::read(&path).is_ok());
    }

    #[test]
    fn test_bid_sequence_is_monotonic_and_persisted() {
        let tmp = TempDir::new().unwrap();
        let auction_id = types::ids::AuctionId::new();
        {
            let mut store = open_store(&tmp);
            for i in 0..3 {
                let bid = Bid::new(
                    auction_id,
                    UserId::new(),
                    Decimal::from(50 + i),
                    Utc::now(),
                );
                store.create_bid(bid);
            }
        }
        let mut store = open_store(&tmp);
        let bids = store.list_bids_for_auction(&auction_id);
        assert_eq!(
            bids.iter().map(|b| b.sequence).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        // The counter continues after reopen, it never restarts.
        let next = store.create_bid(Bid::new(
            auction_id,
            UserId::new(),
            Decimal::from(60),
            Utc::now(),
        ));
        assert_eq!(next.sequence, 3);
    }

    #[test]
    fn test_update_absent_listing_returns_none() {
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp);
        let missing = ListingId::new();
        assert!(store.update_listing(&missing, |l| l.close(Utc::now())).is_none());
    }

    #[test]
    fn test_purge_audit_before_cutoff() {
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp);
        let actor = UserId::new();
        let old = Utc::now() - chrono::Duration::days(30);
        let recent = Utc::now();

        store.append_audit(AuditEntry::new(actor, "OLD", serde_json::json!({}), old));
        store.append_audit(AuditEntry::new(actor, "NEW", serde_json::json!({}), recent));

        let removed = store.purge_audit_before(Utc::now() - chrono::Duration::days(1));
        assert_eq!(removed, 1);
        let remaining = store.list_audit(|_| true);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].action, "NEW");
    }

    #[test]
    fn test_stock_update_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp);
        let owner = UserId::new();
        store.create_stock(owner, "iron ingot", 64, Utc::now());

        let updated = store
            .update_stock(&owner, "iron ingot", |s| s.quantity_total = 32)
            .unwrap();
        assert_eq!(updated.quantity_total, 32);
        assert_eq!(store.get_stock(&owner, "iron ingot").unwrap().quantity_total, 32);
    }
}
