//! Deal Service: the two-party confirmation state machine
//!
//! `Pending → {Completed, Cancelled}`; any terminal state may be archived
//! to `Closed`. Inventory is NOT reserved when a deal is created — two
//! buyers can hold competing pending deals against the same units, and the
//! loser is caught by a mandatory re-check when the second confirmation
//! lands. Currency moves outside the system; completion only gates the
//! inventory decrement on mutual acknowledgement.

use crate::MarketEngine;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};
use types::deal::{Deal, DealParty, DealStatus};
use types::errors::{DealError, ListingError, MarketError, ValidationError};
use types::ids::{DealId, ListingId};

impl MarketEngine {
    /// Create a pending deal for a buyer against an active listing.
    ///
    /// Preconditions: listing exists and is active; `quantity` is positive
    /// and within the listing's available quantity; the resolved buyer is
    /// not the seller. No inventory is decremented here.
    pub fn create_deal(
        &mut self,
        listing_id: &ListingId,
        buyer_handle: &str,
        quantity: u32,
        thread_ref: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Deal, MarketError> {
        let listing = self
            .store
            .get_listing(listing_id)
            .cloned()
            .ok_or(ListingError::NotFound {
                listing_id: *listing_id,
            })?;
        if !listing.is_active() {
            return Err(ListingError::NotActive {
                listing_id: *listing_id,
            }
            .into());
        }
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(quantity).into());
        }
        if quantity > listing.quantity_available {
            return Err(DealError::InsufficientQuantity {
                requested: quantity,
                available: listing.quantity_available,
            }
            .into());
        }

        let buyer = self.resolve_user(buyer_handle, now);
        if buyer.id == listing.seller_id {
            return Err(DealError::SelfTrade.into());
        }

        let deal = self.store.create_deal(Deal::new(
            listing.id,
            buyer.id,
            listing.seller_id,
            listing.item_name.clone(),
            listing.price,
            quantity,
            thread_ref,
            now,
        ));

        info!(
            deal_id = %deal.id,
            listing_id = %listing.id,
            buyer_id = %buyer.id,
            quantity,
            "deal created"
        );
        self.log_action(
            buyer.id,
            "DEAL_CREATED",
            json!({
                "deal_id": deal.id.to_string(),
                "listing_id": listing.id.to_string(),
                "item_name": deal.item_name,
                "quantity": deal.quantity,
            }),
            now,
        );
        Ok(deal)
    }

    /// Record one party's confirmation; complete the deal when both sides
    /// have confirmed.
    ///
    /// Completion re-validates the listing's available quantity, because
    /// arbitrarily many operations may have interleaved since the first
    /// confirmation. If the re-check fails the confirmation is kept, the
    /// deal stays pending, and [`DealError::QuantityNoLongerAvailable`] is
    /// returned as a retry-or-cancel signal. A party may then confirm again
    /// to re-attempt completion, typically after lowering the quantity with
    /// [`MarketEngine::update_deal_quantity`].
    pub fn confirm_deal(
        &mut self,
        deal_id: &DealId,
        acting_handle: &str,
        now: DateTime<Utc>,
    ) -> Result<Deal, MarketError> {
        let deal = self.get_pending_deal(deal_id)?;
        let actor = self.resolve_user(acting_handle, now);
        let party = deal.party_of(&actor.id).ok_or(DealError::NotAParty {
            deal_id: *deal_id,
            user_id: actor.id,
        })?;
        // A repeat confirmation is only an error while the other side is
        // still missing; with both flags set it re-attempts completion, so
        // a failed re-check stays retryable.
        if deal.has_confirmed(party) && !deal.both_confirmed() {
            return Err(DealError::AlreadyConfirmed {
                deal_id: *deal_id,
                user_id: actor.id,
            }
            .into());
        }

        let confirmed = if deal.has_confirmed(party) {
            deal
        } else {
            let confirmed = self
                .store
                .update_deal(deal_id, |d| d.confirm(party, now))
                .ok_or(DealError::NotFound { deal_id: *deal_id })?;
            self.log_action(
                actor.id,
                "DEAL_CONFIRMED",
                json!({
                    "deal_id": deal_id.to_string(),
                    "party": match party {
                        DealParty::Buyer => "buyer",
                        DealParty::Seller => "seller",
                    },
                }),
                now,
            );
            confirmed
        };

        if !confirmed.both_confirmed() {
            return Ok(confirmed);
        }

        // Both sides have acknowledged; re-check against concurrent
        // depletion before decrementing inventory.
        let listing =
            self.store
                .get_listing(&confirmed.listing_id)
                .cloned()
                .ok_or(ListingError::NotFound {
                    listing_id: confirmed.listing_id,
                })?;
        if listing.quantity_available < confirmed.quantity {
            warn!(
                deal_id = %deal_id,
                requested = confirmed.quantity,
                available = listing.quantity_available,
                "completion re-check failed; deal stays pending"
            );
            return Err(DealError::QuantityNoLongerAvailable {
                requested: confirmed.quantity,
                available: listing.quantity_available,
            }
            .into());
        }

        let listing = self
            .store
            .update_listing(&confirmed.listing_id, |l| {
                l.reduce_quantity(confirmed.quantity, now)
            })
            .ok_or(ListingError::NotFound {
                listing_id: confirmed.listing_id,
            })?;
        let completed = self
            .store
            .update_deal(deal_id, |d| d.complete(now))
            .ok_or(DealError::NotFound { deal_id: *deal_id })?;

        info!(
            deal_id = %deal_id,
            listing_id = %listing.id,
            remaining = listing.quantity_available,
            "deal completed"
        );
        self.log_action(
            actor.id,
            "DEAL_COMPLETED",
            json!({
                "deal_id": deal_id.to_string(),
                "listing_id": listing.id.to_string(),
                "quantity": completed.quantity,
                "listing_remaining": listing.quantity_available,
            }),
            now,
        );
        Ok(completed)
    }

    /// Cancel a pending deal. Either party may cancel; no inventory effect,
    /// since none was reserved.
    pub fn cancel_deal(
        &mut self,
        deal_id: &DealId,
        acting_handle: &str,
        now: DateTime<Utc>,
    ) -> Result<Deal, MarketError> {
        let deal = self.get_pending_deal(deal_id)?;
        let actor = self.resolve_user(acting_handle, now);
        deal.party_of(&actor.id).ok_or(DealError::NotAParty {
            deal_id: *deal_id,
            user_id: actor.id,
        })?;

        let cancelled = self
            .store
            .update_deal(deal_id, |d| d.cancel(now))
            .ok_or(DealError::NotFound { deal_id: *deal_id })?;
        self.log_action(
            actor.id,
            "DEAL_CANCELLED",
            json!({ "deal_id": deal_id.to_string() }),
            now,
        );
        Ok(cancelled)
    }

    /// Archive a terminal deal. Idempotent: closing a closed deal is a
    /// no-op. A pending deal cannot be archived.
    ///
    /// Any caller may archive; who is allowed to ask for it is a role check
    /// that belongs to the hosting platform.
    pub fn close_deal(
        &mut self,
        deal_id: &DealId,
        acting_handle: &str,
        now: DateTime<Utc>,
    ) -> Result<Deal, MarketError> {
        let deal = self
            .store
            .get_deal(deal_id)
            .cloned()
            .ok_or(DealError::NotFound { deal_id: *deal_id })?;
        if deal.status == DealStatus::Pending {
            return Err(DealError::StillPending { deal_id: *deal_id }.into());
        }
        let actor = self.resolve_user(acting_handle, now);
        if deal.status == DealStatus::Closed {
            return Ok(deal);
        }

        let closed = self
            .store
            .update_deal(deal_id, |d| d.close(now))
            .ok_or(DealError::NotFound { deal_id: *deal_id })?;
        self.log_action(
            actor.id,
            "DEAL_CLOSED",
            json!({ "deal_id": deal_id.to_string() }),
            now,
        );
        Ok(closed)
    }

    /// Change a pending deal's quantity. Buyer only, and the listing must
    /// still have enough available.
    pub fn update_deal_quantity(
        &mut self,
        deal_id: &DealId,
        new_quantity: u32,
        acting_handle: &str,
        now: DateTime<Utc>,
    ) -> Result<Deal, MarketError> {
        let deal = self.get_pending_deal(deal_id)?;
        let actor = self.resolve_user(acting_handle, now);
        match deal.party_of(&actor.id) {
            Some(DealParty::Buyer) => {}
            Some(DealParty::Seller) => {
                return Err(DealError::NotBuyer { deal_id: *deal_id }.into())
            }
            None => {
                return Err(DealError::NotAParty {
                    deal_id: *deal_id,
                    user_id: actor.id,
                }
                .into())
            }
        }
        if new_quantity == 0 {
            return Err(ValidationError::InvalidQuantity(new_quantity).into());
        }

        let listing =
            self.store
                .get_listing(&deal.listing_id)
                .cloned()
                .ok_or(ListingError::NotFound {
                    listing_id: deal.listing_id,
                })?;
        if new_quantity > listing.quantity_available {
            return Err(DealError::InsufficientQuantity {
                requested: new_quantity,
                available: listing.quantity_available,
            }
            .into());
        }

        let updated = self
            .store
            .update_deal(deal_id, |d| {
                d.quantity = new_quantity;
                d.updated_at = now;
            })
            .ok_or(DealError::NotFound { deal_id: *deal_id })?;
        self.log_action(
            actor.id,
            "DEAL_QUANTITY_UPDATED",
            json!({
                "deal_id": deal_id.to_string(),
                "quantity": new_quantity,
            }),
            now,
        );
        Ok(updated)
    }

    /// Look up a deal.
    pub fn get_deal(&self, id: &DealId) -> Option<Deal> {
        self.store.get_deal(id).cloned()
    }

    /// All deals in which the handle's user is a party, in insertion order.
    /// An unknown handle simply has no deals.
    pub fn list_deals_for_user(&self, handle: &str) -> Vec<Deal> {
        match self.store.find_user_by_handle(handle) {
            Some(user) => {
                let user_id = user.id;
                self.store
                    .list_deals(|d| d.buyer_id == user_id || d.seller_id == user_id)
            }
            None => Vec::new(),
        }
    }

    fn get_pending_deal(&self, deal_id: &DealId) -> Result<Deal, MarketError> {
        let deal = self
            .store
            .get_deal(deal_id)
            .cloned()
            .ok_or(DealError::NotFound { deal_id: *deal_id })?;
        if deal.status != DealStatus::Pending {
            return Err(DealError::NotPending {
                deal_id: *deal_id,
                status: deal.status.to_string(),
            }
            .into());
        }
        Ok(deal)
    }
}
