//! Listing Service: create, query, and close sell offers

use crate::MarketEngine;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use types::errors::{ListingError, MarketError, ValidationError};
use types::ids::ListingId;
use types::listing::{Listing, ListingStatus};

/// Read-only listing aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListingStats {
    pub active: usize,
    pub total: usize,
}

impl MarketEngine {
    /// Create an active listing for a seller.
    ///
    /// Preconditions: `price > 0`, `quantity > 0`. The seller is resolved
    /// (and created on first sight) from the external handle.
    pub fn create_listing(
        &mut self,
        seller_handle: &str,
        item_name: &str,
        price: Decimal,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError> {
        if price <= Decimal::ZERO {
            return Err(ValidationError::InvalidPrice(price).into());
        }
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(quantity).into());
        }

        let seller = self.resolve_user(seller_handle, now);
        let listing = self
            .store
            .create_listing(Listing::new(seller.id, item_name, price, quantity, now));

        info!(
            listing_id = %listing.id,
            seller_id = %seller.id,
            item_name,
            quantity,
            "listing created"
        );
        self.log_action(
            seller.id,
            "LISTING_CREATED",
            json!({
                "listing_id": listing.id.to_string(),
                "item_name": listing.item_name,
                "price": listing.price,
                "quantity": listing.quantity_available,
            }),
            now,
        );
        Ok(listing)
    }

    /// Set a listing's available quantity; zero closes the listing. No
    /// negative value can ever persist.
    pub fn update_listing_quantity(
        &mut self,
        id: &ListingId,
        new_quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError> {
        let listing = self
            .store
            .update_listing(id, |l| l.set_quantity(new_quantity, now))
            .ok_or(ListingError::NotFound { listing_id: *id })?;

        self.log_action(
            listing.seller_id,
            "LISTING_QUANTITY_UPDATED",
            json!({
                "listing_id": listing.id.to_string(),
                "quantity": listing.quantity_available,
                "status": listing.status.to_string(),
            }),
            now,
        );
        Ok(listing)
    }

    /// Look up a listing. Absence is a normal outcome; callers check
    /// explicitly.
    pub fn get_listing(&self, id: &ListingId) -> Option<Listing> {
        self.store.get_listing(id).cloned()
    }

    /// All listings, optionally filtered by status, in insertion order.
    pub fn list_listings(&self, status: Option<ListingStatus>) -> Vec<Listing> {
        self.store
            .list_listings(|l| status.map_or(true, |s| l.status == s))
    }

    /// Counts of active and total listings.
    pub fn get_listing_stats(&self) -> ListingStats {
        let all = self.store.list_listings(|_| true);
        ListingStats {
            active: all.iter().filter(|l| l.is_active()).count(),
            total: all.len(),
        }
    }
}
