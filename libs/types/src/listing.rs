//! Listing lifecycle types

use crate::ids::{ListingId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Listing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingStatus {
    /// Open sell offer, selectable for new deals
    Active,
    /// Sold out or withdrawn; never selectable again
    Closed,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::Active => write!(f, "ACTIVE"),
            ListingStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// An active sell offer for a quantity of one item type at a fixed unit
/// price.
///
/// Invariant: `quantity_available` never goes negative; when it reaches 0
/// the listing transitions to `Closed`. Listings are soft-closed, never
/// physically deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub seller_id: UserId,
    pub item_name: String,
    pub price: Decimal,
    pub quantity_available: u32,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a new active listing.
    pub fn new(
        seller_id: UserId,
        item_name: impl Into<String>,
        price: Decimal,
        quantity: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ListingId::new(),
            seller_id,
            item_name: item_name.into(),
            price,
            quantity_available: quantity,
            status: ListingStatus::Active,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Whether the listing can accept new deals.
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    /// Set the available quantity, closing the listing when it hits zero.
    pub fn set_quantity(&mut self, quantity: u32, timestamp: DateTime<Utc>) {
        self.quantity_available = quantity;
        if quantity == 0 {
            self.status = ListingStatus::Closed;
        }
        self.updated_at = timestamp;
    }

    /// Reduce the available quantity by a completed deal's amount.
    ///
    /// # Panics
    /// Panics if the reduction exceeds the available quantity; callers must
    /// validate before mutating.
    pub fn reduce_quantity(&mut self, amount: u32, timestamp: DateTime<Utc>) {
        let remaining = self
            .quantity_available
            .checked_sub(amount)
            .expect("reduction exceeds available quantity");
        self.set_quantity(remaining, timestamp);
    }

    /// Close the listing regardless of remaining quantity.
    pub fn close(&mut self, timestamp: DateTime<Utc>) {
        self.status = ListingStatus::Closed;
        self.updated_at = timestamp;
    }
}
