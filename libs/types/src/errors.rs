//! Error taxonomy for the marketplace engine
//!
//! Every distinguishable failure gets its own named variant so the
//! transport layer can map each reason to a distinct user-facing message.
//! The core never formats user text itself.

use crate::ids::{AuctionId, DealId, ListingId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level marketplace error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("listing error: {0}")]
    Listing(#[from] ListingError),

    #[error("deal error: {0}")]
    Deal(#[from] DealError),

    #[error("auction error: {0}")]
    Auction(#[from] AuctionError),
}

/// Input validation errors, rejected before any mutation.
///
/// Fully recoverable: the caller corrects the input and retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("price must be positive, got {0}")]
    InvalidPrice(Decimal),

    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(u32),

    #[error("end time {end} must be after start time {start}")]
    InvalidTimeRange { start: String, end: String },
}

/// Listing-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListingError {
    #[error("listing not found: {listing_id}")]
    NotFound { listing_id: ListingId },

    #[error("listing is not active: {listing_id}")]
    NotActive { listing_id: ListingId },
}

/// Deal-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DealError {
    #[error("deal not found: {deal_id}")]
    NotFound { deal_id: DealId },

    #[error("deal is not pending: {deal_id} is {status}")]
    NotPending { deal_id: DealId, status: String },

    #[error("deal is still pending and cannot be archived: {deal_id}")]
    StillPending { deal_id: DealId },

    #[error("user {user_id} is not a party to deal {deal_id}")]
    NotAParty { deal_id: DealId, user_id: UserId },

    #[error("user {user_id} already confirmed deal {deal_id}")]
    AlreadyConfirmed { deal_id: DealId, user_id: UserId },

    #[error("only the buyer may change the quantity of deal {deal_id}")]
    NotBuyer { deal_id: DealId },

    #[error("buyer and seller must differ")]
    SelfTrade,

    #[error("insufficient quantity: requested {requested}, available {available}")]
    InsufficientQuantity { requested: u32, available: u32 },

    /// The completion-time re-check failed: another deal consumed the units
    /// between the two confirmations. The deal stays pending; the caller
    /// retries or cancels. Distinct from [`DealError::InsufficientQuantity`],
    /// which rejects invalid input outright.
    #[error(
        "quantity no longer available at completion: requested {requested}, available {available}"
    )]
    QuantityNoLongerAvailable { requested: u32, available: u32 },
}

/// Auction-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuctionError {
    #[error("auction not found: {auction_id}")]
    NotFound { auction_id: AuctionId },

    #[error("auction is not active: {auction_id}")]
    NotActive { auction_id: AuctionId },

    #[error("auction has ended: {auction_id}")]
    Ended { auction_id: AuctionId },

    #[error("bid {amount} is below the minimum price {min_price}")]
    BidTooLow { amount: Decimal, min_price: Decimal },

    #[error("user {bidder_id} already has a bid on auction {auction_id}")]
    DuplicateBid {
        auction_id: AuctionId,
        bidder_id: UserId,
    },

    #[error("only the creator may end auction {auction_id} early")]
    NotCreator { auction_id: AuctionId },
}
