//! Types library for the marketplace engine
//!
//! This library provides all core type definitions used across the
//! marketplace system, ensuring type safety and backward compatibility.
//!
//! # Modules
//! - `ids`: Unique identifiers (UserId, ListingId, DealId, AuctionId, BidId, AuditEntryId)
//! - `user`: User and stock types
//! - `listing`: Listing lifecycle types
//! - `deal`: Deal confirmation state machine types
//! - `auction`: Auction and bid types
//! - `audit`: Audit trail types
//! - `errors`: Error taxonomy

// Public modules
pub mod audit;
pub mod auction;
pub mod deal;
pub mod errors;
pub mod ids;
pub mod listing;
pub mod user;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::audit::*;
    pub use crate::auction::*;
    pub use crate::deal::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::listing::*;
    pub use crate::user::*;
}
