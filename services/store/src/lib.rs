//! Persistent Store for the marketplace engine
//!
//! Owns all entities as insertion-ordered associative containers keyed by
//! generated identifiers, with load-on-start and save-on-mutation semantics
//! against a single snapshot file.
//!
//! - [`state`]: the in-memory collections and their pair-list wire format
//! - [`snapshot`]: the on-disk envelope and atomic read/write
//! - [`store`]: the [`store::MarketStore`] entity contract

pub mod snapshot;
pub mod state;
pub mod store;

pub use snapshot::{SnapshotError, SNAPSHOT_VERSION};
pub use state::MarketState;
pub use store::MarketStore;
