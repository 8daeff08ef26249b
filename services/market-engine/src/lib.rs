//! Marketplace Engine
//!
//! The transaction and auction lifecycle engine for a chat-hosted virtual
//! marketplace. Owns listing inventory, the two-party deal confirmation
//! protocol, auction bidding with automatic resolution, and the append-only
//! audit trail, all backed by a single persistent store.
//!
//! # Architecture
//!
//! ```text
//! transport request
//!        │
//!   ┌────▼─────────────────────────────┐
//!   │          MarketEngine            │
//!   │ identity │ listings │ deals      │
//!   │ auctions │ resolver │ audit      │
//!   └────┬─────────────────────────────┘
//!        │ mutate + snapshot      ┌───────────────┐
//!   ┌────▼────────┐   append     │ ResolutionLoop │ (only autonomous
//!   │ MarketStore │◄─────────────┤  (tokio timer) │  writer)
//!   └─────────────┘              └───────────────┘
//! ```
//!
//! The engine is single-writer: every operation takes `&mut self` and runs
//! to completion before the next one starts. The resolution loop shares the
//! engine through an async mutex, so each scan-and-resolve pass is atomic
//! from the caller's point of view. Operations return plain entities or
//! named errors; the engine never formats user-facing text.

pub mod audit;
pub mod auctions;
pub mod deals;
pub mod identity;
pub mod listings;
pub mod resolver;

use std::path::PathBuf;
use store::{MarketStore, SnapshotError};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";

/// The marketplace engine.
///
/// Services hold no state of their own; the injected [`MarketStore`] is the
/// single source of truth and every operation is a stateless procedure over
/// it.
pub struct MarketEngine {
    store: MarketStore,
}

impl MarketEngine {
    /// Build an engine over an already-opened store.
    pub fn new(store: MarketStore) -> Self {
        Self { store }
    }

    /// Open the store at `path` and build an engine over it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        Ok(Self::new(MarketStore::open(path)?))
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &MarketStore {
        &self.store
    }

    /// Flush the store to disk, propagating failure. For shutdown.
    pub fn flush(&mut self) -> Result<(), SnapshotError> {
        self.store.flush()
    }
}
