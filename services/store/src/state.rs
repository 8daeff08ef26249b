//! In-memory state: the canonical copies of every entity
//!
//! Collections are `BTreeMap` keyed by the entity's id string. Ids are
//! UUID v7, whose string form sorts chronologically, so map iteration order
//! equals insertion order. On the wire each collection is an ordered list of
//! `[id, record]` pairs, which round-trips associative-container semantics
//! through JSON.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use types::audit::AuditEntry;
use types::auction::{Auction, Bid};
use types::deal::Deal;
use types::listing::Listing;
use types::user::{Stock, User};

/// Full marketplace state.
///
/// Every collection is `#[serde(default)]` so a snapshot written before a
/// collection existed still loads, with the missing collection empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// Users keyed by internal id.
    #[serde(default, with = "pairs")]
    pub users: BTreeMap<String, User>,
    /// Un-listed inventory keyed by `owner_id:item_name`.
    #[serde(default, with = "pairs")]
    pub stock: BTreeMap<String, Stock>,
    /// Listings keyed by id.
    #[serde(default, with = "pairs")]
    pub listings: BTreeMap<String, Listing>,
    /// Deals keyed by id.
    #[serde(default, with = "pairs")]
    pub deals: BTreeMap<String, Deal>,
    /// Auctions keyed by id.
    #[serde(default, with = "pairs")]
    pub auctions: BTreeMap<String, Auction>,
    /// Bids keyed by id.
    #[serde(default, with = "pairs")]
    pub bids: BTreeMap<String, Bid>,
    /// Audit log entries keyed by id.
    #[serde(default, with = "pairs")]
    pub audit_log: BTreeMap<String, AuditEntry>,
    /// Monotonic counter stamped onto bids for arrival-order tie-breaking.
    #[serde(default)]
    pub next_sequence: u64,
}

impl MarketState {
    /// Create a new empty state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute a deterministic SHA-256 hash of the serialized state.
    pub fn compute_hash(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("MarketState serialization should never fail");
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }
}

/// Serialize a `BTreeMap` as an ordered list of `[key, value]` pairs.
mod pairs {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, T>(map: &BTreeMap<String, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut seq = serializer.serialize_seq(Some(map.len()))?;
        for pair in map {
            seq.serialize_element(&pair)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let entries: Vec<(String, T)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
