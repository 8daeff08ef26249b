//! Snapshot file format and atomic read/write
//!
//! One JSON artifact holds the whole state, wrapped with a format version
//! and a SHA-256 checksum. Writes are atomic: serialize → write tmp →
//! fsync → rename, so a crash mid-write leaves the previous snapshot
//! intact.

use crate::state::MarketState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
}

/// On-disk snapshot envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Format version for forward compatibility.
    pub version: u32,
    /// Wall-clock time the snapshot was written.
    pub saved_at: DateTime<Utc>,
    /// SHA-256 hash of the serialized state.
    pub checksum: String,
    /// Full marketplace state.
    pub state: MarketState,
}

impl SnapshotFile {
    /// Wrap a state with version and computed checksum.
    pub fn new(state: MarketState, saved_at: DateTime<Utc>) -> Self {
        let checksum = state.compute_hash();
        Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            checksum,
            state,
        }
    }

    /// Verify the embedded checksum against the state.
    pub fn verify_integrity(&self) -> bool {
        self.state.compute_hash() == self.checksum
    }
}

/// Write a snapshot atomically to `path`.
pub fn write(path: &Path, state: &MarketState, now: DateTime<Utc>) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let envelope = SnapshotFile::new(state.clone(), now);
    let data = serde_json::to_vec_pretty(&envelope)
        .map_err(|e| SnapshotError::Serialization(e.to_string()))?;

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Read and verify a snapshot from `path`.
///
/// Any failure (unreadable file, malformed JSON, bad checksum, future
/// version) is an error; the caller decides whether to degrade to an empty
/// state.
pub fn read(path: &Path) -> Result<MarketState, SnapshotError> {
    let data = fs::read(path)?;

    let envelope: SnapshotFile =
        serde_json::from_slice(&data).map_err(|e| SnapshotError::Serialization(e.to_string()))?;

    if envelope.version > SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(envelope.version));
    }

    if !envelope.verify_integrity() {
        return Err(SnapshotError::IntegrityFailure {
            expected: envelope.checksum.clone(),
            actual: envelope.state.compute_hash(),
        });
    }

    Ok(envelope.state)
}
