//! Backup artifact handles and identifier minting.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::category::BackupCategory;

/// Which storage tier an artifact lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    Local,
    Remote,
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Local => f.write_str("local"),
            StorageLocation::Remote => f.write_str("remote"),
        }
    }
}

/// One concrete backup output for a category at a point in time.
///
/// Artifacts are immutable once created. They are deleted by retention or
/// superseded by a newer artifact with a different identifier, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupArtifact {
    pub category: BackupCategory,
    /// Filename (local) or trailing key segment (remote). Unique within a
    /// category and location.
    pub identifier: String,
    pub location: StorageLocation,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl BackupArtifact {
    /// Age relative to a clock reading captured once per run, so all age
    /// computations within one run agree.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }
}

/// Process-wide sequence folded into identifiers so that two artifacts
/// minted in the same millisecond still satisfy uniqueness.
static MINT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Mint a fresh artifact identifier for a category.
///
/// Shape: `{category}_{YYYYmmdd-HHMMSS-mmm}-{seq:04}.{ext}`. The embedded
/// timestamp keeps listings human-sortable; the sequence guarantees
/// uniqueness under rapid successive runs.
pub fn mint_identifier(category: BackupCategory, now: DateTime<Utc>) -> String {
    let seq = MINT_SEQUENCE.fetch_add(1, Ordering::Relaxed) % 10_000;
    format!(
        "{}_{}-{:04}.{}",
        category,
        now.format("%Y%m%d-%H%M%S-%3f"),
        seq,
        category.extension()
    )
}
