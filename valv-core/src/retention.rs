//! Retention planning.
//!
//! Pure selection of deletion candidates. Actually removing files is the
//! caller's job, which keeps this testable without a filesystem and lets
//! the engine sequence deletion strictly after remote publication.

use crate::artifact::BackupArtifact;
use crate::inventory::Inventory;

/// Artifacts that fall outside the retention window.
///
/// The `max_keep` newest artifacts survive; everything older is returned
/// oldest first, so deletion logs read in a deterministic order. Remote
/// copies are never candidates here, the remote tier is archival.
pub fn expired(inventory: &Inventory, max_keep: usize) -> Vec<BackupArtifact> {
    let mut candidates: Vec<BackupArtifact> = inventory
        .iter()
        .skip(max_keep)
        .cloned()
        .collect();
    candidates.reverse();
    candidates
}
