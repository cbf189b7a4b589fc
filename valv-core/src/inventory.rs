//! Inventories of stored artifacts and the merged global view.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::BackupArtifact;
use crate::category::BackupCategory;

/// Per-category local inventories, as produced by a storage scan.
pub type CategoryInventories = BTreeMap<BackupCategory, Inventory>;

/// The artifacts known to exist in one category and location at scan time,
/// newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    artifacts: Vec<BackupArtifact>,
}

impl Inventory {
    /// Build an inventory, normalizing to descending creation time.
    pub fn new(mut artifacts: Vec<BackupArtifact>) -> Self {
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { artifacts }
    }

    pub fn count(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Creation time of the most recent artifact, if any.
    pub fn newest(&self) -> Option<DateTime<Utc>> {
        self.artifacts.first().map(|a| a.created_at)
    }

    /// Creation time of the oldest artifact, if any.
    pub fn oldest(&self) -> Option<DateTime<Utc>> {
        self.artifacts.last().map(|a| a.created_at)
    }

    pub fn artifacts(&self) -> &[BackupArtifact] {
        &self.artifacts
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackupArtifact> {
        self.artifacts.iter()
    }
}

/// Fused view over every inventory a monitoring run could see.
///
/// `newest` and `oldest` stay undefined only when every contributing
/// inventory was empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalView {
    pub newest: Option<DateTime<Utc>>,
    pub oldest: Option<DateTime<Utc>>,
    pub total: usize,
}

impl GlobalView {
    /// Merge any number of inventories into one global view.
    pub fn merge<'a>(inventories: impl IntoIterator<Item = &'a Inventory>) -> Self {
        let mut view = GlobalView::default();
        for inventory in inventories {
            view.total += inventory.count();
            view.newest = max_defined(view.newest, inventory.newest());
            view.oldest = min_defined(view.oldest, inventory.oldest());
        }
        view
    }
}

fn max_defined(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn min_defined(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
