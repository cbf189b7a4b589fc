//! Local artifact store: directory layout, scans, and deletions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use valv_core::{
    BackupArtifact, BackupCategory, CategoryInventories, Inventory, StorageLocation,
};

use crate::error::StoreError;

/// View over the on-disk backup directory, one subdirectory per category.
///
/// All operations are synchronous filesystem calls; callers that are on
/// the async runtime wrap scans in `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    backup_dir: PathBuf,
}

impl LocalStore {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn category_dir(&self, category: BackupCategory) -> PathBuf {
        self.backup_dir.join(category.as_str())
    }

    /// Create the category directories if they do not exist yet.
    pub fn ensure_layout(&self) -> Result<(), StoreError> {
        for category in BackupCategory::ALL {
            fs::create_dir_all(self.category_dir(category))?;
        }
        Ok(())
    }

    /// Enumerate one category's artifacts, newest first. A directory that
    /// does not exist yet is an empty inventory, not an error.
    pub fn scan(&self, category: BackupCategory) -> Result<Inventory, StoreError> {
        let dir = self.category_dir(category);
        if !dir.exists() {
            return Ok(Inventory::default());
        }

        let mut artifacts = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let identifier = entry.file_name().to_string_lossy().into_owned();
            let created_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            artifacts.push(BackupArtifact {
                category,
                identifier,
                location: StorageLocation::Local,
                size_bytes: metadata.len(),
                created_at,
            });
        }

        Ok(Inventory::new(artifacts))
    }

    /// Scan every category.
    pub fn scan_all(&self) -> Result<CategoryInventories, StoreError> {
        let mut inventories = CategoryInventories::new();
        for category in BackupCategory::ALL {
            inventories.insert(category, self.scan(category)?);
        }
        Ok(inventories)
    }

    /// Remove one artifact from disk.
    pub fn delete(&self, artifact: &BackupArtifact) -> Result<(), StoreError> {
        let path = self.category_dir(artifact.category).join(&artifact.identifier);
        fs::remove_file(&path)?;
        Ok(())
    }

    /// Remove a batch of artifacts, skipping the ones that fail.
    ///
    /// Returns the identifiers actually removed. Failures are logged and
    /// left behind for the next run to retry.
    pub fn delete_all(&self, artifacts: &[BackupArtifact]) -> Vec<String> {
        let mut deleted = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            match self.delete(artifact) {
                Ok(()) => deleted.push(artifact.identifier.clone()),
                Err(error) => warn!(
                    artifact = %artifact.identifier,
                    %error,
                    "failed to delete expired backup, skipping"
                ),
            }
        }
        deleted
    }
}
