//! Publication policy over a `RemoteStore`.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use valv_config::RemoteConfig;
use valv_core::{BackupArtifact, BackupCategory, Inventory, StorageLocation};

use crate::error::RemoteError;
use crate::store::{ObjectMeta, RemoteStore};

/// What happened to one publication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDisposition {
    Published,
    /// Remote storage is not configured; nothing was attempted. This is
    /// an ordinary outcome, not a failure.
    Skipped,
}

/// Remote inventory scan result. A failed listing degrades into an empty
/// inventory carrying the error, so monitoring always gets a report.
#[derive(Debug, Clone, Default)]
pub struct RemoteScan {
    pub inventory: Inventory,
    pub error: Option<String>,
}

/// Publishes artifacts under deterministic keys and scans them back.
pub struct Publisher {
    store: Option<Arc<dyn RemoteStore>>,
    prefix: String,
    project: String,
}

impl Publisher {
    pub fn new(store: Arc<dyn RemoteStore>, config: &RemoteConfig) -> Self {
        Self {
            store: Some(store),
            prefix: config.prefix.clone(),
            project: config.project.clone(),
        }
    }

    /// A publisher without remote storage; every publish is skipped and
    /// every scan is empty.
    pub fn unconfigured(config: &RemoteConfig) -> Self {
        Self {
            store: None,
            prefix: config.prefix.clone(),
            project: config.project.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Deterministic object key for an artifact. Publishing the same
    /// artifact twice overwrites the same key.
    pub fn key_for(&self, artifact: &BackupArtifact) -> String {
        format!(
            "{}/{}/{}",
            self.prefix, artifact.category, artifact.identifier
        )
    }

    /// Push one artifact to the remote tier.
    pub async fn publish(
        &self,
        artifact: &BackupArtifact,
        source: &Path,
    ) -> Result<PublishDisposition, RemoteError> {
        let Some(store) = &self.store else {
            info!(
                artifact = %artifact.identifier,
                "remote storage not configured, keeping artifact local only"
            );
            return Ok(PublishDisposition::Skipped);
        };

        let key = self.key_for(artifact);
        let meta = ObjectMeta {
            category: artifact.category,
            created_at: artifact.created_at,
            project: self.project.clone(),
        };
        store.put(&key, source, &meta).await?;
        info!(%key, size_bytes = artifact.size_bytes, "artifact published");
        Ok(PublishDisposition::Published)
    }

    /// List the remote tier under the configured prefix.
    pub async fn scan(&self) -> RemoteScan {
        let Some(store) = &self.store else {
            debug!("remote storage not configured, remote inventory is empty");
            return RemoteScan::default();
        };

        let prefix = format!("{}/", self.prefix);
        match store.list(&prefix).await {
            Ok(objects) => {
                let artifacts = objects
                    .into_iter()
                    .filter_map(|object| {
                        let relative = object.key.strip_prefix(&prefix)?;
                        let (category, identifier) = relative.split_once('/')?;
                        let category: BackupCategory = category.parse().ok()?;
                        Some(BackupArtifact {
                            category,
                            identifier: identifier.to_string(),
                            location: StorageLocation::Remote,
                            size_bytes: object.size_bytes,
                            created_at: object.last_modified,
                        })
                    })
                    .collect();
                RemoteScan {
                    inventory: Inventory::new(artifacts),
                    error: None,
                }
            }
            Err(error) => {
                warn!(%error, "remote inventory scan failed, degrading to empty");
                RemoteScan {
                    inventory: Inventory::default(),
                    error: Some(error.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRemoteStore;
    use chrono::{Duration, Utc};
    use tempfile::NamedTempFile;

    fn artifact(identifier: &str) -> BackupArtifact {
        BackupArtifact {
            category: BackupCategory::Database,
            identifier: identifier.to_string(),
            location: StorageLocation::Local,
            size_bytes: 4,
            created_at: Utc::now(),
        }
    }

    fn configured() -> (Arc<MemoryRemoteStore>, Publisher) {
        let store = Arc::new(MemoryRemoteStore::new());
        let mut config = RemoteConfig::default();
        config.bucket = Some("bucket".into());
        let publisher = Publisher::new(store.clone(), &config);
        (store, publisher)
    }

    #[tokio::test]
    async fn publish_uses_the_category_partitioned_key() {
        let (store, publisher) = configured();
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"dump").unwrap();

        let disposition = publisher
            .publish(&artifact("database_a.sql.gz"), file.path())
            .await
            .unwrap();

        assert_eq!(disposition, PublishDisposition::Published);
        assert_eq!(store.keys(), vec!["backups/database/database_a.sql.gz"]);
    }

    #[tokio::test]
    async fn unconfigured_publish_is_a_skip_not_a_failure() {
        let publisher = Publisher::unconfigured(&RemoteConfig::default());
        let file = NamedTempFile::new().unwrap();

        let disposition = publisher
            .publish(&artifact("database_a.sql.gz"), file.path())
            .await
            .unwrap();
        assert_eq!(disposition, PublishDisposition::Skipped);

        let scan = publisher.scan().await;
        assert!(scan.inventory.is_empty());
        assert!(scan.error.is_none());
    }

    #[tokio::test]
    async fn scan_rebuilds_artifacts_from_keys() {
        let (store, publisher) = configured();
        let now = Utc::now();
        store.seed(
            "backups/database/database_a.sql.gz",
            100,
            now - Duration::hours(2),
        );
        store.seed("backups/code/code_b.tar.gz", 200, now - Duration::hours(1));
        // Foreign objects under the prefix are ignored.
        store.seed("backups/notes.txt", 1, now);

        let scan = publisher.scan().await;
        assert!(scan.error.is_none());
        assert_eq!(scan.inventory.count(), 2);
        let newest = &scan.inventory.artifacts()[0];
        assert_eq!(newest.identifier, "code_b.tar.gz");
        assert_eq!(newest.category, BackupCategory::Code);
        assert_eq!(newest.location, StorageLocation::Remote);
    }

    #[tokio::test]
    async fn scan_degrades_on_listing_failure() {
        let (store, publisher) = configured();
        store.fail_lists(true);

        let scan = publisher.scan().await;
        assert!(scan.inventory.is_empty());
        assert!(scan.error.as_deref().unwrap().contains("injected"));
    }
}
