//! Artifact production by category.
//!
//! `CommandProducer` drives the external mechanisms the platform already
//! relies on: `pg_dump` piped into `gzip` for the database, a JSON
//! snapshot of the configuration manifests, and `tar` for the code tree.
//! Every invocation is bounded by the configured timeout; a timeout is
//! treated exactly like a non-zero exit.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::process::Command;
use tracing::{debug, info};

use valv_config::ValvConfig;
use valv_core::{mint_identifier, BackupArtifact, BackupCategory, StorageLocation};

use crate::error::StoreError;

/// Produces one artifact for a category.
///
/// The trait seam exists so orchestration can be exercised with fake
/// producers; the engine never assumes which mechanism sits behind it.
#[async_trait]
pub trait ArtifactProducer: Send + Sync {
    async fn produce(&self, category: BackupCategory) -> Result<BackupArtifact, StoreError>;
}

/// Production implementation shelling out to the platform tools.
pub struct CommandProducer {
    backup_dir: PathBuf,
    source_dir: PathBuf,
    config_manifests: Vec<PathBuf>,
    database_url: Option<String>,
    timeout: Duration,
}

impl CommandProducer {
    pub fn new(config: &ValvConfig) -> Self {
        Self {
            backup_dir: config.storage.backup_dir.clone(),
            source_dir: config.storage.source_dir.clone(),
            config_manifests: config.storage.config_manifests.clone(),
            database_url: config.database.url.clone(),
            timeout: Duration::from_secs(config.storage.command_timeout_secs),
        }
    }

    fn category_dir(&self, category: BackupCategory) -> PathBuf {
        self.backup_dir.join(category.as_str())
    }

    async fn dump_database(&self, path: &Path) -> Result<(), StoreError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(StoreError::MissingDatabaseUrl)?;

        // pg_dump writes the plain dump; gzip then replaces it with the
        // final .sql.gz artifact.
        let sql_path = path.with_extension("");
        let dump_file = std::fs::File::create(&sql_path)?;

        let mut dump = Command::new("pg_dump");
        dump.arg(url)
            .stdout(Stdio::from(dump_file))
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.run_checked(dump, BackupCategory::Database).await?;

        let mut compress = Command::new("gzip");
        compress
            .arg("-f")
            .arg(&sql_path)
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.run_checked(compress, BackupCategory::Database).await
    }

    async fn snapshot_config(&self, path: &Path, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut files = serde_json::Map::new();
        for manifest in &self.config_manifests {
            let absolute = self.source_dir.join(manifest);
            // Missing manifests are skipped, a partial snapshot beats none.
            match tokio::fs::read_to_string(&absolute).await {
                Ok(contents) => {
                    files.insert(
                        manifest.to_string_lossy().into_owned(),
                        serde_json::Value::String(contents),
                    );
                }
                Err(_) => debug!(manifest = %manifest.display(), "config manifest absent, skipping"),
            }
        }

        let snapshot = serde_json::json!({
            "timestamp": now.to_rfc3339(),
            "files": files,
        });
        let body = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(path, body).await?;
        Ok(())
    }

    async fn archive_code(&self, path: &Path) -> Result<(), StoreError> {
        let mut archive = Command::new("tar");
        archive
            .arg("-czf")
            .arg(path)
            .arg("--exclude=target")
            .arg("--exclude=.git")
            .arg("--exclude=dist")
            .arg("--exclude=build")
            .arg("-C")
            .arg(&self.source_dir)
            .arg(".")
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.run_checked(archive, BackupCategory::Code).await
    }

    /// Run a tool to completion within the timeout, mapping non-zero exit
    /// and timeout onto the same fatal error class.
    async fn run_checked(
        &self,
        mut command: Command,
        category: BackupCategory,
    ) -> Result<(), StoreError> {
        let child = command
            .spawn()
            .map_err(|source| StoreError::Spawn { category, source })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(StoreError::Spawn { category, source }),
            Err(_) => {
                return Err(StoreError::TimedOut {
                    category,
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(StoreError::Failed {
                category,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl ArtifactProducer for CommandProducer {
    async fn produce(&self, category: BackupCategory) -> Result<BackupArtifact, StoreError> {
        let now = Utc::now();
        let identifier = mint_identifier(category, now);
        let dir = self.category_dir(category);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&identifier);

        info!(%category, artifact = %identifier, "producing backup artifact");
        match category {
            BackupCategory::Database => self.dump_database(&path).await?,
            BackupCategory::Config => self.snapshot_config(&path, now).await?,
            BackupCategory::Code => self.archive_code(&path).await?,
        }

        // Size and creation time come from a stat of the finished file,
        // never from assumptions about what the tool did.
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|source| StoreError::Unreadable { category, source })?;
        let created_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or(now);

        Ok(BackupArtifact {
            category,
            identifier,
            location: StorageLocation::Local,
            size_bytes: metadata.len(),
            created_at,
        })
    }
}
