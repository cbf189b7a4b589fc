//! Backup runtime core, coordinating production, publication, retention,
//! and monitoring.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use opentelemetry::KeyValue;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use valv_config::ValvConfig;
use valv_core::{
    evaluate_alerts, expired, resolve, AlertThresholds, BackupCategory, BackupTrigger, BackupType,
    GlobalView, StatusReport, RUN_REPORT_FILE, STATUS_REPORT_FILE,
};
use valv_remote::{PublishDisposition, Publisher, S3RemoteStore};
use valv_store::{ArtifactProducer, CommandProducer, LocalStore, StoreError};
use valv_telemetry::{logging::EventLogger, MetricsRecorder};

use crate::engine::error::EngineError;
use crate::engine::outcome::RunOutcome;

/// Coordinates backup and monitoring runs.
///
/// Holds no global state: configuration and collaborators are injected at
/// construction, so tests run the full pipeline against fake producers
/// and an in-memory remote store.
pub struct BackupRuntime {
    config: Arc<ValvConfig>,
    producer: Arc<dyn ArtifactProducer>,
    publisher: Arc<Publisher>,
    local: LocalStore,
    pub metrics: Arc<MetricsRecorder>,
}

impl BackupRuntime {
    pub fn new(
        config: ValvConfig,
        producer: Arc<dyn ArtifactProducer>,
        publisher: Publisher,
        metrics: MetricsRecorder,
    ) -> Self {
        let local = LocalStore::new(config.storage.backup_dir.clone());
        Self {
            config: Arc::new(config),
            producer,
            publisher: Arc::new(publisher),
            local,
            metrics: Arc::new(metrics),
        }
    }

    /// Build the production runtime: command-driven producers plus an S3
    /// publisher when a bucket is configured.
    pub async fn connect(
        config: ValvConfig,
        metrics: MetricsRecorder,
    ) -> Result<Self, EngineError> {
        let producer = Arc::new(CommandProducer::new(&config));
        let publisher = if config.remote.is_configured() {
            let store = S3RemoteStore::connect(&config.remote).await?;
            Publisher::new(Arc::new(store), &config.remote)
        } else {
            Publisher::unconfigured(&config.remote)
        };
        Ok(Self::new(config, producer, publisher, metrics))
    }

    /// Execute one backup run: resolve the type, produce every category,
    /// publish what was produced, then rotate old local artifacts.
    ///
    /// Production failures abort the run before any publication or
    /// retention. Publish failures are collected into the outcome instead
    /// of failing the run, the local artifact already exists.
    #[instrument(skip_all, fields(trigger = %trigger))]
    pub async fn run_backup(
        &self,
        requested: Option<BackupType>,
        trigger: BackupTrigger,
        changes: &[String],
    ) -> Result<RunOutcome, EngineError> {
        let started = Instant::now();
        self.metrics.backup_runs.inc();

        let backup_type = requested.unwrap_or_else(|| resolve(trigger, changes));
        let categories = backup_type.categories();
        info!(%backup_type, ?categories, "starting backup run");

        // Fail fast before any side effect when the run needs a dump but
        // no connection string is configured.
        if categories.contains(&BackupCategory::Database) {
            self.config.require_database_url()?;
        }

        let artifacts = self.produce_all(categories).await?;
        let (uploaded, upload_failures) = self.publish_all(&artifacts).await?;
        // Retention runs strictly after publication so an expiring
        // artifact is never deleted out from under an in-flight upload.
        let deleted = self.enforce_retention().await?;

        let outcome = RunOutcome {
            trigger,
            backup_type,
            artifacts,
            uploaded,
            upload_failures,
            deleted,
        };

        let report = outcome.to_report(Utc::now());
        report.save(&self.local.backup_dir().join(RUN_REPORT_FILE))?;

        self.metrics
            .run_duration
            .observe(started.elapsed().as_secs_f64());
        EventLogger::log_event(
            "backup_complete",
            vec![
                KeyValue::new("trigger", trigger.to_string()),
                KeyValue::new("backup_type", backup_type.to_string()),
                KeyValue::new("artifacts", outcome.artifacts.len() as i64),
                KeyValue::new("total_bytes", outcome.total_bytes() as i64),
                KeyValue::new("upload_failures", outcome.upload_failures.len() as i64),
            ],
        )
        .await;

        Ok(outcome)
    }

    /// Produce all requested categories concurrently. Output paths are
    /// disjoint per category, so the tasks never contend.
    async fn produce_all(
        &self,
        categories: &[BackupCategory],
    ) -> Result<Vec<valv_core::BackupArtifact>, EngineError> {
        let mut tasks = JoinSet::new();
        for &category in categories {
            let producer = self.producer.clone();
            tasks.spawn(async move { producer.produce(category).await });
        }

        let mut artifacts = Vec::with_capacity(categories.len());
        while let Some(joined) = tasks.join_next().await {
            let artifact = joined??;
            self.metrics.artifacts_produced.inc();
            debug!(
                category = %artifact.category,
                artifact = %artifact.identifier,
                size_bytes = artifact.size_bytes,
                "artifact produced"
            );
            artifacts.push(artifact);
        }

        // Category order keeps reports and logs deterministic regardless
        // of completion order.
        artifacts.sort_by_key(|a| a.category);
        Ok(artifacts)
    }

    /// Publish every artifact, bounded by the configured upload
    /// concurrency. Returns the published count and the failures.
    async fn publish_all(
        &self,
        artifacts: &[valv_core::BackupArtifact],
    ) -> Result<(usize, Vec<String>), EngineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.remote.max_concurrent_uploads));
        let mut tasks = JoinSet::new();

        for artifact in artifacts.iter().cloned() {
            let publisher = self.publisher.clone();
            let semaphore = semaphore.clone();
            let source = self
                .local
                .category_dir(artifact.category)
                .join(&artifact.identifier);
            tasks.spawn(async move {
                // The semaphore is never closed while tasks are running.
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("upload semaphore closed");
                let result = publisher.publish(&artifact, &source).await;
                (artifact, result)
            });
        }

        let mut uploaded = 0;
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (artifact, result) = joined?;
            match result {
                Ok(PublishDisposition::Published) => uploaded += 1,
                Ok(PublishDisposition::Skipped) => {}
                Err(error) => {
                    self.metrics.upload_failures.inc();
                    warn!(
                        artifact = %artifact.identifier,
                        %error,
                        "publish failed, artifact remains local only"
                    );
                    failures.push(format!("{}: {}", artifact.identifier, error));
                }
            }
        }
        failures.sort();
        Ok((uploaded, failures))
    }

    /// Rotate every category down to the retention limit. Single-file
    /// deletion failures are logged and skipped inside the store.
    async fn enforce_retention(&self) -> Result<Vec<String>, EngineError> {
        let local = self.local.clone();
        let max_keep = self.config.storage.max_backups;

        let deleted = tokio::task::spawn_blocking(move || -> Result<Vec<String>, StoreError> {
            let mut deleted = Vec::new();
            for category in BackupCategory::ALL {
                let inventory = local.scan(category)?;
                let doomed = expired(&inventory, max_keep);
                if !doomed.is_empty() {
                    info!(
                        %category,
                        expiring = doomed.len(),
                        retained = inventory.count() - doomed.len(),
                        "rotating old backups"
                    );
                }
                deleted.extend(local.delete_all(&doomed));
            }
            Ok(deleted)
        })
        .await??;

        self.metrics.artifacts_deleted.inc_by(deleted.len() as f64);
        Ok(deleted)
    }

    /// Execute one monitoring run. Always produces and persists a status
    /// report; a broken remote tier degrades the report instead of
    /// aborting it.
    #[instrument(skip_all)]
    pub async fn run_monitor(&self) -> Result<StatusReport, EngineError> {
        // One clock reading for every age computation in this run.
        let now = Utc::now();

        let local = self.local.clone();
        let local_scan = tokio::task::spawn_blocking(move || local.scan_all());
        let (locals, remote) = tokio::join!(local_scan, self.publisher.scan());
        let locals = locals??;

        let view = GlobalView::merge(
            locals
                .values()
                .chain(std::iter::once(&remote.inventory)),
        );
        let thresholds = AlertThresholds {
            stale_after_hours: self.config.monitor.stale_after_hours,
            max_age_days: self.config.monitor.max_age_days,
            minimum_count: self.config.monitor.minimum_count,
        };
        let alerts = evaluate_alerts(&view, remote.error.as_deref(), &thresholds, now);

        self.metrics.alerts_emitted.inc_by(alerts.len() as f64);
        for alert in &alerts {
            warn!(severity = %alert.severity, kind = ?alert.kind, "{}", alert.message);
        }

        let remote_count = remote.inventory.count();
        let report = StatusReport::compose(now, &locals, remote_count, remote.error, &view, alerts);
        report.save(&self.local.backup_dir().join(STATUS_REPORT_FILE))?;

        info!(
            local_total = report.local_total,
            remote_count = report.remote_count,
            total = report.total,
            status = ?report.status,
            "monitoring run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::path::PathBuf;
    use tempfile::TempDir;
    use valv_core::{
        mint_identifier, Alert, AlertKind, BackupArtifact, HealthVerdict, RunReport, Severity,
        StorageLocation,
    };
    use valv_remote::MemoryRemoteStore;

    /// Producer that writes a small file where the real one would put a
    /// dump, then stats it back like the real one does.
    struct FakeProducer {
        backup_dir: PathBuf,
    }

    #[async_trait]
    impl ArtifactProducer for FakeProducer {
        async fn produce(&self, category: BackupCategory) -> Result<BackupArtifact, StoreError> {
            let now = Utc::now();
            let identifier = mint_identifier(category, now);
            let dir = self.backup_dir.join(category.as_str());
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(&identifier);
            std::fs::write(&path, category.as_str())?;
            let metadata = std::fs::metadata(&path)?;
            Ok(BackupArtifact {
                category,
                identifier,
                location: StorageLocation::Local,
                size_bytes: metadata.len(),
                created_at: DateTime::from(metadata.modified()?),
            })
        }
    }

    /// Producer that always fails, for the fatal-production path.
    struct BrokenProducer;

    #[async_trait]
    impl ArtifactProducer for BrokenProducer {
        async fn produce(&self, category: BackupCategory) -> Result<BackupArtifact, StoreError> {
            Err(StoreError::Failed {
                category,
                status: 1,
                stderr: "boom".into(),
            })
        }
    }

    struct Harness {
        runtime: BackupRuntime,
        store: Arc<MemoryRemoteStore>,
        _dir: TempDir,
    }

    fn harness(configure: impl FnOnce(&mut ValvConfig)) -> Harness {
        let dir = TempDir::new().unwrap();
        let mut config = ValvConfig::default();
        config.storage.backup_dir = dir.path().join("backups");
        config.remote.bucket = Some("test-bucket".into());
        configure(&mut config);

        let store = Arc::new(MemoryRemoteStore::new());
        let publisher = Publisher::new(store.clone(), &config.remote);
        let producer = Arc::new(FakeProducer {
            backup_dir: config.storage.backup_dir.clone(),
        });
        let runtime =
            BackupRuntime::new(config, producer, publisher, MetricsRecorder::new());
        Harness {
            runtime,
            store,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn full_run_produces_publishes_and_reports() {
        let h = harness(|_| {});
        let outcome = h
            .runtime
            .run_backup(None, BackupTrigger::Manual, &[])
            .await
            .unwrap();

        assert_eq!(outcome.backup_type, BackupType::Full);
        assert_eq!(outcome.artifacts.len(), 3);
        assert_eq!(outcome.uploaded, 3);
        assert!(outcome.upload_failures.is_empty());
        assert_eq!(h.store.object_count(), 3);

        let report_path = h.runtime.local.backup_dir().join(RUN_REPORT_FILE);
        let report = RunReport::load(&report_path).unwrap();
        assert_eq!(report.artifacts.len(), 3);
        assert_eq!(report.uploaded, 3);
    }

    #[tokio::test]
    async fn schedule_trigger_narrows_to_database() {
        let h = harness(|_| {});
        let outcome = h
            .runtime
            .run_backup(None, BackupTrigger::Schedule, &[])
            .await
            .unwrap();

        assert_eq!(outcome.backup_type, BackupType::Database);
        assert_eq!(outcome.artifacts.len(), 1);
        assert_eq!(
            outcome.artifacts[0].category,
            BackupCategory::Database
        );
    }

    #[tokio::test]
    async fn explicit_type_bypasses_the_selector() {
        let h = harness(|_| {});
        let outcome = h
            .runtime
            .run_backup(Some(BackupType::Code), BackupTrigger::Schedule, &[])
            .await
            .unwrap();
        assert_eq!(outcome.backup_type, BackupType::Code);
        assert_eq!(outcome.artifacts.len(), 1);
    }

    #[tokio::test]
    async fn production_failure_is_fatal_and_skips_publication() {
        let dir = TempDir::new().unwrap();
        let mut config = ValvConfig::default();
        config.storage.backup_dir = dir.path().join("backups");
        config.remote.bucket = Some("test-bucket".into());

        let store = Arc::new(MemoryRemoteStore::new());
        let publisher = Publisher::new(store.clone(), &config.remote);
        let runtime = BackupRuntime::new(
            config,
            Arc::new(BrokenProducer),
            publisher,
            MetricsRecorder::new(),
        );

        let result = runtime
            .run_backup(Some(BackupType::Code), BackupTrigger::Manual, &[])
            .await;
        assert!(matches!(result, Err(EngineError::Production(_))));
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn publish_failures_do_not_fail_the_run() {
        let h = harness(|_| {});
        h.store.fail_puts(true);

        let outcome = h
            .runtime
            .run_backup(None, BackupTrigger::Manual, &[])
            .await
            .unwrap();

        assert_eq!(outcome.uploaded, 0);
        assert_eq!(outcome.upload_failures.len(), 3);
        // The local artifacts survived even though nothing was uploaded.
        assert_eq!(outcome.artifacts.len(), 3);

        let report_path = h.runtime.local.backup_dir().join(RUN_REPORT_FILE);
        let report = RunReport::load(&report_path).unwrap();
        assert_eq!(report.status, valv_core::RunStatus::PartialUpload);
    }

    #[tokio::test]
    async fn retention_rotates_beyond_the_limit() {
        let h = harness(|config| config.storage.max_backups = 10);

        // Twelve pre-existing database dumps, oldest first.
        let database_dir = h.runtime.local.category_dir(BackupCategory::Database);
        std::fs::create_dir_all(&database_dir).unwrap();
        for i in 0..12 {
            std::fs::write(database_dir.join(format!("database_{i:02}.sql.gz")), b"old").unwrap();
            std::thread::sleep(std::time::Duration::from_millis(15));
        }

        let outcome = h
            .runtime
            .run_backup(Some(BackupType::Database), BackupTrigger::Manual, &[])
            .await
            .unwrap();

        // 12 old + 1 new = 13, rotated down to the 10 newest.
        assert_eq!(outcome.deleted.len(), 3);
        assert!(outcome.deleted.contains(&"database_00.sql.gz".to_string()));
        assert!(outcome.deleted.contains(&"database_01.sql.gz".to_string()));
        assert!(outcome.deleted.contains(&"database_02.sql.gz".to_string()));
        let remaining = h.runtime.local.scan(BackupCategory::Database).unwrap();
        assert_eq!(remaining.count(), 10);
    }

    #[tokio::test]
    async fn monitor_on_empty_world_is_critical() {
        let h = harness(|_| {});
        let report = h.runtime.run_monitor().await.unwrap();

        assert_eq!(report.status, HealthVerdict::Warning);
        assert!(report.has_critical());
        let criticals: Vec<&Alert> = report
            .alerts
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .collect();
        assert_eq!(criticals.len(), 1);
        assert_eq!(report.total, 0);

        let saved =
            StatusReport::load(&h.runtime.local.backup_dir().join(STATUS_REPORT_FILE)).unwrap();
        assert_eq!(saved.status, report.status);
        assert_eq!(saved.alerts.len(), report.alerts.len());
    }

    #[tokio::test]
    async fn monitor_flags_a_single_stale_backup() {
        let h = harness(|_| {});
        h.store.seed(
            "backups/database/database_old.sql.gz",
            2048,
            Utc::now() - Duration::hours(30),
        );

        let report = h.runtime.run_monitor().await.unwrap();

        assert_eq!(report.status, HealthVerdict::Warning);
        assert!(!report.has_critical());
        let kinds: Vec<AlertKind> = report.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertKind::StaleBackup, AlertKind::InsufficientBackups]
        );
        assert_eq!(report.alerts[0].severity, Severity::High);
        // 30 hours is well inside the 7 day horizon.
        assert!(!kinds.contains(&AlertKind::OldBackup));
        assert_eq!(report.remote_count, 1);
    }

    #[tokio::test]
    async fn monitor_degrades_when_remote_is_unreachable() {
        let h = harness(|_| {});
        // Something local so the run is not the empty-world case.
        let config_dir = h.runtime.local.category_dir(BackupCategory::Config);
        std::fs::create_dir_all(&config_dir).unwrap();
        for i in 0..3 {
            std::fs::write(config_dir.join(format!("config_{i}.json")), b"{}").unwrap();
        }
        h.store.fail_lists(true);

        let report = h.runtime.run_monitor().await.unwrap();

        assert!(report.remote_error.is_some());
        assert!(!report.has_critical());
        assert!(report
            .alerts
            .iter()
            .any(|a| a.kind == AlertKind::RemoteUnreachable && a.severity == Severity::Medium));
        assert_eq!(report.local_total, 3);
    }

    #[tokio::test]
    async fn monitor_merges_local_and_remote_extremes() {
        let h = harness(|_| {});
        let code_dir = h.runtime.local.category_dir(BackupCategory::Code);
        std::fs::create_dir_all(&code_dir).unwrap();
        std::fs::write(code_dir.join("code_fresh.tar.gz"), b"tar").unwrap();

        h.store.seed(
            "backups/database/database_ancient.sql.gz",
            128,
            Utc::now() - Duration::days(10),
        );

        let report = h.runtime.run_monitor().await.unwrap();

        assert_eq!(report.total, 2);
        // Newest comes from the local artifact written just now.
        assert!(report.newest.unwrap() > Utc::now() - Duration::hours(1));
        // Oldest comes from the remote seed, past the 7 day horizon.
        assert!(report
            .alerts
            .iter()
            .any(|a| a.kind == AlertKind::OldBackup));
    }
}
