//! Persisted status and run reports.
//!
//! Both documents live at fixed paths inside the backup directory and are
//! fully replaced on every run. Writes go through a temp file and rename
//! so a concurrent reader never sees a partial document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alert::{Alert, Severity};
use crate::category::{BackupCategory, BackupTrigger, BackupType};
use crate::inventory::{CategoryInventories, GlobalView};

/// File name of the monitoring status report inside the backup directory.
pub const STATUS_REPORT_FILE: &str = "status_report.json";

/// File name of the backup run report inside the backup directory.
pub const RUN_REPORT_FILE: &str = "backup_report.json";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Single healthy/warning summary derived from the current alert set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthVerdict {
    Healthy,
    Warning,
}

/// Outcome of one monitoring run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub timestamp: DateTime<Utc>,
    pub status: HealthVerdict,
    /// Local artifact count per category.
    pub local: BTreeMap<BackupCategory, usize>,
    pub local_total: usize,
    pub remote_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_error: Option<String>,
    pub alerts: Vec<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<DateTime<Utc>>,
    pub total: usize,
}

impl StatusReport {
    /// Merge the monitoring run's inputs into one report.
    pub fn compose(
        now: DateTime<Utc>,
        locals: &CategoryInventories,
        remote_count: usize,
        remote_error: Option<String>,
        view: &GlobalView,
        alerts: Vec<Alert>,
    ) -> Self {
        let local: BTreeMap<BackupCategory, usize> = BackupCategory::ALL
            .iter()
            .map(|&category| {
                let count = locals.get(&category).map_or(0, |inv| inv.count());
                (category, count)
            })
            .collect();
        let local_total = local.values().sum();

        let status = if alerts.is_empty() {
            HealthVerdict::Healthy
        } else {
            HealthVerdict::Warning
        };

        Self {
            timestamp: now,
            status,
            local,
            local_total,
            remote_count,
            remote_error,
            alerts,
            newest: view.newest,
            oldest: view.oldest,
            total: view.total,
        }
    }

    /// Whether any alert warrants a caller-visible failure outcome.
    pub fn has_critical(&self) -> bool {
        self.alerts.iter().any(|a| a.severity == Severity::Critical)
    }

    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        write_atomic(path, &serde_json::to_vec_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}

/// One produced artifact as recorded in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedArtifact {
    pub category: BackupCategory,
    pub file: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    /// Local artifacts exist but at least one remote upload failed.
    PartialUpload,
}

/// Outcome of one backup run, replacing the previous run's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub trigger: BackupTrigger,
    pub backup_type: BackupType,
    pub artifacts: Vec<ReportedArtifact>,
    pub uploaded: usize,
    pub upload_failures: Vec<String>,
    pub deleted: Vec<String>,
    pub status: RunStatus,
}

impl RunReport {
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        write_atomic(path, &serde_json::to_vec_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}

/// Replace `path` with `contents` without ever exposing a partial file.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{evaluate_alerts, AlertThresholds};
    use crate::artifact::{BackupArtifact, StorageLocation};
    use crate::inventory::Inventory;
    use chrono::Duration;
    use tempfile::TempDir;

    fn sample_locals(now: DateTime<Utc>) -> CategoryInventories {
        let mut locals = CategoryInventories::new();
        locals.insert(
            BackupCategory::Database,
            Inventory::new(vec![BackupArtifact {
                category: BackupCategory::Database,
                identifier: "database_a.sql.gz".into(),
                location: StorageLocation::Local,
                size_bytes: 512,
                created_at: now - Duration::hours(1),
            }]),
        );
        locals
    }

    #[test]
    fn compose_fills_every_category_even_when_absent() {
        let now = Utc::now();
        let locals = sample_locals(now);
        let view = GlobalView::merge(locals.values());
        let report = StatusReport::compose(now, &locals, 0, None, &view, Vec::new());

        assert_eq!(report.local[&BackupCategory::Database], 1);
        assert_eq!(report.local[&BackupCategory::Config], 0);
        assert_eq!(report.local[&BackupCategory::Code], 0);
        assert_eq!(report.local_total, 1);
        assert_eq!(report.status, HealthVerdict::Healthy);
    }

    #[test]
    fn any_alert_downgrades_the_verdict() {
        let now = Utc::now();
        let locals = CategoryInventories::new();
        let view = GlobalView::default();
        let alerts = evaluate_alerts(&view, None, &AlertThresholds::default(), now);
        let report = StatusReport::compose(now, &locals, 0, None, &view, alerts);

        assert_eq!(report.status, HealthVerdict::Warning);
        assert!(report.has_critical());
    }

    #[test]
    fn status_report_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STATUS_REPORT_FILE);

        let now = Utc::now();
        let locals = sample_locals(now);
        let view = GlobalView::merge(locals.values());
        let alerts = evaluate_alerts(&view, None, &AlertThresholds::default(), now);
        let report = StatusReport::compose(now, &locals, 2, None, &view, alerts);

        report.save(&path).unwrap();
        let restored = StatusReport::load(&path).unwrap();

        assert_eq!(restored.status, report.status);
        assert_eq!(restored.alerts.len(), report.alerts.len());
        assert_eq!(restored.local, report.local);
        assert_eq!(restored.remote_count, 2);
    }

    #[test]
    fn save_replaces_the_previous_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STATUS_REPORT_FILE);

        let now = Utc::now();
        let locals = CategoryInventories::new();
        let view = GlobalView::default();
        let first = StatusReport::compose(now, &locals, 0, None, &view, Vec::new());
        first.save(&path).unwrap();

        let second = StatusReport::compose(
            now,
            &locals,
            7,
            Some("listing failed".into()),
            &view,
            Vec::new(),
        );
        second.save(&path).unwrap();

        let restored = StatusReport::load(&path).unwrap();
        assert_eq!(restored.remote_count, 7);
        assert_eq!(restored.remote_error.as_deref(), Some("listing failed"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn run_report_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(RUN_REPORT_FILE);

        let report = RunReport {
            timestamp: Utc::now(),
            trigger: BackupTrigger::Push,
            backup_type: BackupType::Incremental,
            artifacts: vec![ReportedArtifact {
                category: BackupCategory::Code,
                file: "code_20260101-010203-000-0001.tar.gz".into(),
                size_bytes: 4096,
            }],
            uploaded: 1,
            upload_failures: Vec::new(),
            deleted: vec!["code_old.tar.gz".into()],
            status: RunStatus::Success,
        };

        report.save(&path).unwrap();
        let restored = RunReport::load(&path).unwrap();
        assert_eq!(restored, report);
    }
}
