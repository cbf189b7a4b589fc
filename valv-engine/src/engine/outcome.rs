//! Outcome of one backup run.

use chrono::{DateTime, Utc};

use valv_core::{
    BackupArtifact, BackupTrigger, BackupType, ReportedArtifact, RunReport, RunStatus,
};

/// Everything a finished backup run knows about itself. The persisted
/// [`RunReport`] is derived from this.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub trigger: BackupTrigger,
    pub backup_type: BackupType,
    pub artifacts: Vec<BackupArtifact>,
    pub uploaded: usize,
    /// Publish failures are non-fatal but must not be silent.
    pub upload_failures: Vec<String>,
    pub deleted: Vec<String>,
}

impl RunOutcome {
    pub fn to_report(&self, timestamp: DateTime<Utc>) -> RunReport {
        let status = if self.upload_failures.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::PartialUpload
        };

        RunReport {
            timestamp,
            trigger: self.trigger,
            backup_type: self.backup_type,
            artifacts: self
                .artifacts
                .iter()
                .map(|artifact| ReportedArtifact {
                    category: artifact.category,
                    file: artifact.identifier.clone(),
                    size_bytes: artifact.size_bytes,
                })
                .collect(),
            uploaded: self.uploaded,
            upload_failures: self.upload_failures.clone(),
            deleted: self.deleted.clone(),
            status,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.artifacts.iter().map(|a| a.size_bytes).sum()
    }
}
