//! Threshold rules turning the global inventory view into alerts.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::inventory::GlobalView;

/// Alert severity, ordered so that `Critical` compares highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StaleBackup,
    OldBackup,
    InsufficientBackups,
    RemoteUnreachable,
}

/// One finding of a monitoring run. Alerts are rebuilt from scratch every
/// run and only ever appended to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
}

/// Thresholds feeding the rules, with the documented defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertThresholds {
    /// A newest backup older than this is stale.
    pub stale_after_hours: i64,
    /// An oldest backup older than this marks the horizon of history.
    pub max_age_days: i64,
    /// Fewer total backups than this is worth flagging.
    pub minimum_count: usize,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            stale_after_hours: 24,
            max_age_days: 7,
            minimum_count: 3,
        }
    }
}

/// Evaluate every rule against the merged view. All matching alerts are
/// emitted, ordered by descending severity.
///
/// When nothing exists anywhere the single critical no-backups alert
/// stands alone; the finer-grained rules would only restate it. A recorded
/// remote scan error additionally surfaces as a medium
/// `RemoteUnreachable` alert so a degraded tier is never silent.
pub fn evaluate_alerts(
    view: &GlobalView,
    remote_error: Option<&str>,
    thresholds: &AlertThresholds,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    match view.newest {
        None => alerts.push(Alert {
            kind: AlertKind::StaleBackup,
            severity: Severity::Critical,
            message: "no backups found".to_string(),
        }),
        Some(newest) => {
            let age = now - newest;
            if age > Duration::hours(thresholds.stale_after_hours) {
                alerts.push(Alert {
                    kind: AlertKind::StaleBackup,
                    severity: Severity::High,
                    message: format!("most recent backup is {} hours old", age.num_hours()),
                });
            }
        }
    }

    if let Some(oldest) = view.oldest {
        let age = now - oldest;
        if age > Duration::days(thresholds.max_age_days) {
            alerts.push(Alert {
                kind: AlertKind::OldBackup,
                severity: Severity::Low,
                message: format!("oldest backup is {} days old", age.num_days()),
            });
        }
    }

    if view.newest.is_some() && view.total < thresholds.minimum_count {
        alerts.push(Alert {
            kind: AlertKind::InsufficientBackups,
            severity: Severity::Medium,
            message: format!("only {} backups found", view.total),
        });
    }

    if let Some(error) = remote_error {
        alerts.push(Alert {
            kind: AlertKind::RemoteUnreachable,
            severity: Severity::Medium,
            message: format!("remote inventory unavailable: {error}"),
        });
    }

    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}
