//! Monitoring and alerting configuration.
//!
//! Thresholds feeding the alert rules of the monitoring run.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Monitoring thresholds.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct MonitorConfig {
    /// A newest backup older than this many hours raises a staleness alert.
    #[validate(range(min = 1, max = 720))]
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: i64,

    /// An oldest backup older than this many days marks the history
    /// horizon (informational alert).
    #[validate(range(min = 1, max = 365))]
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,

    /// Fewer backups than this across all tiers raises a count alert.
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_minimum_count")]
    pub minimum_count: usize,
}

fn default_stale_after_hours() -> i64 {
    24
}

fn default_max_age_days() -> i64 {
    7
}

fn default_minimum_count() -> usize {
    3
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            stale_after_hours: default_stale_after_hours(),
            max_age_days: default_max_age_days(),
            minimum_count: default_minimum_count(),
        }
    }
}
