//! Backup categories, run triggers, and resolved backup types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What is being backed up. Identifies both the producer used for a run
/// and the storage partition (local subdirectory, remote key segment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupCategory {
    Database,
    Config,
    Code,
}

impl BackupCategory {
    /// All categories, in the order a full backup produces them.
    pub const ALL: [BackupCategory; 3] = [
        BackupCategory::Database,
        BackupCategory::Config,
        BackupCategory::Code,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackupCategory::Database => "database",
            BackupCategory::Config => "config",
            BackupCategory::Code => "code",
        }
    }

    /// File extension of artifacts in this category.
    pub fn extension(&self) -> &'static str {
        match self {
            BackupCategory::Database => "sql.gz",
            BackupCategory::Config => "json",
            BackupCategory::Code => "tar.gz",
        }
    }
}

impl fmt::Display for BackupCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown backup category: {0}")]
pub struct ParseCategoryError(String);

impl FromStr for BackupCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "database" => Ok(BackupCategory::Database),
            "config" => Ok(BackupCategory::Config),
            "code" => Ok(BackupCategory::Code),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// The event that initiated a backup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupTrigger {
    Manual,
    Push,
    Release,
    Schedule,
}

impl BackupTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupTrigger::Manual => "manual",
            BackupTrigger::Push => "push",
            BackupTrigger::Release => "release",
            BackupTrigger::Schedule => "schedule",
        }
    }
}

impl fmt::Display for BackupTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown backup trigger: {0}")]
pub struct ParseTriggerError(String);

impl FromStr for BackupTrigger {
    type Err = ParseTriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(BackupTrigger::Manual),
            "push" => Ok(BackupTrigger::Push),
            "release" => Ok(BackupTrigger::Release),
            "schedule" => Ok(BackupTrigger::Schedule),
            other => Err(ParseTriggerError(other.to_string())),
        }
    }
}

/// Resolved scope of a backup run.
///
/// `Incremental` is currently an alias for the full category set: the
/// trigger rules distinguish it from `Full`, but no narrower selection is
/// implemented yet, so both produce all three categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    Full,
    Incremental,
    Database,
    Config,
    Code,
}

impl BackupType {
    /// The categories a run of this type must produce.
    pub fn categories(&self) -> &'static [BackupCategory] {
        match self {
            BackupType::Full | BackupType::Incremental => &BackupCategory::ALL,
            BackupType::Database => &[BackupCategory::Database],
            BackupType::Config => &[BackupCategory::Config],
            BackupType::Code => &[BackupCategory::Code],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackupType::Full => "full",
            BackupType::Incremental => "incremental",
            BackupType::Database => "database",
            BackupType::Config => "config",
            BackupType::Code => "code",
        }
    }
}

impl fmt::Display for BackupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown backup type: {0}")]
pub struct ParseTypeError(String);

impl FromStr for BackupType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(BackupType::Full),
            "incremental" => Ok(BackupType::Incremental),
            "database" => Ok(BackupType::Database),
            "config" => Ok(BackupType::Config),
            "code" => Ok(BackupType::Code),
            other => Err(ParseTypeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_covers_all_categories() {
        assert_eq!(BackupType::Full.categories(), &BackupCategory::ALL);
        assert_eq!(BackupType::Incremental.categories(), &BackupCategory::ALL);
    }

    #[test]
    fn single_category_types() {
        assert_eq!(
            BackupType::Database.categories(),
            &[BackupCategory::Database]
        );
        assert_eq!(BackupType::Code.categories(), &[BackupCategory::Code]);
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in BackupCategory::ALL {
            assert_eq!(category.as_str().parse::<BackupCategory>().unwrap(), category);
        }
    }

    #[test]
    fn unknown_trigger_is_rejected() {
        assert!("cron".parse::<BackupTrigger>().is_err());
    }
}
