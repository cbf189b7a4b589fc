//! Local backup storage and retention configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Local artifact storage parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per backup category.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Artifacts retained per category; older ones are rotated out.
    #[validate(range(min = 1, max = 500))]
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Timeout for each external tool invocation (seconds). A dump or
    /// archive running past this is treated as a failed production.
    #[validate(range(min = 1, max = 86400))]
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Directory archived by code backups.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Files captured by configuration backups, relative to `source_dir`.
    #[serde(default = "default_config_manifests")]
    pub config_manifests: Vec<PathBuf>,
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_max_backups() -> usize {
    10
}

fn default_command_timeout() -> u64 {
    600
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_config_manifests() -> Vec<PathBuf> {
    ["Cargo.toml", "config/valv.yaml", ".github/workflows/ci.yml"]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            max_backups: default_max_backups(),
            command_timeout_secs: default_command_timeout(),
            source_dir: default_source_dir(),
            config_manifests: default_config_manifests(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn defaults_are_valid() {
        StorageConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_retention_is_rejected() {
        let mut config = StorageConfig::default();
        config.max_backups = 0;
        assert!(config.validate().is_err());
    }
}
