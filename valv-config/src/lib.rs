//! # Valv Configuration System
//!
//! Hierarchical configuration for every Valv component.
//!
//! ## Features
//! - **Unified Configuration**: single source of truth across all crates
//! - **Validation**: every threshold and path checked at load time
//! - **Environment Awareness**: per-environment YAML overlays plus
//!   `VALV_*` variables for CI and cron contexts

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod database;
mod error;
mod monitor;
mod remote;
mod storage;
mod telemetry;
mod validation;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use monitor::MonitorConfig;
pub use remote::RemoteConfig;
pub use storage::StorageConfig;
pub use telemetry::TelemetryConfig;

/// Top-level configuration container for all Valv components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct ValvConfig {
    /// Local backup storage and retention parameters.
    #[validate(nested)]
    pub storage: StorageConfig,

    /// Database dump source.
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Remote object storage parameters.
    #[validate(nested)]
    pub remote: RemoteConfig,

    /// Monitoring and alerting thresholds.
    #[validate(nested)]
    pub monitor: MonitorConfig,

    /// Telemetry and observability configuration.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl ValvConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/valv.yaml` base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` overrides, selected via `VALV_ENV`.
    /// 4. `VALV_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ValvConfig::default()));

        if Path::new("config/valv.yaml").exists() {
            figment = figment.merge(Yaml::file("config/valv.yaml"));
        }

        let env = std::env::var("VALV_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        figment
            .merge(Env::prefixed("VALV_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path, still honoring `VALV_*`
    /// environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::from(Serialized::defaults(ValvConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("VALV_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// The database connection string, required before a database dump may
    /// start. Fails fast so no side effect precedes the error.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database
            .url
            .as_deref()
            .ok_or(ConfigError::MissingSetting("database.url"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_validation() {
        let config = ValvConfig::default();
        config.validate().expect("Default config should validate");
    }

    #[test]
    fn environment_override() {
        std::env::set_var("VALV_STORAGE__MAX_BACKUPS", "25");
        let config = ValvConfig::load().unwrap();
        assert_eq!(config.storage.max_backups, 25);
        std::env::remove_var("VALV_STORAGE__MAX_BACKUPS");
    }

    #[test]
    fn database_url_is_required_for_dumps() {
        let config = ValvConfig::default();
        assert!(matches!(
            config.require_database_url(),
            Err(ConfigError::MissingSetting("database.url"))
        ));

        let mut config = ValvConfig::default();
        config.database.url = Some("postgres://localhost/app".into());
        assert_eq!(
            config.require_database_url().unwrap(),
            "postgres://localhost/app"
        );
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("valv.yaml");
        std::fs::write(
            &path,
            "monitor:\n  stale_after_hours: 48\nremote:\n  bucket: nightly-backups\n",
        )
        .unwrap();

        let config = ValvConfig::load_from_path(&path).unwrap();
        assert_eq!(config.monitor.stale_after_hours, 48);
        assert_eq!(config.remote.bucket.as_deref(), Some("nightly-backups"));
        // Untouched settings keep their defaults.
        assert_eq!(config.remote.max_concurrent_uploads, 4);
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            ValvConfig::load_from_path("config/does-not-exist.yaml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
