//! Remote object storage configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Parameters for the durable remote tier.
///
/// Leaving `bucket` unset disables publication entirely; runs then keep
/// their artifacts local only and say so in the logs.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct RemoteConfig {
    /// Target bucket. Unset means remote storage is not configured.
    #[serde(default)]
    pub bucket: Option<String>,

    /// Bucket region.
    #[serde(default = "default_region")]
    pub region: String,

    /// Key prefix under which artifacts are published.
    #[validate(custom(function = validation::validate_key_prefix))]
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Project tag attached to every published object.
    #[serde(default = "default_project")]
    pub project: String,

    /// Upper bound on concurrent uploads within one run.
    #[validate(range(min = 1, max = 32))]
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
}

fn default_region() -> String {
    "us-east-1".into()
}

fn default_prefix() -> String {
    "backups".into()
}

fn default_project() -> String {
    "valv".into()
}

fn default_max_concurrent_uploads() -> usize {
    4
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: default_region(),
            prefix: default_prefix(),
            project: default_project(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
        }
    }
}

impl RemoteConfig {
    pub fn is_configured(&self) -> bool {
        self.bucket.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn defaults_are_valid_and_unconfigured() {
        let config = RemoteConfig::default();
        config.validate().unwrap();
        assert!(!config.is_configured());
    }

    #[test]
    fn slash_wrapped_prefix_is_rejected() {
        let mut config = RemoteConfig::default();
        config.prefix = "/backups/".into();
        assert!(config.validate().is_err());
    }
}
