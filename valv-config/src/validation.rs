//! Custom validation functions for configuration.
//!
//! Shared validation logic used across multiple configuration modules.

use validator::ValidationError;

/// Validate alert severity level.
pub fn validate_severity(level: &str) -> Result<(), ValidationError> {
    let valid = ["low", "medium", "high", "critical"].contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_severity"))
    }
}

/// Validate that a database URL uses a scheme the dump tool understands.
pub fn validate_database_url(url: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^postgres(ql)?://")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(url) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_database_url"))
    }
}

/// Validate a remote key prefix: non-empty path segments without leading
/// or trailing slashes, so key composition stays deterministic.
pub fn validate_key_prefix(prefix: &str) -> Result<(), ValidationError> {
    let valid = !prefix.is_empty()
        && !prefix.starts_with('/')
        && !prefix.ends_with('/')
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_key_prefix"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_levels() {
        for level in ["low", "medium", "HIGH", "critical"] {
            validate_severity(level).unwrap();
        }
        assert!(validate_severity("urgent").is_err());
    }

    #[test]
    fn key_prefixes() {
        validate_key_prefix("backups").unwrap();
        validate_key_prefix("team/backups").unwrap();
        assert!(validate_key_prefix("").is_err());
        assert!(validate_key_prefix("/backups").is_err());
        assert!(validate_key_prefix("backups/").is_err());
    }
}
