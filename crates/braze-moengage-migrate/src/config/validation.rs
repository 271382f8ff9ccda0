//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    check_url("source.base_url", &config.source.base_url)?;
    check_url("target.email_url", &config.target.email_url)?;
    check_url("target.push_url", &config.target.push_url)?;
    check_url("target.sms_url", &config.target.sms_url)?;

    // Timing validation - only check if explicitly set
    if let Some(0) = config.migration.request_timeout_secs {
        return Err(MigrateError::Config(
            "migration.request_timeout_secs must be at least 1".into(),
        ));
    }

    Ok(())
}

fn check_url(field: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(MigrateError::Config(format!("{} is required", field)));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(MigrateError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )));
    }
    if url.ends_with('/') {
        return Err(MigrateError::Config(format!(
            "{} must not end with a trailing slash",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_missing_fetcher_url() {
        let mut config = Config::default();
        config.source.base_url = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_non_http_url() {
        let mut config = Config::default();
        config.target.push_url = "localhost:8081".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_trailing_slash_rejected() {
        let mut config = Config::default();
        config.target.email_url = "http://localhost:8080/".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.migration.request_timeout_secs = Some(0);
        assert!(validate(&config).is_err());
    }
}
