//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_yields_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.source.base_url, "http://localhost:8082");
        assert_eq!(config.target.email_url, "http://localhost:8080");
        assert_eq!(config.target.push_url, "http://localhost:8081");
        assert_eq!(config.target.sms_url, "http://localhost:8083");
        assert_eq!(config.migration.get_request_timeout_secs(), 30);
        assert_eq!(config.migration.get_pause_between_campaigns_ms(), 1_000);
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
target:
  push_url: "https://push.internal.example.com"
migration:
  pause_between_campaigns_ms: 0
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.target.push_url, "https://push.internal.example.com");
        assert_eq!(config.target.email_url, "http://localhost:8080");
        assert_eq!(config.migration.get_pause_between_campaigns_ms(), 0);
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        assert!(Config::from_yaml("source: [not, a, map]").is_err());
    }
}
