//! Configuration type definitions for the boundary service endpoints.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// Covers the four boundary services (campaign fetcher plus the three draft
/// services) and migration timing. The embedding caller owns where this
/// comes from; [`Config::default`] reproduces the standard local deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Campaign fetcher service (Braze side).
    #[serde(default)]
    pub source: SourceServiceConfig,

    /// Draft-creation services (MoEngage side).
    #[serde(default)]
    pub target: TargetServicesConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Campaign fetcher service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceServiceConfig {
    /// Base URL of the campaign fetcher service.
    #[serde(default = "default_fetcher_url")]
    pub base_url: String,
}

impl Default for SourceServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_fetcher_url(),
        }
    }
}

/// Draft-creation service endpoints, one per channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetServicesConfig {
    /// Base URL of the email draft service.
    #[serde(default = "default_email_url")]
    pub email_url: String,

    /// Base URL of the push draft service (also handles multi-channel).
    #[serde(default = "default_push_url")]
    pub push_url: String,

    /// Base URL of the SMS draft service.
    #[serde(default = "default_sms_url")]
    pub sms_url: String,
}

impl Default for TargetServicesConfig {
    fn default() -> Self {
        Self {
            email_url: default_email_url(),
            push_url: default_push_url(),
            sms_url: default_sms_url(),
        }
    }
}

/// Migration behavior configuration.
///
/// Fields use `Option<T>` to distinguish "not set" (use the default) from
/// "explicitly set".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Per-request timeout for draft-creation calls, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Pause between campaigns, in milliseconds. Keeps progress observable
    /// and avoids bursts against the destination API; zero is allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_between_campaigns_ms: Option<u64>,
}

impl MigrationConfig {
    pub fn get_request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs.unwrap_or(30)
    }

    pub fn get_pause_between_campaigns_ms(&self) -> u64 {
        self.pause_between_campaigns_ms.unwrap_or(1_000)
    }
}

// Default value functions for serde

fn default_fetcher_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_email_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_push_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_sms_url() -> String {
    "http://localhost:8083".to_string()
}
