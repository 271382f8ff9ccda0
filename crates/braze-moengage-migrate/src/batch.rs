//! Batch data model: campaign references, platform credentials, and the
//! batch identity signature used for idempotency.

use crate::error::{MigrateError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Default MoEngage dashboard origin when credentials omit one.
pub const DEFAULT_MOENGAGE_ORIGIN: &str = "https://dashboard-01.moengage.com";

/// Default MoEngage draft-creation API URL when credentials omit one.
pub const DEFAULT_MOENGAGE_API_URL: &str =
    "https://dashboard-01.moengage.com/v1.0/campaigns/draft";

/// Campaign channel type as reported by the Braze campaign listing.
///
/// `Multi` is Braze's multi-channel campaign type; it is migrated through
/// the push draft service. Types the listing may report but that cannot be
/// migrated (`Banner`, `Webhook`, `Unknown`) are filtered out before the
/// migration loop starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    Email,
    Push,
    Sms,
    Multi,
    Banner,
    Webhook,
    #[serde(other)]
    Unknown,
}

impl CampaignType {
    /// Whether campaigns of this type can be forwarded to MoEngage.
    pub fn is_migratable(&self) -> bool {
        matches!(
            self,
            CampaignType::Email | CampaignType::Push | CampaignType::Multi | CampaignType::Sms
        )
    }

    /// Human-readable channel name for log messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            CampaignType::Email => "Email",
            CampaignType::Push => "Push",
            CampaignType::Sms => "SMS",
            CampaignType::Multi => "Multi-channel",
            CampaignType::Banner => "Banner",
            CampaignType::Webhook => "Webhook",
            CampaignType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CampaignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Identity and classification metadata for one selected campaign.
///
/// Carries no campaign content; the full definition is fetched per attempt
/// by the source adapter. Immutable after selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRef {
    /// Braze campaign id.
    pub id: String,

    /// Display name from the campaign listing.
    pub name: String,

    /// Channel type.
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,

    /// Number of message variations in the campaign.
    #[serde(default)]
    pub variation_count: usize,
}

/// Braze dashboard session credentials consumed by the fetch adapter.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCredentials {
    /// Braze dashboard URL the session belongs to.
    pub dashboard_url: String,

    /// Dashboard session id.
    pub session_id: String,

    /// Braze app group id.
    pub app_group_id: String,
}

impl SourceCredentials {
    /// Name of the first structurally missing field, if any.
    ///
    /// The fetch adapter fails fast on this before any network call.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.dashboard_url.is_empty() {
            Some("dashboard_url")
        } else if self.session_id.is_empty() {
            Some("session_id")
        } else if self.app_group_id.is_empty() {
            Some("app_group_id")
        } else {
            None
        }
    }
}

impl fmt::Debug for SourceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceCredentials")
            .field("dashboard_url", &self.dashboard_url)
            .field("session_id", &"[REDACTED]")
            .field("app_group_id", &self.app_group_id)
            .finish()
    }
}

/// MoEngage API credentials consumed by the dispatch adapter.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationCredentials {
    /// Bearer token for the MoEngage dashboard API.
    pub bearer_token: String,

    /// Refresh token paired with the bearer token.
    pub refresh_token: String,

    /// Dashboard origin; empty means the standard origin.
    #[serde(default)]
    pub origin: String,

    /// Draft-creation API URL; empty means the standard URL.
    #[serde(default)]
    pub api_url: String,
}

impl DestinationCredentials {
    /// Dashboard origin with the standard fallback applied.
    pub fn effective_origin(&self) -> &str {
        if self.origin.is_empty() {
            DEFAULT_MOENGAGE_ORIGIN
        } else {
            &self.origin
        }
    }

    /// Draft API URL with the standard fallback applied.
    pub fn effective_api_url(&self) -> &str {
        if self.api_url.is_empty() {
            DEFAULT_MOENGAGE_API_URL
        } else {
            &self.api_url
        }
    }

    /// Whether both token fields are present.
    pub fn is_complete(&self) -> bool {
        !self.bearer_token.is_empty() && !self.refresh_token.is_empty()
    }
}

impl fmt::Debug for DestinationCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationCredentials")
            .field("bearer_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("origin", &self.origin)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// The unit of work submitted by the caller: selected campaigns plus the
/// credentials for both platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationBatch {
    /// Selected campaigns, in selection order.
    pub campaigns: Vec<CampaignRef>,

    /// Braze session credentials, immutable for the batch's lifetime.
    pub source_credentials: SourceCredentials,

    /// MoEngage credentials, immutable for the batch's lifetime.
    pub destination_credentials: DestinationCredentials,
}

impl MigrationBatch {
    /// Parse a persisted batch record and validate its structure.
    pub fn from_json(json: &str) -> Result<Self> {
        let batch: Self = serde_json::from_str(json)
            .map_err(|e| MigrateError::precondition(format!("Invalid migration batch: {}", e)))?;
        batch.validate()?;
        Ok(batch)
    }

    /// Validate the hard preconditions for starting a run.
    pub fn validate(&self) -> Result<()> {
        if self.campaigns.is_empty() {
            return Err(MigrateError::precondition(
                "migration batch contains no campaigns",
            ));
        }
        if let Some(field) = self.source_credentials.missing_field() {
            return Err(MigrateError::precondition(format!(
                "Braze credentials are incomplete: missing {}",
                field
            )));
        }
        if !self.destination_credentials.is_complete() {
            return Err(MigrateError::precondition(
                "MoEngage credentials are incomplete: missing bearer_token or refresh_token",
            ));
        }
        Ok(())
    }

    /// Deterministic identity of this batch, used as the idempotency key.
    ///
    /// Computed as a SHA-256 digest over the sorted set of campaign ids, so
    /// two batches selecting the same campaigns collide on the same
    /// signature regardless of selection order or other metadata.
    pub fn signature(&self) -> String {
        let ids: BTreeSet<&str> = self.campaigns.iter().map(|c| c.id.as_str()).collect();
        let mut hasher = Sha256::new();
        for id in &ids {
            hasher.update(id.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// Sorted, deduplicated campaign ids (the set the signature covers).
    pub fn campaign_ids(&self) -> Vec<String> {
        let ids: BTreeSet<&str> = self.campaigns.iter().map(|c| c.id.as_str()).collect();
        ids.into_iter().map(String::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(id: &str, campaign_type: CampaignType) -> CampaignRef {
        CampaignRef {
            id: id.to_string(),
            name: format!("Campaign {}", id),
            campaign_type,
            variation_count: 1,
        }
    }

    fn source_credentials() -> SourceCredentials {
        SourceCredentials {
            dashboard_url: "https://dashboard-03.braze.com".to_string(),
            session_id: "session-abc".to_string(),
            app_group_id: "group-123".to_string(),
        }
    }

    fn destination_credentials() -> DestinationCredentials {
        DestinationCredentials {
            bearer_token: "bearer-xyz".to_string(),
            refresh_token: "refresh-xyz".to_string(),
            origin: String::new(),
            api_url: String::new(),
        }
    }

    fn batch(ids: &[&str]) -> MigrationBatch {
        MigrationBatch {
            campaigns: ids
                .iter()
                .map(|id| campaign(id, CampaignType::Email))
                .collect(),
            source_credentials: source_credentials(),
            destination_credentials: destination_credentials(),
        }
    }

    #[test]
    fn test_signature_is_order_independent() {
        assert_eq!(
            batch(&["a", "b", "c"]).signature(),
            batch(&["c", "b", "a"]).signature()
        );
    }

    #[test]
    fn test_signature_is_set_sensitive() {
        assert_ne!(batch(&["a", "b"]).signature(), batch(&["a", "b", "c"]).signature());
    }

    #[test]
    fn test_signature_ignores_duplicates() {
        assert_eq!(batch(&["a", "b", "b"]).signature(), batch(&["a", "b"]).signature());
    }

    #[test]
    fn test_validate_rejects_empty_batch() {
        let batch = batch(&[]);
        assert!(batch.validate().is_err());
    }

    #[test]
    fn test_validate_names_missing_source_field() {
        let mut batch = batch(&["a"]);
        batch.source_credentials.app_group_id = String::new();
        let err = batch.validate().unwrap_err();
        assert!(err.to_string().contains("app_group_id"));
    }

    #[test]
    fn test_validate_rejects_incomplete_destination_credentials() {
        let mut batch = batch(&["a"]);
        batch.destination_credentials.bearer_token = String::new();
        assert!(batch.validate().is_err());
    }

    #[test]
    fn test_from_json_round_trip() {
        let json = serde_json::to_string(&batch(&["a", "b"])).unwrap();
        let parsed = MigrationBatch::from_json(&json).unwrap();
        assert_eq!(parsed.campaigns.len(), 2);
        assert_eq!(parsed.campaigns[0].campaign_type, CampaignType::Email);
    }

    #[test]
    fn test_from_json_rejects_malformed_record() {
        assert!(MigrationBatch::from_json("{\"campaigns\": 42}").is_err());
    }

    #[test]
    fn test_campaign_type_migratability() {
        assert!(CampaignType::Email.is_migratable());
        assert!(CampaignType::Push.is_migratable());
        assert!(CampaignType::Multi.is_migratable());
        assert!(CampaignType::Sms.is_migratable());
        assert!(!CampaignType::Banner.is_migratable());
        assert!(!CampaignType::Webhook.is_migratable());
        assert!(!CampaignType::Unknown.is_migratable());
    }

    #[test]
    fn test_campaign_type_unknown_catch_all() {
        let parsed: CampaignType = serde_json::from_str("\"in_app_message\"").unwrap();
        assert_eq!(parsed, CampaignType::Unknown);
    }

    #[test]
    fn test_source_credentials_debug_redacts_session() {
        let creds = source_credentials();
        let debug_output = format!("{:?}", creds);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("session-abc"));
    }

    #[test]
    fn test_destination_credentials_debug_redacts_tokens() {
        let creds = destination_credentials();
        let debug_output = format!("{:?}", creds);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("bearer-xyz"));
        assert!(!debug_output.contains("refresh-xyz"));
    }

    #[test]
    fn test_destination_credential_fallbacks() {
        let creds = destination_credentials();
        assert_eq!(creds.effective_origin(), DEFAULT_MOENGAGE_ORIGIN);
        assert_eq!(creds.effective_api_url(), DEFAULT_MOENGAGE_API_URL);

        let custom = DestinationCredentials {
            origin: "https://dashboard-02.moengage.com".to_string(),
            ..destination_credentials()
        };
        assert_eq!(custom.effective_origin(), "https://dashboard-02.moengage.com");
    }
}
