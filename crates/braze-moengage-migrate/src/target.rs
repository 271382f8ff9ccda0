//! Destination platform adapter: routes fetched campaigns to the MoEngage
//! draft-creation services and wraps the create-draft call.

use crate::batch::{CampaignType, DestinationCredentials};
use crate::config::Config;
use crate::source::CampaignDetail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Errors from the draft dispatch adapter.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The campaign type has no draft service; no network call was made.
    #[error("Unsupported campaign type: {0}")]
    UnsupportedType(CampaignType),

    /// The draft service returned an error status.
    #[error("Migration service error ({status}): {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Remote-provided detail text, or the status line.
        detail: String,
    },

    /// The request exceeded the configured timeout.
    #[error("Migration request timed out after {0} seconds")]
    Timeout(u64),

    /// No response was received (connection refused, DNS failure, etc.).
    #[error("No response from the {service} migration service ({message}). Is the service running?")]
    NoResponse {
        /// Which draft service was addressed.
        service: &'static str,
        /// Underlying transport error text.
        message: String,
    },

    /// The request failed after a response started (e.g. body decode).
    #[error("Migration request failed: {0}")]
    Request(String),
}

/// Response body returned by the draft services.
///
/// The three services share an envelope but differ in optional fields; every
/// field here tolerates absence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchResponse {
    /// Service status message.
    #[serde(default)]
    pub message: Option<String>,

    /// MoEngage-side response, when the service forwarded one.
    #[serde(default)]
    pub moengage_response: Option<MoEngageResponse>,

    /// Push service only: whether the draft was actually created.
    #[serde(default)]
    pub draft_created: Option<bool>,

    /// Push service only: platforms detected in the campaign.
    #[serde(default)]
    pub platforms_detected: Option<Vec<String>>,
}

/// MoEngage-side identifiers echoed back by a draft service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoEngageResponse {
    /// Id of the created draft campaign.
    #[serde(default)]
    pub campaign_id: Option<String>,
}

impl DispatchResponse {
    /// The created draft id, when the service reported one.
    pub fn draft_id(&self) -> Option<&str> {
        self.moengage_response
            .as_ref()
            .and_then(|r| r.campaign_id.as_deref())
    }

    /// Whether the destination reported the draft as created.
    ///
    /// Only the push service sends this flag; absence means created.
    pub fn draft_created(&self) -> bool {
        self.draft_created != Some(false)
    }
}

/// Sends a fetched campaign to the matching draft service.
#[async_trait]
pub trait MoEngageDispatcher: Send + Sync {
    /// Create a destination draft for the fetched campaign.
    async fn dispatch(
        &self,
        detail: &CampaignDetail,
        campaign_type: CampaignType,
        credentials: &DestinationCredentials,
    ) -> Result<DispatchResponse, DispatchError>;
}

/// HTTP client for the three MoEngage draft services.
pub struct MoEngageClient {
    client: reqwest::Client,
    email_url: String,
    push_url: String,
    sms_url: String,
    timeout: Duration,
}

impl MoEngageClient {
    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across adapters).
    pub fn with_client(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            email_url: config.target.email_url.clone(),
            push_url: config.target.push_url.clone(),
            sms_url: config.target.sms_url.clone(),
            timeout: Duration::from_secs(config.migration.get_request_timeout_secs()),
        }
    }

    /// Resolve the draft service endpoint and name for a campaign type.
    ///
    /// Push and multi-channel campaigns share the push service.
    fn endpoint(
        &self,
        campaign_type: CampaignType,
    ) -> Result<(String, &'static str), DispatchError> {
        match campaign_type {
            CampaignType::Email => Ok((format!("{}/v1/migrate-campaign", self.email_url), "email")),
            CampaignType::Push | CampaignType::Multi => Ok((
                format!("{}/v1/migrate-push-campaign", self.push_url),
                "push",
            )),
            CampaignType::Sms => Ok((format!("{}/v1/migrate-sms-campaign", self.sms_url), "sms")),
            other => Err(DispatchError::UnsupportedType(other)),
        }
    }
}

/// Build the request envelope for a draft service.
fn build_envelope(detail: &CampaignDetail, credentials: &DestinationCredentials) -> Value {
    serde_json::json!({
        "campaign": detail.payload(),
        "moengage_credentials": {
            "bearer_token": credentials.bearer_token,
            "refresh_token": credentials.refresh_token,
            "origin": credentials.effective_origin(),
            "api_url": credentials.effective_api_url(),
        }
    })
}

/// Pull the remote error text out of a failure body, falling back to the
/// status line. The services report errors under `detail` or `message`.
fn extract_detail(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("message"))
                .and_then(|d| d.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| status.to_string())
}

#[async_trait]
impl MoEngageDispatcher for MoEngageClient {
    async fn dispatch(
        &self,
        detail: &CampaignDetail,
        campaign_type: CampaignType,
        credentials: &DestinationCredentials,
    ) -> Result<DispatchResponse, DispatchError> {
        let (url, service) = self.endpoint(campaign_type)?;
        let body = build_envelope(detail, credentials);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout(self.timeout.as_secs())
                } else if e.is_connect() {
                    DispatchError::NoResponse {
                        service,
                        message: e.to_string(),
                    }
                } else {
                    DispatchError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        // The draft services signal success with 200 or 201 specifically.
        if !matches!(status.as_u16(), 200 | 201) {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Status {
                status: status.as_u16(),
                detail: extract_detail(&body, status),
            });
        }

        response
            .json::<DispatchResponse>()
            .await
            .map_err(|e| DispatchError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MoEngageClient {
        MoEngageClient::from_config(&Config::default())
    }

    fn credentials() -> DestinationCredentials {
        DestinationCredentials {
            bearer_token: "bearer-xyz".to_string(),
            refresh_token: "refresh-xyz".to_string(),
            origin: String::new(),
            api_url: String::new(),
        }
    }

    #[test]
    fn test_routing_per_campaign_type() {
        let client = client();
        let (email, _) = client.endpoint(CampaignType::Email).unwrap();
        let (push, _) = client.endpoint(CampaignType::Push).unwrap();
        let (multi, _) = client.endpoint(CampaignType::Multi).unwrap();
        let (sms, _) = client.endpoint(CampaignType::Sms).unwrap();

        assert_eq!(email, "http://localhost:8080/v1/migrate-campaign");
        assert_eq!(push, "http://localhost:8081/v1/migrate-push-campaign");
        assert_eq!(multi, push, "multi-channel shares the push service");
        assert_eq!(sms, "http://localhost:8083/v1/migrate-sms-campaign");
    }

    #[test]
    fn test_unsupported_type_fails_before_network() {
        let client = client();
        for t in [
            CampaignType::Banner,
            CampaignType::Webhook,
            CampaignType::Unknown,
        ] {
            match client.endpoint(t) {
                Err(DispatchError::UnsupportedType(got)) => assert_eq!(got, t),
                other => panic!("expected UnsupportedType, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_no_response() {
        let mut config = Config::default();
        config.target.email_url = "http://127.0.0.1:1".to_string();
        let client = MoEngageClient::from_config(&config);
        let detail = CampaignDetail::new(json!({"id": "c1"}));

        let err = client
            .dispatch(&detail, CampaignType::Email, &credentials())
            .await
            .unwrap_err();
        match err {
            DispatchError::NoResponse { service, .. } => assert_eq!(service, "email"),
            other => panic!("expected NoResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_shape() {
        let detail = CampaignDetail::new(json!({
            "campaign": {"id": "c1", "subject": "Hello"}
        }));
        let envelope = build_envelope(&detail, &credentials());

        assert_eq!(envelope["campaign"]["id"], "c1");
        assert_eq!(envelope["moengage_credentials"]["bearer_token"], "bearer-xyz");
        assert_eq!(
            envelope["moengage_credentials"]["origin"],
            crate::batch::DEFAULT_MOENGAGE_ORIGIN
        );
        assert_eq!(
            envelope["moengage_credentials"]["api_url"],
            crate::batch::DEFAULT_MOENGAGE_API_URL
        );
    }

    #[test]
    fn test_response_draft_id_extraction() {
        let response: DispatchResponse = serde_json::from_value(json!({
            "message": "Campaign migrated",
            "moengage_response": {"campaign_id": "draft-42"}
        }))
        .unwrap();
        assert_eq!(response.draft_id(), Some("draft-42"));
        assert!(response.draft_created());
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: DispatchResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.draft_id(), None);
        assert!(response.draft_created());
    }

    #[test]
    fn test_push_response_draft_not_created() {
        let response: DispatchResponse = serde_json::from_value(json!({
            "draft_created": false,
            "platforms_detected": ["android", "ios"]
        }))
        .unwrap();
        assert!(!response.draft_created());
        assert_eq!(
            response.platforms_detected.as_deref(),
            Some(["android".to_string(), "ios".to_string()].as_slice())
        );
    }

    #[test]
    fn test_extract_detail_prefers_detail_then_message() {
        let status = reqwest::StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            extract_detail("{\"detail\": \"bad payload\"}", status),
            "bad payload"
        );
        assert_eq!(
            extract_detail("{\"message\": \"conversion failed\"}", status),
            "conversion failed"
        );
        assert!(extract_detail("<html>", status).contains("422"));
    }
}
