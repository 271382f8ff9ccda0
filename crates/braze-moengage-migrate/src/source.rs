//! Source platform adapter: fetches full campaign definitions from the
//! Braze campaign fetcher service.

use crate::batch::SourceCredentials;
use crate::config::Config;
use async_trait::async_trait;
use serde_json::Value;

/// Header carrying the Braze dashboard URL.
const HEADER_DASHBOARD_URL: &str = "X-Dashboard-Url";
/// Header carrying the dashboard session id.
const HEADER_SESSION_ID: &str = "X-Session-Id";
/// Header carrying the Braze app group id.
const HEADER_APP_GROUP_ID: &str = "X-App-Group-Id";

/// Fully fetched content for one campaign.
///
/// Opaque to the orchestrator beyond being the payload forwarded to the
/// dispatch adapter. Lives for a single migration attempt; retries fetch
/// the campaign again.
#[derive(Debug, Clone)]
pub struct CampaignDetail {
    raw: Value,
}

impl CampaignDetail {
    /// Wrap a fetched response body.
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// The campaign definition to forward to the destination.
    ///
    /// The fetcher service returns the definition either under a `campaign`
    /// key or at the top level; both shapes are accepted.
    pub fn payload(&self) -> &Value {
        self.raw.get("campaign").unwrap_or(&self.raw)
    }

}

/// Errors from the campaign fetch adapter.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Credentials were structurally incomplete; no network call was made.
    #[error("Incomplete Braze credentials: missing {0}")]
    MissingCredential(&'static str),

    /// The fetcher service returned a non-2xx status.
    #[error("Campaign fetch failed ({status}): {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Remote-provided detail text, or the status line.
        detail: String,
    },

    /// No response was received (connection refused, DNS failure, etc.).
    #[error("No response from the campaign fetcher service ({0}). Is the service running?")]
    NoResponse(String),

    /// The request failed after a response started (e.g. body decode).
    #[error("Campaign fetch request failed: {0}")]
    Request(String),
}

/// Fetches full campaign detail for one campaign id.
#[async_trait]
pub trait BrazeFetcher: Send + Sync {
    /// Fetch the full campaign definition for `campaign_id`.
    async fn fetch(
        &self,
        campaign_id: &str,
        credentials: &SourceCredentials,
    ) -> Result<CampaignDetail, FetchError>;
}

/// HTTP client for the campaign fetcher service.
pub struct BrazeClient {
    client: reqwest::Client,
    base_url: String,
}

impl BrazeClient {
    /// Create a client for the fetcher service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.source.base_url.clone())
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across adapters).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl BrazeFetcher for BrazeClient {
    async fn fetch(
        &self,
        campaign_id: &str,
        credentials: &SourceCredentials,
    ) -> Result<CampaignDetail, FetchError> {
        if let Some(field) = credentials.missing_field() {
            return Err(FetchError::MissingCredential(field));
        }

        let url = format!("{}/campaigns/{}/", self.base_url, campaign_id);
        let response = self
            .client
            .get(&url)
            .header(HEADER_DASHBOARD_URL, &credentials.dashboard_url)
            .header(HEADER_SESSION_ID, &credentials.session_id)
            .header(HEADER_APP_GROUP_ID, &credentials.app_group_id)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    FetchError::NoResponse(e.to_string())
                } else {
                    FetchError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                detail: extract_detail(&body, status),
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(CampaignDetail::new(raw))
    }
}

/// Pull the remote `detail` text out of an error body, falling back to the
/// status line when the body has none.
fn extract_detail(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credentials() -> SourceCredentials {
        SourceCredentials {
            dashboard_url: "https://dashboard-03.braze.com".to_string(),
            session_id: "session-abc".to_string(),
            app_group_id: "group-123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_incomplete_credentials_fail_before_network() {
        // Points at a URL that would fail the test if a request were made;
        // the error must be the credential one, not a connection error.
        let client = BrazeClient::new("http://127.0.0.1:1");
        let mut creds = credentials();
        creds.app_group_id = String::new();

        let err = client.fetch("c1", &creds).await.unwrap_err();
        match err {
            FetchError::MissingCredential(field) => assert_eq!(field, "app_group_id"),
            other => panic!("expected MissingCredential, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_no_response() {
        let client = BrazeClient::new("http://127.0.0.1:1");

        let err = client.fetch("c1", &credentials()).await.unwrap_err();
        match err {
            FetchError::NoResponse(message) => {
                assert!(!message.is_empty());
            }
            other => panic!("expected NoResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_unwraps_campaign_key() {
        let detail = CampaignDetail::new(json!({
            "campaign": {"id": "c1", "subject": "Hello"},
            "fetched_at": "2025-01-01T00:00:00Z"
        }));
        assert_eq!(detail.payload()["id"], "c1");
    }

    #[test]
    fn test_payload_accepts_top_level_campaign() {
        let detail = CampaignDetail::new(json!({"id": "c1", "subject": "Hello"}));
        assert_eq!(detail.payload()["id"], "c1");
    }

    #[test]
    fn test_extract_detail_prefers_remote_text() {
        let detail = extract_detail(
            "{\"detail\": \"session expired\"}",
            reqwest::StatusCode::UNAUTHORIZED,
        );
        assert_eq!(detail, "session expired");
    }

    #[test]
    fn test_extract_detail_falls_back_to_status_line() {
        let detail = extract_detail("not json", reqwest::StatusCode::BAD_GATEWAY);
        assert!(detail.contains("502"));
    }
}
