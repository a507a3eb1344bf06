// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Kommo CRM API.
//!
//! Provides [`KommoClient`] which handles request construction, bearer-token
//! authentication, and transient error retry. Lead operations use the v4
//! API; salesbot operations use the v2 API.

use std::time::Duration;

use async_trait::async_trait;
use kurir_config::model::KommoConfig;
use kurir_core::{CrmClient, CustomFieldUpdate, EntityType, KurirError};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::types::{AccountInfo, Pipeline, SalesbotRun};

/// Longest honored `Retry-After` delay for rate-limited requests.
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Which versioned API surface a request targets.
#[derive(Debug, Clone, Copy)]
enum ApiVersion {
    V2,
    V4,
}

/// HTTP client for Kommo API communication.
///
/// Manages authentication headers, connection pooling, and retry logic for
/// transient errors (timeouts, 429, 5xx). Authentication failures (401) are
/// surfaced immediately without retry.
#[derive(Debug, Clone)]
pub struct KommoClient {
    http: reqwest::Client,
    base_url_v4: String,
    base_url_v2: String,
    max_retries: u32,
}

impl KommoClient {
    /// Creates a new Kommo API client from configuration.
    pub fn new(config: &KommoConfig) -> Result<Self, KurirError> {
        let subdomain = config.subdomain.trim();
        if subdomain.is_empty() {
            return Err(KurirError::Config("kommo.subdomain is required".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", config.access_token)).map_err(|e| {
                KurirError::Config(format!("invalid access token header value: {e}"))
            })?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KurirError::Crm {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        info!(subdomain, "initialized Kommo API client");

        Ok(Self {
            http,
            base_url_v4: format!("https://{subdomain}.kommo.com/api/v4/"),
            base_url_v2: format!("https://{subdomain}.kommo.com/api/v2/"),
            max_retries: config.max_retries,
        })
    }

    /// Overrides both base URLs (for testing with wiremock).
    #[cfg(test)]
    fn with_base_urls(mut self, v4: String, v2: String) -> Self {
        self.base_url_v4 = v4;
        self.base_url_v2 = v2;
        self
    }

    fn url_for(&self, version: ApiVersion, endpoint: &str) -> String {
        let base = match version {
            ApiVersion::V2 => &self.base_url_v2,
            ApiVersion::V4 => &self.base_url_v4,
        };
        format!("{}{}", base, endpoint.trim_start_matches('/'))
    }

    /// Sends one API request with transient-error retry.
    async fn request(
        &self,
        method: Method,
        version: ApiVersion,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, KurirError> {
        let url = self.url_for(version, endpoint);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, url = url.as_str(), "retrying Kommo request");
            }

            let mut request = self.http.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let message = format!("request to {url} failed: {e}");
                    if attempt < self.max_retries {
                        warn!(error = %e, "transient request failure, will retry");
                        last_error = Some(KurirError::Crm {
                            message,
                            status: None,
                            source: Some(Box::new(e)),
                        });
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                    return Err(KurirError::Crm {
                        message,
                        status: None,
                        source: Some(Box::new(e)),
                    });
                }
            };

            let status = response.status();
            debug!(status = %status, attempt, url = url.as_str(), "Kommo response received");

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt < self.max_retries {
                    let retry_after = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(MAX_RETRY_AFTER_SECS)
                        .min(MAX_RETRY_AFTER_SECS);
                    warn!(retry_after, "rate limit exceeded, backing off");
                    tokio::time::sleep(Duration::from_secs(retry_after)).await;
                    last_error = Some(KurirError::Crm {
                        message: "rate limit exceeded".to_string(),
                        status: Some(429),
                        source: None,
                    });
                    continue;
                }
                return Err(KurirError::Crm {
                    message: "rate limit exceeded and max retries reached".to_string(),
                    status: Some(429),
                    source: None,
                });
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(KurirError::Crm {
                    message: "authentication failed, check the access token".to_string(),
                    status: Some(401),
                    source: None,
                });
            }

            if status.is_server_error() && attempt < self.max_retries {
                let body_text = response.text().await.unwrap_or_default();
                warn!(status = %status, body = body_text.as_str(), "server error, will retry");
                last_error = Some(KurirError::Crm {
                    message: format!("Kommo returned {status}: {body_text}"),
                    status: Some(status.as_u16()),
                    source: None,
                });
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            if !status.is_success() {
                let body_text = response.text().await.unwrap_or_default();
                return Err(KurirError::Crm {
                    message: format!("Kommo returned {status}: {body_text}"),
                    status: Some(status.as_u16()),
                    source: None,
                });
            }

            let body_text = response.text().await.map_err(|e| KurirError::Crm {
                message: format!("failed to read response body: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;
            // Some endpoints answer 204/empty; normalize to an empty object.
            if body_text.trim().is_empty() {
                return Ok(json!({}));
            }
            return match serde_json::from_str(&body_text) {
                Ok(value) => Ok(value),
                Err(_) => Ok(json!({"raw_response": body_text})),
            };
        }

        Err(last_error.unwrap_or_else(|| KurirError::Crm {
            message: "request failed after retries".to_string(),
            status: None,
            source: None,
        }))
    }

    /// Updates custom-field values on a lead via the v4 API.
    pub async fn patch_lead_custom_fields(
        &self,
        lead_id: i64,
        fields: &[CustomFieldUpdate],
    ) -> Result<Value, KurirError> {
        if fields.is_empty() {
            return Err(KurirError::Crm {
                message: "custom fields list cannot be empty".to_string(),
                status: None,
                source: None,
            });
        }

        let body = json!({"custom_fields_values": fields});
        let result = self
            .request(
                Method::PATCH,
                ApiVersion::V4,
                &format!("leads/{lead_id}"),
                Some(&body),
            )
            .await?;
        info!(lead_id, count = fields.len(), "updated lead custom fields");
        Ok(result)
    }

    /// Launches a salesbot against an entity via the v2 API.
    ///
    /// The endpoint expects an array of launch requests even for one bot.
    pub async fn run_salesbot(
        &self,
        bot_id: i64,
        entity_id: i64,
        entity_type: EntityType,
    ) -> Result<Value, KurirError> {
        let body = serde_json::to_value([SalesbotRun {
            bot_id,
            entity_id,
            entity_type: entity_type.code().to_string(),
        }])
        .map_err(|e| KurirError::Internal(format!("failed to encode salesbot request: {e}")))?;

        let result = self
            .request(Method::POST, ApiVersion::V2, "salesbot/run", Some(&body))
            .await?;
        info!(bot_id, entity_id, entity_type = entity_type.code(), "launched salesbot");
        Ok(result)
    }

    /// Fetches account metadata; doubles as the bootstrap connectivity check.
    pub async fn account_info(&self) -> Result<AccountInfo, KurirError> {
        let value = self
            .request(Method::GET, ApiVersion::V4, "account", None)
            .await?;
        serde_json::from_value(value).map_err(|e| KurirError::Crm {
            message: format!("failed to decode account response: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })
    }

    /// Fetches the lead pipelines configured on the account.
    pub async fn pipelines(&self) -> Result<Vec<Pipeline>, KurirError> {
        let value = self
            .request(Method::GET, ApiVersion::V4, "leads/pipelines", None)
            .await?;
        let pipelines = value
            .pointer("/_embedded/pipelines")
            .cloned()
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(pipelines).map_err(|e| KurirError::Crm {
            message: format!("failed to decode pipelines response: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl CrmClient for KommoClient {
    async fn update_lead_custom_fields(
        &self,
        entity_id: i64,
        fields: &[CustomFieldUpdate],
    ) -> Result<Value, KurirError> {
        self.patch_lead_custom_fields(entity_id, fields).await
    }

    async fn launch_salesbot(
        &self,
        bot_id: i64,
        entity_id: i64,
        entity_type: EntityType,
    ) -> Result<Value, KurirError> {
        self.run_salesbot(bot_id, entity_id, entity_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer, max_retries: u32) -> KommoClient {
        KommoClient::new(&KommoConfig {
            subdomain: "demo".into(),
            access_token: "token-123".into(),
            timeout_secs: 5,
            max_retries,
            ..Default::default()
        })
        .unwrap()
        .with_base_urls(format!("{}/v4/", server.uri()), format!("{}/v2/", server.uri()))
    }

    #[tokio::test]
    async fn patch_lead_custom_fields_hits_v4_leads() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v4/leads/12345"))
            .and(header("Authorization", "Bearer token-123"))
            .and(body_partial_json(json!({
                "custom_fields_values": [{
                    "field_id": 1069656,
                    "values": [{"value": "Main Menu"}]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12345})))
            .mount(&server)
            .await;

        let client = test_client(&server, 0);
        let fields = [CustomFieldUpdate::textarea(1069656, "Custom Message", "Main Menu")];
        let result = client.patch_lead_custom_fields(12345, &fields).await.unwrap();
        assert_eq!(result["id"], 12345);
    }

    #[tokio::test]
    async fn empty_custom_fields_rejected_without_request() {
        let server = MockServer::start().await;
        let client = test_client(&server, 0);
        let err = client.patch_lead_custom_fields(1, &[]).await.unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[tokio::test]
    async fn run_salesbot_posts_array_to_v2() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/salesbot/run"))
            .and(body_json(json!([{
                "bot_id": 66624,
                "entity_id": 500,
                "entity_type": "2"
            }])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let client = test_client(&server, 0);
        let result = client.run_salesbot(66624, 500, EntityType::Lead).await.unwrap();
        assert_eq!(result["success"], true);
    }

    #[tokio::test]
    async fn retries_on_429_with_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/account"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("Retry-After", "0"),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v4/account"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "name": "Demo", "subdomain": "demo"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server, 2);
        let account = client.account_info().await.unwrap();
        assert_eq!(account.subdomain.as_deref(), Some("demo"));
    }

    #[tokio::test]
    async fn unauthorized_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/account"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"title": "Unauthorized"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, 3);
        let err = client.account_info().await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn server_error_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/account"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server, 1);
        let err = client.account_info().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn pipelines_decodes_embedded_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/leads/pipelines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": {"pipelines": [
                    {"id": 1, "name": "Main", "is_main": true},
                    {"id": 2, "name": "Secondary"}
                ]}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server, 0);
        let pipelines = client.pipelines().await.unwrap();
        assert_eq!(pipelines.len(), 2);
        assert!(pipelines[0].is_main);
        assert_eq!(pipelines[1].name.as_deref(), Some("Secondary"));
    }
}
