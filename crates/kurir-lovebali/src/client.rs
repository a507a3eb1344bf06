// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Love Bali visitor-levy API.
//!
//! One endpoint matters to the bridge: `bpd/single_scan_passport`, which
//! resolves a passport number to a levy voucher. Errors keep the upstream
//! HTTP status so the handler layer can distinguish auth/not-found responses
//! from transient faults.

use std::time::Duration;

use async_trait::async_trait;
use kurir_config::model::LoveBaliConfig;
use kurir_core::{KurirError, PassportLookup, PassportScan};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

/// Envelope the scan endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    data: Option<PassportScan>,
}

/// Client for the Love Bali API.
#[derive(Debug, Clone)]
pub struct LoveBaliClient {
    http: reqwest::Client,
    base_url: String,
}

impl LoveBaliClient {
    /// Creates a new Love Bali API client from configuration.
    pub fn new(config: &LoveBaliConfig) -> Result<Self, KurirError> {
        let mut base_url = config.base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", config.api_token.trim())).map_err(
                |e| KurirError::Config(format!("invalid Love Bali token header value: {e}")),
            )?,
        );
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KurirError::Passport {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
            })?;

        info!(base_url = base_url.as_str(), "initialized Love Bali API client");

        Ok(Self { http, base_url })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    fn with_base_url(mut self, url: String) -> Self {
        self.base_url = format!("{}/", url.trim_end_matches('/'));
        self
    }

    /// Submits a passport number to the single-scan endpoint.
    pub async fn single_scan_passport(
        &self,
        passport_number: &str,
    ) -> Result<PassportScan, KurirError> {
        let url = format!("{}bpd/single_scan_passport", self.base_url);
        debug!(url = url.as_str(), "calling Love Bali single scan");

        let response = self
            .http
            .post(&url)
            .json(&json!({"passport_number": passport_number}))
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("Love Bali request to {url} timed out")
                } else {
                    format!("Love Bali request to {url} failed: {e}")
                };
                KurirError::Passport { message, status: None }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KurirError::Passport {
                message: format!("Love Bali returned {status}: {body}"),
                status: Some(status.as_u16()),
            });
        }

        let envelope: ScanResponse = response.json().await.map_err(|e| KurirError::Passport {
            message: format!("Love Bali returned an undecodable response: {e}"),
            status: None,
        })?;

        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl PassportLookup for LoveBaliClient {
    async fn scan(&self, passport_number: &str) -> Result<PassportScan, KurirError> {
        self.single_scan_passport(passport_number).await
    }
}
