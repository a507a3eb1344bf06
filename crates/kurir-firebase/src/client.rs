// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Firebase Realtime Database REST surface.
//!
//! Provides [`FirebaseClient`] which handles path resolution against the
//! configured base path, authenticated reads/writes/deletes, and opening the
//! streaming events connection.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use kurir_config::model::FirebaseConfig;
use kurir_core::{KurirError, RealtimeStore};
use serde_json::Value;
use tracing::debug;

use crate::sse::{self, StreamEvent};

/// Client for one Realtime Database, scoped to a base path.
///
/// Event paths delivered by the subscription are relative to the base path;
/// [`absolute_path`](FirebaseClient::absolute_path) joins them back onto it
/// before building request URLs.
#[derive(Debug, Clone)]
pub struct FirebaseClient {
    http: reqwest::Client,
    database_url: String,
    base_path: String,
    auth_token: Option<String>,
}

impl FirebaseClient {
    /// Creates a new Realtime Database client from configuration.
    pub fn new(config: &FirebaseConfig) -> Result<Self, KurirError> {
        let database_url = config.database_url.trim().trim_end_matches('/').to_string();
        if database_url.is_empty() {
            return Err(KurirError::Config(
                "firebase.database_url is required".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KurirError::Realtime {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            database_url,
            base_path: config.base_path.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Joins a subscription-relative event path onto the configured base path.
    pub fn absolute_path(&self, event_path: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        let relative = event_path.trim_start_matches('/');
        if relative.is_empty() {
            if base.is_empty() {
                "/".to_string()
            } else {
                base.to_string()
            }
        } else {
            format!("{base}/{relative}")
        }
    }

    fn url_for(&self, absolute_path: &str) -> String {
        let path = absolute_path.trim_start_matches('/');
        let mut url = format!("{}/{}.json", self.database_url, path);
        if let Some(ref token) = self.auth_token {
            url.push_str(&format!("?auth={token}"));
        }
        url
    }

    fn stream_url(&self) -> String {
        self.url_for(&self.base_path)
    }

    /// Opens the streaming events connection on the base path and returns a
    /// stream of typed change events.
    ///
    /// The connection has no read timeout: the server keeps it open and sends
    /// keep-alives. Callers own reconnection.
    pub async fn stream_events(
        &self,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, KurirError>> + Send>>, KurirError>
    {
        let url = self.stream_url();
        debug!(url = url.as_str(), "opening realtime event stream");

        let response = self
            .http
            .get(&url)
            .header("Accept", "text/event-stream")
            .timeout(Duration::from_secs(u64::MAX / 4))
            .send()
            .await
            .map_err(|e| KurirError::Realtime {
                message: format!("failed to open event stream: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KurirError::Realtime {
                message: format!("event stream rejected with {status}: {body}"),
                source: None,
            });
        }

        Ok(sse::parse_event_stream(response))
    }

    async fn request_json(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
        path: &str,
    ) -> Result<Value, KurirError> {
        let response = request.send().await.map_err(|e| KurirError::Realtime {
            message: format!("{action} at `{path}` failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KurirError::Realtime {
                message: format!("{action} at `{path}` returned {status}: {body}"),
                source: None,
            });
        }

        response.json().await.map_err(|e| KurirError::Realtime {
            message: format!("{action} at `{path}` returned invalid JSON: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl RealtimeStore for FirebaseClient {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, KurirError> {
        let absolute = self.absolute_path(path);
        let value = self
            .request_json(self.http.get(self.url_for(&absolute)), "read", &absolute)
            .await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), KurirError> {
        let absolute = self.absolute_path(path);
        self.request_json(
            self.http.put(self.url_for(&absolute)).json(value),
            "write",
            &absolute,
        )
        .await?;
        debug!(path = absolute.as_str(), "wrote realtime data");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), KurirError> {
        let absolute = self.absolute_path(path);
        // The REST API returns 200 with a null body whether or not the path
        // existed, which gives delete its idempotence.
        self.request_json(self.http.delete(self.url_for(&absolute)), "delete", &absolute)
            .await?;
        debug!(path = absolute.as_str(), "deleted realtime data");
        Ok(())
    }
}
