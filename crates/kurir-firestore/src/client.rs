// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Firestore REST document surface.
//!
//! Covers exactly what the bridge needs: get/replace/delete a document by id
//! and equality queries via `:runQuery`. Authentication is an optional OAuth
//! bearer token; without one, requests target an emulator or open rules.

use std::time::Duration;

use kurir_config::model::FirestoreConfig;
use kurir_core::KurirError;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::value;

const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";

/// Client for one Firestore database.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    base_url: String,
    /// `projects/{project}/databases/{database}/documents`
    parent: String,
    auth_token: Option<String>,
}

/// One equality predicate for [`FirestoreClient::run_query`].
#[derive(Debug, Clone)]
pub struct FieldEquals {
    pub field: &'static str,
    pub value: Value,
}

impl FirestoreClient {
    /// Creates a new Firestore client from configuration.
    pub fn new(config: &FirestoreConfig) -> Result<Self, KurirError> {
        let project_id = config.project_id.trim();
        if project_id.is_empty() {
            return Err(KurirError::Config(
                "firestore.project_id is required".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KurirError::Store {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: FIRESTORE_API_BASE.to_string(),
            parent: format!(
                "projects/{}/databases/{}/documents",
                project_id, config.database
            ),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn document_url(&self, collection: &str, document_id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url, self.parent, collection, document_id
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetches a document, decoded to a plain JSON map. `None` when absent.
    pub async fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Map<String, Value>>, KurirError> {
        let url = self.document_url(collection, document_id);
        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .map_err(|e| request_error("get", collection, document_id, e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status("get", collection, document_id, response).await?;

        let document: Value = response
            .json()
            .await
            .map_err(|e| request_error("decode", collection, document_id, e))?;
        Ok(Some(value::from_document(&document)))
    }

    /// Creates or fully replaces a document with the given plain JSON fields.
    pub async fn set_document(
        &self,
        collection: &str,
        document_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), KurirError> {
        let url = self.document_url(collection, document_id);
        let body = json!({"fields": value::to_fields(fields)});

        let response = self
            .authorized(self.http.patch(&url).json(&body))
            .send()
            .await
            .map_err(|e| request_error("set", collection, document_id, e))?;
        check_status("set", collection, document_id, response).await?;

        debug!(collection, document_id, "document written");
        Ok(())
    }

    /// Deletes a document. Firestore reports success for absent documents.
    pub async fn delete_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<(), KurirError> {
        let url = self.document_url(collection, document_id);
        let response = self
            .authorized(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| request_error("delete", collection, document_id, e))?;
        check_status("delete", collection, document_id, response).await?;
        Ok(())
    }

    /// Runs an equality query over one collection and returns the matching
    /// documents as plain JSON maps.
    pub async fn run_query(
        &self,
        collection: &str,
        predicates: &[FieldEquals],
    ) -> Result<Vec<Map<String, Value>>, KurirError> {
        let filters: Vec<Value> = predicates
            .iter()
            .map(|p| {
                json!({
                    "fieldFilter": {
                        "field": {"fieldPath": p.field},
                        "op": "EQUAL",
                        "value": value::encode(&p.value),
                    }
                })
            })
            .collect();

        let where_clause = match filters.len() {
            0 => Value::Null,
            1 => filters[0].clone(),
            _ => json!({"compositeFilter": {"op": "AND", "filters": filters}}),
        };

        let mut structured_query = json!({
            "from": [{"collectionId": collection}],
        });
        if !where_clause.is_null() {
            structured_query["where"] = where_clause;
        }

        let url = format!("{}/{}:runQuery", self.base_url, self.parent);
        let response = self
            .authorized(
                self.http
                    .post(&url)
                    .json(&json!({"structuredQuery": structured_query})),
            )
            .send()
            .await
            .map_err(|e| request_error("query", collection, "-", e))?;
        let response = check_status("query", collection, "-", response).await?;

        // :runQuery streams one JSON object per result; the final element
        // may carry only a readTime.
        let results: Vec<Value> = response
            .json()
            .await
            .map_err(|e| request_error("decode", collection, "-", e))?;

        Ok(results
            .iter()
            .filter_map(|entry| entry.get("document"))
            .map(value::from_document)
            .collect())
    }
}

fn request_error(
    action: &str,
    collection: &str,
    document_id: &str,
    error: impl std::error::Error + Send + Sync + 'static,
) -> KurirError {
    KurirError::Store {
        message: format!("{action} on {collection}/{document_id} failed: {error}"),
        source: Some(Box::new(error)),
    }
}

async fn check_status(
    action: &str,
    collection: &str,
    document_id: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, KurirError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(KurirError::Store {
        message: format!("{action} on {collection}/{document_id} returned {status}: {body}"),
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> FirestoreClient {
        FirestoreClient::new(&FirestoreConfig {
            project_id: "demo-project".into(),
            database: "kommo-webhook".into(),
            auth_token: None,
            timeout_secs: 5,
        })
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    const DOC_PATH: &str =
        "/projects/demo-project/databases/kommo-webhook/documents/sessions/sess-1";

    #[tokio::test]
    async fn get_document_decodes_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo-project/databases/kommo-webhook/documents/sessions/sess-1",
                "fields": {
                    "session_id": {"stringValue": "sess-1"},
                    "entity_id": {"integerValue": "500"},
                    "is_active": {"booleanValue": true}
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let doc = client.get_document("sessions", "sess-1").await.unwrap().unwrap();
        assert_eq!(doc["session_id"], json!("sess-1"));
        assert_eq!(doc["entity_id"], json!(500));
        assert_eq!(doc["is_active"], json!(true));
    }

    #[tokio::test]
    async fn get_document_absent_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.get_document("sessions", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_document_encodes_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(DOC_PATH))
            .and(body_partial_json(json!({
                "fields": {"session_id": {"stringValue": "sess-1"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "..."})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut fields = Map::new();
        fields.insert("session_id".into(), json!("sess-1"));
        assert!(client.set_document("sessions", "sess-1", &fields).await.is_ok());
    }

    #[tokio::test]
    async fn run_query_builds_composite_filter_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/projects/demo-project/databases/kommo-webhook/documents:runQuery",
            ))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "from": [{"collectionId": "sessions"}],
                    "where": {"compositeFilter": {"op": "AND"}}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"document": {"fields": {"session_id": {"stringValue": "s1"}}}},
                {"document": {"fields": {"session_id": {"stringValue": "s2"}}}},
                {"readTime": "2026-08-04T10:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let docs = client
            .run_query(
                "sessions",
                &[
                    FieldEquals { field: "entity_id", value: json!(500) },
                    FieldEquals { field: "is_active", value: json!(true) },
                ],
            )
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["session_id"], json!("s1"));
        assert_eq!(docs[1]["session_id"], json!("s2"));
    }

    #[tokio::test]
    async fn server_error_maps_to_store_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.get_document("sessions", "s").await.unwrap_err();
        assert!(matches!(err, KurirError::Store { .. }));
    }
}
