// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Firestore-backed implementation of the document store.
//!
//! Sessions live in `sessions/{session_id}`, leads in `leads/{lead_id}`.
//! Expiry is lazy: expired sessions are marked inactive when a query
//! encounters them, never hard-deleted.

use async_trait::async_trait;
use kurir_core::{DocumentStore, KurirError, Lead, NewSession, Session, SessionPatch};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::client::{FieldEquals, FirestoreClient};

const SESSIONS: &str = "sessions";
const LEADS: &str = "leads";

/// Session and lead persistence over a [`FirestoreClient`].
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: FirestoreClient,
}

impl FirestoreStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn doc_fields(doc: Value) -> Result<Map<String, Value>, KurirError> {
        match doc {
            Value::Object(map) => Ok(map),
            other => Err(KurirError::Store {
                message: format!("expected document object, got {other}"),
                source: None,
            }),
        }
    }

    async fn write_session(&self, session: &Session) -> Result<(), KurirError> {
        let fields = Self::doc_fields(session.to_doc())?;
        self.client
            .set_document(SESSIONS, &session.session_id, &fields)
            .await
    }

    /// Marks an expired session inactive in place. Failures are logged and
    /// swallowed: expiry bookkeeping must not break a read path.
    async fn deactivate_expired(&self, session: &Session) {
        let mut expired = session.clone();
        expired.deactivate();
        if let Err(e) = self.write_session(&expired).await {
            warn!(
                session_id = session.session_id.as_str(),
                error = %e,
                "failed to deactivate expired session"
            );
        } else {
            debug!(
                session_id = session.session_id.as_str(),
                "expired session deactivated"
            );
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn create_session(&self, req: NewSession) -> Result<Session, KurirError> {
        let session = req.into_session();
        self.write_session(&session).await?;
        info!(
            session_id = session.session_id.as_str(),
            entity_id = session.entity_id,
            "created session"
        );
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, KurirError> {
        match self.client.get_document(SESSIONS, session_id).await? {
            Some(fields) => Ok(Some(Session::from_doc(Value::Object(fields))?)),
            None => Ok(None),
        }
    }

    async fn update_session(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Option<Session>, KurirError> {
        let Some(mut session) = self.get_session(session_id).await? else {
            debug!(session_id, "session not found for update");
            return Ok(None);
        };

        session.apply(&patch);
        self.write_session(&session).await?;
        info!(session_id, "updated session");
        Ok(Some(session))
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, KurirError> {
        if self.get_session(session_id).await?.is_none() {
            return Ok(false);
        }
        self.client.delete_document(SESSIONS, session_id).await?;
        info!(session_id, "deleted session");
        Ok(true)
    }

    async fn sessions_by_entity(
        &self,
        entity_id: i64,
        active_only: bool,
    ) -> Result<Vec<Session>, KurirError> {
        let mut predicates = vec![FieldEquals {
            field: "entity_id",
            value: json!(entity_id),
        }];
        if active_only {
            predicates.push(FieldEquals {
                field: "is_active",
                value: json!(true),
            });
        }

        let docs = self.client.run_query(SESSIONS, &predicates).await?;

        let mut sessions = Vec::new();
        for doc in docs {
            let session = match Session::from_doc(Value::Object(doc)) {
                Ok(session) => session,
                Err(e) => {
                    warn!(entity_id, error = %e, "skipping undecodable session document");
                    continue;
                }
            };

            if !session.is_expired() {
                sessions.push(session);
            } else if session.is_active {
                self.deactivate_expired(&session).await;
            }
        }

        debug!(entity_id, count = sessions.len(), "fetched sessions for entity");
        Ok(sessions)
    }

    async fn cleanup_expired_sessions(&self) -> Result<usize, KurirError> {
        let docs = self
            .client
            .run_query(
                SESSIONS,
                &[FieldEquals { field: "is_active", value: json!(true) }],
            )
            .await?;

        let mut cleaned = 0;
        for doc in docs {
            if let Ok(session) = Session::from_doc(Value::Object(doc))
                && session.is_expired()
            {
                self.deactivate_expired(&session).await;
                cleaned += 1;
            }
        }

        if cleaned > 0 {
            info!(count = cleaned, "cleaned up expired sessions");
        }
        Ok(cleaned)
    }

    async fn save_lead(&self, lead: &Lead) -> Result<(), KurirError> {
        let fields = Self::doc_fields(lead.to_doc())?;
        self.client.set_document(LEADS, &lead.lead_id, &fields).await?;
        info!(
            lead_id = lead.lead_id.as_str(),
            source_path = lead.source_path.as_str(),
            "saved lead"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurir_config::model::FirestoreConfig;
    use kurir_core::Command;
    use kurir_core::types::Metadata;
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> FirestoreStore {
        let client = FirestoreClient::new(&FirestoreConfig {
            project_id: "demo-project".into(),
            database: "kommo-webhook".into(),
            auth_token: None,
            timeout_secs: 5,
        })
        .unwrap()
        .with_base_url(server.uri());
        FirestoreStore::new(client)
    }

    fn session_doc(session: &Session) -> Value {
        let fields = match session.to_doc() {
            Value::Object(map) => crate::value::to_fields(&map),
            _ => unreachable!(),
        };
        json!({"document": {"fields": fields}})
    }

    #[tokio::test]
    async fn create_session_writes_sessions_collection() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path_regex(r"/documents/sessions/[0-9a-f-]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "..."})))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        let session = store
            .create_session(NewSession {
                entity_id: Some(500),
                command: Some(Command::MainMenu),
                expires_in_hours: Some(24),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(session.entity_id, Some(500));
        assert!(session.is_active);
    }

    #[tokio::test]
    async fn latest_session_picks_most_recently_updated() {
        let server = MockServer::start().await;

        let mut older = NewSession {
            entity_id: Some(500),
            expires_in_hours: Some(24),
            ..Default::default()
        }
        .into_session();
        let mut newer = older.clone();
        newer.session_id = "newer".into();
        older.session_id = "older".into();
        newer.touch();

        Mock::given(method("POST"))
            .and(path(
                "/projects/demo-project/databases/kommo-webhook/documents:runQuery",
            ))
            .and(body_partial_json(json!({
                "structuredQuery": {"from": [{"collectionId": "sessions"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                session_doc(&older),
                session_doc(&newer),
                {"readTime": "2026-08-04T10:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let latest = store.latest_session_by_entity(500).await.unwrap().unwrap();
        assert_eq!(latest.session_id, "newer");
    }

    #[tokio::test]
    async fn expired_sessions_are_lazily_deactivated_and_filtered() {
        let server = MockServer::start().await;

        let mut expired = NewSession {
            entity_id: Some(500),
            expires_in_hours: Some(1),
            ..Default::default()
        }
        .into_session();
        expired.session_id = "expired".into();
        expired.expires_at = Some(chrono::Utc::now() - chrono::Duration::hours(2));

        Mock::given(method("POST"))
            .and(path_regex(r":runQuery$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                session_doc(&expired),
            ])))
            .mount(&server)
            .await;

        // The lazy deactivation write-back.
        Mock::given(method("PATCH"))
            .and(path_regex(r"/documents/sessions/expired$"))
            .and(body_partial_json(json!({
                "fields": {"is_active": {"booleanValue": false}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "..."})))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        let sessions = store.sessions_by_entity(500, true).await.unwrap();
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn update_session_returns_none_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let result = store
            .update_session("missing", SessionPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_session_applies_patch_and_writes_back() {
        let server = MockServer::start().await;

        let mut session = NewSession {
            entity_id: Some(500),
            expires_in_hours: Some(24),
            ..Default::default()
        }
        .into_session();
        session.session_id = "sess-1".into();
        let fields = match session.to_doc() {
            Value::Object(map) => crate::value::to_fields(&map),
            _ => unreachable!(),
        };

        Mock::given(method("GET"))
            .and(path_regex(r"/documents/sessions/sess-1$"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"fields": fields})),
            )
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path_regex(r"/documents/sessions/sess-1$"))
            .and(body_partial_json(json!({
                "fields": {"command": {"stringValue": "MAIN_MENU"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "..."})))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        let updated = store
            .update_session(
                "sess-1",
                SessionPatch {
                    command: Some(Command::MainMenu),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.command, Some(Command::MainMenu));
    }

    #[tokio::test]
    async fn save_lead_writes_leads_collection() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path_regex(r"/documents/leads/[0-9a-f-]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "..."})))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        let mut lead = Lead::from_event("/incoming/x", json!({"k": "v"}), Metadata::new());
        lead.mark_processed();
        assert!(store.save_lead(&lead).await.is_ok());
    }
}
