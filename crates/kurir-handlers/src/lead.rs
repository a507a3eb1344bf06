// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incoming-lead handler: records every structured event as a lead audit
//! document and reconciles per-entity session state.
//!
//! The design favors never losing an event over strict validation: a missing
//! or malformed entity id disables session logic, but the lead is still
//! persisted. CRM failures degrade to annotated metadata; only a failure to
//! persist the lead itself aborts, leaving the raw payload in the realtime
//! store for manual reconciliation.

use std::sync::Arc;

use async_trait::async_trait;
use kurir_core::{
    Command, CrmClient, CustomFieldUpdate, DocumentStore, EntityType, KurirError, Language, Lead,
    Metadata, NewSession, RealtimeStore, Session, SessionPatch,
};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::handler::{BotIds, Handler, extract_entity_id};

/// Exact button texts of the language-selection menu.
const BAHASA_SELECTOR: &str = "\u{1F1EE}\u{1F1E9} Bahasa";
const ENGLISH_SELECTOR: &str = "\u{1F1EC}\u{1F1E7} English";

/// Lifetime of a session bootstrapped on first contact.
const NEW_SESSION_HOURS: i64 = 24;

/// Handler for incoming lead events.
pub struct IncomingLeadHandler {
    store: Arc<dyn DocumentStore>,
    realtime: Arc<dyn RealtimeStore>,
    crm: Option<Arc<dyn CrmClient>>,
    bots: BotIds,
    custom_message_field_id: i64,
}

impl IncomingLeadHandler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        realtime: Arc<dyn RealtimeStore>,
        crm: Option<Arc<dyn CrmClient>>,
        bots: BotIds,
        custom_message_field_id: i64,
    ) -> Self {
        Self {
            store,
            realtime,
            crm,
            bots,
            custom_message_field_id,
        }
    }

    /// Matches the message against the language-selection buttons.
    fn detect_language(message: &str) -> Option<Language> {
        match message {
            BAHASA_SELECTOR => Some(Language::Id),
            ENGLISH_SELECTOR => Some(Language::En),
            _ => None,
        }
    }

    /// First-contact bootstrap: launch the language-selection bot, then
    /// create a fresh session. Failures are annotated into the lead and do
    /// not abort lead persistence.
    async fn bootstrap_session(&self, entity_id: i64, lead: &mut Lead) {
        let Some(ref crm) = self.crm else {
            warn!(entity_id, "CRM client not available, cannot launch salesbot");
            return;
        };

        match crm
            .launch_salesbot(self.bots.lang_select, entity_id, EntityType::Lead)
            .await
        {
            Ok(result) => {
                info!(
                    entity_id,
                    bot_id = self.bots.lang_select,
                    result = %result,
                    "launched language-selection salesbot"
                );
            }
            Err(e) => {
                error!(
                    entity_id,
                    bot_id = self.bots.lang_select,
                    error = %e,
                    "failed to launch language-selection salesbot"
                );
                lead.metadata.insert("salesbot_launched".into(), json!(false));
                lead.metadata
                    .insert("salesbot_error".into(), json!(e.to_string()));
                return;
            }
        }

        let request = NewSession {
            entity_id: Some(entity_id),
            language: None,
            command: Some(Command::MainMenu),
            expires_in_hours: Some(NEW_SESSION_HOURS),
            metadata: Metadata::new(),
        };
        match self.store.create_session(request).await {
            Ok(session) => {
                info!(
                    entity_id,
                    session_id = session.session_id.as_str(),
                    lead_id = lead.lead_id.as_str(),
                    "created new session for first contact"
                );
                lead.metadata
                    .insert("new_session_created".into(), json!(true));
                lead.metadata
                    .insert("new_session_id".into(), json!(session.session_id));
            }
            Err(e) => {
                error!(entity_id, error = %e, "failed to create session");
                lead.metadata.insert("salesbot_launched".into(), json!(false));
                lead.metadata
                    .insert("salesbot_error".into(), json!(e.to_string()));
            }
        }
    }

    /// Language selection: set and persist the session language when the
    /// message is one of the two selector buttons.
    async fn handle_language_selection(
        &self,
        entity_id: i64,
        session: &Session,
        message: &str,
        lead: &mut Lead,
    ) {
        let Some(language) = Self::detect_language(message) else {
            debug!(
                entity_id,
                session_id = session.session_id.as_str(),
                "message is not a language selection, no state change"
            );
            return;
        };

        let patch = SessionPatch {
            language: Some(language),
            ..Default::default()
        };
        match self.store.update_session(&session.session_id, patch).await {
            Ok(Some(_)) => {
                info!(
                    entity_id,
                    session_id = session.session_id.as_str(),
                    language = %language,
                    "detected and set session language"
                );
                lead.metadata
                    .insert("detected_language".into(), json!(language.to_string()));
            }
            Ok(None) => {
                warn!(
                    entity_id,
                    session_id = session.session_id.as_str(),
                    "session disappeared before language update"
                );
            }
            Err(e) => {
                error!(
                    entity_id,
                    session_id = session.session_id.as_str(),
                    error = %e,
                    "failed to persist detected language"
                );
            }
        }
    }

    /// Recognized command phrase: push the literal text into the custom
    /// field, then launch the reply bot. Failures degrade to annotations.
    async fn handle_command(
        &self,
        entity_id: i64,
        session: &Session,
        message: &str,
        lead: &mut Lead,
    ) {
        info!(
            entity_id,
            session_id = session.session_id.as_str(),
            command = message,
            "message is a recognized command"
        );

        let Some(ref crm) = self.crm else {
            warn!(entity_id, "CRM client not available, cannot update custom fields");
            return;
        };

        let fields = [CustomFieldUpdate::textarea(
            self.custom_message_field_id,
            "Custom Message",
            message,
        )];
        match crm.update_lead_custom_fields(entity_id, &fields).await {
            Ok(result) => {
                info!(
                    entity_id,
                    session_id = session.session_id.as_str(),
                    result = %result,
                    "updated lead custom fields with command message"
                );
            }
            Err(e) => {
                error!(entity_id, error = %e, "failed to update lead custom fields");
                lead.metadata
                    .insert("command_update_error".into(), json!(e.to_string()));
                return;
            }
        }

        match crm
            .launch_salesbot(self.bots.reply, entity_id, EntityType::Lead)
            .await
        {
            Ok(result) => {
                info!(
                    entity_id,
                    bot_id = self.bots.reply,
                    result = %result,
                    "launched reply salesbot"
                );
            }
            Err(e) => {
                error!(entity_id, bot_id = self.bots.reply, error = %e, "failed to launch reply salesbot");
                lead.metadata
                    .insert("reply_bot_error".into(), json!(e.to_string()));
            }
        }
    }
}

#[async_trait]
impl Handler for IncomingLeadHandler {
    fn name(&self) -> &'static str {
        "incoming-lead"
    }

    /// Any non-empty structured payload qualifies; downstream logic no-ops
    /// gracefully for irrelevant shapes.
    fn can_handle(&self, path: &str, data: &Value) -> Result<bool, KurirError> {
        let handles = data.as_object().is_some_and(|map| !map.is_empty());
        if !handles {
            debug!(path, "skipping event without structured data");
        }
        Ok(handles)
    }

    async fn handle(&self, path: &str, data: &Value) -> Result<(), KurirError> {
        info!(path, "processing incoming lead");

        let mut provenance = Metadata::new();
        provenance.insert("handler".into(), json!(self.name()));
        let mut lead = Lead::from_event(path, data.clone(), provenance);

        let entity_id = extract_entity_id(data);
        let message = data
            .get("messages")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("")
            .to_string();

        let mut session = None;
        if let Some(entity_id) = entity_id {
            match self.store.latest_session_by_entity(entity_id).await {
                Ok(Some(found)) => {
                    info!(
                        entity_id,
                        session_id = found.session_id.as_str(),
                        language = ?found.language,
                        "found existing session for entity"
                    );
                    lead.metadata
                        .insert("session_id".into(), json!(found.session_id.clone()));
                    lead.metadata.insert(
                        "session_language".into(),
                        json!(found.language.map(|l| l.to_string())),
                    );
                    session = Some(found);
                }
                Ok(None) => {
                    debug!(entity_id, "no active session found for entity");
                    self.bootstrap_session(entity_id, &mut lead).await;
                }
                Err(e) => {
                    warn!(entity_id, error = %e, "error retrieving session for entity");
                }
            }
        }

        if let (Some(session), Some(entity_id)) = (session.as_ref(), entity_id)
            && !message.is_empty()
        {
            if session.language.is_none() {
                self.handle_language_selection(entity_id, session, &message, &mut lead)
                    .await;
            } else if Command::from_label(&message).is_some() {
                self.handle_command(entity_id, session, &message, &mut lead)
                    .await;
            }
        }

        // The audit write happens regardless of everything above.
        lead.mark_processed();
        if let Err(e) = self.store.save_lead(&lead).await {
            // The raw payload stays in the realtime store for manual
            // reconciliation; the manager contains the propagated error.
            error!(path, lead_id = lead.lead_id.as_str(), error = %e, "failed to save lead");
            return Err(e);
        }

        match self.realtime.delete(path).await {
            Ok(()) => {
                info!(
                    lead_id = lead.lead_id.as_str(),
                    source_path = path,
                    "processed lead and cleaned up source data"
                );
            }
            Err(e) => {
                warn!(
                    lead_id = lead.lead_id.as_str(),
                    source_path = path,
                    error = %e,
                    "lead saved but source data could not be deleted"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurir_test_utils::{MemoryRealtime, MemoryStore, RecordingCrm};

    const FIELD_ID: i64 = 1_069_656;

    fn bots() -> BotIds {
        BotIds {
            lang_select: 66624,
            reply: 66625,
            main_menu_en: 66626,
            main_menu_id: 66627,
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        realtime: Arc<MemoryRealtime>,
        crm: Arc<RecordingCrm>,
        handler: IncomingLeadHandler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let realtime = Arc::new(MemoryRealtime::new("/incoming"));
        let crm = Arc::new(RecordingCrm::new());
        let handler = IncomingLeadHandler::new(
            store.clone(),
            realtime.clone(),
            Some(crm.clone()),
            bots(),
            FIELD_ID,
        );
        Fixture {
            store,
            realtime,
            crm,
            handler,
        }
    }

    async fn seeded_session(store: &MemoryStore, entity_id: i64, language: Option<Language>) -> Session {
        let session = NewSession {
            entity_id: Some(entity_id),
            language,
            command: Some(Command::MainMenu),
            expires_in_hours: Some(24),
            ..Default::default()
        }
        .into_session();
        store.insert_session(session.clone()).await;
        session
    }

    #[test]
    fn can_handle_requires_non_empty_object() {
        let f = fixture();
        assert!(f.handler.can_handle("/e", &json!({"k": "v"})).unwrap());
        assert!(!f.handler.can_handle("/e", &json!({})).unwrap());
        assert!(!f.handler.can_handle("/e", &json!("text")).unwrap());
        assert!(!f.handler.can_handle("/e", &Value::Null).unwrap());
    }

    #[tokio::test]
    async fn first_contact_launches_bot_and_creates_session() {
        let f = fixture();
        f.realtime.seed("/lead-1", json!({"entity_id": "500", "messages": ""})).await;

        f.handler
            .handle("/lead-1", &json!({"entity_id": "500", "messages": ""}))
            .await
            .unwrap();

        let launches = f.crm.bot_launches().await;
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].bot_id, 66624);
        assert_eq!(launches[0].entity_id, 500);
        assert_eq!(launches[0].entity_type, EntityType::Lead);

        let sessions = f.store.sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].entity_id, Some(500));
        assert_eq!(sessions[0].language, None);
        assert_eq!(sessions[0].command, Some(Command::MainMenu));
        assert!(sessions[0].is_active);
        assert!(sessions[0].expires_at.is_some());

        let leads = f.store.leads().await;
        assert_eq!(leads.len(), 1);
        assert!(leads[0].processed);
        assert_eq!(leads[0].metadata["new_session_created"], json!(true));

        // Source payload cleaned up after the audit write.
        assert_eq!(f.realtime.deleted_paths().await, vec!["/lead-1".to_string()]);
    }

    #[tokio::test]
    async fn bot_launch_failure_is_annotated_and_lead_still_saved() {
        let f = fixture();
        f.crm.fail_bot_launches(true);

        f.handler
            .handle("/lead-1", &json!({"entity_id": 500}))
            .await
            .unwrap();

        // No session without a successful bot launch.
        assert!(f.store.sessions().await.is_empty());

        let leads = f.store.leads().await;
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].metadata["salesbot_launched"], json!(false));
        assert!(leads[0].metadata["salesbot_error"].is_string());
        assert_eq!(f.realtime.deleted_paths().await.len(), 1);
    }

    #[tokio::test]
    async fn language_selection_updates_session_without_bot_launch() {
        let f = fixture();
        let session = seeded_session(&f.store, 500, None).await;

        f.handler
            .handle(
                "/lead-2",
                &json!({"entity_id": "500", "messages": "\u{1F1EE}\u{1F1E9} Bahasa"}),
            )
            .await
            .unwrap();

        let stored = f.store.get_session(&session.session_id).await.unwrap().unwrap();
        assert_eq!(stored.language, Some(Language::Id));

        assert!(f.crm.bot_launches().await.is_empty());
        assert!(f.crm.field_updates().await.is_empty());

        let leads = f.store.leads().await;
        assert_eq!(leads[0].metadata["detected_language"], json!("ID"));
        assert_eq!(leads[0].metadata["session_id"], json!(session.session_id));
    }

    #[tokio::test]
    async fn unrecognized_message_leaves_session_untouched() {
        let f = fixture();
        let session = seeded_session(&f.store, 500, None).await;

        f.handler
            .handle("/lead-3", &json!({"entity_id": 500, "messages": "hello there"}))
            .await
            .unwrap();

        let stored = f.store.get_session(&session.session_id).await.unwrap().unwrap();
        assert_eq!(stored.language, None);
        assert!(f.crm.bot_launches().await.is_empty());
        assert_eq!(f.store.leads().await.len(), 1);
    }

    #[tokio::test]
    async fn recognized_command_updates_field_then_launches_reply_bot() {
        let f = fixture();
        seeded_session(&f.store, 500, Some(Language::En)).await;

        f.handler
            .handle("/lead-4", &json!({"entity_id": 500, "messages": "Main Menu"}))
            .await
            .unwrap();

        let updates = f.crm.field_updates().await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].entity_id, 500);
        assert_eq!(updates[0].fields[0].field_id, FIELD_ID);
        assert_eq!(updates[0].fields[0].values[0].value, "Main Menu");

        let launches = f.crm.bot_launches().await;
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].bot_id, 66625);

        // No session mutation on a command message.
        let sessions = f.store.sessions().await;
        assert_eq!(sessions[0].language, Some(Language::En));
        assert_eq!(sessions[0].command, Some(Command::MainMenu));
    }

    #[tokio::test]
    async fn command_field_update_failure_skips_reply_bot() {
        let f = fixture();
        seeded_session(&f.store, 500, Some(Language::En)).await;
        f.crm.fail_field_updates(true);

        f.handler
            .handle("/lead-5", &json!({"entity_id": 500, "messages": "Love Bali"}))
            .await
            .unwrap();

        assert!(f.crm.bot_launches().await.is_empty());
        let leads = f.store.leads().await;
        assert_eq!(leads.len(), 1);
        assert!(leads[0].metadata["command_update_error"].is_string());
    }

    #[tokio::test]
    async fn invalid_entity_id_still_records_lead() {
        let f = fixture();

        f.handler
            .handle("/lead-6", &json!({"entity_id": "not-a-number", "messages": "hi"}))
            .await
            .unwrap();

        assert!(f.store.sessions().await.is_empty());
        assert!(f.crm.bot_launches().await.is_empty());

        let leads = f.store.leads().await;
        assert_eq!(leads.len(), 1);
        assert!(leads[0].processed);
        assert_eq!(f.realtime.deleted_paths().await.len(), 1);
    }

    #[tokio::test]
    async fn lead_persistence_failure_propagates_and_skips_deletion() {
        let f = fixture();
        f.store.fail_save_lead(true);

        let result = f.handler.handle("/lead-7", &json!({"entity_id": 500})).await;
        assert!(result.is_err());
        assert!(f.realtime.deleted_paths().await.is_empty());
    }

    #[tokio::test]
    async fn delete_failure_after_save_is_tolerated() {
        let f = fixture();
        f.realtime.fail_deletes(true);

        f.handler
            .handle("/lead-8", &json!({"entity_id": 500}))
            .await
            .unwrap();

        assert_eq!(f.store.leads().await.len(), 1);
    }

    #[tokio::test]
    async fn session_lookup_failure_degrades_to_no_session() {
        let f = fixture();
        f.store.fail_queries(true);

        f.handler
            .handle("/lead-9", &json!({"entity_id": 500, "messages": "Main Menu"}))
            .await
            .unwrap();

        // No bootstrap, no command handling, but the lead is recorded.
        assert!(f.crm.bot_launches().await.is_empty());
        assert_eq!(f.store.leads().await.len(), 1);
    }

    #[tokio::test]
    async fn without_crm_client_session_bootstrap_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let realtime = Arc::new(MemoryRealtime::default());
        let handler =
            IncomingLeadHandler::new(store.clone(), realtime.clone(), None, bots(), FIELD_ID);

        handler
            .handle("/lead-10", &json!({"entity_id": 500}))
            .await
            .unwrap();

        assert!(store.sessions().await.is_empty());
        assert_eq!(store.leads().await.len(), 1);
    }
}
