// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incoming-message handler: the passport-verification state machine.
//!
//! The conversational state rides in the payload's `state` field, layered
//! over the entity's latest session for localization and command context:
//!
//! - `INITIAL` (also the default for payloads without a state): prompt the
//!   user for their passport number, nothing else.
//! - `AWAITING_PASSPORT_NUMBER`: normalize and validate the reply, look the
//!   passport up, answer with the localized result, and on success advance
//!   the session to the main menu and launch the language-appropriate
//!   main-menu bot.
//!
//! Every outbound message travels the same two-step channel: write the text
//! into the CRM custom field, then launch the reply bot. Both steps fail and
//! log independently; end users only ever see catalog messages, never
//! internal errors.

use std::sync::Arc;

use async_trait::async_trait;
use kurir_core::{
    Command, CrmClient, CustomFieldUpdate, DocumentStore, EntityType, KurirError, Language,
    PassportLookup, RealtimeStore, Session, SessionPatch,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::catalog::{MessageKey, get_message, render_passport_found};
use crate::handler::{BotIds, Handler, extract_entity_id, extract_message};

const STATE_INITIAL: &str = "INITIAL";
const STATE_AWAITING_PASSPORT: &str = "AWAITING_PASSPORT_NUMBER";

/// Handler for incoming conversational messages.
pub struct IncomingMessageHandler {
    store: Arc<dyn DocumentStore>,
    realtime: Arc<dyn RealtimeStore>,
    crm: Option<Arc<dyn CrmClient>>,
    passport: Option<Arc<dyn PassportLookup>>,
    bots: BotIds,
    custom_message_field_id: i64,
}

impl IncomingMessageHandler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        realtime: Arc<dyn RealtimeStore>,
        crm: Option<Arc<dyn CrmClient>>,
        passport: Option<Arc<dyn PassportLookup>>,
        bots: BotIds,
        custom_message_field_id: i64,
    ) -> Self {
        Self {
            store,
            realtime,
            crm,
            passport,
            bots,
            custom_message_field_id,
        }
    }

    /// Delivers one outbound message: custom-field write, then reply-bot
    /// launch. The two steps are independently fallible; a failed write does
    /// not suppress the launch attempt.
    async fn send_message(&self, entity_id: i64, text: &str) {
        let Some(ref crm) = self.crm else {
            warn!(entity_id, "CRM client not available, cannot deliver message");
            return;
        };

        let fields = [CustomFieldUpdate::textarea(
            self.custom_message_field_id,
            "Custom Message",
            text,
        )];
        match crm.update_lead_custom_fields(entity_id, &fields).await {
            Ok(_) => debug!(entity_id, "wrote outbound message to custom field"),
            Err(e) => {
                error!(entity_id, error = %e, "failed to write outbound message to custom field");
            }
        }

        match crm
            .launch_salesbot(self.bots.reply, entity_id, EntityType::Lead)
            .await
        {
            Ok(_) => debug!(entity_id, bot_id = self.bots.reply, "launched reply salesbot"),
            Err(e) => {
                error!(
                    entity_id,
                    bot_id = self.bots.reply,
                    error = %e,
                    "failed to launch reply salesbot"
                );
            }
        }
    }

    /// `AWAITING_PASSPORT_NUMBER` transition.
    async fn handle_passport_reply(
        &self,
        entity_id: i64,
        message: &str,
        language: Option<Language>,
        session: Option<&Session>,
    ) {
        let normalized = normalize_passport(message);
        if !is_valid_passport(&normalized) {
            info!(entity_id, "passport number failed format validation");
            self.send_message(entity_id, get_message(MessageKey::PassportInvalid, language))
                .await;
            return;
        }

        let Some(ref passport) = self.passport else {
            warn!(entity_id, "passport lookup not available");
            self.send_message(entity_id, get_message(MessageKey::PassportError, language))
                .await;
            return;
        };

        let scan = match passport.scan(&normalized).await {
            Ok(scan) => scan,
            Err(e) => {
                let key = match e.status() {
                    // Auth and not-found responses are a business outcome,
                    // not a transient fault.
                    Some(401) | Some(404) => MessageKey::PassportNotFound,
                    _ => MessageKey::PassportError,
                };
                warn!(entity_id, error = %e, "passport lookup failed");
                self.send_message(entity_id, get_message(key, language)).await;
                return;
            }
        };

        info!(
            entity_id,
            voucher = scan.code_voucher.as_deref().unwrap_or("-"),
            "passport found"
        );
        self.send_message(entity_id, &render_passport_found(language, &scan))
            .await;

        let Some(session) = session else {
            debug!(entity_id, "no session to advance after passport match");
            return;
        };

        let patch = SessionPatch {
            command: Some(Command::MainMenu),
            ..Default::default()
        };
        match self.store.update_session(&session.session_id, patch).await {
            Ok(Some(_)) => {
                let bot_id = match language {
                    Some(Language::En) => self.bots.main_menu_en,
                    _ => self.bots.main_menu_id,
                };
                let Some(ref crm) = self.crm else {
                    warn!(entity_id, "CRM client not available, cannot launch main-menu bot");
                    return;
                };
                match crm.launch_salesbot(bot_id, entity_id, EntityType::Lead).await {
                    Ok(_) => {
                        info!(
                            entity_id,
                            session_id = session.session_id.as_str(),
                            bot_id,
                            "session advanced to main menu and bot launched"
                        );
                    }
                    Err(e) => {
                        error!(entity_id, bot_id, error = %e, "failed to launch main-menu bot");
                    }
                }
            }
            Ok(None) => {
                warn!(
                    entity_id,
                    session_id = session.session_id.as_str(),
                    "session disappeared before main-menu transition"
                );
            }
            Err(e) => {
                error!(
                    entity_id,
                    session_id = session.session_id.as_str(),
                    error = %e,
                    "failed to advance session to main menu"
                );
            }
        }
    }
}

#[async_trait]
impl Handler for IncomingMessageHandler {
    fn name(&self) -> &'static str {
        "incoming-message"
    }

    /// Matches structured payloads that carry a usable entity id and a
    /// non-empty message.
    fn can_handle(&self, _path: &str, data: &Value) -> Result<bool, KurirError> {
        let Some(map) = data.as_object() else {
            return Ok(false);
        };

        match map.get("entity_id") {
            None | Some(Value::Null) => return Ok(false),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(false),
            _ => {}
        }

        Ok(extract_message(data).is_some())
    }

    async fn handle(&self, path: &str, data: &Value) -> Result<(), KurirError> {
        let Some(message) = extract_message(data) else {
            debug!(path, "incoming event ignored: no message content detected");
            return Ok(());
        };

        info!(path, message = message.as_str(), "incoming message received");

        let Some(entity_id) = extract_entity_id(data) else {
            warn!(path, "incoming message missing valid entity_id");
            return Ok(());
        };

        let session = match self.store.latest_session_by_entity(entity_id).await {
            Ok(session) => session,
            Err(e) => {
                error!(entity_id, error = %e, "failed to retrieve session for entity");
                None
            }
        };
        let language = session.as_ref().and_then(|s| s.language);

        let state = data
            .get("state")
            .and_then(Value::as_str)
            .unwrap_or(STATE_INITIAL);

        match state {
            STATE_INITIAL => {
                self.send_message(entity_id, get_message(MessageKey::PassportPrompt, language))
                    .await;
            }
            STATE_AWAITING_PASSPORT => {
                self.handle_passport_reply(entity_id, &message, language, session.as_ref())
                    .await;
            }
            other => {
                debug!(entity_id, state = other, "unrecognized conversation state, skipping");
            }
        }

        // Best-effort cleanup of the triggering payload.
        if let Err(e) = self.realtime.delete(path).await {
            warn!(path, error = %e, "failed to delete triggering payload");
        }

        Ok(())
    }
}

/// Normalizes a free-text passport reply: trim, uppercase, and strip
/// interior spaces and hyphens.
pub fn normalize_passport(input: &str) -> String {
    input
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Validates the normalized form: 6 to 12 characters, each an uppercase
/// letter or digit.
pub fn is_valid_passport(normalized: &str) -> bool {
    (6..=12).contains(&normalized.len())
        && normalized
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
