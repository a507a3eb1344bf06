// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session model and its storage mapping.
//!
//! Sessions are stored as schemaless documents, so decoding is lenient:
//! unknown command or language codes degrade to `None` and string entity ids
//! are coerced to integers instead of failing the whole document.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::KurirError;
use crate::types::{Command, Language, Metadata};

/// Longest allowed session lifetime in hours (one year).
const MAX_EXPIRES_IN_HOURS: i64 = 8760;

/// One conversation's state, tracked per CRM entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub entity_id: Option<i64>,
    pub language: Option<Language>,
    pub command: Option<Command>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Metadata,
    pub is_active: bool,
}

impl Session {
    /// Refreshes `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Sets the session language and refreshes the update timestamp.
    pub fn set_language(&mut self, language: Language) {
        self.language = Some(language);
        self.touch();
    }

    /// Sets the active command and refreshes the update timestamp.
    pub fn set_command(&mut self, command: Command) {
        self.command = Some(command);
        self.touch();
    }

    /// Marks the session inactive. Once inactive, a session is never
    /// reactivated; callers create a new one instead.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    /// Whether the session has passed its expiry timestamp. Sessions without
    /// an expiry never expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// Applies a partial update, merging metadata keys and refreshing
    /// `updated_at`. Shared by every `DocumentStore` implementation so the
    /// read-modify-write semantics stay identical across backends.
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(language) = patch.language {
            self.language = Some(language);
        }
        if let Some(command) = patch.command {
            self.command = Some(command);
        }
        if let Some(ref metadata) = patch.metadata {
            for (key, value) in metadata {
                self.metadata.insert(key.clone(), value.clone());
            }
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(hours) = patch.expires_in_hours {
            self.expires_at = Some(Utc::now() + Duration::hours(clamp_hours(hours)));
        }
        self.touch();
    }

    /// Serializes the session into its document representation.
    pub fn to_doc(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Decodes a session document, tolerating loosely typed fields.
    pub fn from_doc(mut doc: Value) -> Result<Session, KurirError> {
        if let Some(map) = doc.as_object_mut() {
            normalize_doc(map);
        }
        serde_json::from_value(doc).map_err(|e| KurirError::Store {
            message: format!("failed to decode session document: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Request to create a new session.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub entity_id: Option<i64>,
    pub language: Option<Language>,
    pub command: Option<Command>,
    /// Session lifetime in hours; defaults to 1, capped at one year.
    pub expires_in_hours: Option<i64>,
    pub metadata: Metadata,
}

impl NewSession {
    /// Materializes the request into a fresh active session.
    pub fn into_session(self) -> Session {
        let now = Utc::now();
        let hours = clamp_hours(self.expires_in_hours.unwrap_or(1));
        Session {
            session_id: Uuid::new_v4().to_string(),
            entity_id: self.entity_id,
            language: self.language,
            command: self.command,
            created_at: now,
            updated_at: now,
            expires_at: Some(now + Duration::hours(hours)),
            metadata: self.metadata,
            is_active: true,
        }
    }
}

/// Partial update for an existing session. `None` fields are left untouched;
/// metadata entries are merged key-by-key.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub language: Option<Language>,
    pub command: Option<Command>,
    pub metadata: Option<Metadata>,
    pub is_active: Option<bool>,
    pub expires_in_hours: Option<i64>,
}

fn clamp_hours(hours: i64) -> i64 {
    hours.clamp(1, MAX_EXPIRES_IN_HOURS)
}

/// Coerces loosely typed document fields into the shapes the typed model
/// expects: string entity ids become integers, unrecognized command and
/// language codes become null.
fn normalize_doc(map: &mut serde_json::Map<String, Value>) {
    if let Some(entity_id) = map.get("entity_id") {
        let coerced = match entity_id {
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            Value::Number(n) => n.as_i64().map(Value::from),
            _ => None,
        };
        map.insert("entity_id".into(), coerced.unwrap_or(Value::Null));
    }

    for (field, known) in [
        (
            "command",
            &["MAIN_MENU", "LANG_SELECT", "LOVE_BALI", "SIGAPURA", "CHAT_OPERATOR"][..],
        ),
        ("language", &["EN", "ID"][..]),
    ] {
        if let Some(value) = map.get(field) {
            let keep = matches!(value, Value::String(s) if known.contains(&s.as_str()));
            if !keep && !value.is_null() {
                map.insert(field.into(), Value::Null);
            }
        }
    }
}
