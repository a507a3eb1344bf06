// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across collaborator traits and the Kurir handler layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::KurirError;

/// Open string-keyed metadata map carried by sessions and leads.
///
/// Kept schema-free on purpose: CRM payloads and audit records attach
/// arbitrary provenance keys at runtime.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Conversation language selected through the language-selection menu.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Language {
    #[strum(serialize = "EN")]
    #[serde(rename = "EN")]
    En,
    #[strum(serialize = "ID")]
    #[serde(rename = "ID")]
    Id,
}

/// Active top-level menu context of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Command {
    #[strum(serialize = "MAIN_MENU")]
    #[serde(rename = "MAIN_MENU")]
    MainMenu,
    #[strum(serialize = "LANG_SELECT")]
    #[serde(rename = "LANG_SELECT")]
    LangSelect,
    #[strum(serialize = "LOVE_BALI")]
    #[serde(rename = "LOVE_BALI")]
    LoveBali,
    #[strum(serialize = "SIGAPURA")]
    #[serde(rename = "SIGAPURA")]
    Sigapura,
    #[strum(serialize = "CHAT_OPERATOR")]
    #[serde(rename = "CHAT_OPERATOR")]
    ChatOperator,
}

impl Command {
    /// The button label shown to the end user for this command.
    pub fn label(&self) -> &'static str {
        match self {
            Command::MainMenu => "Main Menu",
            Command::LangSelect => "Lang Select",
            Command::LoveBali => "Love Bali",
            Command::Sigapura => "SigaPura",
            Command::ChatOperator => "Chat Operator",
        }
    }

    /// Resolves a button label back to its command. Labels are matched
    /// verbatim; anything else is not a command.
    pub fn from_label(label: &str) -> Option<Command> {
        match label {
            "Main Menu" => Some(Command::MainMenu),
            "Lang Select" => Some(Command::LangSelect),
            "Love Bali" => Some(Command::LoveBali),
            "SigaPura" => Some(Command::Sigapura),
            "Chat Operator" => Some(Command::ChatOperator),
            _ => None,
        }
    }
}

/// Kommo entity kind a bot or field update is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Contact,
    Lead,
}

impl EntityType {
    /// Wire code expected by the Kommo API ('1' = contact, '2' = lead).
    pub fn code(&self) -> &'static str {
        match self {
            EntityType::Contact => "1",
            EntityType::Lead => "2",
        }
    }

    /// Resolves an entity name ('contact'/'lead', plurals accepted) to its kind.
    pub fn from_name(name: &str) -> Result<EntityType, KurirError> {
        match name.to_ascii_lowercase().as_str() {
            "contact" | "contacts" => Ok(EntityType::Contact),
            "lead" | "leads" => Ok(EntityType::Lead),
            other => Err(KurirError::Crm {
                message: format!(
                    "invalid entity name `{other}`, expected `contact` or `lead`"
                ),
                status: None,
                source: None,
            }),
        }
    }
}

/// One value slot of a custom-field update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    pub value: String,
}

/// A single custom-field update pushed to the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldUpdate {
    pub field_id: i64,
    pub field_name: Option<String>,
    pub field_code: Option<String>,
    pub field_type: Option<String>,
    pub values: Vec<CustomFieldValue>,
}

impl CustomFieldUpdate {
    /// Builds a textarea field update with a single value.
    pub fn textarea(field_id: i64, field_name: &str, value: &str) -> Self {
        Self {
            field_id,
            field_name: Some(field_name.to_string()),
            field_code: None,
            field_type: Some("textarea".to_string()),
            values: vec![CustomFieldValue {
                value: value.to_string(),
            }],
        }
    }
}

/// Result of a passport lookup. Any field may be absent in the upstream
/// response; presentation defaults missing fields at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassportScan {
    #[serde(default)]
    pub code_voucher: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub arrival_date: Option<String>,
    #[serde(default)]
    pub expired_date: Option<String>,
}

/// Kind of change delivered by the realtime-store subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ChangeKind {
    #[strum(serialize = "put")]
    Put,
    #[strum(serialize = "patch")]
    Patch,
}

/// One change event pulled off the realtime-store subscription.
#[derive(Debug, Clone)]
pub struct RealtimeEvent {
    pub kind: ChangeKind,
    /// Path relative to the subscription's base path.
    pub path: String,
    pub data: serde_json::Value,
}
