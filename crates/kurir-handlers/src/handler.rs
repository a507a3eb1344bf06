// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler contract and shared payload-extraction helpers.

use async_trait::async_trait;
use kurir_core::KurirError;
use serde_json::Value;
use tracing::warn;

/// Payload keys checked for user-facing message text, in priority order.
pub const MESSAGE_KEYS: [&str; 4] = ["message", "messages", "text", "body"];

/// One unit of event-processing logic.
///
/// `can_handle` is the capability test the dispatcher runs for every
/// non-default handler; an `Err` counts as "does not match" and is logged,
/// never propagated. `handle` performs the side effects; its errors are
/// contained by the dispatcher so one handler cannot block its siblings.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Stable identifier used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this handler wants the event.
    fn can_handle(&self, path: &str, data: &Value) -> Result<bool, KurirError>;

    /// Processes the event.
    async fn handle(&self, path: &str, data: &Value) -> Result<(), KurirError>;
}

/// Fixed salesbot identifiers a handler launches, wired from configuration.
#[derive(Debug, Clone, Copy)]
pub struct BotIds {
    /// Language-selection menu bot, launched on first contact.
    pub lang_select: i64,
    /// Reply bot pushing the custom-message field to the user.
    pub reply: i64,
    /// English main-menu bot.
    pub main_menu_en: i64,
    /// Indonesian main-menu bot.
    pub main_menu_id: i64,
}

/// Extracts and coerces the entity id from a payload.
///
/// Accepts integers and decimal strings. Anything else is logged and treated
/// as absent; session logic is skipped but the event is still recorded.
pub fn extract_entity_id(data: &Value) -> Option<i64> {
    match data.get("entity_id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(entity_id = trimmed, "invalid entity_id format, skipping session lookup");
                    None
                }
            }
        }
        _ => None,
    }
}

/// Extracts the first non-empty message string from a payload, checking the
/// keys in [`MESSAGE_KEYS`]. List values yield their first non-empty entry.
pub fn extract_message(data: &Value) -> Option<String> {
    let map = data.as_object()?;
    for key in MESSAGE_KEYS {
        match map.get(key) {
            Some(Value::String(s)) => {
                let cleaned = s.trim();
                if !cleaned.is_empty() {
                    return Some(cleaned.to_string());
                }
            }
            Some(Value::Array(items)) => {
                for item in items {
                    if let Some(s) = item.as_str() {
                        let cleaned = s.trim();
                        if !cleaned.is_empty() {
                            return Some(cleaned.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}
