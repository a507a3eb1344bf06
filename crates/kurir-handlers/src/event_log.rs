// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catch-all handler that logs every event.
//!
//! Registered as the manager's default so every change is observable even
//! when no specialized handler matches. Performs no side effects.

use async_trait::async_trait;
use kurir_core::KurirError;
use serde_json::Value;
use tracing::info;

use crate::handler::{Handler, extract_message};

/// Logs the path and shape of every incoming event.
#[derive(Debug, Default)]
pub struct EventLogHandler;

impl EventLogHandler {
    pub fn new() -> Self {
        Self
    }
}

fn shape_of(data: &Value) -> String {
    match data {
        Value::Object(map) => format!("object({} keys)", map.len()),
        Value::Array(items) => format!("array({} items)", items.len()),
        Value::String(_) => "string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Null => "null".to_string(),
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > 50 {
        let truncated: String = text.chars().take(50).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

#[async_trait]
impl Handler for EventLogHandler {
    fn name(&self) -> &'static str {
        "event-log"
    }

    fn can_handle(&self, _path: &str, _data: &Value) -> Result<bool, KurirError> {
        Ok(true)
    }

    async fn handle(&self, path: &str, data: &Value) -> Result<(), KurirError> {
        match extract_message(data) {
            Some(message) => info!(
                path,
                shape = shape_of(data).as_str(),
                message = preview(&message).as_str(),
                "event received"
            ),
            None => info!(path, shape = shape_of(data).as_str(), "event received"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn matches_and_handles_everything() {
        let handler = EventLogHandler::new();
        assert!(handler.can_handle("/e", &json!({})).unwrap());
        assert!(handler.can_handle("/e", &json!("text")).unwrap());
        assert!(handler.can_handle("/e", &Value::Null).unwrap());

        assert!(handler.handle("/e", &json!({"message": "hi"})).await.is_ok());
        assert!(handler.handle("/e", &Value::Null).await.is_ok());
    }

    #[test]
    fn preview_truncates_long_text() {
        let long = "x".repeat(80);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 53);
    }

    #[test]
    fn shape_descriptions() {
        assert_eq!(shape_of(&json!({"a": 1, "b": 2})), "object(2 keys)");
        assert_eq!(shape_of(&json!([1, 2, 3])), "array(3 items)");
        assert_eq!(shape_of(&json!("x")), "string");
        assert_eq!(shape_of(&Value::Null), "null");
    }
}
