// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead model: the permanent audit record of one raw incoming event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::KurirError;
use crate::types::Metadata;

/// Snapshot of one incoming event, persisted before the transient source
/// payload is deleted. Never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: String,
    /// Realtime-store path the triggering payload came from.
    pub source_path: String,
    /// The raw payload, preserved verbatim.
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Lead {
    /// Wraps a raw event payload into a new unprocessed lead.
    pub fn from_event(source_path: &str, data: Value, metadata: Metadata) -> Lead {
        let now = Utc::now();
        Lead {
            lead_id: Uuid::new_v4().to_string(),
            source_path: source_path.to_string(),
            data,
            created_at: now,
            updated_at: now,
            processed: false,
            metadata,
        }
    }

    /// Marks the lead processed and refreshes `updated_at`.
    pub fn mark_processed(&mut self) {
        self.processed = true;
        self.updated_at = Utc::now();
    }

    pub fn to_doc(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_doc(doc: Value) -> Result<Lead, KurirError> {
        serde_json::from_value(doc).map_err(|e| KurirError::Store {
            message: format!("failed to decode lead document: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
