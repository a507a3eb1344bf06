// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording CRM client for deterministic testing.
//!
//! Captures custom-field updates and salesbot launches for assertion, with
//! independently injectable failures for each operation.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use kurir_core::{CrmClient, CustomFieldUpdate, EntityType, KurirError};
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// One recorded custom-field update.
#[derive(Debug, Clone)]
pub struct RecordedFieldUpdate {
    pub entity_id: i64,
    pub fields: Vec<CustomFieldUpdate>,
}

/// One recorded salesbot launch.
#[derive(Debug, Clone)]
pub struct RecordedBotLaunch {
    pub bot_id: i64,
    pub entity_id: i64,
    pub entity_type: EntityType,
}

/// A mock CRM client that records every call.
pub struct RecordingCrm {
    field_updates: Mutex<Vec<RecordedFieldUpdate>>,
    bot_launches: Mutex<Vec<RecordedBotLaunch>>,
    fail_field_updates: AtomicBool,
    fail_bot_launches: AtomicBool,
}

impl RecordingCrm {
    pub fn new() -> Self {
        Self {
            field_updates: Mutex::new(Vec::new()),
            bot_launches: Mutex::new(Vec::new()),
            fail_field_updates: AtomicBool::new(false),
            fail_bot_launches: AtomicBool::new(false),
        }
    }

    pub async fn field_updates(&self) -> Vec<RecordedFieldUpdate> {
        self.field_updates.lock().await.clone()
    }

    pub async fn bot_launches(&self) -> Vec<RecordedBotLaunch> {
        self.bot_launches.lock().await.clone()
    }

    pub fn fail_field_updates(&self, fail: bool) {
        self.fail_field_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_bot_launches(&self, fail: bool) {
        self.fail_bot_launches.store(fail, Ordering::SeqCst);
    }
}

impl Default for RecordingCrm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrmClient for RecordingCrm {
    async fn update_lead_custom_fields(
        &self,
        entity_id: i64,
        fields: &[CustomFieldUpdate],
    ) -> Result<Value, KurirError> {
        if self.fail_field_updates.load(Ordering::SeqCst) {
            return Err(KurirError::Crm {
                message: "injected field update failure".to_string(),
                status: Some(500),
                source: None,
            });
        }
        self.field_updates.lock().await.push(RecordedFieldUpdate {
            entity_id,
            fields: fields.to_vec(),
        });
        Ok(json!({"id": entity_id}))
    }

    async fn launch_salesbot(
        &self,
        bot_id: i64,
        entity_id: i64,
        entity_type: EntityType,
    ) -> Result<Value, KurirError> {
        if self.fail_bot_launches.load(Ordering::SeqCst) {
            return Err(KurirError::Crm {
                message: "injected salesbot failure".to_string(),
                status: Some(500),
                source: None,
            });
        }
        self.bot_launches.lock().await.push(RecordedBotLaunch {
            bot_id,
            entity_id,
            entity_type,
        });
        Ok(json!({"success": true}))
    }
}
