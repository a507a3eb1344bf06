// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRM trait: the subset of the Kommo API the handler layer drives.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::KurirError;
use crate::types::{CustomFieldUpdate, EntityType};

/// Operations against the CRM automation API.
///
/// Retry/backoff for transient failures lives inside implementations; a
/// returned error means retries are exhausted and the caller degrades.
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Updates custom-field values on a lead.
    async fn update_lead_custom_fields(
        &self,
        entity_id: i64,
        fields: &[CustomFieldUpdate],
    ) -> Result<Value, KurirError>;

    /// Launches a pre-configured automation bot against an entity.
    async fn launch_salesbot(
        &self,
        bot_id: i64,
        entity_id: i64,
        entity_type: EntityType,
    ) -> Result<Value, KurirError>;
}
