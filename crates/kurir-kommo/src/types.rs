// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response types for the Kommo API.

use serde::{Deserialize, Serialize};

/// One entry of the `salesbot/run` request array.
#[derive(Debug, Clone, Serialize)]
pub struct SalesbotRun {
    pub bot_id: i64,
    pub entity_id: i64,
    /// Entity type code: '1' = contact, '2' = lead.
    pub entity_type: String,
}

/// Subset of the `/api/v4/account` response used for connectivity checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subdomain: Option<String>,
}

/// One pipeline from `/api/v4/leads/pipelines`.
#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_main: bool,
}
