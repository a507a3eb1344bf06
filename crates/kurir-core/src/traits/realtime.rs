// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime-store trait: the transient path-addressed inbox.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::KurirError;

/// Path-addressed access to the realtime store.
///
/// Paths handed to these methods are relative to [`base_path`], matching the
/// paths delivered by the subscription. The store is a transient inbox, not a
/// system of record: consumed payloads are deleted.
///
/// [`base_path`]: RealtimeStore::base_path
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// The base path the subscription was opened on.
    fn base_path(&self) -> &str;

    /// Reads the payload at `path`, `None` when absent.
    async fn read(&self, path: &str) -> Result<Option<Value>, KurirError>;

    /// Writes `value` at `path`, replacing any existing payload.
    async fn write(&self, path: &str, value: &Value) -> Result<(), KurirError>;

    /// Deletes the payload at `path`. Deleting an absent path succeeds.
    async fn delete(&self, path: &str) -> Result<(), KurirError>;
}
