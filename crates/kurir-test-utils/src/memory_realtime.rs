// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory realtime store for deterministic testing.
//!
//! Payloads are seeded and read by subscription-relative path; writes and
//! deletes are captured for assertion. Deletes can be forced to fail to
//! exercise best-effort cleanup paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use kurir_core::{KurirError, RealtimeStore};
use serde_json::Value;
use tokio::sync::Mutex;

/// A mock realtime store backed by a path-keyed map.
pub struct MemoryRealtime {
    base_path: String,
    data: Mutex<HashMap<String, Value>>,
    writes: Mutex<Vec<(String, Value)>>,
    deletes: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl MemoryRealtime {
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.to_string(),
            data: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Seeds a payload at a subscription-relative path.
    pub async fn seed(&self, path: &str, value: Value) {
        self.data.lock().await.insert(path.to_string(), value);
    }

    /// All writes performed through the trait, in order.
    pub async fn writes(&self) -> Vec<(String, Value)> {
        self.writes.lock().await.clone()
    }

    /// All delete paths requested through the trait, in order.
    pub async fn deleted_paths(&self) -> Vec<String> {
        self.deletes.lock().await.clone()
    }

    /// Makes every subsequent delete fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryRealtime {
    fn default() -> Self {
        Self::new("/incoming")
    }
}

#[async_trait]
impl RealtimeStore for MemoryRealtime {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, KurirError> {
        Ok(self.data.lock().await.get(path).cloned())
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), KurirError> {
        self.data
            .lock()
            .await
            .insert(path.to_string(), value.clone());
        self.writes
            .lock()
            .await
            .push((path.to_string(), value.clone()));
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), KurirError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(KurirError::Realtime {
                message: format!("injected delete failure at `{path}`"),
                source: None,
            });
        }
        self.data.lock().await.remove(path);
        self.deletes.lock().await.push(path.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn seeded_data_reads_back_and_delete_records_path() {
        let store = MemoryRealtime::new("/incoming");
        store.seed("/abc", json!({"entity_id": "500"})).await;

        assert_eq!(
            store.read("/abc").await.unwrap(),
            Some(json!({"entity_id": "500"}))
        );

        store.delete("/abc").await.unwrap();
        assert_eq!(store.read("/abc").await.unwrap(), None);
        assert_eq!(store.deleted_paths().await, vec!["/abc".to_string()]);
    }

    #[tokio::test]
    async fn injected_delete_failure() {
        let store = MemoryRealtime::default();
        store.fail_deletes(true);
        assert!(store.delete("/abc").await.is_err());
        assert!(store.deleted_paths().await.is_empty());
    }
}
