// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted passport lookup for deterministic testing.
//!
//! Results are queued ahead of time and popped per call; every scanned
//! number is recorded for assertion. Calling past the script is a test bug
//! and surfaces as an internal error.

use std::collections::VecDeque;

use async_trait::async_trait;
use kurir_core::{KurirError, PassportLookup, PassportScan};
use tokio::sync::Mutex;

/// A mock passport lookup replaying queued results.
pub struct ScriptedPassport {
    results: Mutex<VecDeque<Result<PassportScan, KurirError>>>,
    scanned: Mutex<Vec<String>>,
}

impl ScriptedPassport {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            scanned: Mutex::new(Vec::new()),
        }
    }

    /// Queues the result for the next `scan` call.
    pub async fn push_result(&self, result: Result<PassportScan, KurirError>) {
        self.results.lock().await.push_back(result);
    }

    /// Queues a successful scan with all four fields populated.
    pub async fn push_found(&self, voucher: &str, guest: &str, arrival: &str, expired: &str) {
        self.push_result(Ok(PassportScan {
            code_voucher: Some(voucher.to_string()),
            guest_name: Some(guest.to_string()),
            arrival_date: Some(arrival.to_string()),
            expired_date: Some(expired.to_string()),
        }))
        .await;
    }

    /// Queues an error carrying the given HTTP status.
    pub async fn push_status_error(&self, status: u16) {
        self.push_result(Err(KurirError::Passport {
            message: format!("scripted status {status}"),
            status: Some(status),
        }))
        .await;
    }

    /// Every passport number passed to `scan`, in call order.
    pub async fn scanned(&self) -> Vec<String> {
        self.scanned.lock().await.clone()
    }
}

impl Default for ScriptedPassport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PassportLookup for ScriptedPassport {
    async fn scan(&self, passport_number: &str) -> Result<PassportScan, KurirError> {
        self.scanned.lock().await.push(passport_number.to_string());
        self.results
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| {
                Err(KurirError::Internal(
                    "unscripted passport scan call".to_string(),
                ))
            })
    }
}
