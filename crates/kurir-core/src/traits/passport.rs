// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passport-lookup trait.

use async_trait::async_trait;

use crate::error::KurirError;
use crate::types::PassportScan;

/// Lookup of a visitor levy voucher by passport number.
///
/// Errors carry the upstream HTTP status (see [`KurirError::status`]) so
/// callers can distinguish auth/not-found responses from transient faults.
#[async_trait]
pub trait PassportLookup: Send + Sync {
    async fn scan(&self, passport_number: &str) -> Result<PassportScan, KurirError>;
}
