// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kommo CRM integration for Kurir: custom-field updates, salesbot
//! launches, and account metadata over the Kommo REST API.

pub mod client;
pub mod types;

pub use client::KommoClient;
pub use types::{AccountInfo, Pipeline, SalesbotRun};
