// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Love Bali passport-lookup integration for Kurir.

pub mod client;

pub use client::LoveBaliClient;
