// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Firestore integration for Kurir: the durable document store holding
//! session state and lead audit records.

pub mod client;
pub mod store;
pub mod value;

pub use client::{FieldEquals, FirestoreClient};
pub use store::FirestoreStore;
