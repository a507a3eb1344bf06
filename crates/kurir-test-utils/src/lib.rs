// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the Kurir collaborator traits.
//!
//! Handler and orchestration tests inject these instead of the real clients:
//! everything is in-memory, recorded, and failure-injectable.

pub mod memory_realtime;
pub mod memory_store;
pub mod recording_crm;
pub mod scripted_passport;

pub use memory_realtime::MemoryRealtime;
pub use memory_store::MemoryStore;
pub use recording_crm::{RecordedBotLaunch, RecordedFieldUpdate, RecordingCrm};
pub use scripted_passport::ScriptedPassport;
