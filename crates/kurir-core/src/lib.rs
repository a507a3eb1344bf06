// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Kurir event bridge.
//!
//! This crate provides the error type, domain models (sessions, leads), and
//! the collaborator traits the handler layer is written against. Concrete
//! clients for the realtime store, document store, CRM, and passport lookup
//! live in sibling crates and implement the traits defined here.

pub mod error;
pub mod model;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KurirError;
pub use model::{Lead, NewSession, Session, SessionPatch};
pub use types::{
    ChangeKind, Command, CustomFieldUpdate, EntityType, Language, Metadata, PassportScan,
    RealtimeEvent,
};

pub use traits::{CrmClient, DocumentStore, PassportLookup, RealtimeStore};
