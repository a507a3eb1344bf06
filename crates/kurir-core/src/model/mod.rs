// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain models persisted to the document store.

pub mod lead;
pub mod session;

pub use lead::Lead;
pub use session::{NewSession, Session, SessionPatch};
