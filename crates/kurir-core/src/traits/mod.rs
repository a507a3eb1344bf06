// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits implemented by the concrete service clients.
//!
//! The handler layer depends only on these traits; concrete clients are
//! injected by the binary at bootstrap. There is no global registry: each
//! handler owns `Arc` handles to exactly the services it uses.

pub mod crm;
pub mod passport;
pub mod realtime;
pub mod store;

pub use crm::CrmClient;
pub use passport::PassportLookup;
pub use realtime::RealtimeStore;
pub use store::DocumentStore;
