// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event dispatch and session-state reconciliation for Kurir.
//!
//! This crate holds the hand-registered handler set and its dispatcher:
//! the [`Handler`] contract, the [`HandlerManager`] routing events to every
//! capable handler with per-handler failure isolation, the incoming-lead and
//! incoming-message handlers, the catch-all [`EventLogHandler`], and the
//! localized message catalog.

pub mod catalog;
pub mod event_log;
pub mod handler;
pub mod lead;
pub mod manager;
pub mod message;

pub use catalog::{MessageKey, get_message, render_passport_found};
pub use event_log::EventLogHandler;
pub use handler::{BotIds, Handler};
pub use lead::IncomingLeadHandler;
pub use manager::{HandlerInfo, HandlerManager};
pub use message::IncomingMessageHandler;
