// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Firebase Realtime Database integration for Kurir.
//!
//! The Realtime Database is the transient inbox: webhook payloads land under
//! the configured base path, the streaming connection delivers them as change
//! events, and handlers delete them once consumed. This crate provides the
//! REST client ([`FirebaseClient`]), the streaming-protocol parser
//! ([`sse`]), and the background listener task ([`listener`]).

pub mod client;
pub mod listener;
pub mod sse;

pub use client::FirebaseClient;
pub use listener::spawn_listener;
