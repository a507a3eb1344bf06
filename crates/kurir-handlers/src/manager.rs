// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler manager: routes one event to the correct handler(s), isolates
//! failures, and supplies observability.
//!
//! Dispatch rules: the default handler (at most one) always executes,
//! regardless of its own capability test; non-default handlers execute when
//! `can_handle` returns true, in registration order, after the default. Every
//! handler error is caught and logged so one handler cannot suppress
//! another's side effects. Handlers must therefore tolerate being one of
//! several observers of the same event.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::handler::Handler;

/// Introspection snapshot of one registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInfo {
    pub name: &'static str,
    pub is_default: bool,
}

/// Ordered collection of handlers plus one optional default handler.
#[derive(Default)]
pub struct HandlerManager {
    handlers: Vec<Arc<dyn Handler>>,
    default_handler: Option<Arc<dyn Handler>>,
}

impl HandlerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, appending it to the ordered list.
    ///
    /// With `default = true` the handler also becomes the default; a later
    /// default registration silently replaces the earlier designation.
    pub fn register(&mut self, handler: Arc<dyn Handler>, default: bool) {
        if default {
            info!(handler = handler.name(), "registered default handler");
            self.default_handler = Some(handler.clone());
        } else {
            info!(handler = handler.name(), "registered handler");
        }
        self.handlers.push(handler);
    }

    /// Removes a handler by identity. If it held the default designation,
    /// the default becomes unset.
    pub fn unregister(&mut self, handler: &Arc<dyn Handler>) {
        let before = self.handlers.len();
        self.handlers.retain(|h| !Arc::ptr_eq(h, handler));
        if self.handlers.len() != before {
            if self
                .default_handler
                .as_ref()
                .is_some_and(|d| Arc::ptr_eq(d, handler))
            {
                self.default_handler = None;
            }
            info!(handler = handler.name(), "unregistered handler");
        }
    }

    /// Routes one event through the registered handlers.
    ///
    /// Success or failure is observable only through logs and the side
    /// effects each handler performs.
    pub async fn dispatch(&self, path: &str, data: &Value) {
        debug!(path, "processing event");

        let mut capable: Vec<&Arc<dyn Handler>> = Vec::new();
        let mut matched: Vec<&Arc<dyn Handler>> = Vec::new();

        for handler in &self.handlers {
            if self
                .default_handler
                .as_ref()
                .is_some_and(|d| Arc::ptr_eq(d, handler))
            {
                continue;
            }

            match handler.can_handle(path, data) {
                Ok(true) => matched.push(handler),
                Ok(false) => {}
                Err(e) => {
                    error!(
                        handler = handler.name(),
                        path,
                        error = %e,
                        "capability check failed, treating as non-matching"
                    );
                }
            }
        }

        if let Some(ref default) = self.default_handler {
            capable.push(default);
            if matched.is_empty() {
                info!(
                    path,
                    default_handler = default.name(),
                    "default handler processing event (no specific handlers matched)"
                );
            }
        }
        capable.extend(matched);

        if capable.is_empty() {
            debug!(path, "no handlers found for event");
            return;
        }

        info!(
            path,
            count = capable.len(),
            handlers = ?capable.iter().map(|h| h.name()).collect::<Vec<_>>(),
            "dispatching event"
        );

        for handler in capable {
            debug!(handler = handler.name(), path, "invoking handler");
            if let Err(e) = handler.handle(path, data).await {
                // Continue with the remaining handlers even if one fails.
                error!(
                    handler = handler.name(),
                    path,
                    error = %e,
                    "handler failed"
                );
            } else {
                debug!(handler = handler.name(), path, "handler completed");
            }
        }
    }

    /// Snapshot of the registered handlers for diagnostics.
    pub fn handler_info(&self) -> Vec<HandlerInfo> {
        self.handlers
            .iter()
            .map(|h| HandlerInfo {
                name: h.name(),
                is_default: self
                    .default_handler
                    .as_ref()
                    .is_some_and(|d| Arc::ptr_eq(d, h)),
            })
            .collect()
    }

    /// Empties the handler list and the default designation.
    pub fn clear(&mut self) {
        let count = self.handlers.len();
        self.handlers.clear();
        self.default_handler = None;
        info!(count, "cleared handlers");
    }
}
