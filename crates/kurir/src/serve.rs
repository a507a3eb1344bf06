// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kurir serve` command implementation.
//!
//! Wires the concrete clients into the handler set and runs the event loop:
//! a background listener task feeds realtime changes into a bounded channel,
//! and this loop drains it, dispatching one event at a time through the
//! handler manager. Handler execution is strictly sequential; a slow
//! external call delays subsequent events by design.

use std::sync::Arc;
use std::time::Duration;

use kurir_config::model::KurirConfig;
use kurir_core::{DocumentStore, KurirError, RealtimeStore};
use kurir_firebase::{FirebaseClient, spawn_listener};
use kurir_firestore::{FirestoreClient, FirestoreStore};
use kurir_handlers::{
    BotIds, EventLogHandler, HandlerManager, IncomingLeadHandler, IncomingMessageHandler,
};
use kurir_kommo::KommoClient;
use kurir_lovebali::LoveBaliClient;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::shutdown;

/// Runs the `kurir serve` command.
///
/// Initializes clients, verifies CRM connectivity, registers the handler
/// set, and enters the event loop. Supports graceful shutdown via signal
/// handlers; bootstrap failures exit before the loop starts.
pub async fn run_serve(config: KurirConfig) -> Result<(), KurirError> {
    init_tracing(&config.app.log_level);

    info!(name = config.app.name.as_str(), "starting kurir serve");

    let kommo = Arc::new(KommoClient::new(&config.kommo)?);
    match kommo.account_info().await {
        Ok(account) => {
            info!(
                account = account.name.as_deref().unwrap_or("-"),
                subdomain = account.subdomain.as_deref().unwrap_or("-"),
                "Kommo API connection verified"
            );
        }
        Err(e) => {
            error!(error = %e, "Kommo API connection test failed");
            return Err(e);
        }
    }

    let firebase = Arc::new(FirebaseClient::new(&config.firebase)?);
    if let Err(e) = firebase.read("/").await {
        error!(error = %e, "Realtime Database connection test failed");
        return Err(e);
    }
    info!(
        path = config.firebase.base_path.as_str(),
        "Realtime Database connection verified"
    );

    let firestore = Arc::new(FirestoreStore::new(FirestoreClient::new(&config.firestore)?));
    if let Err(e) = firestore.get_session("connectivity-probe").await {
        error!(error = %e, "Firestore connection test failed");
        return Err(e);
    }
    info!(
        project = config.firestore.project_id.as_str(),
        database = config.firestore.database.as_str(),
        "Firestore connection verified"
    );

    // Sweep sessions that expired while the process was down.
    match firestore.cleanup_expired_sessions().await {
        Ok(0) => {}
        Ok(count) => info!(count, "deactivated expired sessions"),
        Err(e) => warn!(error = %e, "expired-session sweep failed, continuing"),
    }

    let lovebali = Arc::new(LoveBaliClient::new(&config.lovebali)?);

    let bots = BotIds {
        lang_select: config.kommo.bots.lang_select,
        reply: config.kommo.bots.reply,
        main_menu_en: config.kommo.bots.main_menu_en,
        main_menu_id: config.kommo.bots.main_menu_id,
    };
    let field_id = config.kommo.custom_message_field_id;

    let mut manager = HandlerManager::new();
    manager.register(Arc::new(EventLogHandler::new()), true);
    manager.register(
        Arc::new(IncomingMessageHandler::new(
            firestore.clone(),
            firebase.clone(),
            Some(kommo.clone()),
            Some(lovebali),
            bots,
            field_id,
        )),
        false,
    );
    manager.register(
        Arc::new(IncomingLeadHandler::new(
            firestore.clone(),
            firebase.clone(),
            Some(kommo.clone()),
            bots,
            field_id,
        )),
        false,
    );
    info!(
        handlers = ?manager.handler_info().iter().map(|h| h.name).collect::<Vec<_>>(),
        "event handler system initialized"
    );

    let cancel = shutdown::install_signal_handler();

    let (tx, mut rx) = mpsc::channel(config.app.queue_capacity);
    let listener = spawn_listener(
        firebase.clone(),
        Duration::from_secs(config.firebase.reconnect_delay_secs),
        tx,
        cancel.clone(),
    );

    info!(
        path = config.firebase.base_path.as_str(),
        "listening for realtime events"
    );

    loop {
        tokio::select! {
            maybe_event = rx.recv() => match maybe_event {
                Some(event) => {
                    debug!(kind = %event.kind, path = event.path.as_str(), "event received");
                    manager.dispatch(&event.path, &event.data).await;
                }
                None => {
                    warn!("event channel closed, leaving event loop");
                    break;
                }
            },
            _ = cancel.cancelled() => {
                info!("shutdown signal received, leaving event loop");
                break;
            }
        }
    }

    // Stop the listener and give it a bounded window to wind down; shutdown
    // proceeds either way.
    cancel.cancel();
    drop(rx);
    let timeout = Duration::from_secs(config.app.shutdown_timeout_secs);
    if tokio::time::timeout(timeout, listener).await.is_err() {
        warn!(?timeout, "listener task did not stop in time, proceeding");
    }

    manager.clear();
    info!("kurir serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kurir={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
