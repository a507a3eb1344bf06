// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kurir check` command implementation.
//!
//! Verifies connectivity to the external services without entering the
//! event loop: Kommo account metadata, a Realtime Database read on the
//! configured base path, and a Firestore probe read. Fails on the first
//! unreachable service so deployment problems surface before serving.

use kurir_config::model::KurirConfig;
use kurir_core::{DocumentStore, KurirError, RealtimeStore};
use kurir_firebase::FirebaseClient;
use kurir_firestore::{FirestoreClient, FirestoreStore};
use kurir_kommo::KommoClient;
use tracing::info;

/// Runs the `kurir check` command.
pub async fn run_check(config: KurirConfig) -> Result<(), KurirError> {
    crate::serve::init_tracing(&config.app.log_level);

    let kommo = KommoClient::new(&config.kommo)?;
    let account = kommo.account_info().await?;
    let pipelines = kommo.pipelines().await?;
    info!(
        account = account.name.as_deref().unwrap_or("-"),
        subdomain = account.subdomain.as_deref().unwrap_or("-"),
        pipelines = pipelines.len(),
        "Kommo API reachable"
    );
    println!(
        "kommo: ok (account {}, {} pipeline(s))",
        account.subdomain.as_deref().unwrap_or("-"),
        pipelines.len()
    );

    let firebase = FirebaseClient::new(&config.firebase)?;
    let snapshot = firebase.read("/").await?;
    info!(
        path = config.firebase.base_path.as_str(),
        has_data = snapshot.is_some(),
        "Realtime Database reachable"
    );
    println!(
        "firebase: ok (base path {}, {})",
        config.firebase.base_path,
        if snapshot.is_some() { "has data" } else { "empty" }
    );

    let firestore = FirestoreStore::new(FirestoreClient::new(&config.firestore)?);
    // A probe read on an id that cannot exist; any non-error answer proves
    // the database is reachable and readable.
    firestore.get_session("connectivity-probe").await?;
    info!(
        project = config.firestore.project_id.as_str(),
        database = config.firestore.database.as_str(),
        "Firestore reachable"
    );
    println!(
        "firestore: ok (project {}, database {})",
        config.firestore.project_id, config.firestore.database
    );

    println!("all checks passed");
    Ok(())
}
