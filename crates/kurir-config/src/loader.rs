// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./kurir.toml` > `~/.config/kurir/kurir.toml` >
//! `/etc/kurir/kurir.toml` with environment variable overrides via the
//! `KURIR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KurirConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/kurir/kurir.toml` (system-wide)
/// 3. `~/.config/kurir/kurir.toml` (user XDG config)
/// 4. `./kurir.toml` (local directory)
/// 5. `KURIR_*` environment variables
pub fn load_config() -> Result<KurirConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<KurirConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KurirConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KurirConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KurirConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for
/// diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KurirConfig::default()))
        .merge(Toml::file("/etc/kurir/kurir.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("kurir/kurir.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("kurir.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay unambiguous: `KURIR_KOMMO_ACCESS_TOKEN` must map to
/// `kommo.access_token`, not `kommo.access.token`. The nested `bots` table
/// gets a second mapping pass (`KURIR_KOMMO_BOTS_LANG_SELECT` ->
/// `kommo.bots.lang_select`).
fn env_provider() -> Env {
    Env::prefixed("KURIR_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("app_", "app.", 1)
            .replacen("firebase_", "firebase.", 1)
            .replacen("firestore_", "firestore.", 1)
            .replacen("kommo_", "kommo.", 1)
            .replacen("lovebali_", "lovebali.", 1)
            .replacen("bots_", "bots.", 1);
        mapped.into()
    })
}
