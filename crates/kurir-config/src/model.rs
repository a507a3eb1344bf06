// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Kurir event bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Kurir configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Sections default to sensible values; validation
/// reports the keys that cannot be defaulted (credentials, endpoints).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KurirConfig {
    /// Process identity and runtime settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Firebase Realtime Database subscription settings.
    #[serde(default)]
    pub firebase: FirebaseConfig,

    /// Firestore document store settings.
    #[serde(default)]
    pub firestore: FirestoreConfig,

    /// Kommo CRM API settings.
    #[serde(default)]
    pub kommo: KommoConfig,

    /// Love Bali passport-lookup API settings.
    #[serde(default)]
    pub lovebali: LoveBaliConfig,
}

/// Process identity and runtime behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in logs.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Capacity of the bounded event queue between the subscription task and
    /// the dispatch loop.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long shutdown waits for the listener task before giving up.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
            queue_capacity: default_queue_capacity(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_app_name() -> String {
    "kurir".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_queue_capacity() -> usize {
    256
}

fn default_shutdown_timeout_secs() -> u64 {
    2
}

/// Firebase Realtime Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FirebaseConfig {
    /// Realtime Database root URL, e.g.
    /// `https://<project>-default-rtdb.firebaseio.com`. Required.
    #[serde(default)]
    pub database_url: String,

    /// Path within the database to listen on.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Database secret or ID token passed as the `auth` query parameter.
    /// `None` sends unauthenticated requests (open rules / emulator).
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Per-request timeout for reads, writes, and deletes.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay before re-opening a dropped event stream.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            base_path: default_base_path(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

/// Firestore document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FirestoreConfig {
    /// GCP project id hosting the Firestore database. Required.
    #[serde(default)]
    pub project_id: String,

    /// Firestore database name.
    #[serde(default = "default_firestore_database")]
    pub database: String,

    /// OAuth bearer token for the REST API. `None` sends unauthenticated
    /// requests (emulator).
    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database: default_firestore_database(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_firestore_database() -> String {
    "kommo-webhook".to_string()
}

/// Kommo CRM API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KommoConfig {
    /// Account subdomain (`example` for example.kommo.com). Required.
    #[serde(default)]
    pub subdomain: String,

    /// Long-lived API access token. Required.
    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures (timeouts, 429, 5xx).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Custom field the bridge writes outbound text into.
    #[serde(default = "default_custom_message_field_id")]
    pub custom_message_field_id: i64,

    /// Pre-configured salesbot identifiers.
    #[serde(default)]
    pub bots: BotConfig,
}

impl Default for KommoConfig {
    fn default() -> Self {
        Self {
            subdomain: String::new(),
            access_token: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            custom_message_field_id: default_custom_message_field_id(),
            bots: BotConfig::default(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_custom_message_field_id() -> i64 {
    1_069_656
}

/// Salesbot identifiers. These are fixed per CRM account, not discovered at
/// runtime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Language-selection menu bot, launched on first contact.
    #[serde(default = "default_lang_select_bot")]
    pub lang_select: i64,

    /// Reply bot that pushes the custom-message field to the user.
    #[serde(default = "default_reply_bot")]
    pub reply: i64,

    /// English main-menu bot.
    #[serde(default = "default_main_menu_en_bot")]
    pub main_menu_en: i64,

    /// Indonesian main-menu bot.
    #[serde(default = "default_main_menu_id_bot")]
    pub main_menu_id: i64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            lang_select: default_lang_select_bot(),
            reply: default_reply_bot(),
            main_menu_en: default_main_menu_en_bot(),
            main_menu_id: default_main_menu_id_bot(),
        }
    }
}

fn default_lang_select_bot() -> i64 {
    66624
}

fn default_reply_bot() -> i64 {
    66625
}

fn default_main_menu_en_bot() -> i64 {
    66626
}

fn default_main_menu_id_bot() -> i64 {
    66627
}

/// Love Bali passport-lookup API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoveBaliConfig {
    #[serde(default = "default_lovebali_base_url")]
    pub base_url: String,

    /// Bearer token for lookup requests.
    #[serde(default)]
    pub api_token: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LoveBaliConfig {
    fn default() -> Self {
        Self {
            base_url: default_lovebali_base_url(),
            api_token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_lovebali_base_url() -> String {
    "https://lovebali.baliprov.go.id/api/v2/".to_string()
}
