// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: required credentials, URL schemes, path shapes. Collects all
//! errors instead of failing fast so a misconfigured deployment is fixed in
//! one round trip.

use crate::diagnostic::ConfigError;
use crate::model::KurirConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors.
pub fn validate_config(config: &KurirConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let database_url = config.firebase.database_url.trim();
    if database_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "firebase.database_url is required (e.g. https://<project>-default-rtdb.firebaseio.com)"
                .to_string(),
        });
    } else if !database_url.starts_with("http://") && !database_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!(
                "firebase.database_url `{database_url}` must start with http:// or https://"
            ),
        });
    }

    if !config.firebase.base_path.starts_with('/') {
        errors.push(ConfigError::Validation {
            message: format!(
                "firebase.base_path `{}` must start with `/`",
                config.firebase.base_path
            ),
        });
    }

    if config.firestore.project_id.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "firestore.project_id is required".to_string(),
        });
    }

    if config.kommo.subdomain.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "kommo.subdomain is required".to_string(),
        });
    }

    if config.kommo.access_token.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "kommo.access_token is required".to_string(),
        });
    }

    if config.kommo.custom_message_field_id <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "kommo.custom_message_field_id must be positive, got {}",
                config.kommo.custom_message_field_id
            ),
        });
    }

    let lovebali_url = config.lovebali.base_url.trim();
    if !lovebali_url.starts_with("http://") && !lovebali_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!(
                "lovebali.base_url `{lovebali_url}` must start with http:// or https://"
            ),
        });
    }

    if config.app.queue_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "app.queue_capacity must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> KurirConfig {
        let mut config = KurirConfig::default();
        config.firebase.database_url = "https://demo-default-rtdb.firebaseio.com".into();
        config.firestore.project_id = "demo-project".into();
        config.kommo.subdomain = "demo".into();
        config.kommo.access_token = "token".into();
        config
    }

    #[test]
    fn complete_config_validates() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn default_config_reports_all_missing_credentials() {
        let errors = validate_config(&KurirConfig::default()).unwrap_err();
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        for needle in [
            "firebase.database_url",
            "firestore.project_id",
            "kommo.subdomain",
            "kommo.access_token",
        ] {
            assert!(
                messages.iter().any(|m| m.contains(needle)),
                "expected an error mentioning {needle}, got {messages:?}"
            );
        }
    }

    #[test]
    fn bad_database_url_scheme_fails() {
        let mut config = valid_config();
        config.firebase.database_url = "ftp://example.com".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("http"))
        ));
    }

    #[test]
    fn base_path_without_leading_slash_fails() {
        let mut config = valid_config();
        config.firebase.base_path = "incoming".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("base_path"))
        ));
    }

    #[test]
    fn zero_queue_capacity_fails() {
        let mut config = valid_config();
        config.app.queue_capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("queue_capacity"))
        ));
    }

    #[test]
    fn negative_field_id_fails() {
        let mut config = valid_config();
        config.kommo.custom_message_field_id = -1;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("custom_message_field_id"))
        ));
    }
}
