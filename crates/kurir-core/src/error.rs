// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Kurir event bridge.

use thiserror::Error;

/// The primary error type used across all Kurir collaborator traits and core
/// operations.
#[derive(Debug, Error)]
pub enum KurirError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Realtime-store errors (stream disconnect, read/write/delete failure).
    #[error("realtime store error: {message}")]
    Realtime {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Document-store errors (Firestore request failure, document decode failure).
    #[error("document store error: {message}")]
    Store {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// CRM API errors (request failure, rate limiting, authentication).
    #[error("crm error: {message}")]
    Crm {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Passport-lookup API errors; carries the HTTP status when one was received.
    #[error("passport lookup error: {message}")]
    Passport {
        message: String,
        status: Option<u16>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KurirError {
    /// The HTTP status carried by CRM and passport-lookup errors, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            KurirError::Crm { status, .. } | KurirError::Passport { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accessor_covers_http_variants() {
        let crm = KurirError::Crm {
            message: "rate limited".into(),
            status: Some(429),
            source: None,
        };
        assert_eq!(crm.status(), Some(429));

        let passport = KurirError::Passport {
            message: "not found".into(),
            status: Some(404),
        };
        assert_eq!(passport.status(), Some(404));

        assert_eq!(KurirError::Config("x".into()).status(), None);
    }
}
