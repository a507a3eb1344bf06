// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Centralized catalog of user-facing messages grouped by language.
//!
//! Lookup never fails for a registered key: the fallback chain is requested
//! language, then English, then the first available translation.

use kurir_core::{Language, PassportScan};

/// Identifiers for localized user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    PassportPrompt,
    PassportInvalid,
    PassportError,
    PassportNotFound,
    PassportFound,
}

pub const DEFAULT_LANGUAGE: Language = Language::En;

fn translations(key: MessageKey) -> &'static [(Language, &'static str)] {
    match key {
        MessageKey::PassportPrompt => &[
            (Language::En, "Please enter your passport number"),
            (Language::Id, "Silakan masukkan nomor paspor Anda"),
        ],
        MessageKey::PassportInvalid => &[
            (Language::En, "Invalid passport number format"),
            (Language::Id, "Format nomor paspor tidak valid"),
        ],
        MessageKey::PassportError => &[
            (
                Language::En,
                "An error occurred while processing your passport number. Please try again later.",
            ),
            (
                Language::Id,
                "Terjadi kesalahan saat memproses nomor paspor Anda. Silakan coba lagi nanti.",
            ),
        ],
        MessageKey::PassportNotFound => &[
            (Language::En, "Passport number not found in the database"),
            (Language::Id, "Nomor paspor tidak ditemukan dalam database"),
        ],
        MessageKey::PassportFound => &[
            (
                Language::En,
                "Passport found.\n\n\
                 Voucher Code:\n{code_voucher}\n\n\
                 Guest Name:\n{guest_name}\n\n\
                 Arrival Date:\n{arrival_date}\n\n\
                 Expired Date:\n{expired_date}",
            ),
            (
                Language::Id,
                "Paspor ditemukan.\n\n\
                 Kode Voucher:\n{code_voucher}\n\n\
                 Nama Tamu:\n{guest_name}\n\n\
                 Tanggal Kedatangan:\n{arrival_date}\n\n\
                 Tanggal Kedaluwarsa:\n{expired_date}",
            ),
        ],
    }
}

/// Returns the localized message for the given key.
///
/// `None` means "language not yet detected" and resolves to the default
/// language.
pub fn get_message(key: MessageKey, language: Option<Language>) -> &'static str {
    let by_language = translations(key);
    let requested = language.unwrap_or(DEFAULT_LANGUAGE);

    by_language
        .iter()
        .find(|(lang, _)| *lang == requested)
        .or_else(|| by_language.iter().find(|(lang, _)| *lang == DEFAULT_LANGUAGE))
        .map(|(_, text)| *text)
        .unwrap_or_else(|| by_language[0].1)
}

/// Renders the passport-found template with the four lookup fields, each
/// defaulting to `-` when absent.
///
/// A template carrying none of the known placeholders is returned verbatim,
/// so a malformed template degrades to raw text instead of an error.
pub fn render_passport_found(language: Option<Language>, scan: &PassportScan) -> String {
    let template = get_message(MessageKey::PassportFound, language);
    let substitutions = [
        ("{code_voucher}", scan.code_voucher.as_deref()),
        ("{guest_name}", scan.guest_name.as_deref()),
        ("{arrival_date}", scan.arrival_date.as_deref()),
        ("{expired_date}", scan.expired_date.as_deref()),
    ];

    let mut rendered = template.to_string();
    for (placeholder, value) in substitutions {
        rendered = rendered.replace(placeholder, value.unwrap_or("-"));
    }
    rendered
}
