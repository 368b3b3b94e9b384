//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Name every knob the core reads from the process environment.
//! - Provide defaults that work without any configuration.
//!
//! # Invariants
//! - Blank (whitespace-only) values behave exactly like unset ones.
//! - Resolution never fails; unparsable values fall back to defaults.

use crate::calendar::{locale_from_env, parse_locale};
use crate::quote::{DEFAULT_QUOTE_BASE_URL, DEFAULT_QUOTE_TIMEOUT};
use chrono::Locale;
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_ENV: &str = "JOURNAL_DB_PATH";
pub const LOCALE_ENV: &str = "JOURNAL_LOCALE";
pub const QUOTE_URL_ENV: &str = "JOURNAL_QUOTE_URL";
pub const QUOTE_TIMEOUT_ENV: &str = "JOURNAL_QUOTE_TIMEOUT_SECS";

const DEFAULT_DB_FILE_NAME: &str = "journal.sqlite3";

/// Effective journal configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalConfig {
    pub db_path: PathBuf,
    pub locale: Locale,
    pub quote_base_url: String,
    pub quote_timeout: Duration,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            locale: locale_from_env(),
            quote_base_url: DEFAULT_QUOTE_BASE_URL.to_string(),
            quote_timeout: DEFAULT_QUOTE_TIMEOUT,
        }
    }
}

impl JournalConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = value(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(locale) = value(LOCALE_ENV).and_then(|name| parse_locale(&name)) {
            config.locale = locale;
        }
        if let Some(url) = value(QUOTE_URL_ENV) {
            config.quote_base_url = url;
        }
        if let Some(secs) = value(QUOTE_TIMEOUT_ENV)
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            config.quote_timeout = Duration::from_secs(secs);
        }

        config
    }
}
