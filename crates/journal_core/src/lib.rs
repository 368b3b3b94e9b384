//! Core domain logic for the journal app.
//! This crate is the single source of truth for entry storage, date keys
//! and the grouped query the UI renders.

pub mod calendar;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod quote;
pub mod repo;
pub mod search;
pub mod service;

pub use calendar::{
    locale_from_env, month_key, month_year_string, parse_locale, short_date_string,
    weekday_name, DateKeys, JournalCalendar,
};
pub use config::JournalConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{EntryId, EntryValidationError, JournalEntry};
pub use model::group::{group_by_month, EntryGroup};
pub use quote::{fetch_and_cache, Quote, QuoteCache, QuoteClient, QuoteError, SqliteQuoteCache};
pub use repo::entry_repo::{
    EntryListQuery, EntryRepository, RepoError, RepoResult, SqliteEntryRepository,
};
pub use repo::preference_repo::{PreferenceRepository, SqlitePreferenceRepository};
pub use service::journal_service::{JournalError, JournalService};
pub use service::preference_service::PreferenceService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
