//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level journal functions to Dart via FRB.
//! - Flatten core results into plain envelopes the UI can render.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every mutation is followed by a fresh `entries_query` on the Dart side;
//!   nothing here caches view state.
//! - Configuration is resolved once per process.

use chrono::{DateTime, Utc};
use journal_core::db::open_db;
use journal_core::{
    core_version as core_version_inner, fetch_and_cache, init_logging as init_logging_inner,
    ping as ping_inner, EntryGroup, JournalCalendar, JournalConfig, JournalEntry, JournalError,
    JournalService, PreferenceService, QuoteCache, QuoteClient, SqliteEntryRepository,
    SqlitePreferenceRepository, SqliteQuoteCache,
};
use log::error;
use rusqlite::Connection;
use std::sync::OnceLock;
use uuid::Uuid;

static CONFIG: OnceLock<JournalConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One journal row as rendered by the list and the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryItem {
    pub entry_id: String,
    pub entry_date_epoch_ms: i64,
    pub entry_text: String,
    pub short_date_string: String,
    pub month_year_string: String,
    /// Full localized weekday, for the editor header.
    pub weekday_name: String,
}

/// One month section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryGroupItem {
    /// First day of the month as `YYYY-MM-DD`; carries no time zone.
    pub month_key: String,
    pub title: String,
    pub entries: Vec<EntryItem>,
}

/// Response envelope for the grouped list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntriesQueryResponse {
    pub ok: bool,
    /// Newest month first; empty when nothing matches.
    pub groups: Vec<EntryGroupItem>,
    pub message: String,
}

/// Response envelope for loading one entry into the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryGetResponse {
    pub ok: bool,
    pub entry: Option<EntryItem>,
    pub message: String,
}

/// Generic action response envelope for create/update/delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected entry ID.
    pub entry_id: Option<String>,
    /// `date_conversion_failed|not_found|invalid_id|invalid_date|db_error`.
    pub error_code: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, entry_id: String) -> Self {
        Self {
            ok: true,
            entry_id: Some(entry_id),
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            entry_id: None,
            error_code: Some(code.to_string()),
            message: message.into(),
        }
    }
}

/// Response envelope for boolean preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagResponse {
    pub ok: bool,
    pub value: bool,
    pub message: String,
}

/// Response envelope for quote fetch and cache reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteResponse {
    pub ok: bool,
    pub quote: Option<String>,
    pub author: Option<String>,
    /// Failure kind from the core (`status_code`, `no_data`, ...).
    pub error_code: Option<String>,
    pub message: String,
}

/// Lists entries grouped by month, optionally filtered by date text.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank `filter` lists everything.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entries_query(filter: Option<String>) -> EntriesQueryResponse {
    let result = with_journal_service(|service| {
        let groups = service.query(filter.as_deref())?;
        Ok(groups
            .into_iter()
            .map(|group| to_group_item(service, group))
            .collect::<Vec<_>>())
    });

    match result {
        Ok(groups) => {
            let message = if groups.is_empty() {
                "No entries.".to_string()
            } else {
                format!("Found {} month(s).", groups.len())
            };
            EntriesQueryResponse {
                ok: true,
                groups,
                message,
            }
        }
        Err(err) => EntriesQueryResponse {
            ok: false,
            groups: Vec::new(),
            message: format!("entries_query failed: {err}"),
        },
    }
}

/// Loads one entry for the editor.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_get(entry_id: String) -> EntryGetResponse {
    let Some(id) = parse_entry_id(&entry_id) else {
        return EntryGetResponse {
            ok: false,
            entry: None,
            message: format!("entry_get failed: invalid entry id `{entry_id}`"),
        };
    };

    match with_journal_service(|service| {
        Ok(service
            .get_entry(id)?
            .map(|entry| to_entry_item(service, entry)))
    }) {
        Ok(Some(entry)) => EntryGetResponse {
            ok: true,
            entry: Some(entry),
            message: "Entry loaded.".to_string(),
        },
        Ok(None) => EntryGetResponse {
            ok: false,
            entry: None,
            message: format!("entry_get failed: journal entry not found: {id}"),
        },
        Err(err) => EntryGetResponse {
            ok: false,
            entry: None,
            message: format!("entry_get failed: {err}"),
        },
    }
}

/// Creates an entry from the editor's save action.
///
/// # FFI contract
/// - `entry_date_epoch_ms` is the picked date in Unix epoch milliseconds.
/// - Returns the created entry ID on success.
/// - A date without a month key returns `date_conversion_failed`; the UI
///   keeps the editor open.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_create(entry_date_epoch_ms: i64, entry_text: String) -> EntryActionResponse {
    let Some(entry_date) = parse_epoch_ms(entry_date_epoch_ms) else {
        return invalid_date("entry_create", entry_date_epoch_ms);
    };

    match with_journal_service(|service| service.create_entry(entry_date, entry_text)) {
        Ok(id) => EntryActionResponse::success("Entry saved.", id.to_string()),
        Err(err) => action_failure("entry_create", err),
    }
}

/// Replaces date and text of an existing entry.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_update(
    entry_id: String,
    entry_date_epoch_ms: i64,
    entry_text: String,
) -> EntryActionResponse {
    let Some(id) = parse_entry_id(&entry_id) else {
        return invalid_id("entry_update", &entry_id);
    };
    let Some(entry_date) = parse_epoch_ms(entry_date_epoch_ms) else {
        return invalid_date("entry_update", entry_date_epoch_ms);
    };

    match with_journal_service(|service| service.update_entry(id, entry_date, entry_text)) {
        Ok(()) => EntryActionResponse::success("Entry updated.", id.to_string()),
        Err(err) => action_failure("entry_update", err),
    }
}

/// Deletes an entry from the list's delete action.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete(entry_id: String) -> EntryActionResponse {
    let Some(id) = parse_entry_id(&entry_id) else {
        return invalid_id("entry_delete", &entry_id);
    };

    match with_journal_service(|service| service.delete_entry(id)) {
        Ok(()) => EntryActionResponse::success("Entry deleted.", id.to_string()),
        Err(err) => action_failure("entry_delete", err),
    }
}

/// Reads the "has seen data-loss warning" flag when the editor opens.
#[flutter_rust_bridge::frb(sync)]
pub fn warning_seen() -> FlagResponse {
    let result = with_connection(|conn| {
        let repo = SqlitePreferenceRepository::try_new(conn).map_err(|err| err.to_string())?;
        PreferenceService::new(repo)
            .has_seen_data_loss_warning()
            .map_err(|err| err.to_string())
    });
    flag_response("warning_seen", result)
}

/// Records that the data-loss warning was dismissed.
#[flutter_rust_bridge::frb(sync)]
pub fn mark_warning_seen() -> FlagResponse {
    let result = with_connection(|conn| {
        let repo = SqlitePreferenceRepository::try_new(conn).map_err(|err| err.to_string())?;
        PreferenceService::new(repo)
            .mark_data_loss_warning_seen()
            .map(|()| true)
            .map_err(|err| err.to_string())
    });
    flag_response("mark_warning_seen", result)
}

/// Fetches a new quote and caches it on success.
///
/// # FFI contract
/// - Async call: FRB runs it on a worker thread, never the UI isolate.
/// - Reports a failure once; no retry.
/// - Cache write failures do not affect the response.
pub fn quote_fetch() -> QuoteResponse {
    let config = resolve_config();
    let client = match QuoteClient::new(config.quote_base_url.clone(), config.quote_timeout) {
        Ok(client) => client,
        Err(err) => return quote_failure("quote_fetch", Some(err.code()), err.to_string()),
    };

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            // Without a cache the quote is still worth showing.
            error!("event=quote_fetch module=ffi status=error error_code=db_open_failed error={err}");
            return match client.fetch_quote() {
                Ok(quote) => quote_success("Quote fetched.", quote.quote, quote.author),
                Err(err) => quote_failure("quote_fetch", Some(err.code()), err.to_string()),
            };
        }
    };

    let result = match SqliteQuoteCache::try_new(&conn) {
        Ok(cache) => fetch_and_cache(&client, &cache),
        Err(err) => {
            error!("event=quote_fetch module=ffi status=error error_code=cache_unavailable error={err}");
            client.fetch_quote()
        }
    };

    match result {
        Ok(quote) => quote_success("Quote fetched.", quote.quote, quote.author),
        Err(err) => quote_failure("quote_fetch", Some(err.code()), err.to_string()),
    }
}

/// Returns the cached quote, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn quote_cached() -> QuoteResponse {
    let result = with_connection(|conn| {
        let cache = SqliteQuoteCache::try_new(conn).map_err(|err| err.to_string())?;
        cache.load_quote().map_err(|err| err.to_string())
    });

    match result {
        Ok(Some(quote)) => quote_success("Cached quote.", quote.quote, quote.author),
        Ok(None) => QuoteResponse {
            ok: true,
            quote: None,
            author: None,
            error_code: None,
            message: "No cached quote.".to_string(),
        },
        Err(err) => quote_failure("quote_cached", None, err),
    }
}

fn resolve_config() -> &'static JournalConfig {
    CONFIG.get_or_init(JournalConfig::from_env)
}

fn with_connection<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let config = resolve_config();
    let conn = open_db(&config.db_path).map_err(|err| format!("journal DB open failed: {err}"))?;
    f(&conn)
}

fn with_journal_service<T>(
    f: impl FnOnce(&JournalService<SqliteEntryRepository<'_>>) -> Result<T, JournalError>,
) -> Result<T, FfiError> {
    let config = resolve_config();
    let conn = open_db(&config.db_path)
        .map_err(|err| FfiError::Storage(format!("journal DB open failed: {err}")))?;
    let repo = SqliteEntryRepository::try_new(&conn)
        .map_err(|err| FfiError::Storage(format!("journal repo init failed: {err}")))?;
    let service = JournalService::new(repo, JournalCalendar::local(config.locale));
    f(&service).map_err(FfiError::Journal)
}

/// Failure of a DB-backed call, before or inside the service.
#[derive(Debug)]
enum FfiError {
    Storage(String),
    Journal(JournalError),
}

impl FfiError {
    fn code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "db_error",
            Self::Journal(JournalError::DateConversionFailed { .. }) => "date_conversion_failed",
            Self::Journal(JournalError::NotFound(_)) => "not_found",
            Self::Journal(JournalError::Repo(_)) => "db_error",
        }
    }
}

impl std::fmt::Display for FfiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(message) => write!(f, "{message}"),
            Self::Journal(err) => write!(f, "{err}"),
        }
    }
}

fn action_failure(operation: &str, err: FfiError) -> EntryActionResponse {
    EntryActionResponse::failure(err.code(), format!("{operation} failed: {err}"))
}

fn invalid_id(operation: &str, raw: &str) -> EntryActionResponse {
    EntryActionResponse::failure(
        "invalid_id",
        format!("{operation} failed: invalid entry id `{raw}`"),
    )
}

fn invalid_date(operation: &str, epoch_ms: i64) -> EntryActionResponse {
    EntryActionResponse::failure(
        "invalid_date",
        format!("{operation} failed: timestamp {epoch_ms} is out of range"),
    )
}

fn flag_response(operation: &str, result: Result<bool, String>) -> FlagResponse {
    match result {
        Ok(value) => FlagResponse {
            ok: true,
            value,
            message: String::new(),
        },
        Err(err) => FlagResponse {
            ok: false,
            value: false,
            message: format!("{operation} failed: {err}"),
        },
    }
}

fn quote_success(message: &str, quote: String, author: String) -> QuoteResponse {
    QuoteResponse {
        ok: true,
        quote: Some(quote),
        author: Some(author),
        error_code: None,
        message: message.to_string(),
    }
}

fn quote_failure(operation: &str, code: Option<&str>, message: String) -> QuoteResponse {
    QuoteResponse {
        ok: false,
        quote: None,
        author: None,
        error_code: code.map(str::to_string),
        message: format!("{operation} failed: {message}"),
    }
}

fn parse_entry_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

fn parse_epoch_ms(epoch_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(epoch_ms)
}

fn to_group_item(service: &JournalService<SqliteEntryRepository<'_>>, group: EntryGroup) -> EntryGroupItem {
    EntryGroupItem {
        month_key: group.month_key.format("%Y-%m-%d").to_string(),
        title: group.title,
        entries: group
            .entries
            .into_iter()
            .map(|entry| to_entry_item(service, entry))
            .collect(),
    }
}

fn to_entry_item(service: &JournalService<SqliteEntryRepository<'_>>, entry: JournalEntry) -> EntryItem {
    EntryItem {
        entry_id: entry.id.to_string(),
        entry_date_epoch_ms: entry.entry_date.timestamp_millis(),
        weekday_name: service.calendar().weekday_name(&entry.entry_date),
        entry_text: entry.entry_text,
        short_date_string: entry.short_date_string,
        month_year_string: entry.month_year_string,
    }
}
