//! Journal entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert, update-by-id, delete-by-id and filtered listing over
//!   `journal_entries`.
//! - Maintain the folded search columns next to the display strings.
//!
//! # Invariants
//! - Write paths call `JournalEntry::validate()` before SQL mutations.
//! - Every write replaces all derived columns in the same statement.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listing order is `month_key DESC, entry_date DESC, uuid ASC`.

use crate::db::migrations::ensure_schema_current;
use crate::db::DbError;
use crate::model::entry::{EntryId, EntryValidationError, JournalEntry};
use crate::search::fold::{fold_search_text, normalize_filter};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MONTH_KEY_FORMAT: &str = "%Y-%m-%d";

const ENTRY_SELECT_SQL: &str = "SELECT
    uuid,
    entry_date,
    entry_text,
    month_key,
    short_date_string,
    month_year_string
FROM journal_entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Db(DbError),
    NotFound(EntryId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "journal entry not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryListQuery {
    /// Substring matched against short date OR month-year, case- and
    /// diacritic-insensitively. Blank means no filter.
    pub filter: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl EntryListQuery {
    pub fn filtered(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

/// Repository interface for journal entry CRUD operations.
pub trait EntryRepository {
    fn create_entry(&self, entry: &JournalEntry) -> RepoResult<EntryId>;
    fn update_entry(&self, entry: &JournalEntry) -> RepoResult<()>;
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>>;
    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<JournalEntry>>;
    fn delete_entry(&self, id: EntryId) -> RepoResult<()>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `RepoError::Db(DbError::NotMigrated)` for a raw connection that
    ///   did not go through `open_db`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create_entry(&self, entry: &JournalEntry) -> RepoResult<EntryId> {
        entry.validate()?;

        self.conn.execute(
            "INSERT INTO journal_entries (
                uuid,
                entry_date,
                entry_text,
                month_key,
                short_date_string,
                month_year_string,
                short_date_search,
                month_year_search
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                entry.id.to_string(),
                entry.entry_date.timestamp_millis(),
                entry.entry_text.as_str(),
                entry.month_key.format(MONTH_KEY_FORMAT).to_string(),
                entry.short_date_string.as_str(),
                entry.month_year_string.as_str(),
                fold_search_text(&entry.short_date_string),
                fold_search_text(&entry.month_year_string),
            ],
        )?;

        Ok(entry.id)
    }

    fn update_entry(&self, entry: &JournalEntry) -> RepoResult<()> {
        entry.validate()?;

        let changed = self.conn.execute(
            "UPDATE journal_entries
             SET
                entry_date = ?1,
                entry_text = ?2,
                month_key = ?3,
                short_date_string = ?4,
                month_year_string = ?5,
                short_date_search = ?6,
                month_year_search = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?8;",
            params![
                entry.entry_date.timestamp_millis(),
                entry.entry_text.as_str(),
                entry.month_key.format(MONTH_KEY_FORMAT).to_string(),
                entry.short_date_string.as_str(),
                entry.month_year_string.as_str(),
                fold_search_text(&entry.short_date_string),
                fold_search_text(&entry.month_year_string),
                entry.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(entry.id));
        }

        Ok(())
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }

        Ok(None)
    }

    fn list_entries(&self, query: &EntryListQuery) -> RepoResult<Vec<JournalEntry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(needle) = normalize_filter(query.filter.as_deref()) {
            sql.push_str(" AND (instr(short_date_search, ?) > 0 OR instr(month_year_search, ?) > 0)");
            bind_values.push(Value::Text(needle.clone()));
            bind_values.push(Value::Text(needle));
        }

        sql.push_str(" ORDER BY month_key DESC, entry_date DESC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn delete_entry(&self, id: EntryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM journal_entries WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<JournalEntry> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in journal_entries.uuid"
        ))
    })?;

    let entry = JournalEntry {
        id,
        entry_date: parse_epoch_ms(row.get("entry_date")?, "entry_date")?,
        entry_text: row.get("entry_text")?,
        month_key: parse_month_key(&row.get::<_, String>("month_key")?)?,
        short_date_string: row.get("short_date_string")?,
        month_year_string: row.get("month_year_string")?,
    };
    entry.validate()?;
    Ok(entry)
}

fn parse_epoch_ms(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "timestamp `{value}` out of range in journal_entries.{column}"
        ))
    })
}

fn parse_month_key(value: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, MONTH_KEY_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{value}` in journal_entries.month_key"
        ))
    })
}
