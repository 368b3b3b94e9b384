//! Preference repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist small user flags that live outside journal entries.
//!
//! # Invariants
//! - Flags are stored as `"true"`/`"false"`; any other value is invalid.
//! - Preference writes never touch `journal_entries`.

use crate::db::migrations::ensure_schema_current;
use crate::repo::entry_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for persisted preference flags.
pub trait PreferenceRepository {
    /// Returns the stored flag, or `None` when it was never written.
    fn get_flag(&self, key: &str) -> RepoResult<Option<bool>>;
    fn set_flag(&self, key: &str, value: bool) -> RepoResult<()>;
}

/// SQLite-backed preference repository.
pub struct SqlitePreferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferenceRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        Ok(Self { conn })
    }
}

impl PreferenceRepository for SqlitePreferenceRepository<'_> {
    fn get_flag(&self, key: &str) -> RepoResult<Option<bool>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        match raw.as_deref() {
            None => Ok(None),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(other) => Err(RepoError::InvalidData(format!(
                "invalid flag value `{other}` for preference `{key}`"
            ))),
        }
    }

    fn set_flag(&self, key: &str, value: bool) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, if value { "true" } else { "false" }],
        )?;
        Ok(())
    }
}
