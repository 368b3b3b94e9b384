//! Journal entry use-case service.
//!
//! # Responsibility
//! - Provide the presentation-facing store: create, update, delete, get and
//!   the grouped query.
//! - Derive date keys before any write so a failed derivation writes nothing.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Derivation failure is returned as `JournalError::DateConversionFailed`
//!   and leaves storage untouched.
//! - The service pushes no change notifications; callers re-query.

use crate::calendar::{DateKeys, JournalCalendar};
use crate::model::entry::{EntryId, JournalEntry};
use crate::model::group::{group_by_month, EntryGroup};
use crate::repo::entry_repo::{EntryListQuery, EntryRepository, RepoError};
use chrono::{DateTime, Local, SubsecRound, TimeZone, Utc};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stored timestamps keep millisecond precision.
const STORED_SUBSEC_DIGITS: u16 = 3;

/// Service error for journal use-cases.
#[derive(Debug)]
pub enum JournalError {
    /// The calendar could not derive a month key for this date.
    DateConversionFailed { entry_date: DateTime<Utc> },
    /// Target entry does not exist.
    NotFound(EntryId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for JournalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DateConversionFailed { entry_date } => write!(
                f,
                "cannot save this date: no month key for {}",
                entry_date.to_rfc3339()
            ),
            Self::NotFound(id) => write!(f, "journal entry not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JournalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for JournalError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Journal store facade over a repository and a calendar.
pub struct JournalService<R: EntryRepository, Tz: TimeZone = Local> {
    repo: R,
    calendar: JournalCalendar<Tz>,
}

impl<R, Tz> JournalService<R, Tz>
where
    R: EntryRepository,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Creates a service using the provided repository and calendar.
    pub fn new(repo: R, calendar: JournalCalendar<Tz>) -> Self {
        Self { repo, calendar }
    }

    pub fn calendar(&self) -> &JournalCalendar<Tz> {
        &self.calendar
    }

    /// Creates one entry and returns its stable ID.
    ///
    /// # Errors
    /// - `DateConversionFailed` when no month key exists; nothing is written.
    pub fn create_entry(
        &self,
        entry_date: DateTime<Utc>,
        entry_text: impl Into<String>,
    ) -> Result<EntryId, JournalError> {
        let entry_date = entry_date.trunc_subsecs(STORED_SUBSEC_DIGITS);
        let keys = self.derive_keys(entry_date, "entry_create")?;
        let entry = JournalEntry::new(entry_date, entry_text, keys);

        let id = self.repo.create_entry(&entry)?;
        info!("event=entry_create module=service status=ok entry_id={id}");
        Ok(id)
    }

    /// Replaces date, text and all derived fields of an existing entry.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown; nothing changes.
    /// - `DateConversionFailed` when no month key exists; the stored entry
    ///   stays exactly as it was.
    pub fn update_entry(
        &self,
        id: EntryId,
        entry_date: DateTime<Utc>,
        entry_text: impl Into<String>,
    ) -> Result<(), JournalError> {
        let Some(mut entry) = self.repo.get_entry(id)? else {
            warn!("event=entry_update module=service status=error error_code=not_found entry_id={id}");
            return Err(JournalError::NotFound(id));
        };

        let entry_date = entry_date.trunc_subsecs(STORED_SUBSEC_DIGITS);
        let keys = self.derive_keys(entry_date, "entry_update")?;
        entry.apply_edit(entry_date, entry_text, keys);

        self.repo.update_entry(&entry)?;
        info!("event=entry_update module=service status=ok entry_id={id}");
        Ok(())
    }

    /// Hard-deletes one entry.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    pub fn delete_entry(&self, id: EntryId) -> Result<(), JournalError> {
        match self.repo.delete_entry(id) {
            Ok(()) => {
                info!("event=entry_delete module=service status=ok entry_id={id}");
                Ok(())
            }
            Err(err) => {
                warn!("event=entry_delete module=service status=error entry_id={id} error={err}");
                Err(err.into())
            }
        }
    }

    /// Gets one entry by stable ID.
    pub fn get_entry(&self, id: EntryId) -> Result<Option<JournalEntry>, JournalError> {
        Ok(self.repo.get_entry(id)?)
    }

    /// Returns filtered entries grouped by month, newest month first.
    ///
    /// A missing or blank filter returns every entry. No match and an empty
    /// store both return an empty list.
    pub fn query(&self, filter: Option<&str>) -> Result<Vec<EntryGroup>, JournalError> {
        let query = EntryListQuery {
            filter: filter.map(str::to_owned),
            ..EntryListQuery::default()
        };
        let entries = self.repo.list_entries(&query)?;
        let entry_count = entries.len();
        let groups = group_by_month(entries, |key| self.calendar.group_title(key));

        debug!(
            "event=entry_query module=service status=ok filtered={} entries={} groups={}",
            filter.is_some_and(|text| !text.trim().is_empty()),
            entry_count,
            groups.len()
        );
        Ok(groups)
    }

    fn derive_keys(&self, entry_date: DateTime<Utc>, event: &str) -> Result<DateKeys, JournalError> {
        self.calendar.derive_date_keys(&entry_date).ok_or_else(|| {
            warn!(
                "event={event} module=service status=error error_code=date_conversion_failed entry_date_ms={}",
                entry_date.timestamp_millis()
            );
            JournalError::DateConversionFailed { entry_date }
        })
    }
}
