//! Journal entry model.
//!
//! # Responsibility
//! - Define the canonical persisted entry record.
//! - Keep the user-chosen date and its derived fields in lockstep.
//!
//! # Invariants
//! - `id` is stable and never reused for another entry.
//! - `month_key`, `short_date_string` and `month_year_string` always come
//!   from one `DateKeys` derived for the current `entry_date`.
//! - `month_key` is always day 1 of a month and carries no time zone.

use crate::calendar::DateKeys;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a journal entry.
pub type EntryId = Uuid;

/// Validation failures for persisted entry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Grouping key is not the first day of a month.
    MonthKeyNotFirstOfMonth(NaiveDate),
    /// A derived display field is empty.
    EmptyDerivedField(&'static str),
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MonthKeyNotFirstOfMonth(month_key) => {
                write!(f, "month_key ({month_key}) must be the first day of a month")
            }
            Self::EmptyDerivedField(field) => write!(f, "derived field `{field}` is empty"),
        }
    }
}

impl Error for EntryValidationError {}

/// One journal record with its date-derived grouping and search fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    /// User-chosen timestamp.
    pub entry_date: DateTime<Utc>,
    /// Free-form text, may be empty.
    pub entry_text: String,
    /// Day 1 of `entry_date`'s month in the calendar that wrote the entry.
    pub month_key: NaiveDate,
    pub short_date_string: String,
    pub month_year_string: String,
}

impl JournalEntry {
    /// Creates a new entry with a generated stable ID.
    pub fn new(entry_date: DateTime<Utc>, entry_text: impl Into<String>, keys: DateKeys) -> Self {
        Self::with_id(Uuid::new_v4(), entry_date, entry_text, keys)
    }

    /// Creates an entry with a caller-provided ID.
    pub fn with_id(
        id: EntryId,
        entry_date: DateTime<Utc>,
        entry_text: impl Into<String>,
        keys: DateKeys,
    ) -> Self {
        Self {
            id,
            entry_date,
            entry_text: entry_text.into(),
            month_key: keys.month_key,
            short_date_string: keys.short_date_string,
            month_year_string: keys.month_year_string,
        }
    }

    /// Replaces date, text and every derived field in one step.
    pub fn apply_edit(
        &mut self,
        entry_date: DateTime<Utc>,
        entry_text: impl Into<String>,
        keys: DateKeys,
    ) {
        self.entry_date = entry_date;
        self.entry_text = entry_text.into();
        self.month_key = keys.month_key;
        self.short_date_string = keys.short_date_string;
        self.month_year_string = keys.month_year_string;
    }

    /// Checks the structural invariants of the derived fields.
    ///
    /// Does not re-derive keys, so entries written under another locale or
    /// time zone stay valid.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.month_key.day() != 1 {
            return Err(EntryValidationError::MonthKeyNotFirstOfMonth(self.month_key));
        }
        if self.short_date_string.trim().is_empty() {
            return Err(EntryValidationError::EmptyDerivedField("short_date_string"));
        }
        if self.month_year_string.trim().is_empty() {
            return Err(EntryValidationError::EmptyDerivedField("month_year_string"));
        }

        Ok(())
    }
}
