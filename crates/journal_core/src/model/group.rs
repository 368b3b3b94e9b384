//! Month grouping of journal entries.
//!
//! # Invariants
//! - Groups are ordered by `month_key` descending.
//! - Entries inside a group are ordered by `entry_date` descending, ties
//!   broken by `id` ascending.
//! - A group is never empty.

use crate::model::entry::JournalEntry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One month section: key, display title and its entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryGroup {
    pub month_key: NaiveDate,
    /// Month-year title derived from `month_key`.
    pub title: String,
    pub entries: Vec<JournalEntry>,
}

impl EntryGroup {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sorts and buckets entries by exact `month_key` equality.
///
/// Input order does not matter. `title_for` receives each distinct key once.
pub fn group_by_month(
    mut entries: Vec<JournalEntry>,
    title_for: impl Fn(&NaiveDate) -> String,
) -> Vec<EntryGroup> {
    entries.sort_by(|a, b| {
        b.month_key
            .cmp(&a.month_key)
            .then_with(|| b.entry_date.cmp(&a.entry_date))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut groups: Vec<EntryGroup> = Vec::new();
    for entry in entries {
        match groups.last_mut() {
            Some(group) if group.month_key == entry.month_key => group.entries.push(entry),
            _ => groups.push(EntryGroup {
                month_key: entry.month_key,
                title: title_for(&entry.month_key),
                entries: vec![entry],
            }),
        }
    }

    groups
}
