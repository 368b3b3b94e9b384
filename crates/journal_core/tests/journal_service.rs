use chrono::{
    DateTime, Datelike, FixedOffset, LocalResult, Locale, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, TimeZone, Timelike, Utc,
};
use journal_core::db::open_db_in_memory;
use journal_core::{
    month_key, EntryGroup, JournalCalendar, JournalError, JournalService, SqliteEntryRepository,
};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn service(conn: &Connection) -> JournalService<SqliteEntryRepository<'_>, Utc> {
    let repo = SqliteEntryRepository::try_new(conn).unwrap();
    JournalService::new(repo, JournalCalendar::new(Utc, Locale::POSIX))
}

fn first_of(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

fn titles(groups: &[EntryGroup]) -> Vec<&str> {
    groups.iter().map(|g| g.title.as_str()).collect()
}

fn all_ids(groups: &[EntryGroup]) -> Vec<Uuid> {
    groups
        .iter()
        .flat_map(|g| g.entries.iter().map(|e| e.id))
        .collect()
}

struct Seeded {
    oct_10: Uuid,
    oct_25: Uuid,
    nov_02: Uuid,
}

fn seed(svc: &JournalService<SqliteEntryRepository<'_>, Utc>) -> Seeded {
    Seeded {
        oct_10: svc.create_entry(at(2023, 10, 10, 20), "first").unwrap(),
        oct_25: svc.create_entry(at(2023, 10, 25, 7), "second").unwrap(),
        nov_02: svc.create_entry(at(2023, 11, 2, 13), "third").unwrap(),
    }
}

#[test]
fn unfiltered_query_groups_by_month_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let ids = seed(&svc);

    let groups = svc.query(Some("")).unwrap();
    assert_eq!(titles(&groups), vec!["November 2023", "October 2023"]);
    assert_eq!(groups[0].month_key, first_of(2023, 11));
    assert_eq!(all_ids(&groups[..1]), vec![ids.nov_02]);
    assert_eq!(all_ids(&groups[1..]), vec![ids.oct_25, ids.oct_10]);

    assert_eq!(svc.query(None).unwrap(), groups);
}

#[test]
fn month_name_filter_returns_only_that_month() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let ids = seed(&svc);

    let groups = svc.query(Some("October")).unwrap();
    assert_eq!(titles(&groups), vec!["October 2023"]);
    assert_eq!(all_ids(&groups), vec![ids.oct_25, ids.oct_10]);

    let lower = svc.query(Some("ocTOber")).unwrap();
    assert_eq!(lower, groups);
}

#[test]
fn short_date_filter_matches_single_entry() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let ids = seed(&svc);

    let groups = svc.query(Some("11/02")).unwrap();
    assert_eq!(titles(&groups), vec!["November 2023"]);
    assert_eq!(all_ids(&groups), vec![ids.nov_02]);
    assert_eq!(groups[0].entries[0].short_date_string, "11/02/23");
}

#[test]
fn filtering_by_displayed_strings_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    seed(&svc);

    for group in svc.query(None).unwrap() {
        for entry in &group.entries {
            for text in [&entry.short_date_string, &entry.month_year_string] {
                let first = svc.query(Some(text.as_str())).unwrap();
                let ids = all_ids(&first);
                assert!(ids.contains(&entry.id));

                let again = svc.query(Some(text.as_str())).unwrap();
                assert_eq!(all_ids(&again), ids);
            }
        }
    }
}

#[test]
fn moving_an_entry_to_a_new_month_creates_a_new_leading_group() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let ids = seed(&svc);

    svc.update_entry(ids.oct_10, at(2023, 12, 1, 10), "moved").unwrap();

    let groups = svc.query(None).unwrap();
    assert_eq!(
        titles(&groups),
        vec!["December 2023", "November 2023", "October 2023"]
    );
    assert_eq!(all_ids(&groups[..1]), vec![ids.oct_10]);
    assert_eq!(all_ids(&groups[2..]), vec![ids.oct_25]);

    let moved = svc.get_entry(ids.oct_10).unwrap().unwrap();
    assert_eq!(moved.entry_text, "moved");
    assert_eq!(moved.month_key, first_of(2023, 12));
    assert_eq!(moved.short_date_string, "12/01/23");
    assert_eq!(moved.month_year_string, "December 2023");
}

#[test]
fn emptying_a_month_removes_its_group() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let ids = seed(&svc);

    svc.delete_entry(ids.nov_02).unwrap();

    let groups = svc.query(None).unwrap();
    assert_eq!(titles(&groups), vec!["October 2023"]);
    assert!(!all_ids(&groups).contains(&ids.nov_02));
    assert!(svc.query(Some("11/02")).unwrap().is_empty());
}

#[test]
fn empty_store_and_no_match_return_empty_groups() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    assert!(svc.query(None).unwrap().is_empty());
    seed(&svc);
    assert!(svc.query(Some("March")).unwrap().is_empty());
}

#[test]
fn update_and_delete_unknown_ids_report_not_found_without_changes() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    seed(&svc);
    let before = svc.query(None).unwrap();
    let ghost = Uuid::new_v4();

    let err = svc.update_entry(ghost, at(2024, 1, 1, 9), "x").unwrap_err();
    assert!(matches!(err, JournalError::NotFound(id) if id == ghost));

    let err = svc.delete_entry(ghost).unwrap_err();
    assert!(matches!(err, JournalError::NotFound(id) if id == ghost));

    assert_eq!(svc.query(None).unwrap(), before);
}

#[test]
fn stored_dates_keep_millisecond_precision() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let precise = at(2023, 10, 10, 9) + chrono::Duration::nanoseconds(123_456_789);
    let id = svc.create_entry(precise, "precise").unwrap();

    let loaded = svc.get_entry(id).unwrap().unwrap();
    assert_eq!(loaded.entry_date.timestamp_millis(), precise.timestamp_millis());
    assert_eq!(loaded.entry_date.nanosecond(), 123_000_000);
}

#[test]
fn local_calendar_buckets_by_local_month() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let svc = JournalService::new(repo, JournalCalendar::new(tokyo, Locale::POSIX));

    // Late October in UTC, already November in Tokyo.
    let id = svc.create_entry(at(2023, 10, 31, 20), "").unwrap();

    let groups = svc.query(None).unwrap();
    assert_eq!(titles(&groups), vec!["November 2023"]);
    let entry = svc.get_entry(id).unwrap().unwrap();
    assert_eq!(entry.short_date_string, "11/01/23");
    assert_eq!(entry.month_key, first_of(2023, 11));
    let local = entry.entry_date.with_timezone(&tokyo);
    assert_eq!(month_key(&local).map(|key| key.date_naive()), Some(entry.month_key));
}

#[test]
fn entries_written_in_different_zones_share_one_month_group() {
    let conn = open_db_in_memory().unwrap();
    let berlin = FixedOffset::east_opt(2 * 3600).unwrap();
    let new_york = FixedOffset::west_opt(4 * 3600).unwrap();
    let svc_berlin = JournalService::new(
        SqliteEntryRepository::try_new(&conn).unwrap(),
        JournalCalendar::new(berlin, Locale::POSIX),
    );
    let svc_new_york = JournalService::new(
        SqliteEntryRepository::try_new(&conn).unwrap(),
        JournalCalendar::new(new_york, Locale::POSIX),
    );

    let early = svc_berlin.create_entry(at(2023, 10, 10, 12), "berlin").unwrap();
    let late = svc_new_york.create_entry(at(2023, 10, 20, 12), "new york").unwrap();

    for groups in [svc_new_york.query(None).unwrap(), svc_berlin.query(None).unwrap()] {
        assert_eq!(titles(&groups), vec!["October 2023"]);
        assert_eq!(groups[0].month_key, first_of(2023, 10));
        assert_eq!(all_ids(&groups), vec![late, early]);
    }

    let filtered = svc_new_york.query(Some("October")).unwrap();
    assert_eq!(titles(&filtered), vec!["October 2023"]);
    assert_eq!(all_ids(&filtered), vec![late, early]);
}

/// Zone at +01:00 for the first half of each month and +02:00 from the
/// 15th (UTC) on, so every month has a spring-forward gap mid-month and a
/// fall-back overlap just after local midnight on the 1st.
#[derive(Debug, Clone, Copy)]
struct HalfMonthDstZone;

impl HalfMonthDstZone {
    fn offset_hours_at(utc: &NaiveDateTime) -> i32 {
        if utc.day() >= 15 {
            2
        } else {
            1
        }
    }

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }
}

impl TimeZone for HalfMonthDstZone {
    type Offset = FixedOffset;

    fn from_offset(_offset: &FixedOffset) -> Self {
        HalfMonthDstZone
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
        self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
        // Earlier instant first, so `earliest()` picks the larger offset.
        let valid = [2, 1]
            .into_iter()
            .filter(|hours| {
                let utc = *local - chrono::Duration::hours(i64::from(*hours));
                Self::offset_hours_at(&utc) == *hours
            })
            .map(Self::offset)
            .collect::<Vec<_>>();
        match valid.as_slice() {
            [] => LocalResult::None,
            [only] => LocalResult::Single(*only),
            [earlier, later, ..] => LocalResult::Ambiguous(*earlier, *later),
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
        Self::offset(Self::offset_hours_at(utc))
    }
}

#[test]
fn offset_shifts_inside_a_month_do_not_move_entries() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();
    let svc = JournalService::new(repo, JournalCalendar::new(HalfMonthDstZone, Locale::POSIX));

    // +01:00 before the shift, +02:00 after it.
    let march_early = svc.create_entry(at(2024, 3, 10, 12), "").unwrap();
    let march_late = svc.create_entry(at(2024, 3, 20, 12), "").unwrap();
    // 2024-03-31T22:30Z is 00:30 on April 1st at +02:00.
    let april_first = svc
        .create_entry(at(2024, 3, 31, 22) + chrono::Duration::minutes(30), "")
        .unwrap();
    // 2024-04-01T00:30Z is 01:30 on April 1st at +01:00.
    let april_after_shift = svc
        .create_entry(at(2024, 4, 1, 0) + chrono::Duration::minutes(30), "")
        .unwrap();

    let groups = svc.query(None).unwrap();
    assert_eq!(titles(&groups), vec!["April 2024", "March 2024"]);
    assert_eq!(groups[0].month_key, first_of(2024, 4));
    assert_eq!(all_ids(&groups[..1]), vec![april_after_shift, april_first]);
    assert_eq!(groups[1].month_key, first_of(2024, 3));
    assert_eq!(all_ids(&groups[1..]), vec![march_late, march_early]);

    let first = svc.get_entry(april_first).unwrap().unwrap();
    assert_eq!(first.short_date_string, "04/01/24");
    assert_eq!(first.month_year_string, "April 2024");
}

/// UTC-aligned zone that skips local midnight on the 1st of every month.
#[derive(Debug, Clone, Copy)]
struct MidnightGapZone;

#[derive(Debug, Clone, Copy)]
struct MidnightGapOffset;

impl Offset for MidnightGapOffset {
    fn fix(&self) -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }
}

impl Display for MidnightGapOffset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "+00:00")
    }
}

impl TimeZone for MidnightGapZone {
    type Offset = MidnightGapOffset;

    fn from_offset(_offset: &MidnightGapOffset) -> Self {
        MidnightGapZone
    }

    fn offset_from_local_date(&self, _local: &NaiveDate) -> LocalResult<MidnightGapOffset> {
        LocalResult::Single(MidnightGapOffset)
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<MidnightGapOffset> {
        if local.day() == 1 && local.hour() == 0 {
            LocalResult::None
        } else {
            LocalResult::Single(MidnightGapOffset)
        }
    }

    fn offset_from_utc_date(&self, _utc: &NaiveDate) -> MidnightGapOffset {
        MidnightGapOffset
    }

    fn offset_from_utc_datetime(&self, _utc: &NaiveDateTime) -> MidnightGapOffset {
        MidnightGapOffset
    }
}

#[test]
fn date_conversion_failure_writes_nothing() {
    let conn = open_db_in_memory().unwrap();

    // Seed one entry through a working calendar.
    let id = service(&conn)
        .create_entry(at(2023, 10, 10, 9), "keep me")
        .unwrap();
    let before = service(&conn).get_entry(id).unwrap().unwrap();

    let repo = SqliteEntryRepository::try_new(&conn).unwrap();
    let broken = JournalService::new(repo, JournalCalendar::new(MidnightGapZone, Locale::POSIX));

    let err = broken.create_entry(at(2024, 3, 15, 12), "never stored").unwrap_err();
    assert!(matches!(err, JournalError::DateConversionFailed { .. }));

    let err = broken.update_entry(id, at(2024, 3, 15, 12), "changed").unwrap_err();
    assert!(matches!(
        err,
        JournalError::DateConversionFailed { entry_date } if entry_date == at(2024, 3, 15, 12)
    ));

    let after = service(&conn).get_entry(id).unwrap().unwrap();
    assert_eq!(after, before);
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM journal_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn journal_error_messages_are_user_facing() {
    let err = JournalError::DateConversionFailed {
        entry_date: at(2024, 3, 15, 12),
    };
    assert!(err.to_string().starts_with("cannot save this date"));
}
