//! Date-key derivation for journal entries.
//!
//! # Responsibility
//! - Convert a full entry timestamp into the month grouping key and the
//!   two display strings used for searching.
//! - Resolve the journal locale from POSIX-style names.
//!
//! # Invariants
//! - Functions are pure for a given time zone and locale.
//! - `month_key` uses calendar year and month only; time of day never
//!   moves an entry to another month.
//! - `month_key` failure is reported as `None`, never replaced by a
//!   fallback date.
//! - The stored month key is a plain calendar date, so entries written in
//!   different time zones still share a bucket and a title.

use chrono::{DateTime, Datelike, Local, Locale, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt::Display;

/// Locale used when neither configuration nor environment names one.
pub const DEFAULT_LOCALE: Locale = Locale::en_US;

const SHORT_DATE_FORMAT: &str = "%x";
const MONTH_YEAR_FORMAT: &str = "%B %Y";
const WEEKDAY_FORMAT: &str = "%A";

/// Returns day 1 of `date`'s month at local midnight in `date`'s zone.
///
/// Returns `None` when the zone cannot represent that local time, e.g. a
/// daylight-saving gap that starts at midnight. Ambiguous midnights resolve
/// to the earlier instant.
pub fn month_key<Tz: TimeZone>(date: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    date.timezone()
        .with_ymd_and_hms(date.year(), date.month(), 1, 0, 0, 0)
        .earliest()
}

/// Formats `date` with the locale's short date representation.
pub fn short_date_string<Tz>(date: &DateTime<Tz>, locale: Locale) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.format_localized(SHORT_DATE_FORMAT, locale).to_string()
}

/// Formats `date` as full month name followed by the 4-digit year.
///
/// The month name is localized; the order is always month first.
pub fn month_year_string<Tz>(date: &DateTime<Tz>, locale: Locale) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.format_localized(MONTH_YEAR_FORMAT, locale).to_string()
}

/// Formats the full localized weekday name of `date`.
pub fn weekday_name<Tz>(date: &DateTime<Tz>, locale: Locale) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.format_localized(WEEKDAY_FORMAT, locale).to_string()
}

/// Parses a POSIX locale name such as `en_US.UTF-8`, `de_DE@euro` or `C`.
///
/// Encoding and modifier suffixes are ignored. `C` maps to `POSIX`.
pub fn parse_locale(name: &str) -> Option<Locale> {
    let trimmed = name.trim();
    let base = trimmed
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();

    match base {
        "" => None,
        "C" | "POSIX" => Some(Locale::POSIX),
        other => Locale::try_from(other).ok(),
    }
}

/// Resolves the locale from `LC_ALL`, `LC_TIME`, then `LANG`.
///
/// Falls back to [`DEFAULT_LOCALE`] when none is set or recognized.
pub fn locale_from_env() -> Locale {
    ["LC_ALL", "LC_TIME", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find_map(|value| parse_locale(&value))
        .unwrap_or(DEFAULT_LOCALE)
}

/// Derived date fields that must always change together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateKeys {
    /// Day 1 of the entry's local month, without a time zone.
    pub month_key: NaiveDate,
    /// Locale short date, e.g. `10/10/23`.
    pub short_date_string: String,
    /// Month name and year, e.g. `October 2023`.
    pub month_year_string: String,
}

/// Time zone and locale the journal derives its date keys in.
#[derive(Debug, Clone)]
pub struct JournalCalendar<Tz: TimeZone = Local> {
    tz: Tz,
    locale: Locale,
}

impl JournalCalendar<Local> {
    /// Calendar in the system time zone.
    pub fn local(locale: Locale) -> Self {
        Self::new(Local, locale)
    }
}

impl<Tz> JournalCalendar<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(tz: Tz, locale: Locale) -> Self {
        Self { tz, locale }
    }

    /// Derives all grouping/search fields for `entry_date`, or nothing.
    pub fn derive_date_keys(&self, entry_date: &DateTime<Utc>) -> Option<DateKeys> {
        let local = entry_date.with_timezone(&self.tz);
        let key = month_key(&local)?;

        Some(DateKeys {
            month_key: key.date_naive(),
            short_date_string: short_date_string(&local, self.locale),
            month_year_string: month_year_string(&local, self.locale),
        })
    }

    /// Section title for a stored month key.
    ///
    /// Rendered from the key's own year and month; the calendar's time zone
    /// plays no part.
    pub fn group_title(&self, month_key: &NaiveDate) -> String {
        let month_start = month_key.and_time(NaiveTime::MIN).and_utc();
        month_year_string(&month_start, self.locale)
    }

    pub fn weekday_name(&self, date: &DateTime<Utc>) -> String {
        weekday_name(&date.with_timezone(&self.tz), self.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        month_key, month_year_string, parse_locale, short_date_string, weekday_name,
        JournalCalendar,
    };
    use chrono::{
        DateTime, Datelike, FixedOffset, LocalResult, Locale, NaiveDate, NaiveDateTime, Offset,
        TimeZone, Timelike, Utc,
    };
    use std::fmt::{Display, Formatter};

    /// Zone at UTC whose local midnight on the 1st of every month is skipped.
    #[derive(Debug, Clone, Copy)]
    struct MidnightGapZone;

    #[derive(Debug, Clone, Copy)]
    struct MidnightGapOffset;

    impl Offset for MidnightGapOffset {
        fn fix(&self) -> FixedOffset {
            FixedOffset::east_opt(0).expect("zero offset is valid")
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

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> LocalResult<MidnightGapOffset> {
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

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .expect("valid UTC timestamp")
    }

    #[test]
    fn month_key_is_first_day_at_midnight_and_idempotent() {
        let date = utc(2023, 10, 25, 17, 42);
        let key = month_key(&date).expect("UTC can represent every midnight");
        assert_eq!(key, utc(2023, 10, 1, 0, 0));
        assert_eq!(month_key(&key), Some(key));
    }

    #[test]
    fn month_key_uses_local_calendar_not_utc() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 2023-10-31 20:00 UTC is already November 1st in Tokyo.
        let date = utc(2023, 10, 31, 20, 0).with_timezone(&tokyo);
        let key = month_key(&date).unwrap();
        assert_eq!((key.year(), key.month(), key.day()), (2023, 11, 1));
        assert_eq!((key.hour(), key.minute()), (0, 0));
    }

    #[test]
    fn month_key_fails_when_midnight_does_not_exist() {
        let date = MidnightGapZone.from_utc_datetime(&utc(2024, 3, 15, 12, 0).naive_utc());
        assert!(month_key(&date).is_none());

        let calendar = JournalCalendar::new(MidnightGapZone, Locale::POSIX);
        assert!(calendar
            .derive_date_keys(&utc(2024, 3, 15, 12, 0))
            .is_none());
    }

    #[test]
    fn formats_follow_locale_rules() {
        let date = utc(2023, 10, 10, 9, 30);
        assert_eq!(short_date_string(&date, Locale::POSIX), "10/10/23");
        assert_eq!(month_year_string(&date, Locale::POSIX), "October 2023");
        assert_eq!(weekday_name(&date, Locale::POSIX), "Tuesday");

        assert_eq!(month_year_string(&date, Locale::de_DE), "Oktober 2023");
        assert_eq!(weekday_name(&date, Locale::de_DE), "Dienstag");
        assert!(short_date_string(&date, Locale::en_US).starts_with("10/10/"));
    }

    #[test]
    fn month_year_keeps_month_first_for_every_locale() {
        let date = utc(2024, 2, 14, 8, 0);
        assert_eq!(month_year_string(&date, Locale::fr_FR), "février 2024");
        assert!(month_year_string(&date, Locale::ja_JP).ends_with("2024"));
    }

    #[test]
    fn derive_date_keys_produces_consistent_fields() {
        let calendar = JournalCalendar::new(Utc, Locale::POSIX);
        let keys = calendar
            .derive_date_keys(&utc(2023, 11, 2, 23, 59))
            .expect("keys should derive");
        assert_eq!(keys.month_key, NaiveDate::from_ymd_opt(2023, 11, 1).unwrap());
        assert_eq!(keys.short_date_string, "11/02/23");
        assert_eq!(keys.month_year_string, "November 2023");
        assert_eq!(calendar.group_title(&keys.month_key), "November 2023");
    }

    #[test]
    fn month_key_and_title_do_not_depend_on_the_writing_zone() {
        let berlin = JournalCalendar::new(FixedOffset::east_opt(2 * 3600).unwrap(), Locale::POSIX);
        let new_york =
            JournalCalendar::new(FixedOffset::west_opt(4 * 3600).unwrap(), Locale::POSIX);

        let from_berlin = berlin.derive_date_keys(&utc(2023, 10, 10, 12, 0)).unwrap();
        let from_new_york = new_york.derive_date_keys(&utc(2023, 10, 20, 12, 0)).unwrap();
        assert_eq!(from_berlin.month_key, from_new_york.month_key);

        // Each zone renders the other's key with the same month.
        assert_eq!(new_york.group_title(&from_berlin.month_key), "October 2023");
        assert_eq!(berlin.group_title(&from_new_york.month_key), "October 2023");
    }

    #[test]
    fn parse_locale_accepts_posix_names() {
        assert_eq!(parse_locale("en_US.UTF-8"), Some(Locale::en_US));
        assert_eq!(parse_locale("de_DE@euro"), Some(Locale::de_DE));
        assert_eq!(parse_locale(" C "), Some(Locale::POSIX));
        assert_eq!(parse_locale("POSIX"), Some(Locale::POSIX));
        assert_eq!(parse_locale(""), None);
        assert_eq!(parse_locale("xx_NOPE"), None);
    }
}
