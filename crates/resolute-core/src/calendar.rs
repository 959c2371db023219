//! Calendar and timezone arithmetic for challenge day numbering.
//!
//! All functions are pure and take the timezone as an explicit parameter --
//! nothing here reads an ambient clock zone or locale. Day arithmetic is
//! done on `NaiveDate` (timezone-free, effectively UTC-midnight instants),
//! so daylight-saving transitions cannot shift a day boundary.

use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::ValidationError;

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The current wall-clock date in the given IANA timezone.
pub fn today_in_tz(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// 1-based day number of `date` relative to a challenge start date.
///
/// Day 1 is the start date itself. Dates before the start yield values
/// less than 1.
pub fn day_number(start: NaiveDate, date: NaiveDate) -> i64 {
    (date - start).num_days() + 1
}

/// Inverse of [`day_number`]: the calendar date of day `day`.
pub fn date_for_day(start: NaiveDate, day: i64) -> NaiveDate {
    start + Duration::days(day - 1)
}

/// Calendar arithmetic, `days` may be negative.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// Parse a `YYYY-MM-DD` date string.
///
/// # Errors
/// Returns an error if the string is not a valid calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse an IANA timezone name (e.g. `America/New_York`).
///
/// # Errors
/// Returns an error if the name is not a known timezone.
pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.parse()
        .map_err(|_| ValidationError::InvalidTimezone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_day_one_is_start_date() {
        let start = date("2024-01-01");
        assert_eq!(day_number(start, start), 1);
        assert_eq!(date_for_day(start, 1), start);
    }

    #[test]
    fn test_day_number_counts_calendar_days() {
        let start = date("2024-01-01");
        assert_eq!(day_number(start, date("2024-01-05")), 5);
        assert_eq!(day_number(start, date("2024-03-16")), 76);
        // Dates before the start fall below 1
        assert_eq!(day_number(start, date("2023-12-31")), 0);
    }

    #[test]
    fn test_day_number_spans_month_and_leap_boundaries() {
        let start = date("2024-02-27");
        // 2024 is a leap year: Feb 29 exists
        assert_eq!(day_number(start, date("2024-02-29")), 3);
        assert_eq!(day_number(start, date("2024-03-01")), 4);
    }

    #[test]
    fn test_date_for_day_inverse() {
        let start = date("2024-01-01");
        assert_eq!(date_for_day(start, 75), date("2024-03-15"));
        assert_eq!(day_number(start, date_for_day(start, 75)), 75);
    }

    #[test]
    fn test_add_days_negative() {
        assert_eq!(add_days(date("2024-01-05"), -5), date("2023-12-31"));
        assert_eq!(add_days(date("2024-01-05"), 0), date("2024-01-05"));
        assert_eq!(add_days(date("2024-12-30"), 3), date("2025-01-02"));
    }

    #[test]
    fn test_parse_and_format_round_trip() {
        assert_eq!(format_date(date("2024-01-09")), "2024-01-09");
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("America/New_York").is_ok());
        assert!(parse_timezone("UTC").is_ok());
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }

    proptest! {
        #[test]
        fn prop_day_number_round_trips(start_offset in 0i64..20_000, gap in 0i64..400) {
            let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
            let start = base + Duration::days(start_offset);
            let day = start + Duration::days(gap);
            let n = day_number(start, day);
            prop_assert!(n >= 1);
            prop_assert_eq!(date_for_day(start, n), day);
        }

        #[test]
        fn prop_add_days_is_invertible(offset in 0i64..20_000, k in -500i64..500) {
            let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + Duration::days(offset);
            prop_assert_eq!(add_days(add_days(base, k), -k), base);
        }
    }
}
