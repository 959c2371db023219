//! Editability window and program-length policy.
//!
//! A day stays editable for [`GRACE_DAYS`] calendar days after it occurs,
//! leaving room for late-night logging across timezones and short
//! connectivity gaps. Once the window closes the day is judged as-is.

use serde::{Deserialize, Serialize};

/// Fixed program length in days.
pub const PROGRAM_LENGTH_DAYS: i64 = 75;

/// Days a past day remains editable after it occurs. Fixed for all users.
pub const GRACE_DAYS: i64 = 2;

/// Whether `day` may still be mutated when today is `today_day`.
///
/// Future days also satisfy this inequality; callers must reject
/// `day > today_day` upstream before consulting the window.
pub fn is_editable(day: i64, today_day: i64) -> bool {
    today_day <= day + GRACE_DAYS
}

/// Whether the grace period of `day` has fully elapsed.
pub fn grace_elapsed(day: i64, today_day: i64) -> bool {
    today_day > day + GRACE_DAYS
}

/// Highest day number whose grace period has fully elapsed, clamped to the
/// program length. Zero or negative when no day is judgeable yet.
pub fn last_judgeable_day(today_day: i64) -> i64 {
    (today_day - GRACE_DAYS - 1).min(PROGRAM_LENGTH_DAYS)
}

/// How a given day may be accessed relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayAccess {
    /// The day has not happened yet; no log may be created.
    Future,
    /// The day is within its editable window.
    Editable,
    /// The grace period ended; the log is immutable.
    Locked,
}

/// Classify a day relative to today's day number.
pub fn classify_day(day: i64, today_day: i64) -> DayAccess {
    if day > today_day {
        DayAccess::Future
    } else if is_editable(day, today_day) {
        DayAccess::Editable
    } else {
        DayAccess::Locked
    }
}
