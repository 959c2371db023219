//! Daily-log mutations and the per-day read model.
//!
//! All writes go through here so the derived `all_requirements_met` flag
//! and `completed_at` timestamp stay consistent with the hard habit set.
//! Future days and days past their grace window are rejected upstream of
//! the storage layer.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::challenge::policy::{self, DayAccess, PROGRAM_LENGTH_DAYS};
use crate::challenge::{
    entry_satisfied, requirements_met, Challenge, ChallengeStatus, DailyLog, HabitDefinition,
    HabitEntry, HabitKind, HabitValue,
};
use crate::error::{CoreError, ValidationError};
use crate::storage::ChallengeDb;

/// Record a habit value for one day of a challenge.
///
/// Resolves "today" from the given timezone, then delegates to
/// [`record_as_of`].
///
/// # Errors
/// Returns an error if the day is out of range, in the future, locked, or
/// the habit is unknown; or if storage fails.
pub fn record(
    db: &ChallengeDb,
    challenge_id: &str,
    habit_id: &str,
    day: i64,
    value: HabitValue,
    tz: Tz,
) -> Result<DailyLog, CoreError> {
    record_as_of(db, challenge_id, habit_id, day, value, calendar::today_in_tz(tz))
}

/// Record a habit value with an explicit "today" date.
///
/// # Errors
/// See [`record`].
pub fn record_as_of(
    db: &ChallengeDb,
    challenge_id: &str,
    habit_id: &str,
    day: i64,
    value: HabitValue,
    today: NaiveDate,
) -> Result<DailyLog, CoreError> {
    let challenge = db.require_challenge(challenge_id)?;
    check_day_writable(&challenge, day, today)?;

    let habits = db.list_active_habits(challenge_id)?;
    let habit = habits
        .iter()
        .find(|h| h.id == habit_id)
        .ok_or_else(|| ValidationError::UnknownHabit {
            habit_id: habit_id.to_string(),
        })?;
    check_value_shape(habit, value)?;

    let mut log = db
        .get_daily_log(challenge_id, day)?
        .unwrap_or_else(|| DailyLog::empty(challenge_id, day));
    log.set_entry(HabitEntry {
        habit_id: habit_id.to_string(),
        value,
    });

    let met = requirements_met(&habits, &log.entries);
    log.all_requirements_met = met;
    log.completed_at = match (met, log.completed_at) {
        (true, Some(existing)) => Some(existing),
        (true, None) => Some(Utc::now()),
        (false, _) => None,
    };
    log.updated_at = Utc::now();

    db.upsert_daily_log(&log)?;
    Ok(log)
}

fn check_day_writable(
    challenge: &Challenge,
    day: i64,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if challenge.status != ChallengeStatus::Active {
        return Err(ValidationError::ChallengeNotActive {
            status: challenge.status.as_str().to_string(),
        });
    }
    if !(1..=PROGRAM_LENGTH_DAYS).contains(&day) {
        return Err(ValidationError::DayOutOfRange {
            day,
            max: PROGRAM_LENGTH_DAYS,
        });
    }

    let today_day = calendar::day_number(challenge.start_date, today);
    match policy::classify_day(day, today_day) {
        DayAccess::Future => Err(ValidationError::FutureDay {
            day,
            today: today_day,
        }),
        DayAccess::Locked => Err(ValidationError::DayLocked {
            day,
            today: today_day,
        }),
        DayAccess::Editable => Ok(()),
    }
}

fn check_value_shape(habit: &HabitDefinition, value: HabitValue) -> Result<(), ValidationError> {
    let matches = matches!(
        (habit.kind, value),
        (HabitKind::Task, HabitValue::Task { .. })
            | (HabitKind::Counter { .. }, HabitValue::Counter { .. })
    );
    if matches {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: habit.name.clone(),
            message: match habit.kind {
                HabitKind::Task => "expected a task value".to_string(),
                HabitKind::Counter { .. } => "expected a counter value".to_string(),
            },
        })
    }
}

/// One habit's state within a [`DayView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitStatus {
    pub habit: HabitDefinition,
    pub value: Option<HabitValue>,
    pub satisfied: bool,
}

/// The read model for one day: definitions joined with recorded entries,
/// plus how the day may currently be accessed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayView {
    pub day_number: i64,
    pub date: NaiveDate,
    pub access: DayAccess,
    pub all_requirements_met: bool,
    pub habits: Vec<HabitStatus>,
}

/// Build the read model for one day of a challenge.
///
/// # Errors
/// Returns an error if the challenge is missing, the day is out of range,
/// or storage fails.
pub fn day_view(
    db: &ChallengeDb,
    challenge_id: &str,
    day: i64,
    tz: Tz,
) -> Result<DayView, CoreError> {
    day_view_as_of(db, challenge_id, day, calendar::today_in_tz(tz))
}

/// Build the read model for one day with an explicit "today" date.
///
/// # Errors
/// See [`day_view`].
pub fn day_view_as_of(
    db: &ChallengeDb,
    challenge_id: &str,
    day: i64,
    today: NaiveDate,
) -> Result<DayView, CoreError> {
    let challenge = db.require_challenge(challenge_id)?;
    if !(1..=PROGRAM_LENGTH_DAYS).contains(&day) {
        return Err(ValidationError::DayOutOfRange {
            day,
            max: PROGRAM_LENGTH_DAYS,
        }
        .into());
    }

    let today_day = calendar::day_number(challenge.start_date, today);
    let habits = db.list_active_habits(challenge_id)?;
    let log = db.get_daily_log(challenge_id, day)?;
    let entries: &[HabitEntry] = log.as_ref().map(|l| l.entries.as_slice()).unwrap_or(&[]);

    let statuses = habits
        .into_iter()
        .map(|habit| {
            let entry = entries.iter().find(|e| e.habit_id == habit.id);
            HabitStatus {
                satisfied: entry_satisfied(&habit, entry),
                value: entry.map(|e| e.value),
                habit,
            }
        })
        .collect();

    Ok(DayView {
        day_number: day,
        date: calendar::date_for_day(challenge.start_date, day),
        access: policy::classify_day(day, today_day),
        all_requirements_met: log.as_ref().is_some_and(|l| l.all_requirements_met),
        habits: statuses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::Visibility;

    fn date(s: &str) -> NaiveDate {
        calendar::parse_date(s).unwrap()
    }

    fn seed(db: &ChallengeDb) -> (Challenge, HabitDefinition) {
        let challenge = Challenge::new("user-1", chrono_tz::UTC, date("2024-01-01"), Visibility::Private);
        db.insert_challenge(&challenge).unwrap();
        let habit = HabitDefinition::new(&challenge.id, "Read 10 pages", HabitKind::Task, true, 0);
        db.add_habit(&habit).unwrap();
        (challenge, habit)
    }

    #[test]
    fn test_record_computes_requirements_met() {
        let db = ChallengeDb::open_memory().unwrap();
        let (challenge, habit) = seed(&db);
        let soft = HabitDefinition::new(&challenge.id, "Journal", HabitKind::Task, false, 1);
        db.add_habit(&soft).unwrap();

        let log = record_as_of(
            &db,
            &challenge.id,
            &habit.id,
            1,
            HabitValue::Task { done: true },
            date("2024-01-01"),
        )
        .unwrap();

        // Soft habit untouched, hard habit done: day is met
        assert!(log.all_requirements_met);
        assert!(log.completed_at.is_some());
    }

    #[test]
    fn test_unchecking_clears_completed_at() {
        let db = ChallengeDb::open_memory().unwrap();
        let (challenge, habit) = seed(&db);

        record_as_of(
            &db,
            &challenge.id,
            &habit.id,
            1,
            HabitValue::Task { done: true },
            date("2024-01-01"),
        )
        .unwrap();
        let log = record_as_of(
            &db,
            &challenge.id,
            &habit.id,
            1,
            HabitValue::Task { done: false },
            date("2024-01-01"),
        )
        .unwrap();

        assert!(!log.all_requirements_met);
        assert!(log.completed_at.is_none());
    }

    #[test]
    fn test_future_day_rejected() {
        let db = ChallengeDb::open_memory().unwrap();
        let (challenge, habit) = seed(&db);

        let err = record_as_of(
            &db,
            &challenge.id,
            &habit.id,
            5,
            HabitValue::Task { done: true },
            date("2024-01-01"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::FutureDay { day: 5, .. })
        ));
    }

    #[test]
    fn test_locked_day_rejected() {
        let db = ChallengeDb::open_memory().unwrap();
        let (challenge, habit) = seed(&db);

        // Day 1 stays editable through day 3, locks on day 4
        assert!(record_as_of(
            &db,
            &challenge.id,
            &habit.id,
            1,
            HabitValue::Task { done: true },
            date("2024-01-03"),
        )
        .is_ok());
        let err = record_as_of(
            &db,
            &challenge.id,
            &habit.id,
            1,
            HabitValue::Task { done: true },
            date("2024-01-04"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DayLocked { day: 1, .. })
        ));
    }

    #[test]
    fn test_day_out_of_range_rejected() {
        let db = ChallengeDb::open_memory().unwrap();
        let (challenge, habit) = seed(&db);

        for day in [0, 76] {
            let err = record_as_of(
                &db,
                &challenge.id,
                &habit.id,
                day,
                HabitValue::Task { done: true },
                date("2024-01-01"),
            )
            .unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::DayOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_unknown_habit_rejected() {
        let db = ChallengeDb::open_memory().unwrap();
        let (challenge, _) = seed(&db);

        let err = record_as_of(
            &db,
            &challenge.id,
            "no-such-habit",
            1,
            HabitValue::Task { done: true },
            date("2024-01-01"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::UnknownHabit { .. })
        ));
    }

    #[test]
    fn test_value_shape_must_match_kind() {
        let db = ChallengeDb::open_memory().unwrap();
        let (challenge, habit) = seed(&db);

        let err = record_as_of(
            &db,
            &challenge.id,
            &habit.id,
            1,
            HabitValue::Counter { value: 3 },
            date("2024-01-01"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_day_view_joins_definitions_and_entries() {
        let db = ChallengeDb::open_memory().unwrap();
        let (challenge, habit) = seed(&db);
        let water = HabitDefinition::new(
            &challenge.id,
            "Drink water",
            HabitKind::Counter { target: 8 },
            true,
            1,
        );
        db.add_habit(&water).unwrap();

        record_as_of(
            &db,
            &challenge.id,
            &water.id,
            1,
            HabitValue::Counter { value: 5 },
            date("2024-01-01"),
        )
        .unwrap();

        let view = day_view_as_of(&db, &challenge.id, 1, date("2024-01-01")).unwrap();
        assert_eq!(view.access, DayAccess::Editable);
        assert_eq!(view.date, date("2024-01-01"));
        assert!(!view.all_requirements_met);
        assert_eq!(view.habits.len(), 2);

        let read = view.habits.iter().find(|h| h.habit.id == habit.id).unwrap();
        assert!(read.value.is_none());
        assert!(!read.satisfied);

        let drank = view.habits.iter().find(|h| h.habit.id == water.id).unwrap();
        assert_eq!(drank.value, Some(HabitValue::Counter { value: 5 }));
        assert!(!drank.satisfied);
    }

    #[test]
    fn test_day_view_for_untouched_future_day() {
        let db = ChallengeDb::open_memory().unwrap();
        let (challenge, _) = seed(&db);

        let view = day_view_as_of(&db, &challenge.id, 10, date("2024-01-01")).unwrap();
        assert_eq!(view.access, DayAccess::Future);
        assert!(!view.all_requirements_met);
    }
}
