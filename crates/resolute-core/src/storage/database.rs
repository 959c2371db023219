//! SQLite-based challenge, habit, and daily-log storage.
//!
//! Every lifecycle transition goes through a conditional write guarded by
//! the challenge's current status, so concurrent evaluations of the same
//! challenge cannot double-apply a transition. The failure transition
//! (mark failed + stats + replacement attempt) is a single transaction.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::calendar;
use crate::challenge::policy::PROGRAM_LENGTH_DAYS;
use crate::challenge::{
    Challenge, ChallengeStatus, DailyLog, HabitDefinition, HabitEntry, HabitKind, LifetimeStats,
    Visibility,
};
use crate::error::{CoreError, DatabaseError};

// === Helper Functions ===

/// Parse challenge status from database string
fn parse_status(status_str: &str) -> ChallengeStatus {
    match status_str {
        "completed" => ChallengeStatus::Completed,
        "failed" => ChallengeStatus::Failed,
        _ => ChallengeStatus::Active,
    }
}

/// Format challenge status for database storage
fn format_status(status: ChallengeStatus) -> &'static str {
    status.as_str()
}

/// Parse visibility from database string
fn parse_visibility(visibility_str: &str) -> Visibility {
    match visibility_str {
        "friends" => Visibility::Friends,
        "public" => Visibility::Public,
        _ => Visibility::Private,
    }
}

/// Format visibility for database storage
fn format_visibility(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Private => "private",
        Visibility::Friends => "friends",
        Visibility::Public => "public",
    }
}

/// Parse habit kind from database string plus optional target
fn parse_habit_kind(kind_str: &str, target: Option<u32>) -> HabitKind {
    match kind_str {
        "counter" => HabitKind::Counter {
            target: target.unwrap_or(1),
        },
        _ => HabitKind::Task,
    }
}

/// Format habit kind for database storage
fn format_habit_kind(kind: HabitKind) -> (&'static str, Option<u32>) {
    match kind {
        HabitKind::Task => ("task", None),
        HabitKind::Counter { target } => ("counter", Some(target)),
    }
}

/// Parse date from YYYY-MM-DD with fallback to the current UTC date
fn parse_date_fallback(date_str: &str) -> NaiveDate {
    calendar::parse_date(date_str).unwrap_or_else(|_| Utc::now().date_naive())
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse IANA timezone name with fallback to UTC
fn parse_tz_fallback(tz_str: &str) -> Tz {
    calendar::parse_timezone(tz_str).unwrap_or(chrono_tz::UTC)
}

/// Build a Challenge from a database row
fn row_to_challenge(row: &rusqlite::Row) -> Result<Challenge, rusqlite::Error> {
    let timezone_str: String = row.get(2)?;
    let start_date_str: String = row.get(3)?;
    let status_str: String = row.get(5)?;
    let visibility_str: String = row.get(7)?;
    let created_at_str: String = row.get(9)?;

    Ok(Challenge {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        timezone: parse_tz_fallback(&timezone_str),
        start_date: parse_date_fallback(&start_date_str),
        current_day: row.get(4)?,
        status: parse_status(&status_str),
        attempt_number: row.get(6)?,
        visibility: parse_visibility(&visibility_str),
        failed_on_day: row.get(8)?,
        created_at: parse_datetime_fallback(&created_at_str),
    })
}

/// Build a HabitDefinition from a database row
fn row_to_habit(row: &rusqlite::Row) -> Result<HabitDefinition, rusqlite::Error> {
    let kind_str: String = row.get(3)?;
    let target: Option<u32> = row.get(4)?;

    Ok(HabitDefinition {
        id: row.get(0)?,
        challenge_id: row.get(1)?,
        name: row.get(2)?,
        kind: parse_habit_kind(&kind_str, target),
        is_hard: row.get(5)?,
        position: row.get(6)?,
        active: row.get(7)?,
    })
}

const CHALLENGE_COLUMNS: &str = "id, owner_id, timezone, start_date, current_day, status, \
     attempt_number, visibility, failed_on_day, created_at";

const HABIT_COLUMNS: &str = "id, challenge_id, name, kind, target, is_hard, position, active";

fn insert_challenge_stmt(conn: &Connection, challenge: &Challenge) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO challenges (id, owner_id, timezone, start_date, current_day, status,
             attempt_number, visibility, failed_on_day, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            challenge.id,
            challenge.owner_id,
            challenge.timezone.name(),
            calendar::format_date(challenge.start_date),
            challenge.current_day,
            format_status(challenge.status),
            challenge.attempt_number,
            format_visibility(challenge.visibility),
            challenge.failed_on_day,
            challenge.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn insert_habit_stmt(conn: &Connection, habit: &HabitDefinition) -> Result<(), rusqlite::Error> {
    let (kind_str, target) = format_habit_kind(habit.kind);
    conn.execute(
        "INSERT INTO habits (id, challenge_id, name, kind, target, is_hard, position, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            habit.id,
            habit.challenge_id,
            habit.name,
            kind_str,
            target,
            habit.is_hard,
            habit.position,
            habit.active,
        ],
    )?;
    Ok(())
}

fn list_active_habits_stmt(
    conn: &Connection,
    challenge_id: &str,
) -> Result<Vec<HabitDefinition>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HABIT_COLUMNS} FROM habits
         WHERE challenge_id = ?1 AND active = 1
         ORDER BY position, name"
    ))?;
    let rows = stmt.query_map(params![challenge_id], row_to_habit)?;
    rows.collect()
}

/// SQLite database for challenge storage.
///
/// Stores challenges, habit definitions, daily logs, and lifetime stats.
pub struct ChallengeDb {
    conn: Connection,
}

impl ChallengeDb {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/resolute/resolute.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("resolute.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS challenges (
                id             TEXT PRIMARY KEY,
                owner_id       TEXT NOT NULL,
                timezone       TEXT NOT NULL DEFAULT 'UTC',
                start_date     TEXT NOT NULL,
                current_day    INTEGER NOT NULL DEFAULT 1,
                status         TEXT NOT NULL DEFAULT 'active',
                attempt_number INTEGER NOT NULL DEFAULT 1,
                visibility     TEXT NOT NULL DEFAULT 'private',
                failed_on_day  INTEGER,
                created_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS habits (
                id           TEXT PRIMARY KEY,
                challenge_id TEXT NOT NULL,
                name         TEXT NOT NULL,
                kind         TEXT NOT NULL DEFAULT 'task',
                target       INTEGER,
                is_hard      INTEGER NOT NULL DEFAULT 1,
                position     INTEGER NOT NULL DEFAULT 0,
                active       INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS daily_logs (
                challenge_id         TEXT NOT NULL,
                day_number           INTEGER NOT NULL,
                entries              TEXT NOT NULL DEFAULT '[]',
                all_requirements_met INTEGER NOT NULL DEFAULT 0,
                completed_at         TEXT,
                updated_at           TEXT NOT NULL,
                PRIMARY KEY (challenge_id, day_number)
            );

            CREATE TABLE IF NOT EXISTS lifetime_stats (
                owner_id       TEXT PRIMARY KEY,
                attempt_number INTEGER NOT NULL DEFAULT 1,
                total_restarts INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_challenges_status ON challenges(status);
            CREATE INDEX IF NOT EXISTS idx_challenges_owner ON challenges(owner_id, status);
            CREATE INDEX IF NOT EXISTS idx_habits_challenge ON habits(challenge_id, active);",
        )?;
        Ok(())
    }

    // === Challenges ===

    /// Insert a new challenge record.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_challenge(&self, challenge: &Challenge) -> Result<(), DatabaseError> {
        insert_challenge_stmt(&self.conn, challenge)?;
        Ok(())
    }

    pub fn get_challenge(&self, id: &str) -> Result<Option<Challenge>, DatabaseError> {
        let challenge = self
            .conn
            .query_row(
                &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = ?1"),
                params![id],
                row_to_challenge,
            )
            .optional()?;
        Ok(challenge)
    }

    /// Like [`get_challenge`](Self::get_challenge) but missing records are an error.
    pub fn require_challenge(&self, id: &str) -> Result<Challenge, DatabaseError> {
        self.get_challenge(id)?.ok_or_else(|| DatabaseError::NotFound {
            kind: "challenge",
            id: id.to_string(),
        })
    }

    /// The owner's single active challenge, if any.
    pub fn active_challenge_for(&self, owner_id: &str) -> Result<Option<Challenge>, DatabaseError> {
        let challenge = self
            .conn
            .query_row(
                &format!(
                    "SELECT {CHALLENGE_COLUMNS} FROM challenges
                     WHERE owner_id = ?1 AND status = 'active'
                     ORDER BY attempt_number DESC LIMIT 1"
                ),
                params![owner_id],
                row_to_challenge,
            )
            .optional()?;
        Ok(challenge)
    }

    /// All challenges currently in the active status, for the sweep.
    pub fn list_active_challenges(&self) -> Result<Vec<Challenge>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges
             WHERE status = 'active'
             ORDER BY created_at"
        ))?;
        let rows = stmt.query_map([], row_to_challenge)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Advance `current_day`, monotonic and only while still active.
    ///
    /// Returns false when nothing changed (already past `day`, or the
    /// challenge left the active state under us).
    pub fn advance_current_day(&self, id: &str, day: i64) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE challenges SET current_day = ?2
             WHERE id = ?1 AND status = 'active' AND current_day < ?2",
            params![id, day],
        )?;
        Ok(changed > 0)
    }

    /// Promote an active challenge to completed.
    ///
    /// Returns false when the challenge was no longer active (a concurrent
    /// evaluation settled it first).
    pub fn mark_completed(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE challenges SET status = 'completed', current_day = ?2
             WHERE id = ?1 AND status = 'active'",
            params![id, PROGRAM_LENGTH_DAYS],
        )?;
        Ok(changed > 0)
    }

    /// Atomically fail a challenge and create the replacement attempt.
    ///
    /// In one transaction: the conditional status flip, the lifetime-stats
    /// update (restart count, longest streak, attempt number), the
    /// replacement challenge at `attempt_number + 1` starting on
    /// `restart_date`, and a copy of the active habit definitions. The
    /// flip is the transaction's first statement, so the write lock is
    /// taken before anything else happens.
    ///
    /// Returns `None` when the conditional flip touched no row, meaning a
    /// concurrent evaluation already settled this challenge; the caller
    /// must treat that as "already handled", never retry.
    ///
    /// # Errors
    /// Returns an error if any statement in the transaction fails.
    pub fn fail_and_restart(
        &self,
        id: &str,
        failed_on_day: i64,
        restart_date: NaiveDate,
    ) -> Result<Option<Challenge>, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;

        let changed = tx.execute(
            "UPDATE challenges SET status = 'failed', failed_on_day = ?2
             WHERE id = ?1 AND status = 'active'",
            params![id, failed_on_day],
        )?;
        if changed == 0 {
            // Lost the race; dropping the transaction rolls back.
            return Ok(None);
        }

        let failed = tx.query_row(
            &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = ?1"),
            params![id],
            row_to_challenge,
        )?;

        let streak = (failed_on_day - 1).max(0);
        let next_attempt = failed.attempt_number + 1;
        tx.execute(
            "INSERT INTO lifetime_stats (owner_id, attempt_number, total_restarts, longest_streak)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(owner_id) DO UPDATE SET
                 attempt_number = excluded.attempt_number,
                 total_restarts = total_restarts + 1,
                 longest_streak = MAX(longest_streak, excluded.longest_streak)",
            params![failed.owner_id, next_attempt, streak],
        )?;

        let replacement = failed.next_attempt(restart_date);
        insert_challenge_stmt(&tx, &replacement)?;

        // The new attempt keeps the same commitments, under fresh ids.
        for habit in list_active_habits_stmt(&tx, id)? {
            let copy = HabitDefinition::new(
                &replacement.id,
                &habit.name,
                habit.kind,
                habit.is_hard,
                habit.position,
            );
            insert_habit_stmt(&tx, &copy)?;
        }

        tx.commit()?;
        Ok(Some(replacement))
    }

    // === Habits ===

    /// Insert a habit definition.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn add_habit(&self, habit: &HabitDefinition) -> Result<(), DatabaseError> {
        insert_habit_stmt(&self.conn, habit)?;
        Ok(())
    }

    pub fn get_habit(&self, id: &str) -> Result<Option<HabitDefinition>, DatabaseError> {
        let habit = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![id],
                row_to_habit,
            )
            .optional()?;
        Ok(habit)
    }

    /// Active habit definitions for a challenge, in display order.
    pub fn list_active_habits(
        &self,
        challenge_id: &str,
    ) -> Result<Vec<HabitDefinition>, DatabaseError> {
        Ok(list_active_habits_stmt(&self.conn, challenge_id)?)
    }

    /// Retire a habit: it stays on old logs but stops counting for new days.
    pub fn retire_habit(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("UPDATE habits SET active = 0 WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // === Daily logs ===

    pub fn get_daily_log(
        &self,
        challenge_id: &str,
        day_number: i64,
    ) -> Result<Option<DailyLog>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT entries, all_requirements_met, completed_at, updated_at
                 FROM daily_logs WHERE challenge_id = ?1 AND day_number = ?2",
                params![challenge_id, day_number],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((entries_json, all_requirements_met, completed_at, updated_at)) = row else {
            return Ok(None);
        };
        let entries: Vec<HabitEntry> = serde_json::from_str(&entries_json)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(Some(DailyLog {
            challenge_id: challenge_id.to_string(),
            day_number,
            entries,
            all_requirements_met,
            completed_at: completed_at.as_deref().map(parse_datetime_fallback),
            updated_at: parse_datetime_fallback(&updated_at),
        }))
    }

    /// Insert or update the log for its `(challenge, day)` key.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn upsert_daily_log(&self, log: &DailyLog) -> Result<(), DatabaseError> {
        let entries_json = serde_json::to_string(&log.entries)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO daily_logs (challenge_id, day_number, entries, all_requirements_met,
                 completed_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(challenge_id, day_number) DO UPDATE SET
                 entries = excluded.entries,
                 all_requirements_met = excluded.all_requirements_met,
                 completed_at = excluded.completed_at,
                 updated_at = excluded.updated_at",
            params![
                log.challenge_id,
                log.day_number,
                entries_json,
                log.all_requirements_met,
                log.completed_at.map(|t| t.to_rfc3339()),
                log.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Day numbers whose log has all requirements met, ascending.
    pub fn met_days(&self, challenge_id: &str) -> Result<Vec<i64>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT day_number FROM daily_logs
             WHERE challenge_id = ?1 AND all_requirements_met = 1
             ORDER BY day_number",
        )?;
        let rows = stmt.query_map(params![challenge_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // === Lifetime stats ===

    /// The owner's aggregate stats; first-attempt defaults if none recorded.
    pub fn lifetime_stats(&self, owner_id: &str) -> Result<LifetimeStats, DatabaseError> {
        let stats = self
            .conn
            .query_row(
                "SELECT attempt_number, total_restarts, longest_streak
                 FROM lifetime_stats WHERE owner_id = ?1",
                params![owner_id],
                |row| {
                    Ok(LifetimeStats {
                        owner_id: owner_id.to_string(),
                        attempt_number: row.get(0)?,
                        total_restarts: row.get(1)?,
                        longest_streak: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(stats.unwrap_or_else(|| LifetimeStats::first_attempt(owner_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::HabitValue;

    fn seed_challenge(db: &ChallengeDb) -> Challenge {
        let challenge = Challenge::new(
            "user-1",
            chrono_tz::UTC,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Visibility::Private,
        );
        db.insert_challenge(&challenge).unwrap();
        challenge
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let db = ChallengeDb::open_memory().unwrap();
        let challenge = seed_challenge(&db);

        let loaded = db.get_challenge(&challenge.id).unwrap().unwrap();
        assert_eq!(loaded.owner_id, "user-1");
        assert_eq!(loaded.start_date, challenge.start_date);
        assert_eq!(loaded.status, ChallengeStatus::Active);
        assert_eq!(loaded.attempt_number, 1);
        assert_eq!(loaded.timezone, chrono_tz::UTC);
        assert_eq!(loaded.failed_on_day, None);
    }

    #[test]
    fn test_require_challenge_not_found() {
        let db = ChallengeDb::open_memory().unwrap();
        let err = db.require_challenge("missing").unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn test_advance_current_day_is_monotonic() {
        let db = ChallengeDb::open_memory().unwrap();
        let challenge = seed_challenge(&db);

        assert!(db.advance_current_day(&challenge.id, 5).unwrap());
        // No going backwards
        assert!(!db.advance_current_day(&challenge.id, 3).unwrap());
        assert_eq!(db.require_challenge(&challenge.id).unwrap().current_day, 5);
    }

    #[test]
    fn test_mark_completed_is_conditional() {
        let db = ChallengeDb::open_memory().unwrap();
        let challenge = seed_challenge(&db);

        assert!(db.mark_completed(&challenge.id).unwrap());
        let loaded = db.require_challenge(&challenge.id).unwrap();
        assert_eq!(loaded.status, ChallengeStatus::Completed);
        assert_eq!(loaded.current_day, PROGRAM_LENGTH_DAYS);

        // Second attempt touches nothing
        assert!(!db.mark_completed(&challenge.id).unwrap());
    }

    #[test]
    fn test_fail_and_restart_creates_replacement() {
        let db = ChallengeDb::open_memory().unwrap();
        let challenge = seed_challenge(&db);
        db.add_habit(&HabitDefinition::new(
            &challenge.id,
            "Read 10 pages",
            HabitKind::Task,
            true,
            0,
        ))
        .unwrap();

        let restart = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let replacement = db.fail_and_restart(&challenge.id, 3, restart).unwrap().unwrap();

        let failed = db.require_challenge(&challenge.id).unwrap();
        assert_eq!(failed.status, ChallengeStatus::Failed);
        assert_eq!(failed.failed_on_day, Some(3));

        assert_eq!(replacement.attempt_number, 2);
        assert_eq!(replacement.current_day, 1);
        assert_eq!(replacement.start_date, restart);
        assert_eq!(replacement.status, ChallengeStatus::Active);

        // Habit definitions carried over with fresh ids
        let habits = db.list_active_habits(&replacement.id).unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].name, "Read 10 pages");

        let stats = db.lifetime_stats("user-1").unwrap();
        assert_eq!(stats.total_restarts, 1);
        assert_eq!(stats.attempt_number, 2);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn test_fail_and_restart_loses_race_once_settled() {
        let db = ChallengeDb::open_memory().unwrap();
        let challenge = seed_challenge(&db);
        let restart = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();

        assert!(db.fail_and_restart(&challenge.id, 3, restart).unwrap().is_some());
        // Already failed: the conditional flip matches no row
        assert!(db.fail_and_restart(&challenge.id, 3, restart).unwrap().is_none());

        let stats = db.lifetime_stats("user-1").unwrap();
        assert_eq!(stats.total_restarts, 1);
    }

    #[test]
    fn test_longest_streak_keeps_maximum() {
        let db = ChallengeDb::open_memory().unwrap();
        let first = seed_challenge(&db);
        let restart = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let second = db.fail_and_restart(&first.id, 9, restart).unwrap().unwrap();
        assert_eq!(db.lifetime_stats("user-1").unwrap().longest_streak, 8);

        // A shorter second run must not shrink the record
        let restart2 = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        db.fail_and_restart(&second.id, 3, restart2).unwrap().unwrap();

        let stats = db.lifetime_stats("user-1").unwrap();
        assert_eq!(stats.longest_streak, 8);
        assert_eq!(stats.total_restarts, 2);
        assert_eq!(stats.attempt_number, 3);
    }

    #[test]
    fn test_upsert_daily_log_replaces_on_conflict() {
        let db = ChallengeDb::open_memory().unwrap();
        let challenge = seed_challenge(&db);

        let mut log = DailyLog::empty(&challenge.id, 1);
        log.set_entry(HabitEntry {
            habit_id: "h1".to_string(),
            value: HabitValue::Task { done: false },
        });
        db.upsert_daily_log(&log).unwrap();

        log.set_entry(HabitEntry {
            habit_id: "h1".to_string(),
            value: HabitValue::Task { done: true },
        });
        log.all_requirements_met = true;
        log.completed_at = Some(Utc::now());
        db.upsert_daily_log(&log).unwrap();

        let loaded = db.get_daily_log(&challenge.id, 1).unwrap().unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert!(loaded.all_requirements_met);
        assert!(loaded.completed_at.is_some());
        assert_eq!(db.met_days(&challenge.id).unwrap(), vec![1]);
    }

    #[test]
    fn test_list_active_challenges_excludes_settled() {
        let db = ChallengeDb::open_memory().unwrap();
        let a = seed_challenge(&db);
        let b = Challenge::new(
            "user-2",
            chrono_tz::UTC,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            Visibility::Public,
        );
        db.insert_challenge(&b).unwrap();
        db.mark_completed(&a.id).unwrap();

        let active = db.list_active_challenges().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);
    }

    #[test]
    fn test_retire_habit() {
        let db = ChallengeDb::open_memory().unwrap();
        let challenge = seed_challenge(&db);
        let habit = HabitDefinition::new(&challenge.id, "Read", HabitKind::Task, true, 0);
        db.add_habit(&habit).unwrap();

        assert!(db.retire_habit(&habit.id).unwrap());
        assert!(db.list_active_habits(&challenge.id).unwrap().is_empty());
        // Still fetchable directly for old-log rendering
        assert!(!db.get_habit(&habit.id).unwrap().unwrap().active);
    }
}
