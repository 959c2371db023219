//! Challenge domain types.
//!
//! A challenge is one 75-day attempt at the program, owned by a user.
//! Habit definitions describe what must be done every day; daily logs
//! record what actually was done. Lifetime stats aggregate across all of
//! a user's attempts.

pub mod policy;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a challenge.
///
/// `Failed` is transient: a failed challenge is observed once and
/// immediately superseded by a fresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Active,
    Completed,
    Failed,
}

impl ChallengeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
            ChallengeStatus::Failed => "failed",
        }
    }
}

/// Sharing scope. Carried through unchanged; rendering is not our concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Friends,
    Public,
}

/// One 75-day attempt at the program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,

    /// Owner's identity (opaque; identity itself lives elsewhere).
    pub owner_id: String,

    /// IANA timezone the owner's calendar days are computed in.
    /// Captured at creation so the sweep can evaluate without the owner
    /// being online.
    pub timezone: Tz,

    /// Calendar date of Day 1.
    pub start_date: NaiveDate,

    /// Highest day number the engine has confirmed progress through.
    pub current_day: i64,

    pub status: ChallengeStatus,

    /// Ordinal of this attempt, starting at 1.
    pub attempt_number: u32,

    pub visibility: Visibility,

    /// Day the challenge failed on; set when status becomes `Failed`.
    pub failed_on_day: Option<i64>,

    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// Create a fresh first-day challenge in the `Active` state.
    pub fn new(owner_id: &str, timezone: Tz, start_date: NaiveDate, visibility: Visibility) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            timezone,
            start_date,
            current_day: 1,
            status: ChallengeStatus::Active,
            attempt_number: 1,
            visibility,
            failed_on_day: None,
            created_at: Utc::now(),
        }
    }

    /// The replacement challenge created when this one fails: same owner,
    /// same zone and visibility, next attempt number, fresh start date.
    pub fn next_attempt(&self, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: self.owner_id.clone(),
            timezone: self.timezone,
            start_date,
            current_day: 1,
            status: ChallengeStatus::Active,
            attempt_number: self.attempt_number + 1,
            visibility: self.visibility,
            failed_on_day: None,
            created_at: Utc::now(),
        }
    }
}

/// What kind of completion a habit requires each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum HabitKind {
    /// A simple done/not-done task.
    Task,
    /// A counter that must reach `target` to count as done.
    Counter { target: u32 },
}

/// One habit the user committed to for the length of a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitDefinition {
    pub id: String,
    pub challenge_id: String,
    pub name: String,
    pub kind: HabitKind,

    /// Hard habits fail the whole challenge when missed; soft habits are
    /// tracked but never judged.
    pub is_hard: bool,

    /// Display/order position within the challenge.
    pub position: u32,

    /// Retired habits stay on old logs but no longer count for new days.
    pub active: bool,
}

impl HabitDefinition {
    pub fn new(challenge_id: &str, name: &str, kind: HabitKind, is_hard: bool, position: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            challenge_id: challenge_id.to_string(),
            name: name.to_string(),
            kind,
            is_hard,
            position,
            active: true,
        }
    }
}

/// A recorded value for one habit on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum HabitValue {
    Task { done: bool },
    Counter { value: u32 },
}

/// One habit's entry within a daily log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitEntry {
    pub habit_id: String,
    pub value: HabitValue,
}

/// The record of habit completion for one day of one challenge.
///
/// Created lazily the first time the user touches a day; never deleted;
/// immutable once the day leaves its editable window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLog {
    pub challenge_id: String,
    pub day_number: i64,
    pub entries: Vec<HabitEntry>,

    /// Derived: every active hard habit satisfied. Recomputed on mutation.
    pub all_requirements_met: bool,

    /// When the day first had all requirements met.
    pub completed_at: Option<DateTime<Utc>>,

    pub updated_at: DateTime<Utc>,
}

impl DailyLog {
    /// An empty log for a day nobody has touched yet.
    pub fn empty(challenge_id: &str, day_number: i64) -> Self {
        Self {
            challenge_id: challenge_id.to_string(),
            day_number,
            entries: Vec::new(),
            all_requirements_met: false,
            completed_at: None,
            updated_at: Utc::now(),
        }
    }

    pub fn entry(&self, habit_id: &str) -> Option<&HabitEntry> {
        self.entries.iter().find(|e| e.habit_id == habit_id)
    }

    /// Insert or replace the entry for its habit.
    pub fn set_entry(&mut self, entry: HabitEntry) {
        match self.entries.iter_mut().find(|e| e.habit_id == entry.habit_id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

/// Per-user aggregates across all challenge attempts.
///
/// Updated only at the moment a challenge transitions to failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub owner_id: String,
    pub attempt_number: u32,
    pub total_restarts: u32,
    pub longest_streak: i64,
}

impl LifetimeStats {
    /// Stats for a user who has never failed a challenge.
    pub fn first_attempt(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            attempt_number: 1,
            total_restarts: 0,
            longest_streak: 0,
        }
    }
}

/// Whether `entry` satisfies its habit definition.
///
/// A missing entry never satisfies: absence of proof of completion is
/// equivalent to non-completion. A value whose shape does not match the
/// definition counts as unmet.
pub fn entry_satisfied(def: &HabitDefinition, entry: Option<&HabitEntry>) -> bool {
    let Some(entry) = entry else {
        return false;
    };
    match (def.kind, entry.value) {
        (HabitKind::Task, HabitValue::Task { done }) => done,
        (HabitKind::Counter { target }, HabitValue::Counter { value }) => value >= target,
        _ => false,
    }
}

/// The day-completion predicate: every active hard habit satisfied.
///
/// Soft habits never gate completion. A challenge with no hard habits
/// satisfies trivially.
pub fn requirements_met(definitions: &[HabitDefinition], entries: &[HabitEntry]) -> bool {
    definitions
        .iter()
        .filter(|d| d.is_hard && d.active)
        .all(|d| entry_satisfied(d, entries.iter().find(|e| e.habit_id == d.id)))
}
