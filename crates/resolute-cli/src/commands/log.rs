//! Daily logging commands for CLI.

use clap::Subcommand;
use resolute_core::{logbook, Challenge, ChallengeDb, Config, HabitValue};

#[derive(Subcommand)]
pub enum LogAction {
    /// Mark a task habit done for a day
    Done {
        /// Day number (1-75)
        day: i64,
        /// Habit name or id
        habit: String,
    },
    /// Mark a task habit not done for a day
    Undo {
        /// Day number (1-75)
        day: i64,
        /// Habit name or id
        habit: String,
    },
    /// Record a counter value for a day
    Count {
        /// Day number (1-75)
        day: i64,
        /// Habit name or id
        habit: String,
        /// Counter value
        value: u32,
    },
    /// Show one day's log
    Show {
        /// Day number (1-75)
        day: i64,
    },
}

/// Resolve a habit reference (exact id, then exact name) to its id.
fn resolve_habit(
    db: &ChallengeDb,
    challenge: &Challenge,
    habit_ref: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let habits = db.list_active_habits(&challenge.id)?;
    let habit = habits
        .iter()
        .find(|h| h.id == habit_ref)
        .or_else(|| habits.iter().find(|h| h.name == habit_ref))
        .ok_or(format!("no habit named '{habit_ref}' on the active challenge"))?;
    Ok(habit.id.clone())
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = ChallengeDb::open()?;
    let Some(challenge) = db.active_challenge_for(&config.challenge.owner)? else {
        return Err("no active challenge; start one first".into());
    };

    match action {
        LogAction::Done { day, habit } => {
            let habit_id = resolve_habit(&db, &challenge, &habit)?;
            let log = logbook::record(
                &db,
                &challenge.id,
                &habit_id,
                day,
                HabitValue::Task { done: true },
                challenge.timezone,
            )?;
            println!("{}", serde_json::to_string_pretty(&log)?);
        }
        LogAction::Undo { day, habit } => {
            let habit_id = resolve_habit(&db, &challenge, &habit)?;
            let log = logbook::record(
                &db,
                &challenge.id,
                &habit_id,
                day,
                HabitValue::Task { done: false },
                challenge.timezone,
            )?;
            println!("{}", serde_json::to_string_pretty(&log)?);
        }
        LogAction::Count { day, habit, value } => {
            let habit_id = resolve_habit(&db, &challenge, &habit)?;
            let log = logbook::record(
                &db,
                &challenge.id,
                &habit_id,
                day,
                HabitValue::Counter { value },
                challenge.timezone,
            )?;
            println!("{}", serde_json::to_string_pretty(&log)?);
        }
        LogAction::Show { day } => {
            let view = logbook::day_view(&db, &challenge.id, day, challenge.timezone)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }
    Ok(())
}
