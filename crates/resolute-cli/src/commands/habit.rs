//! Habit definition commands for CLI.

use clap::Subcommand;
use resolute_core::{ChallengeDb, Config, HabitDefinition, HabitKind};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Add a habit to the active challenge
    Add {
        /// Habit name
        name: String,
        /// Daily target; makes this a counter habit instead of a task
        #[arg(long)]
        target: Option<u32>,
        /// Track only: missing this habit never fails the challenge
        #[arg(long)]
        soft: bool,
    },
    /// List the active challenge's habits
    List,
    /// Retire a habit by id
    Retire {
        /// Habit ID
        id: String,
    },
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = ChallengeDb::open()?;
    let Some(challenge) = db.active_challenge_for(&config.challenge.owner)? else {
        return Err("no active challenge; start one first".into());
    };

    match action {
        HabitAction::Add { name, target, soft } => {
            let kind = match target {
                Some(target) => HabitKind::Counter { target },
                None => HabitKind::Task,
            };
            let position = db.list_active_habits(&challenge.id)?.len() as u32;
            let habit = HabitDefinition::new(&challenge.id, &name, kind, !soft, position);
            db.add_habit(&habit)?;
            println!("Habit added: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List => {
            let habits = db.list_active_habits(&challenge.id)?;
            println!("{}", serde_json::to_string_pretty(&habits)?);
        }
        HabitAction::Retire { id } => {
            if db.retire_habit(&id)? {
                println!("Habit retired: {id}");
            } else {
                println!("Habit not found: {id}");
            }
        }
    }
    Ok(())
}
