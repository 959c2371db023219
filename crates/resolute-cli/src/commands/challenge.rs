//! Challenge lifecycle commands for CLI.

use clap::Subcommand;
use resolute_core::{calendar, Challenge, ChallengeDb, Config, StatusChecker, Visibility};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Start a new challenge
    Start {
        /// IANA timezone (default: configured timezone)
        #[arg(long)]
        timezone: Option<String>,
        /// Start date YYYY-MM-DD (default: today in the timezone)
        #[arg(long)]
        start_date: Option<String>,
        /// Sharing scope: private, friends, or public
        #[arg(long)]
        visibility: Option<String>,
    },
    /// Show the active challenge, running the status check first
    Status,
    /// Run the status check for the active challenge
    Check,
    /// Show one day of the active challenge
    Day {
        /// Day number (1-75)
        day: i64,
    },
}

pub fn run(action: ChallengeAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = ChallengeDb::open()?;
    let owner = config.challenge.owner.as_str();

    match action {
        ChallengeAction::Start {
            timezone,
            start_date,
            visibility,
        } => {
            if let Some(existing) = db.active_challenge_for(owner)? {
                return Err(format!(
                    "challenge already in progress (attempt {}, day {})",
                    existing.attempt_number, existing.current_day
                )
                .into());
            }

            let tz = calendar::parse_timezone(
                timezone.as_deref().unwrap_or(&config.challenge.timezone),
            )?;
            let start = match start_date {
                Some(s) => calendar::parse_date(&s)?,
                None => calendar::today_in_tz(tz),
            };
            let visibility = match visibility.as_deref() {
                Some("friends") => Visibility::Friends,
                Some("public") => Visibility::Public,
                _ => config.challenge.visibility,
            };

            let challenge = Challenge::new(owner, tz, start, visibility);
            db.insert_challenge(&challenge)?;
            println!("Challenge started: {}", challenge.id);
            println!("{}", serde_json::to_string_pretty(&challenge)?);
        }
        ChallengeAction::Status => {
            let Some(challenge) = db.active_challenge_for(owner)? else {
                println!("No active challenge");
                return Ok(());
            };

            // One check per invocation, errors absorbed; the sweep catches
            // anything this misses.
            let checker = StatusChecker::new(challenge.timezone);
            if let Some(evaluation) = checker.check_once(&db, &challenge.id) {
                if let Some(notice) = evaluation.reset_notice() {
                    println!("{notice}");
                }
            }

            match db.active_challenge_for(owner)? {
                Some(current) => println!("{}", serde_json::to_string_pretty(&current)?),
                None => println!("No active challenge"),
            }
        }
        ChallengeAction::Check => {
            let Some(challenge) = db.active_challenge_for(owner)? else {
                println!("No active challenge");
                return Ok(());
            };
            let evaluation = resolute_core::evaluate(&db, &challenge.id, challenge.timezone)?;
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
            if let Some(notice) = evaluation.reset_notice() {
                println!("{notice}");
            }
        }
        ChallengeAction::Day { day } => {
            let Some(challenge) = db.active_challenge_for(owner)? else {
                println!("No active challenge");
                return Ok(());
            };
            let view = resolute_core::logbook::day_view(&db, &challenge.id, day, challenge.timezone)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }
    Ok(())
}
