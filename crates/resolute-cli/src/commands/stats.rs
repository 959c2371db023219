//! Lifetime statistics commands for CLI.

use clap::Subcommand;
use resolute_core::{ChallengeDb, Config};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Lifetime stats across all attempts
    Show,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = ChallengeDb::open()?;

    match action {
        StatsAction::Show => {
            let stats = db.lifetime_stats(&config.challenge.owner)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
