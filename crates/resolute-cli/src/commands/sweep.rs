//! Sweep commands for CLI.
//!
//! `once` suits an external scheduler (cron); `run` keeps an in-process
//! interval loop alive.

use std::time::Duration;

use clap::Subcommand;
use resolute_core::{sweep, ChallengeDb, Config};

#[derive(Subcommand)]
pub enum SweepAction {
    /// Evaluate every active challenge once and exit
    Once,
    /// Run sweep passes forever on a fixed interval
    Run {
        /// Hours between passes (default: configured interval)
        #[arg(long)]
        interval_hours: Option<u64>,
    },
}

pub fn run(action: SweepAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = ChallengeDb::open()?;

    match action {
        SweepAction::Once => {
            let summary = sweep::run_once(&db)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        SweepAction::Run { interval_hours } => {
            let hours = interval_hours.unwrap_or(config.sweep.interval_hours).max(1);
            let interval = Duration::from_secs(hours * 60 * 60);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(sweep::run(&db, interval));
        }
    }
    Ok(())
}
