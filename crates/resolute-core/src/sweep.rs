//! Periodic sweep over active challenges.
//!
//! The durability guarantee: a user who never reopens the app still has
//! their challenge settled within one sweep interval of the grace period
//! elapsing. Each pass is a pure function of persisted data; the loop
//! holds no state between passes, so an external scheduler invoking
//! [`run_once`] on a cron cadence is equivalent to [`run`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeStatus;
use crate::engine;
use crate::error::CoreError;
use crate::storage::ChallengeDb;

/// Default cadence between sweep passes.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

/// Tally of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub evaluated: usize,
    pub still_active: usize,
    pub completed: usize,
    pub failed: usize,
    pub errors: usize,
}

/// Evaluate every active challenge once, each in its owner's stored
/// timezone. One challenge's evaluation error never aborts the pass over
/// the rest; it is logged and counted.
///
/// # Errors
/// Returns an error only if the active-challenge listing itself fails.
pub fn run_once(db: &ChallengeDb) -> Result<SweepSummary, CoreError> {
    let active = db.list_active_challenges()?;
    let mut summary = SweepSummary::default();

    for challenge in active {
        match engine::evaluate(db, &challenge.id, challenge.timezone) {
            Ok(evaluation) => {
                summary.evaluated += 1;
                match evaluation.status {
                    ChallengeStatus::Active => summary.still_active += 1,
                    ChallengeStatus::Completed => summary.completed += 1,
                    ChallengeStatus::Failed => summary.failed += 1,
                }
            }
            Err(error) => {
                tracing::warn!(challenge = %challenge.id, %error, "sweep: evaluation failed");
                summary.errors += 1;
            }
        }
    }

    Ok(summary)
}

/// Run sweep passes forever on a fixed interval.
///
/// The first pass fires immediately, then every `interval`.
pub async fn run(db: &ChallengeDb, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match run_once(db) {
            Ok(summary) => tracing::info!(
                evaluated = summary.evaluated,
                still_active = summary.still_active,
                completed = summary.completed,
                failed = summary.failed,
                errors = summary.errors,
                "sweep pass complete"
            ),
            Err(error) => tracing::warn!(%error, "sweep pass aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{Challenge, Visibility};
    use chrono::Duration as ChronoDuration;
    use chrono::Utc;

    fn challenge_started_days_ago(owner: &str, days: i64) -> Challenge {
        Challenge::new(
            owner,
            chrono_tz::UTC,
            Utc::now().date_naive() - ChronoDuration::days(days),
            Visibility::Private,
        )
    }

    #[test]
    fn test_empty_sweep() {
        let db = ChallengeDb::open_memory().unwrap();
        assert_eq!(run_once(&db).unwrap(), SweepSummary::default());
    }

    #[test]
    fn test_sweep_settles_stale_and_keeps_fresh() {
        let db = ChallengeDb::open_memory().unwrap();

        // Started today: nothing judgeable yet
        let fresh = challenge_started_days_ago("fresh-user", 0);
        db.insert_challenge(&fresh).unwrap();
        // Started ten days ago with no logs at all: day 1 expired long ago
        let stale = challenge_started_days_ago("stale-user", 10);
        db.insert_challenge(&stale).unwrap();

        let summary = run_once(&db).unwrap();
        assert_eq!(summary.evaluated, 2);
        assert_eq!(summary.still_active, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors, 0);

        let settled = db.require_challenge(&stale.id).unwrap();
        assert_eq!(settled.status, ChallengeStatus::Failed);
        assert_eq!(settled.failed_on_day, Some(1));
        // The replacement is active and will be picked up by later passes
        let replacement = db.active_challenge_for("stale-user").unwrap().unwrap();
        assert_eq!(replacement.attempt_number, 2);
    }
}
