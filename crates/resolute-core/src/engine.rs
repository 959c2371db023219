//! Challenge status engine.
//!
//! Decides, for one active challenge, whether it should be promoted to
//! completed, failed and restarted, or left active. The engine holds no
//! state of its own: every evaluation re-reads current records, and every
//! transition is a conditional write, so concurrent evaluations of the
//! same challenge settle it exactly once.
//!
//! ## State Transitions
//!
//! ```text
//! active -> completed          all 75 days satisfied
//! active -> failed -> active'  earliest unmet day past its grace period;
//!                              a fresh attempt replaces the failed record
//! ```

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::challenge::policy::{self, GRACE_DAYS, PROGRAM_LENGTH_DAYS};
use crate::challenge::{Challenge, ChallengeStatus};
use crate::error::CoreError;
use crate::storage::ChallengeDb;

/// Outcome of one `evaluate` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub challenge_id: String,
    pub status: ChallengeStatus,

    /// The day that irrevocably failed, when status is `Failed`.
    pub failed_on_day: Option<i64>,

    /// Last fully completed day before the failure.
    pub streak: Option<i64>,

    /// Attempt number of the replacement challenge.
    pub new_attempt: Option<u32>,

    /// Id of the replacement challenge.
    pub new_challenge_id: Option<String>,
}

impl Evaluation {
    /// An evaluation that reports a record as it stands, with no fresh
    /// transition.
    fn settled(challenge: &Challenge) -> Self {
        Self {
            challenge_id: challenge.id.clone(),
            status: challenge.status,
            failed_on_day: challenge.failed_on_day,
            streak: challenge.failed_on_day.map(|d| (d - 1).max(0)),
            new_attempt: None,
            new_challenge_id: None,
        }
    }

    /// The user-facing reset notice, present only when this evaluation
    /// observed the failure and knows the replacement attempt.
    pub fn reset_notice(&self) -> Option<ResetNotice> {
        match (self.failed_on_day, self.streak, self.new_attempt) {
            (Some(failed_on_day), Some(streak), Some(new_attempt)) => Some(ResetNotice {
                failed_on_day,
                streak,
                new_attempt,
            }),
            _ => None,
        }
    }
}

/// Plain-language explanation of a challenge reset. Not an error: an
/// expected terminal-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetNotice {
    pub failed_on_day: i64,
    pub streak: i64,
    pub new_attempt: u32,
}

impl fmt::Display for ResetNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Day {} was not completed within the {}-day grace period, so the challenge \
             restarted. You reached a {}-day streak. Attempt {} starts today.",
            self.failed_on_day, GRACE_DAYS, self.streak, self.new_attempt
        )
    }
}

/// Evaluate one challenge as of now in the user's timezone.
///
/// Idempotent: repeated or concurrent calls settle the challenge at most
/// once; losers of a transition race report the already-settled state.
///
/// # Errors
/// Returns an error if the challenge does not exist or storage fails.
pub fn evaluate(db: &ChallengeDb, challenge_id: &str, tz: Tz) -> Result<Evaluation, CoreError> {
    evaluate_as_of(db, challenge_id, calendar::today_in_tz(tz))
}

/// Evaluate one challenge with an explicit "today" date.
///
/// # Errors
/// See [`evaluate`].
pub fn evaluate_as_of(
    db: &ChallengeDb,
    challenge_id: &str,
    today: NaiveDate,
) -> Result<Evaluation, CoreError> {
    let challenge = db.require_challenge(challenge_id)?;
    if challenge.status != ChallengeStatus::Active {
        // Already completed, or failed and superseded
        return Ok(Evaluation::settled(&challenge));
    }

    let today_day = calendar::day_number(challenge.start_date, today);
    if today_day < 1 {
        // Start date still ahead; nothing to judge
        return Ok(Evaluation::settled(&challenge));
    }

    let met: HashSet<i64> = db.met_days(challenge_id)?.into_iter().collect();

    if let Some(day) = first_unmet_expired_day(&met, today_day) {
        return fail_challenge(db, &challenge, day, today);
    }

    if today_day >= PROGRAM_LENGTH_DAYS && (1..=PROGRAM_LENGTH_DAYS).all(|d| met.contains(&d)) {
        db.mark_completed(challenge_id)?;
        let settled = db.require_challenge(challenge_id)?;
        tracing::info!(challenge = %challenge_id, "challenge completed");
        return Ok(Evaluation::settled(&settled));
    }

    let target_day = today_day.min(PROGRAM_LENGTH_DAYS);
    if target_day > challenge.current_day {
        db.advance_current_day(challenge_id, target_day)?;
    }
    Ok(Evaluation {
        challenge_id: challenge.id,
        status: ChallengeStatus::Active,
        failed_on_day: None,
        streak: None,
        new_attempt: None,
        new_challenge_id: None,
    })
}

/// The earliest day whose grace period elapsed without all requirements
/// met, if any. Only the earliest matters: once one day irrevocably
/// fails, the program's continuity is broken.
fn first_unmet_expired_day(met: &HashSet<i64>, today_day: i64) -> Option<i64> {
    let last = policy::last_judgeable_day(today_day);
    (1..=last).find(|day| !met.contains(day))
}

fn fail_challenge(
    db: &ChallengeDb,
    challenge: &Challenge,
    failed_on_day: i64,
    today: NaiveDate,
) -> Result<Evaluation, CoreError> {
    match db.fail_and_restart(&challenge.id, failed_on_day, today)? {
        Some(replacement) => {
            tracing::info!(
                challenge = %challenge.id,
                failed_on_day,
                new_attempt = replacement.attempt_number,
                "challenge failed; new attempt created"
            );
            Ok(Evaluation {
                challenge_id: challenge.id.clone(),
                status: ChallengeStatus::Failed,
                failed_on_day: Some(failed_on_day),
                streak: Some((failed_on_day - 1).max(0)),
                new_attempt: Some(replacement.attempt_number),
                new_challenge_id: Some(replacement.id),
            })
        }
        None => {
            // A concurrent evaluation settled this challenge first; report
            // its outcome, including the replacement it created.
            let settled = db.require_challenge(&challenge.id)?;
            let mut evaluation = Evaluation::settled(&settled);
            if settled.status == ChallengeStatus::Failed {
                if let Some(current) = db.active_challenge_for(&settled.owner_id)? {
                    evaluation.new_attempt = Some(current.attempt_number);
                    evaluation.new_challenge_id = Some(current.id);
                }
            }
            Ok(evaluation)
        }
    }
}
