//! Lazy status checker.
//!
//! An embedding client runs the status check once per mount of the
//! challenge view: construct a [`StatusChecker`] when the view mounts and
//! call [`check_once`](StatusChecker::check_once) from every render path.
//! The captured flag makes re-renders no-ops, and a failed check is
//! swallowed -- the periodic sweep is the backstop, so an incomplete check
//! is never a user-facing error.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono_tz::Tz;

use crate::engine::{self, Evaluation};
use crate::storage::ChallengeDb;

/// Run-once trigger for the status check, scoped to one view instance.
pub struct StatusChecker {
    tz: Tz,
    has_run: AtomicBool,
}

impl StatusChecker {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            has_run: AtomicBool::new(false),
        }
    }

    /// Evaluate the challenge at most once for this checker's lifetime.
    ///
    /// Returns `None` when the check already ran, or when evaluation
    /// failed (check incomplete; retried by the sweep or the next mount).
    pub fn check_once(&self, db: &ChallengeDb, challenge_id: &str) -> Option<Evaluation> {
        if self.has_run.swap(true, Ordering::SeqCst) {
            return None;
        }
        match engine::evaluate(db, challenge_id, self.tz) {
            Ok(evaluation) => Some(evaluation),
            Err(error) => {
                tracing::debug!(challenge = %challenge_id, %error, "status check incomplete");
                None
            }
        }
    }

    /// Whether this checker has already fired.
    pub fn has_run(&self) -> bool {
        self.has_run.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{Challenge, Visibility};
    use chrono::NaiveDate;

    #[test]
    fn test_check_runs_exactly_once() {
        let db = ChallengeDb::open_memory().unwrap();
        let challenge = Challenge::new(
            "user-1",
            chrono_tz::UTC,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Visibility::Private,
        );
        db.insert_challenge(&challenge).unwrap();

        let checker = StatusChecker::new(chrono_tz::UTC);
        assert!(!checker.has_run());
        assert!(checker.check_once(&db, &challenge.id).is_some());
        assert!(checker.has_run());
        // Re-render: no second evaluation
        assert!(checker.check_once(&db, &challenge.id).is_none());
    }

    #[test]
    fn test_failed_check_is_swallowed() {
        let db = ChallengeDb::open_memory().unwrap();
        let checker = StatusChecker::new(chrono_tz::UTC);
        // Unknown challenge id: the error is absorbed, not surfaced
        assert!(checker.check_once(&db, "missing").is_none());
        assert!(checker.has_run());
    }
}
