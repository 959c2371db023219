//! # Resolute Core Library
//!
//! Core business logic for Resolute, a tracker for a fixed-length 75-day
//! personal challenge program. It implements a CLI-first philosophy where
//! all operations are available via a standalone CLI binary, with any GUI
//! being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Calendar**: pure timezone-aware day numbering -- the user's IANA
//!   zone is always an explicit parameter, and day arithmetic runs on
//!   naive dates so DST can never shift a boundary
//! - **Status Engine**: stateless per-challenge evaluation; every
//!   lifecycle transition is a conditional write, so concurrent checks
//!   settle a challenge exactly once
//! - **Storage**: SQLite challenge/habit/log storage and TOML-based
//!   configuration
//! - **Sweep**: interval-driven pass over all active challenges, the
//!   backstop for users who never revisit
//!
//! ## Key Components
//!
//! - [`evaluate`]: the one idempotent status-check operation
//! - [`StatusChecker`]: run-once per-mount client trigger
//! - [`ChallengeDb`]: challenge and daily-log persistence
//! - [`Config`]: application configuration management

pub mod calendar;
pub mod challenge;
pub mod checker;
pub mod engine;
pub mod error;
pub mod logbook;
pub mod storage;
pub mod sweep;

pub use challenge::policy::{DayAccess, GRACE_DAYS, PROGRAM_LENGTH_DAYS};
pub use challenge::{
    Challenge, ChallengeStatus, DailyLog, HabitDefinition, HabitEntry, HabitKind, HabitValue,
    LifetimeStats, Visibility,
};
pub use checker::StatusChecker;
pub use engine::{evaluate, evaluate_as_of, Evaluation, ResetNotice};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use logbook::{DayView, HabitStatus};
pub use storage::{ChallengeDb, Config};
pub use sweep::{SweepSummary, SWEEP_INTERVAL};
