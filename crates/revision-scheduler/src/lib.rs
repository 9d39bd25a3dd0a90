//! Spaced-repetition scheduling for memorized units.
//!
//! [`Scheduler`] is the entry point: it owns a [`RevisionStore`], applies
//! review outcomes through the pure [`algorithm::process_review`], and derives
//! due lists, streaks and goal progress from the stored state.

pub mod algorithm;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod reminder;
pub mod scheduler;
pub mod store;

pub use algorithm::{SrsAlgorithm, StepLadder};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use db::SqliteStore;
pub use error::{SchedulerError, SchedulerResult, StoreError};
pub use models::{DueItem, GoalProgress, ItemId, Outcome, ReviewEvent, RevisionItem, StreakInfo};
pub use reminder::{LogReminders, Reminder, ReminderSink};
pub use scheduler::Scheduler;
pub use store::{MemoryStore, RevisionStore};
