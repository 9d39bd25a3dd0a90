//! Error types.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::ItemId;

/// Failures of the backing storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Item {0} is not memorized")]
    ItemNotMemorized(ItemId),
    #[error("Item {0} is already memorized")]
    AlreadyMemorized(ItemId),
    #[error("Invalid outcome: {0:?} (expected easy, medium or hard)")]
    InvalidOutcome(String),
    #[error("Not found: item {0}")]
    NotFound(ItemId),
    #[error("Review date {0} is in the future")]
    FutureReview(NaiveDate),
    #[error("Schedule for item {0} falls outside the supported date range")]
    DateOutOfRange(ItemId),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
