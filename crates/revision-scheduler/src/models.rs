//! Data models for revision scheduling.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SchedulerError;

/// Identifier of a memorizable unit (1..=114 for surahs, but any id works).
pub type ItemId = u32;

/// Unique review event identifier.
pub type EventId = Uuid;

/// Ease factor assigned to freshly memorized items.
pub const DEFAULT_EASE: f64 = 2.5;

/// Scheduling state of one memorizable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionItem {
    /// Stable identifier.
    pub item_id: ItemId,
    /// Whether the item is under active scheduling.
    pub memorized: bool,
    /// When the item was last marked memorized.
    pub memorized_at: Option<DateTime<Utc>>,
    /// When the item was last reviewed.
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// When the item next becomes due.
    pub next_due_at: Option<DateTime<Utc>>,
    /// Current interval in whole days.
    pub interval_days: u32,
    /// Multiplier for mature-phase interval growth.
    pub ease_factor: f64,
    /// 0 = never memorized, 1..=3 = learning, >= graduation = mature.
    pub learning_step: u32,
    /// Consecutive non-hard outcomes.
    pub consecutive_correct: u32,
    /// Times the item fell back from the mature phase.
    pub lapse_count: u32,
}

impl RevisionItem {
    /// An item that has never been scheduled.
    pub fn unmemorized(item_id: ItemId) -> Self {
        Self {
            item_id,
            memorized: false,
            memorized_at: None,
            last_reviewed_at: None,
            next_due_at: None,
            interval_days: 0,
            ease_factor: DEFAULT_EASE,
            learning_step: 0,
            consecutive_correct: 0,
            lapse_count: 0,
        }
    }

    /// Whether the item is in the ease-driven phase.
    pub fn is_mature(&self, graduation_step: u32) -> bool {
        self.learning_step >= graduation_step
    }

    /// Current learning phase for display.
    pub fn phase(&self, graduation_step: u32) -> Phase {
        if !self.memorized {
            Phase::Unmemorized
        } else if self.is_mature(graduation_step) {
            Phase::Mature
        } else {
            Phase::Learning
        }
    }
}

/// Coarse phase of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Unmemorized,
    Learning,
    Mature,
}

impl Phase {
    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unmemorized => "Unmemorized",
            Self::Learning => "Learning",
            Self::Mature => "Mature",
        }
    }
}

/// How a review went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Effortless recall.
    Easy,
    /// Recalled with some effort.
    Medium,
    /// Struggled or failed.
    Hard,
}

impl Outcome {
    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Whether this outcome keeps the correct-answer run going.
    pub fn is_correct(&self) -> bool {
        !matches!(self, Self::Hard)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(SchedulerError::InvalidOutcome(s.to_string())),
        }
    }
}

/// Append-only record of a completed review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    /// Unique identifier.
    pub id: EventId,
    /// Item that was reviewed.
    pub item_id: ItemId,
    /// When the review happened (may be backdated).
    pub occurred_at: DateTime<Utc>,
    /// How it went.
    pub outcome: Outcome,
}

impl ReviewEvent {
    /// Create a new event.
    pub fn new(item_id: ItemId, outcome: Outcome, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            occurred_at,
            outcome,
        }
    }
}

/// An item listed by a due-date query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueItem {
    pub item_id: ItemId,
    pub next_due_at: DateTime<Utc>,
    /// Due on an earlier calendar day than the query day.
    pub overdue: bool,
}

/// Streak information over the review log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakInfo {
    /// Current streak count.
    pub current: u32,
    /// Best streak ever.
    pub best: u32,
    /// Last date in current streak.
    pub last_date: Option<NaiveDate>,
}

/// Progress against the revision goals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// Distinct items reviewed today.
    pub daily: u32,
    pub daily_target: u32,
    /// Reviews since the start of the week.
    pub weekly: u32,
    pub weekly_target: u32,
    /// Items memorized this month.
    pub monthly: u32,
    pub monthly_target: u32,
}

impl GoalProgress {
    /// Whether every goal has been reached.
    pub fn all_met(&self) -> bool {
        self.daily >= self.daily_target
            && self.weekly >= self.weekly_target
            && self.monthly >= self.monthly_target
    }
}

/// A backdated review to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackdatedReview {
    pub item_id: ItemId,
    pub outcome: Outcome,
    pub occurred_on: NaiveDate,
}
