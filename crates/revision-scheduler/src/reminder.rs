//! Hand-off of due dates to a reminder service.

use crate::models::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reminder to fire when an item becomes due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub item_id: ItemId,
    pub fire_at: DateTime<Utc>,
}

/// Receives reminders; delivery is up to the implementation.
///
/// Scheduling a reminder for an item replaces any earlier one for it.
pub trait ReminderSink: Send {
    fn schedule(&mut self, reminder: Reminder) -> anyhow::Result<()>;

    fn cancel(&mut self, item_id: ItemId) -> anyhow::Result<()>;
}

/// Sink that writes reminders to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReminders;

impl ReminderSink for LogReminders {
    fn schedule(&mut self, reminder: Reminder) -> anyhow::Result<()> {
        tracing::info!(item_id = reminder.item_id, fire_at = %reminder.fire_at, "reminder scheduled");
        Ok(())
    }

    fn cancel(&mut self, item_id: ItemId) -> anyhow::Result<()> {
        tracing::info!(item_id, "reminder cancelled");
        Ok(())
    }
}
