//! Scheduler facade: lifecycle, reviews and queries over an injected store.

use crate::algorithm::{is_storable, process_review, SrsAlgorithm, StepLadder};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, GoalsConfig};
use crate::error::{SchedulerError, SchedulerResult};
use crate::models::{
    BackdatedReview, DueItem, GoalProgress, ItemId, Outcome, ReviewEvent, RevisionItem, StreakInfo,
};
use crate::query::{self, Calendar};
use crate::reminder::{Reminder, ReminderSink};
use crate::store::RevisionStore;
use chrono::{DateTime, Duration, NaiveDate, Utc};

pub struct Scheduler<S: RevisionStore> {
    store: S,
    algorithm: Box<dyn SrsAlgorithm>,
    clock: Box<dyn Clock>,
    reminders: Option<Box<dyn ReminderSink>>,
    calendar: Calendar,
    goals: GoalsConfig,
    first_review_delay: Duration,
}

impl<S: RevisionStore> Scheduler<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            algorithm: Box::new(StepLadder::new(config.scheduling.clone())),
            clock: Box::new(SystemClock),
            reminders: None,
            calendar: Calendar::from(&config.calendar),
            goals: config.goals.clone(),
            first_review_delay: Duration::days(i64::from(config.scheduling.first_review_delay_days)),
        }
    }

    /// Set the clock used when no timestamp is supplied.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Set the sink that receives due dates after every committed change.
    pub fn with_reminders(mut self, sink: impl ReminderSink + 'static) -> Self {
        self.reminders = Some(Box::new(sink));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn algorithm(&self) -> &dyn SrsAlgorithm {
        self.algorithm.as_ref()
    }

    pub fn get(&self, item_id: ItemId) -> SchedulerResult<RevisionItem> {
        self.store.get(item_id)?.ok_or(SchedulerError::NotFound(item_id))
    }

    pub fn items(&self) -> SchedulerResult<Vec<RevisionItem>> {
        Ok(self.store.get_all()?)
    }

    // Lifecycle

    /// Put an item under scheduling, starting the learning ladder.
    ///
    /// Fails with `AlreadyMemorized` if the item is already scheduled.
    pub fn mark_memorized(&mut self, item_id: ItemId) -> SchedulerResult<RevisionItem> {
        if let Some(existing) = self.store.get(item_id)? {
            if existing.memorized {
                return Err(SchedulerError::AlreadyMemorized(item_id));
            }
        }

        let now = self.clock.now();
        let next_due_at = now
            .checked_add_signed(self.first_review_delay)
            .filter(|due| is_storable(*due))
            .ok_or(SchedulerError::DateOutOfRange(item_id))?;
        let initial = self.algorithm.initial_schedule();
        let item = RevisionItem {
            item_id,
            memorized: true,
            memorized_at: Some(now),
            last_reviewed_at: None,
            next_due_at: Some(next_due_at),
            interval_days: initial.interval_days,
            ease_factor: initial.ease_factor,
            learning_step: initial.learning_step,
            consecutive_correct: 0,
            lapse_count: initial.lapse_count,
        };
        self.store.upsert(&item)?;
        tracing::info!(item_id, next_due_at = ?item.next_due_at, "marked memorized");

        self.notify(&item);
        Ok(item)
    }

    /// Mark several items; stops at the first failure, keeping earlier ones.
    pub fn mark_memorized_many(&mut self, item_ids: &[ItemId]) -> SchedulerResult<Vec<RevisionItem>> {
        item_ids.iter().map(|&id| self.mark_memorized(id)).collect()
    }

    /// Take an item out of scheduling. Its review history is kept.
    pub fn mark_unmemorized(&mut self, item_id: ItemId) -> SchedulerResult<RevisionItem> {
        let existing = self.get(item_id)?;
        if !existing.memorized {
            return Ok(existing);
        }

        let item = RevisionItem {
            ease_factor: self.algorithm.initial_schedule().ease_factor,
            ..RevisionItem::unmemorized(item_id)
        };
        self.store.upsert(&item)?;
        tracing::info!(item_id, "marked unmemorized");

        self.notify(&item);
        Ok(item)
    }

    // Reviews

    /// Record a review happening now.
    pub fn complete_review(&mut self, item_id: ItemId, outcome: Outcome) -> SchedulerResult<RevisionItem> {
        let now = self.clock.now();
        self.review(item_id, outcome, now, now)
    }

    /// Record a review at an explicit time.
    pub fn complete_review_at(
        &mut self,
        item_id: ItemId,
        outcome: Outcome,
        at: DateTime<Utc>,
    ) -> SchedulerResult<RevisionItem> {
        let now = self.clock.now();
        self.review(item_id, outcome, at, now)
    }

    /// Record a review that happened on an earlier day.
    ///
    /// The review is placed at the start of `occurred_on`; the resulting due
    /// date is never earlier than now. Days without a four-digit year are
    /// rejected with `DateOutOfRange`.
    pub fn add_backdated_review(
        &mut self,
        item_id: ItemId,
        outcome: Outcome,
        occurred_on: NaiveDate,
    ) -> SchedulerResult<RevisionItem> {
        let now = self.clock.now();
        if occurred_on > self.calendar.day_of(now) {
            return Err(SchedulerError::FutureReview(occurred_on));
        }
        let reviewed_at = self
            .calendar
            .start_of_day(occurred_on)
            .ok_or(SchedulerError::DateOutOfRange(item_id))?;
        self.review(item_id, outcome, reviewed_at, now)
    }

    /// Replay several backdated reviews in order; stops at the first failure.
    pub fn add_backdated_reviews(
        &mut self,
        entries: &[BackdatedReview],
    ) -> SchedulerResult<Vec<RevisionItem>> {
        entries
            .iter()
            .map(|e| self.add_backdated_review(e.item_id, e.outcome, e.occurred_on))
            .collect()
    }

    fn review(
        &mut self,
        item_id: ItemId,
        outcome: Outcome,
        reviewed_at: DateTime<Utc>,
        recorded_at: DateTime<Utc>,
    ) -> SchedulerResult<RevisionItem> {
        let current = self.get(item_id)?;
        let processed = process_review(self.algorithm.as_ref(), &current, outcome, reviewed_at, recorded_at)?;
        self.store.record_review(&processed.item, &processed.event)?;

        tracing::debug!(
            item_id,
            outcome = %outcome,
            step = processed.item.learning_step,
            interval_days = processed.item.interval_days,
            ease = processed.item.ease_factor,
            next_due_at = ?processed.item.next_due_at,
            "review recorded"
        );

        self.notify(&processed.item);
        Ok(processed.item)
    }

    fn notify(&mut self, item: &RevisionItem) {
        let Some(sink) = self.reminders.as_mut() else {
            return;
        };
        let result = match item.next_due_at {
            Some(fire_at) if item.memorized => sink.schedule(Reminder {
                item_id: item.item_id,
                fire_at,
            }),
            _ => sink.cancel(item.item_id),
        };
        if let Err(e) = result {
            tracing::warn!(item_id = item.item_id, error = %e, "reminder hand-off failed");
        }
    }

    // Queries

    pub fn due_today(&self) -> SchedulerResult<Vec<DueItem>> {
        self.due_today_at(self.clock.now())
    }

    pub fn due_today_at(&self, as_of: DateTime<Utc>) -> SchedulerResult<Vec<DueItem>> {
        Ok(query::due_today(&self.store.get_all()?, as_of, &self.calendar))
    }

    pub fn due_within(&self, days: u32) -> SchedulerResult<Vec<DueItem>> {
        self.due_within_at(days, self.clock.now())
    }

    pub fn due_within_at(&self, days: u32, as_of: DateTime<Utc>) -> SchedulerResult<Vec<DueItem>> {
        Ok(query::due_within(&self.store.get_all()?, days, as_of))
    }

    pub fn current_streak(&self) -> SchedulerResult<u32> {
        self.current_streak_at(self.clock.now())
    }

    pub fn current_streak_at(&self, as_of: DateTime<Utc>) -> SchedulerResult<u32> {
        Ok(query::current_streak(&self.store.all_events()?, as_of, &self.calendar))
    }

    pub fn streak_info(&self) -> SchedulerResult<StreakInfo> {
        self.streak_info_at(self.clock.now())
    }

    pub fn streak_info_at(&self, as_of: DateTime<Utc>) -> SchedulerResult<StreakInfo> {
        Ok(query::streak_info(&self.store.all_events()?, as_of, &self.calendar))
    }

    /// Reviews of an item, newest first.
    pub fn history_for(&self, item_id: ItemId) -> SchedulerResult<impl Iterator<Item = ReviewEvent>> {
        let events = self.store.events_for(item_id)?;
        if events.is_empty() && self.store.get(item_id)?.is_none() {
            return Err(SchedulerError::NotFound(item_id));
        }
        Ok(query::sort_history(events).into_iter())
    }

    pub fn goal_progress(&self) -> SchedulerResult<GoalProgress> {
        self.goal_progress_at(self.clock.now())
    }

    pub fn goal_progress_at(&self, as_of: DateTime<Utc>) -> SchedulerResult<GoalProgress> {
        let items = self.store.get_all()?;
        let events = self.store.all_events()?;
        Ok(query::goal_progress(&items, &events, as_of, &self.calendar, &self.goals))
    }
}
