//! Read-only views derived from revision state and the review log.

use crate::config::{CalendarConfig, GoalsConfig};
use crate::models::{DueItem, GoalProgress, ReviewEvent, RevisionItem, StreakInfo};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeSet;

/// Maps instants to the user's calendar days.
#[derive(Debug, Clone, Copy)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Calendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(CalendarConfig::default().offset())
    }

    /// Calendar day containing `at`.
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// First instant of `date`, or `None` if it falls outside chrono's range.
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        date.and_time(NaiveTime::MIN)
            .and_utc()
            .checked_sub_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))
    }
}

impl From<&CalendarConfig> for Calendar {
    fn from(config: &CalendarConfig) -> Self {
        Self::new(config.offset())
    }
}

/// Memorized items due on or before the calendar day of `as_of`, by item id.
pub fn due_today(items: &[RevisionItem], as_of: DateTime<Utc>, calendar: &Calendar) -> Vec<DueItem> {
    let today = calendar.day_of(as_of);
    let mut due: Vec<DueItem> = items
        .iter()
        .filter(|item| item.memorized)
        .filter_map(|item| {
            let next_due_at = item.next_due_at?;
            let due_day = calendar.day_of(next_due_at);
            (due_day <= today).then(|| DueItem {
                item_id: item.item_id,
                next_due_at,
                overdue: due_day < today,
            })
        })
        .collect();
    due.sort_by_key(|d| d.item_id);
    due
}

/// Memorized items due after `as_of` and at most `days` days later, soonest first.
pub fn due_within(items: &[RevisionItem], days: u32, as_of: DateTime<Utc>) -> Vec<DueItem> {
    let until = as_of
        .checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let mut upcoming: Vec<DueItem> = items
        .iter()
        .filter(|item| item.memorized)
        .filter_map(|item| {
            let next_due_at = item.next_due_at?;
            (next_due_at > as_of && next_due_at <= until).then(|| DueItem {
                item_id: item.item_id,
                next_due_at,
                overdue: false,
            })
        })
        .collect();
    upcoming.sort_by_key(|d| (d.next_due_at, d.item_id));
    upcoming
}

/// Current and best runs of consecutive days with at least one review.
///
/// The current run survives one day without reviews: it counts back from
/// today if there was a review today, otherwise from yesterday.
pub fn streak_info(events: &[ReviewEvent], as_of: DateTime<Utc>, calendar: &Calendar) -> StreakInfo {
    let today = calendar.day_of(as_of);
    let days: BTreeSet<NaiveDate> = events
        .iter()
        .map(|e| calendar.day_of(e.occurred_at))
        .filter(|d| *d <= today)
        .collect();

    let mut best = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for day in &days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(*day);
    }

    let start = [Some(today), today.pred_opt()]
        .into_iter()
        .flatten()
        .find(|d| days.contains(d));

    let mut current = 0u32;
    let mut check = start;
    while let Some(day) = check.filter(|d| days.contains(d)) {
        current += 1;
        check = day.pred_opt();
    }

    StreakInfo {
        current,
        best: best.max(current),
        last_date: start,
    }
}

pub fn current_streak(events: &[ReviewEvent], as_of: DateTime<Utc>, calendar: &Calendar) -> u32 {
    streak_info(events, as_of, calendar).current
}

/// Events newest first.
pub fn sort_history(mut events: Vec<ReviewEvent>) -> Vec<ReviewEvent> {
    events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    events
}

/// Progress towards the daily, weekly (from Sunday) and monthly goals.
pub fn goal_progress(
    items: &[RevisionItem],
    events: &[ReviewEvent],
    as_of: DateTime<Utc>,
    calendar: &Calendar,
    goals: &GoalsConfig,
) -> GoalProgress {
    let today = calendar.day_of(as_of);
    let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));

    let reviewed_today: BTreeSet<_> = events
        .iter()
        .filter(|e| calendar.day_of(e.occurred_at) == today)
        .map(|e| e.item_id)
        .collect();

    let weekly = events
        .iter()
        .map(|e| calendar.day_of(e.occurred_at))
        .filter(|d| *d >= week_start && *d <= today)
        .count();

    let monthly = items
        .iter()
        .filter(|item| item.memorized)
        .filter_map(|item| item.memorized_at.map(|t| calendar.day_of(t)))
        .filter(|d| d.year() == today.year() && d.month() == today.month() && *d <= today)
        .count();

    GoalProgress {
        daily: reviewed_today.len() as u32,
        daily_target: goals.daily_revisions,
        weekly: weekly as u32,
        weekly_target: goals.weekly_revisions,
        monthly: monthly as u32,
        monthly_target: goals.memorize_per_month,
    }
}
