//! Spaced repetition algorithm and the pure review processor.
//!
//! Items move through a short ladder of fixed day gaps (the learning phase)
//! before graduating to a phase where the gap grows by the ease factor:
//! - Learning Easy climbs one step and waits that many days
//! - Learning Medium repeats the current gap
//! - Hard always drops back to step 1 with a one-day gap and a lower ease
//! - Mature Easy/Medium nudge the ease up/down and multiply the gap by it,
//!   up to `max_interval_days`

use crate::config::SchedulingConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::models::{Outcome, ReviewEvent, RevisionItem};
use chrono::{DateTime, Datelike, Duration, Utc};

/// Scheduling parameters produced by an algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSchedule {
    pub learning_step: u32,
    pub interval_days: u32,
    pub ease_factor: f64,
    pub lapse_count: u32,
}

/// Trait for spaced repetition algorithms.
pub trait SrsAlgorithm: Send + Sync {
    /// Algorithm name.
    fn name(&self) -> &str;

    /// Calculate the next schedule for a memorized item.
    fn calculate_next_review(&self, item: &RevisionItem, outcome: Outcome) -> ReviewSchedule;

    /// Schedule for an item that has just been marked memorized.
    fn initial_schedule(&self) -> ReviewSchedule;

    /// Step at which items leave the learning phase.
    fn graduation_step(&self) -> u32;
}

/// Day-based learning ladder followed by ease-factor growth.
#[derive(Debug, Clone, Default)]
pub struct StepLadder {
    pub config: SchedulingConfig,
}

impl StepLadder {
    pub fn new(config: SchedulingConfig) -> Self {
        Self { config }
    }

    fn clamp_ease(&self, ease: f64) -> f64 {
        ease.max(self.config.min_ease)
    }

    fn lapse(&self, item: &RevisionItem, lapse_count: u32) -> ReviewSchedule {
        ReviewSchedule {
            learning_step: 1,
            interval_days: 1,
            ease_factor: self.clamp_ease(item.ease_factor - self.config.hard_penalty),
            lapse_count,
        }
    }
}

impl SrsAlgorithm for StepLadder {
    fn name(&self) -> &str {
        "step-ladder"
    }

    fn calculate_next_review(&self, item: &RevisionItem, outcome: Outcome) -> ReviewSchedule {
        if item.is_mature(self.config.graduation_step) {
            let ease = match outcome {
                Outcome::Hard => return self.lapse(item, item.lapse_count + 1),
                Outcome::Easy => self.clamp_ease(item.ease_factor + self.config.ease_bonus),
                Outcome::Medium => self.clamp_ease(item.ease_factor - self.config.ease_bonus),
            };
            let interval = (item.interval_days as f64 * ease).round() as u32;

            ReviewSchedule {
                learning_step: item.learning_step,
                interval_days: interval.min(self.config.max_interval_days).max(1),
                ease_factor: ease,
                lapse_count: item.lapse_count,
            }
        } else {
            // Step 0 only shows up on records written by hand; treat it as step 1.
            let step = item.learning_step.max(1);
            let step = match outcome {
                Outcome::Hard => return self.lapse(item, item.lapse_count),
                Outcome::Easy => step + 1,
                Outcome::Medium => step,
            };

            ReviewSchedule {
                learning_step: step,
                interval_days: step,
                ease_factor: item.ease_factor,
                lapse_count: item.lapse_count,
            }
        }
    }

    fn initial_schedule(&self) -> ReviewSchedule {
        ReviewSchedule {
            learning_step: 1,
            interval_days: 1,
            ease_factor: self.config.initial_ease,
            lapse_count: 0,
        }
    }

    fn graduation_step(&self) -> u32 {
        self.config.graduation_step
    }
}

/// Result of processing one review.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedReview {
    pub item: RevisionItem,
    pub event: ReviewEvent,
}

/// Apply a review outcome to an item.
///
/// `reviewed_at` is when the review happened and may lie in the past;
/// `recorded_at` is the true current time. The resulting due date is never
/// earlier than `recorded_at`.
pub fn process_review(
    algorithm: &dyn SrsAlgorithm,
    item: &RevisionItem,
    outcome: Outcome,
    reviewed_at: DateTime<Utc>,
    recorded_at: DateTime<Utc>,
) -> SchedulerResult<ProcessedReview> {
    if !item.memorized {
        return Err(SchedulerError::ItemNotMemorized(item.item_id));
    }
    if !is_storable(reviewed_at) {
        return Err(SchedulerError::DateOutOfRange(item.item_id));
    }

    let schedule = algorithm.calculate_next_review(item, outcome);
    let next_due = Duration::try_days(i64::from(schedule.interval_days))
        .and_then(|gap| reviewed_at.checked_add_signed(gap))
        .filter(|due| is_storable(*due))
        .ok_or(SchedulerError::DateOutOfRange(item.item_id))?
        .max(recorded_at);

    let consecutive_correct = if outcome.is_correct() {
        item.consecutive_correct + 1
    } else {
        0
    };

    let updated = RevisionItem {
        learning_step: schedule.learning_step,
        interval_days: schedule.interval_days,
        ease_factor: schedule.ease_factor,
        lapse_count: schedule.lapse_count,
        consecutive_correct,
        last_reviewed_at: Some(reviewed_at),
        next_due_at: Some(next_due),
        ..item.clone()
    };

    Ok(ProcessedReview {
        item: updated,
        event: ReviewEvent::new(item.item_id, outcome, reviewed_at),
    })
}

/// Whether `at` has a four-digit year, the range stored timestamps round-trip in.
pub(crate) fn is_storable(at: DateTime<Utc>) -> bool {
    (0..=9999).contains(&at.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn day0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn item_at(step: u32, interval: u32, ease: f64) -> RevisionItem {
        RevisionItem {
            memorized: true,
            memorized_at: Some(day0()),
            next_due_at: Some(day0()),
            learning_step: step,
            interval_days: interval,
            ease_factor: ease,
            ..RevisionItem::unmemorized(42)
        }
    }

    fn review(item: &RevisionItem, outcome: Outcome, at: DateTime<Utc>) -> RevisionItem {
        process_review(&StepLadder::default(), item, outcome, at, at).unwrap().item
    }

    #[test]
    fn test_first_easy_review() {
        let next = review(&item_at(1, 1, 2.5), Outcome::Easy, day0());
        assert_eq!(next.learning_step, 2);
        assert_eq!(next.interval_days, 2);
        assert_eq!(next.next_due_at, Some(day0() + Duration::days(2)));
        assert_eq!(next.last_reviewed_at, Some(day0()));
        assert_eq!(next.consecutive_correct, 1);
    }

    #[test]
    fn test_graduation() {
        let next = review(&item_at(3, 3, 2.5), Outcome::Easy, day0());
        assert_eq!(next.learning_step, 4);
        assert_eq!(next.interval_days, 4);
        assert_eq!(next.next_due_at, Some(day0() + Duration::days(4)));
        assert!(next.is_mature(4));
    }

    #[test]
    fn test_learning_medium_repeats_gap() {
        let next = review(&item_at(2, 2, 2.5), Outcome::Medium, day0());
        assert_eq!(next.learning_step, 2);
        assert_eq!(next.interval_days, 2);
        assert_eq!(next.ease_factor, 2.5);
    }

    #[test]
    fn test_learning_hard_resets() {
        let item = RevisionItem { consecutive_correct: 5, ..item_at(3, 3, 2.5) };
        let next = review(&item, Outcome::Hard, day0());
        assert_eq!(next.learning_step, 1);
        assert_eq!(next.interval_days, 1);
        assert!((next.ease_factor - 2.3).abs() < 1e-9);
        assert_eq!(next.lapse_count, 0);
        assert_eq!(next.consecutive_correct, 0);
    }

    #[test]
    fn test_mature_hard_lapses() {
        let next = review(&item_at(6, 10, 2.0), Outcome::Hard, day0());
        assert_eq!(next.lapse_count, 1);
        assert_eq!(next.learning_step, 1);
        assert_eq!(next.interval_days, 1);
        assert!((next.ease_factor - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_mature_easy_and_medium() {
        let easy = review(&item_at(4, 4, 2.5), Outcome::Easy, day0());
        assert!((easy.ease_factor - 2.65).abs() < 1e-9);
        assert_eq!(easy.interval_days, 11);
        assert_eq!(easy.learning_step, 4);

        let medium = review(&item_at(4, 20, 2.0), Outcome::Medium, day0());
        assert!((medium.ease_factor - 1.85).abs() < 1e-9);
        assert_eq!(medium.interval_days, 37);
    }

    #[test]
    fn test_ease_floor() {
        let next = review(&item_at(5, 10, 1.35), Outcome::Hard, day0());
        assert_eq!(next.ease_factor, 1.3);

        let next = review(&item_at(5, 10, 1.3), Outcome::Medium, day0());
        assert_eq!(next.ease_factor, 1.3);
        assert_eq!(next.interval_days, 13);
    }

    #[test]
    fn test_unmemorized_rejected() {
        let item = RevisionItem::unmemorized(9);
        let err = process_review(&StepLadder::default(), &item, Outcome::Easy, day0(), day0())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::ItemNotMemorized(9)));
    }

    #[test]
    fn test_backdated_due_date_clamped() {
        let reviewed_at = day0() - Duration::days(30);
        let result =
            process_review(&StepLadder::default(), &item_at(1, 1, 2.5), Outcome::Easy, reviewed_at, day0())
                .unwrap();
        assert_eq!(result.item.next_due_at, Some(day0()));
        assert_eq!(result.item.last_reviewed_at, Some(reviewed_at));
        assert_eq!(result.event.occurred_at, reviewed_at);
    }

    #[test]
    fn test_backdated_due_date_kept_when_future() {
        let reviewed_at = day0() - Duration::days(1);
        let result =
            process_review(&StepLadder::default(), &item_at(3, 3, 2.5), Outcome::Easy, reviewed_at, day0())
                .unwrap();
        assert_eq!(result.item.next_due_at, Some(reviewed_at + Duration::days(4)));
    }

    #[test]
    fn test_event_matches_review() {
        let result =
            process_review(&StepLadder::default(), &item_at(2, 2, 2.5), Outcome::Medium, day0(), day0())
                .unwrap();
        assert_eq!(result.event.item_id, 42);
        assert_eq!(result.event.outcome, Outcome::Medium);
        assert_eq!(result.event.occurred_at, day0());
    }

    #[test]
    fn test_custom_constants() {
        let algo = StepLadder::new(SchedulingConfig {
            graduation_step: 3,
            ease_bonus: 0.3,
            ..SchedulingConfig::default()
        });
        let next = process_review(&algo, &item_at(3, 3, 2.0), Outcome::Easy, day0(), day0())
            .unwrap()
            .item;
        assert!((next.ease_factor - 2.3).abs() < 1e-9);
        assert_eq!(next.interval_days, 7);
    }

    #[test]
    fn test_mature_interval_capped() {
        let next = review(&item_at(12, 30_000, 2.5), Outcome::Easy, day0());
        assert_eq!(next.interval_days, 36_500);
        assert_eq!(next.next_due_at, Some(day0() + Duration::days(36_500)));

        let algo = StepLadder::new(SchedulingConfig {
            max_interval_days: 60,
            ..SchedulingConfig::default()
        });
        let next = process_review(&algo, &item_at(5, 40, 2.5), Outcome::Medium, day0(), day0())
            .unwrap()
            .item;
        assert_eq!(next.interval_days, 60);
    }

    #[test]
    fn test_due_date_past_year_9999_rejected() {
        let algo = StepLadder::new(SchedulingConfig {
            max_interval_days: u32::MAX,
            ..SchedulingConfig::default()
        });
        let err = process_review(&algo, &item_at(6, 100_000_000, 2.5), Outcome::Easy, day0(), day0())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::DateOutOfRange(42)));

        let err = process_review(&algo, &item_at(6, 3_000_000, 2.5), Outcome::Easy, day0(), day0())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::DateOutOfRange(42)));
    }

    #[test]
    fn test_review_time_before_year_zero_rejected() {
        let ancient = Utc.with_ymd_and_hms(-5, 1, 1, 0, 0, 0).unwrap();
        let err = process_review(&StepLadder::default(), &item_at(1, 1, 2.5), Outcome::Easy, ancient, day0())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::DateOutOfRange(42)));
    }

    fn outcome_strategy() -> impl Strategy<Value = Outcome> {
        prop_oneof![Just(Outcome::Easy), Just(Outcome::Medium), Just(Outcome::Hard)]
    }

    proptest! {
        #[test]
        fn prop_ease_never_below_floor(outcomes in prop::collection::vec(outcome_strategy(), 1..60)) {
            let mut item = item_at(1, 1, 2.5);
            let mut at = day0();
            for outcome in outcomes {
                item = review(&item, outcome, at);
                prop_assert!(item.ease_factor >= 1.3);
                at += Duration::days(i64::from(item.interval_days));
            }
        }

        #[test]
        fn prop_interval_within_cap(
            outcomes in prop::collection::vec(outcome_strategy(), 1..80),
            max_interval in 4u32..50_000,
        ) {
            let algo = StepLadder::new(SchedulingConfig {
                max_interval_days: max_interval,
                ..SchedulingConfig::default()
            });
            let mut item = item_at(1, 1, 2.5);
            for outcome in outcomes {
                item = process_review(&algo, &item, outcome, day0(), day0()).unwrap().item;
                prop_assert!(item.interval_days <= max_interval);
            }
        }

        #[test]
        fn prop_learning_easy_interval_matches_step(step in 1u32..4, ease in 1.3f64..3.0) {
            let next = review(&item_at(step, step, ease), Outcome::Easy, day0());
            prop_assert_eq!(next.learning_step, step + 1);
            prop_assert_eq!(next.interval_days, next.learning_step);
        }

        #[test]
        fn prop_mature_easy_grows(interval in 4u32..200, ease in 1.3f64..3.0, rounds in 1usize..8) {
            let mut item = item_at(4, interval, ease);
            for _ in 0..rounds {
                let next = review(&item, Outcome::Easy, day0());
                prop_assert!(next.interval_days > item.interval_days || next.interval_days == 36_500);
                item = next;
            }
        }

        #[test]
        fn prop_mature_hard_demotes(interval in 1u32..5000, step in 4u32..20) {
            let next = review(&item_at(step, interval, 2.5), Outcome::Hard, day0());
            prop_assert_eq!(next.learning_step, 1);
            prop_assert_eq!(next.interval_days, 1);
        }

        #[test]
        fn prop_due_never_before_recorded(
            step in 1u32..10,
            interval in 1u32..400,
            days_back in 0i64..2000,
            outcome in outcome_strategy(),
        ) {
            let reviewed_at = day0() - Duration::days(days_back);
            let result = process_review(
                &StepLadder::default(),
                &item_at(step, interval, 2.5),
                outcome,
                reviewed_at,
                day0(),
            ).unwrap();
            prop_assert!(result.item.next_due_at.unwrap() >= day0());
        }
    }
}
