//! Command-line interface.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use revision_scheduler::{ItemId, Outcome, RevisionStore, Scheduler};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "hifz-revision", version, about = "Spaced revision of memorized surahs")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Database file (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mark surahs as memorized.
    Mark {
        #[arg(required = true)]
        ids: Vec<ItemId>,
    },
    /// Stop scheduling a surah. Its history is kept.
    Unmark { id: ItemId },
    /// Record a revision: easy, medium or hard.
    Review {
        id: ItemId,
        outcome: String,
        /// Day the revision happened (YYYY-MM-DD), for catching up on missed entries
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Show one surah's schedule.
    Show { id: ItemId },
    /// List surahs due today, or coming up within --days.
    Due {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Show the revision streak.
    Streak,
    /// List past revisions of a surah, newest first.
    History { id: ItemId },
    /// Show progress towards the revision goals.
    Goals,
}

pub fn run<S: RevisionStore>(
    cli: &Cli,
    scheduler: &mut Scheduler<S>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let graduation = scheduler.algorithm().graduation_step();

    match &cli.cmd {
        Command::Mark { ids } => {
            let items = scheduler.mark_memorized_many(ids)?;
            if cli.json {
                return print_json(out, &items);
            }
            for item in items {
                writeln!(out, "Surah {} memorized, first revision {}", item.item_id, fmt_time(item.next_due_at))?;
            }
        }
        Command::Unmark { id } => {
            let item = scheduler.mark_unmemorized(*id)?;
            if cli.json {
                return print_json(out, &item);
            }
            writeln!(out, "Surah {} no longer scheduled", item.item_id)?;
        }
        Command::Review { id, outcome, on } => {
            let outcome: Outcome = outcome.parse()?;
            let item = match on {
                Some(date) => scheduler.add_backdated_review(*id, outcome, *date)?,
                None => scheduler.complete_review(*id, outcome)?,
            };
            if cli.json {
                return print_json(out, &item);
            }
            writeln!(
                out,
                "Surah {} ({}): next revision in {} day(s), {}",
                item.item_id,
                item.phase(graduation).name(),
                item.interval_days,
                fmt_time(item.next_due_at)
            )?;
        }
        Command::Show { id } => {
            let item = scheduler.get(*id)?;
            if cli.json {
                return print_json(out, &item);
            }
            writeln!(out, "Surah {}: {}", item.item_id, item.phase(graduation).name())?;
            writeln!(out, "  next revision: {}", fmt_time(item.next_due_at))?;
            writeln!(out, "  last revision: {}", fmt_time(item.last_reviewed_at))?;
            writeln!(out, "  interval: {} day(s), ease {:.2}", item.interval_days, item.ease_factor)?;
            writeln!(out, "  step {}, {} correct in a row, {} lapse(s)", item.learning_step, item.consecutive_correct, item.lapse_count)?;
            writeln!(out, "  algorithm: {}", scheduler.algorithm().name())?;
        }
        Command::Due { days } => {
            let due = match days {
                Some(days) => scheduler.due_within(*days)?,
                None => scheduler.due_today()?,
            };
            if cli.json {
                return print_json(out, &due);
            }
            if due.is_empty() {
                writeln!(out, "Nothing due")?;
            }
            for d in due {
                let marker = if d.overdue { " (overdue)" } else { "" };
                writeln!(out, "Surah {:>3}  {}{}", d.item_id, fmt_time(Some(d.next_due_at)), marker)?;
            }
        }
        Command::Streak => {
            let streak = scheduler.streak_info()?;
            if cli.json {
                return print_json(out, &streak);
            }
            writeln!(out, "Current streak: {} day(s), best {}", streak.current, streak.best)?;
        }
        Command::History { id } => {
            let events: Vec<_> = scheduler.history_for(*id)?.collect();
            if cli.json {
                return print_json(out, &events);
            }
            for e in events {
                writeln!(out, "{}  {}", fmt_time(Some(e.occurred_at)), e.outcome.name())?;
            }
        }
        Command::Goals => {
            let progress = scheduler.goal_progress()?;
            if cli.json {
                return print_json(out, &progress);
            }
            writeln!(out, "Today:      {}/{}", progress.daily, progress.daily_target)?;
            writeln!(out, "This week:  {}/{}", progress.weekly, progress.weekly_target)?;
            writeln!(out, "This month: {}/{} memorized", progress.monthly, progress.monthly_target)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn fmt_time(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use revision_scheduler::{Config, FixedClock, MemoryStore, SchedulerError};

    fn scheduler() -> Scheduler<MemoryStore> {
        let now = Utc.with_ymd_and_hms(2024, 4, 10, 7, 0, 0).unwrap();
        Scheduler::new(MemoryStore::new(), &Config::default()).with_clock(FixedClock::new(now))
    }

    fn exec(scheduler: &mut Scheduler<MemoryStore>, args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("hifz-revision").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(&cli, scheduler, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_mark_and_review() {
        let mut s = scheduler();
        let out = exec(&mut s, &["mark", "1", "112"]).unwrap();
        assert!(out.contains("Surah 112 memorized, first revision 2024-04-11 07:00"));

        let out = exec(&mut s, &["review", "112", "easy"]).unwrap();
        assert_eq!(out, "Surah 112 (Learning): next revision in 2 day(s), 2024-04-12 07:00\n");
    }

    #[test]
    fn test_invalid_outcome() {
        let mut s = scheduler();
        exec(&mut s, &["mark", "1"]).unwrap();
        let err = exec(&mut s, &["review", "1", "perfect"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchedulerError>(),
            Some(SchedulerError::InvalidOutcome(_))
        ));
    }

    #[test]
    fn test_backdated_review_json() {
        let mut s = scheduler();
        exec(&mut s, &["mark", "36"]).unwrap();
        let out = exec(&mut s, &["--json", "review", "36", "medium", "--on", "2024-04-01"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["item_id"], 36);
        assert_eq!(value["learning_step"], 1);

        let out = exec(&mut s, &["history", "36"]).unwrap();
        assert!(out.starts_with("2024-04-01 00:00  Medium"));
    }

    #[test]
    fn test_due_and_goals() {
        let mut s = scheduler();
        assert_eq!(exec(&mut s, &["due"]).unwrap(), "Nothing due\n");

        exec(&mut s, &["mark", "18"]).unwrap();
        let out = exec(&mut s, &["due", "--days", "3"]).unwrap();
        assert!(out.contains("Surah  18"));

        let out = exec(&mut s, &["goals"]).unwrap();
        assert!(out.contains("This month: 1/2 memorized"));
    }

    #[test]
    fn test_streak_and_show() {
        let mut s = scheduler();
        exec(&mut s, &["mark", "67"]).unwrap();
        exec(&mut s, &["review", "67", "hard"]).unwrap();
        assert_eq!(exec(&mut s, &["streak"]).unwrap(), "Current streak: 1 day(s), best 1\n");

        let out = exec(&mut s, &["show", "67"]).unwrap();
        assert!(out.contains("step 1, 0 correct in a row, 0 lapse(s)"));
        assert!(out.ends_with("  algorithm: step-ladder\n"));
        assert!(exec(&mut s, &["show", "68"]).is_err());
    }
}
