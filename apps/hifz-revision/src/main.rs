//! Hifz Revision - track spaced revision of memorized surahs.

mod cli;

use clap::Parser;
use cli::Cli;
use revision_scheduler::{Config, LogReminders, Scheduler, SqliteStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let db_path = cli
        .db
        .clone()
        .or_else(Config::db_path)
        .unwrap_or_else(|| PathBuf::from("revisions.db"));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!(db = %db_path.display(), "opening revision store");
    let store = SqliteStore::open(&db_path)?;

    let mut scheduler = Scheduler::new(store, &config);
    if config.reminders.enabled {
        scheduler = scheduler.with_reminders(LogReminders);
    }

    let stdout = std::io::stdout();
    cli::run(&cli, &mut scheduler, &mut stdout.lock())
}
