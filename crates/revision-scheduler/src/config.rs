//! Configuration for the revision scheduler.

use crate::error::ConfigError;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "hifz-revision";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub goals: GoalsConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
}

impl Config {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.config_dir().join("config.toml"))
    }

    pub fn db_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.data_dir().join("revisions.db"))
    }
}

/// Tuning constants of the review algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    #[serde(default = "default_initial_ease")]
    pub initial_ease: f64,
    #[serde(default = "default_min_ease")]
    pub min_ease: f64,
    /// Ease change for mature Easy (+) and Medium (-) outcomes.
    #[serde(default = "default_ease_bonus")]
    pub ease_bonus: f64,
    /// Ease reduction on a Hard outcome.
    #[serde(default = "default_hard_penalty")]
    pub hard_penalty: f64,
    /// Learning step at which an item becomes mature.
    #[serde(default = "default_graduation_step")]
    pub graduation_step: u32,
    /// Days from marking memorized to the first review.
    #[serde(default = "default_first_review_delay")]
    pub first_review_delay_days: u32,
    /// Upper bound on the mature-phase gap.
    #[serde(default = "default_max_interval")]
    pub max_interval_days: u32,
}

fn default_initial_ease() -> f64 { 2.5 }
fn default_min_ease() -> f64 { 1.3 }
fn default_ease_bonus() -> f64 { 0.15 }
fn default_hard_penalty() -> f64 { 0.2 }
fn default_graduation_step() -> u32 { 4 }
fn default_first_review_delay() -> u32 { 1 }
fn default_max_interval() -> u32 { 36500 }

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            min_ease: 1.3,
            ease_bonus: 0.15,
            hard_penalty: 0.2,
            graduation_step: 4,
            first_review_delay_days: 1,
            max_interval_days: 36500,
        }
    }
}

/// Where calendar days begin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Offset of the user's local time from UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl CalendarConfig {
    /// Offset used for day boundaries. Out-of-range values fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalsConfig {
    #[serde(default = "default_daily")]
    pub daily_revisions: u32,
    #[serde(default = "default_weekly")]
    pub weekly_revisions: u32,
    #[serde(default = "default_monthly")]
    pub memorize_per_month: u32,
}

fn default_daily() -> u32 { 3 }
fn default_weekly() -> u32 { 20 }
fn default_monthly() -> u32 { 2 }

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            daily_revisions: 3,
            weekly_revisions: 20,
            memorize_per_month: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Hand due dates to the reminder sink.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool { true }

impl Default for ReminderConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scheduling]
            ease_bonus = 0.1

            [goals]
            daily_revisions = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduling.ease_bonus, 0.1);
        assert_eq!(config.scheduling.min_ease, 1.3);
        assert_eq!(config.scheduling.graduation_step, 4);
        assert_eq!(config.scheduling.max_interval_days, 36500);
        assert_eq!(config.goals.daily_revisions, 5);
        assert_eq!(config.goals.weekly_revisions, 20);
        assert!(config.reminders.enabled);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.calendar.utc_offset_minutes = 180;
        config.goals.memorize_per_month = 4;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduling\nmin_ease = ").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_calendar_offset() {
        let calendar = CalendarConfig { utc_offset_minutes: -300 };
        assert_eq!(calendar.offset().local_minus_utc(), -300 * 60);

        let bogus = CalendarConfig { utc_offset_minutes: 100_000 };
        assert_eq!(bogus.offset().local_minus_utc(), 0);
    }
}
