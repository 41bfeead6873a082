//! Application configuration.
//!
//! Business constants live here next to the runtime settings, which are
//! loaded with priority config.toml > environment (.env) > defaults.

use chrono::Weekday;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;

use crate::paths;

// ==================== Scoring Rules ====================

/// Number of recent answers kept per subject
pub const WINDOW_CAPACITY: usize = 10;

/// Correct answers (out of a full window) needed to move up a tier
pub const PROMOTE_CORRECT: usize = 9;

/// Wrong answers (out of a full window) that move a learner down a tier
pub const DEMOTE_WRONG: usize = 6;

/// Ledger slots, one per weekday
pub const LEDGER_DAYS: usize = 7;

// ==================== Registration ====================

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 12;

pub const USERNAME_MIN_LEN: usize = 2;
pub const USERNAME_MAX_LEN: usize = 32;

// ==================== Defaults ====================

pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Jerusalem;
pub const DEFAULT_ARCHIVE_BUDGET_SECS: u64 = 300;

/// How often the ledgers are archived and zeroed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    /// Once per week, at the first trigger on or after `reset_weekday`
    Weekly,
    /// Every trigger
    Daily,
}

/// Schedule for the archive & reset job
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub timezone: Tz,
    pub hour: u32,
    pub minute: u32,
    pub cadence: Cadence,
    pub reset_weekday: Weekday,
    pub budget_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            hour: 0,
            minute: 0,
            cadence: Cadence::Weekly,
            reset_weekday: Weekday::Sun,
            budget_secs: DEFAULT_ARCHIVE_BUDGET_SECS,
        }
    }
}

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub port: u16,
    pub schedule: ScheduleConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(paths::db_path()),
            port: DEFAULT_SERVER_PORT,
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Settings {
    /// Full bind address for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", DEFAULT_SERVER_ADDR, self.port)
    }
}

// ==================== config.toml ====================

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database: Option<DatabaseSection>,
    server: Option<ServerSection>,
    schedule: Option<ScheduleSection>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleSection {
    timezone: Option<String>,
    hour: Option<u32>,
    minute: Option<u32>,
    cadence: Option<Cadence>,
    reset_weekday: Option<String>,
    budget_secs: Option<u64>,
}

/// Load settings: config.toml > environment > defaults
pub fn load() -> Settings {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file = match std::fs::read_to_string("config.toml") {
        Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring malformed config.toml: {}", e);
                FileConfig::default()
            }
        },
        Err(_) => FileConfig::default(),
    };

    resolve(file, |key| std::env::var(key).ok())
}

fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    // Database
    if let Some(path) = file.database.and_then(|db| db.path) {
        tracing::info!("Using database from config.toml: {}", path);
        settings.database_path = PathBuf::from(path);
    } else if let Some(path) = env("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        settings.database_path = PathBuf::from(path);
    }

    // Server
    if let Some(port) = file.server.and_then(|s| s.port) {
        settings.port = port;
    } else if let Some(port) = env("PORT").and_then(|p| p.parse().ok()) {
        settings.port = port;
    }

    // Schedule
    let schedule = file.schedule.unwrap_or_default();
    let tz_name = schedule.timezone.or_else(|| env("APP_TIMEZONE"));
    if let Some(name) = tz_name {
        settings.schedule.timezone = parse_timezone(&name);
    }
    if let Some(hour) = schedule.hour.filter(|h| *h < 24) {
        settings.schedule.hour = hour;
    }
    if let Some(minute) = schedule.minute.filter(|m| *m < 60) {
        settings.schedule.minute = minute;
    }
    if let Some(cadence) = schedule.cadence {
        settings.schedule.cadence = cadence;
    }
    if let Some(day) = schedule.reset_weekday {
        match day.parse::<Weekday>() {
            Ok(weekday) => settings.schedule.reset_weekday = weekday,
            Err(_) => tracing::warn!("Unknown reset_weekday '{}', keeping Sunday", day),
        }
    }
    if let Some(budget) = schedule.budget_secs.filter(|b| *b > 0) {
        settings.schedule.budget_secs = budget;
    }

    settings
}

/// Parse an IANA timezone name, falling back to the default
pub fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone '{}', using {}", name, DEFAULT_TIMEZONE);
        DEFAULT_TIMEZONE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let settings = resolve(FileConfig::default(), no_env);
        assert_eq!(settings.port, DEFAULT_SERVER_PORT);
        assert_eq!(settings.schedule.timezone, chrono_tz::Asia::Jerusalem);
        assert_eq!(settings.schedule.cadence, Cadence::Weekly);
        assert_eq!(settings.schedule.reset_weekday, Weekday::Sun);
        assert!(settings.database_path.ends_with("catmath.db"));
    }

    #[test]
    fn test_config_file_beats_env() {
        let file: FileConfig = toml::from_str(
            r#"
            [database]
            path = "/tmp/from-file.db"

            [server]
            port = 8080

            [schedule]
            timezone = "Europe/Berlin"
            hour = 2
            minute = 30
            cadence = "daily"
            reset_weekday = "monday"
            budget_secs = 60
            "#,
        )
        .unwrap();

        let env = |key: &str| match key {
            "DATABASE_PATH" => Some("/tmp/from-env.db".to_string()),
            "PORT" => Some("9999".to_string()),
            "APP_TIMEZONE" => Some("Asia/Tokyo".to_string()),
            _ => None,
        };

        let settings = resolve(file, env);
        assert_eq!(settings.database_path, PathBuf::from("/tmp/from-file.db"));
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.schedule.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(settings.schedule.hour, 2);
        assert_eq!(settings.schedule.minute, 30);
        assert_eq!(settings.schedule.cadence, Cadence::Daily);
        assert_eq!(settings.schedule.reset_weekday, Weekday::Mon);
        assert_eq!(settings.schedule.budget_secs, 60);
    }

    #[test]
    fn test_env_used_without_file() {
        let env = |key: &str| match key {
            "PORT" => Some("4000".to_string()),
            "APP_TIMEZONE" => Some("UTC".to_string()),
            _ => None,
        };
        let settings = resolve(FileConfig::default(), env);
        assert_eq!(settings.port, 4000);
        assert_eq!(settings.schedule.timezone, chrono_tz::UTC);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let file: FileConfig = toml::from_str(
            r#"
            [schedule]
            timezone = "Mars/Olympus"
            hour = 25
            reset_weekday = "someday"
            "#,
        )
        .unwrap();
        let settings = resolve(file, no_env);
        assert_eq!(settings.schedule.timezone, DEFAULT_TIMEZONE);
        assert_eq!(settings.schedule.hour, 0);
        assert_eq!(settings.schedule.reset_weekday, Weekday::Sun);
    }
}
