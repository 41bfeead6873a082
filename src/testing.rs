//! Test utilities for database and application state setup.
//!
//! Reuses the real schema initialization so tests never carry their own
//! copy of the table definitions.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, MutexGuard};
use tempfile::TempDir;

use crate::clock::FixedClock;
use crate::config::{ScheduleConfig, Settings};
use crate::db::{self, DbPool};
use crate::state::AppState;

/// Shorthand for a UTC instant
pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

/// Temporary database file with the full schema applied.
///
/// The directory is removed when the environment is dropped.
pub struct TestEnv {
    /// Kept alive for database file persistence
    _temp: TempDir,
    pub db_path: PathBuf,
    pub pool: DbPool,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let db_path = temp.path().join("catmath.db");
        let pool = db::init_db(&db_path)?;
        Ok(Self { _temp: temp, db_path, pool })
    }

    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        db::try_lock(&self.pool).unwrap()
    }

    /// A second, independent connection to the same file
    pub fn open_second_connection(&self) -> rusqlite::Result<Connection> {
        db::open_connection(&self.db_path)
    }

    /// Application state over this database with a pinned clock.
    /// The timezone is Asia/Jerusalem (the default).
    pub fn app_state(&self, now: DateTime<Utc>) -> (AppState, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        let settings = Settings {
            database_path: self.db_path.clone(),
            schedule: ScheduleConfig::default(),
            ..Settings::default()
        };
        let state = AppState::new(self.pool.clone(), clock.clone(), settings);
        (state, clock)
    }
}
