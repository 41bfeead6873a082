//! Application state shared by handlers and the archive scheduler.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::Settings;
use crate::db::DbPool;
use crate::domain::{resolve_day_index, DayIndex};

#[derive(Clone)]
pub struct AppState {
    /// Shared database connection (users, progress, snapshots)
    pub db: DbPool,

    pub clock: Arc<dyn Clock>,

    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: DbPool, clock: Arc<dyn Clock>, settings: Settings) -> Self {
        Self {
            db,
            clock,
            settings: Arc::new(settings),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Reference timezone for day buckets and the archive schedule
    pub fn timezone(&self) -> Tz {
        self.settings.schedule.timezone
    }

    /// Today's ledger slot in the reference timezone
    pub fn today(&self) -> DayIndex {
        resolve_day_index(self.now(), self.timezone())
    }
}
