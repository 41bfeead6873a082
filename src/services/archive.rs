//! Archive & reset job.
//!
//! Each tick snapshots every eligible user into `weekly_snapshots` and zeroes
//! their ledgers. A user's snapshot and reset commit together, and the
//! (week_key, username) pair is unique, so a retried or repeated run never
//! archives or resets the same user twice for one period.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use rusqlite::TransactionBehavior;
use std::time::{Duration, Instant};

use crate::config::{Cadence, ScheduleConfig};
use crate::db::{self, ArchiveRunRecord, DbLockError, DbPool};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Lock(#[from] DbLockError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub week_key: String,
    pub archived: usize,
    /// Already archived for this week_key
    pub skipped: usize,
    pub failed: usize,
    /// Not reached before the budget ran out
    pub deferred: usize,
}

impl ArchiveOutcome {
    pub fn status(&self) -> &'static str {
        if self.failed == 0 && self.deferred == 0 {
            "ok"
        } else {
            "partial"
        }
    }
}

/// What happened to a single user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserArchive {
    Archived,
    AlreadyArchived,
    Gone,
}

/// First local date of the period `now` falls in
fn period_start(now: DateTime<Utc>, tz: Tz, cadence: Cadence, reset_weekday: chrono::Weekday) -> NaiveDate {
    let today = now.with_timezone(&tz).date_naive();
    match cadence {
        Cadence::Daily => today,
        Cadence::Weekly => {
            let back = (today.weekday().num_days_from_sunday() + 7 - reset_weekday.num_days_from_sunday()) % 7;
            today - TimeDelta::days(i64::from(back))
        }
    }
}

/// Identifier (`YYYY-MM-DD`) of the period being archived, i.e. the one that
/// ended before `now`'s period began: its first local date. Daily cadence
/// keys on yesterday, weekly cadence on the `reset_weekday` a week before the
/// most recent one. Stable for every tick inside the current period.
pub fn week_key(now: DateTime<Utc>, tz: Tz, cadence: Cadence, reset_weekday: chrono::Weekday) -> String {
    let length = match cadence {
        Cadence::Daily => TimeDelta::days(1),
        Cadence::Weekly => TimeDelta::days(7),
    };
    (period_start(now, tz, cadence, reset_weekday) - length)
        .format("%Y-%m-%d")
        .to_string()
}

/// Resolve a local wall-clock time, stepping forward out of DST gaps
fn local_instant(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let mut naive = date.and_hms_opt(hour, minute, 0)?;
    for _ in 0..4 {
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return Some(dt.with_timezone(&Utc));
        }
        naive += TimeDelta::minutes(30);
    }
    None
}

/// Local midnight opening the current period. Users registered after it
/// already score into the new period and are not archived.
pub fn period_boundary(now: DateTime<Utc>, schedule: &ScheduleConfig) -> DateTime<Utc> {
    let start = period_start(now, schedule.timezone, schedule.cadence, schedule.reset_weekday);
    local_instant(schedule.timezone, start, 0, 0).unwrap_or(now)
}

/// Time left until the next configured local trigger strictly after `now`
pub fn duration_until_next_fire(now: DateTime<Utc>, schedule: &ScheduleConfig) -> Duration {
    let today = now.with_timezone(&schedule.timezone).date_naive();
    let next = (0..3)
        .filter_map(|offset| today.checked_add_days(chrono::Days::new(offset)))
        .filter_map(|date| local_instant(schedule.timezone, date, schedule.hour, schedule.minute))
        .find(|fire| *fire > now);

    match next {
        Some(fire) => (fire - now).to_std().unwrap_or(Duration::from_secs(60)),
        None => Duration::from_secs(24 * 60 * 60),
    }
}

fn archive_user(pool: &DbPool, username: &str, week_key: &str, now: DateTime<Utc>) -> Result<UserArchive, ArchiveError> {
    let mut conn = db::try_lock(pool)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if db::has_snapshot(&tx, week_key, username)? {
        return Ok(UserArchive::AlreadyArchived);
    }
    let Some(progress) = db::load_progress(&tx, username)? else {
        return Ok(UserArchive::Gone);
    };

    db::insert_snapshot(&tx, now, week_key, &progress)?;
    db::reset_ledgers(&tx, username)?;
    tx.commit()?;
    Ok(UserArchive::Archived)
}

/// Run the job once at `now`.
///
/// Users are processed one at a time, each under its own transaction, so
/// scoring requests interleave with the run. Per-user failures are counted
/// and retried on the next tick.
pub fn archive_and_reset(
    pool: &DbPool,
    now: DateTime<Utc>,
    schedule: &ScheduleConfig,
) -> Result<ArchiveOutcome, ArchiveError> {
    let started = Instant::now();
    let deadline = started + Duration::from_secs(schedule.budget_secs);
    let key = week_key(now, schedule.timezone, schedule.cadence, schedule.reset_weekday);
    let boundary = db::timestamp(period_boundary(now, schedule));

    let usernames = {
        let conn = db::try_lock(pool)?;
        db::list_usernames_created_before(&conn, &boundary)?
    };

    let mut outcome = ArchiveOutcome {
        week_key: key.clone(),
        ..Default::default()
    };

    for (i, username) in usernames.iter().enumerate() {
        if Instant::now() >= deadline {
            outcome.deferred = usernames.len() - i;
            tracing::warn!(
                "Archive budget of {}s exhausted, {} users deferred to the next tick",
                schedule.budget_secs,
                outcome.deferred
            );
            break;
        }

        match archive_user(pool, username, &key, now) {
            Ok(UserArchive::Archived) => outcome.archived += 1,
            Ok(UserArchive::AlreadyArchived) | Ok(UserArchive::Gone) => outcome.skipped += 1,
            Err(ArchiveError::Lock(e)) => return Err(e.into()),
            Err(e) => {
                tracing::error!(user = username.as_str(), "Failed to archive user: {}", e);
                outcome.failed += 1;
            }
        }
    }

    let finished_at = now + TimeDelta::from_std(started.elapsed()).unwrap_or(TimeDelta::zero());
    let record = ArchiveRunRecord {
        week_key: key,
        started_at: db::timestamp(now),
        finished_at: db::timestamp(finished_at),
        archived: outcome.archived as i64,
        skipped: outcome.skipped as i64,
        failed: outcome.failed as i64,
        deferred: outcome.deferred as i64,
        status: outcome.status().to_string(),
    };
    {
        let conn = db::try_lock(pool)?;
        db::record_archive_run(&conn, &record)?;
    }

    Ok(outcome)
}

/// Run the job on the blocking pool and report the result in the logs.
/// Never panics or propagates: a failed run is retried on the next tick.
pub async fn run_once(state: &AppState) -> Option<ArchiveOutcome> {
    let pool = state.db.clone();
    let now = state.now();
    let schedule = state.settings.schedule.clone();

    match tokio::task::spawn_blocking(move || archive_and_reset(&pool, now, &schedule)).await {
        Ok(Ok(outcome)) => {
            if outcome.status() == "ok" {
                tracing::info!(
                    week_key = outcome.week_key.as_str(),
                    archived = outcome.archived,
                    skipped = outcome.skipped,
                    "Archive run complete"
                );
            } else {
                tracing::warn!(
                    week_key = outcome.week_key.as_str(),
                    archived = outcome.archived,
                    skipped = outcome.skipped,
                    failed = outcome.failed,
                    deferred = outcome.deferred,
                    "Archive run partial, remaining users retried next tick"
                );
            }
            Some(outcome)
        }
        Ok(Err(e)) => {
            tracing::error!("Archive run failed: {}", e);
            None
        }
        Err(e) => {
            tracing::error!("Archive run panicked: {}", e);
            None
        }
    }
}

/// Background task firing the job at the configured local time
pub fn spawn_scheduler(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = duration_until_next_fire(state.now(), &state.settings.schedule);
            tracing::info!("Next archive run in {}s", wait.as_secs());
            tokio::time::sleep(wait).await;
            run_once(&state).await;
        }
    })
}
