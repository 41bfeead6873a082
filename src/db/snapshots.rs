//! Weekly snapshots (append-only) and the archive run log

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::UserProgress;

/// Archived copy of one user's document
#[derive(Debug, Clone)]
pub struct WeeklySnapshot {
  pub id: i64,
  pub taken_at: String,
  pub week_key: String,
  pub username: String,
  pub data: UserProgress,
}

/// Outcome of one archive job run, as recorded for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRunRecord {
  pub week_key: String,
  pub started_at: String,
  pub finished_at: String,
  pub archived: i64,
  pub skipped: i64,
  pub failed: i64,
  /// Left for the next tick when the time budget ran out
  pub deferred: i64,
  pub status: String,
}

/// Insert a snapshot unless one already exists for (week_key, username).
/// Returns true when a new row was written.
pub fn insert_snapshot(
  conn: &Connection,
  taken_at: DateTime<Utc>,
  week_key: &str,
  progress: &UserProgress,
) -> Result<bool> {
  let data = serde_json::to_string(progress)
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
  let inserted = conn.execute(
    r#"
    INSERT OR IGNORE INTO weekly_snapshots (taken_at, week_key, username, data)
    VALUES (?1, ?2, ?3, ?4)
    "#,
    params![super::timestamp(taken_at), week_key, progress.username, data],
  )?;
  Ok(inserted > 0)
}

pub fn has_snapshot(conn: &Connection, week_key: &str, username: &str) -> Result<bool> {
  conn.query_row(
    "SELECT EXISTS(SELECT 1 FROM weekly_snapshots WHERE week_key = ?1 AND username = ?2)",
    params![week_key, username],
    |row| row.get(0),
  )
}

pub fn get_snapshots_for_week(conn: &Connection, week_key: &str) -> Result<Vec<WeeklySnapshot>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, taken_at, week_key, username, data
    FROM weekly_snapshots
    WHERE week_key = ?1
    ORDER BY username
    "#,
  )?;

  let snapshots = stmt
    .query_map(params![week_key], |row| {
      let data: String = row.get(4)?;
      let data = serde_json::from_str(&data).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
      })?;
      Ok(WeeklySnapshot {
        id: row.get(0)?,
        taken_at: row.get(1)?,
        week_key: row.get(2)?,
        username: row.get(3)?,
        data,
      })
    })?
    .collect::<Result<Vec<_>>>()?;

  Ok(snapshots)
}

pub fn count_snapshots(conn: &Connection, week_key: &str) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM weekly_snapshots WHERE week_key = ?1",
    params![week_key],
    |row| row.get(0),
  )
}

pub fn record_archive_run(conn: &Connection, run: &ArchiveRunRecord) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO archive_runs (week_key, started_at, finished_at, archived, skipped, failed, deferred, status)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    "#,
    params![
      run.week_key,
      run.started_at,
      run.finished_at,
      run.archived,
      run.skipped,
      run.failed,
      run.deferred,
      run.status,
    ],
  )?;
  Ok(())
}

pub fn get_latest_archive_run(conn: &Connection) -> Result<Option<ArchiveRunRecord>> {
  conn
    .query_row(
      r#"
      SELECT week_key, started_at, finished_at, archived, skipped, failed, deferred, status
      FROM archive_runs
      ORDER BY id DESC
      LIMIT 1
      "#,
      [],
      |row| {
        Ok(ArchiveRunRecord {
          week_key: row.get(0)?,
          started_at: row.get(1)?,
          finished_at: row.get(2)?,
          archived: row.get(3)?,
          skipped: row.get(4)?,
          failed: row.get(5)?,
          deferred: row.get(6)?,
          status: row.get(7)?,
        })
      },
    )
    .optional()
}
