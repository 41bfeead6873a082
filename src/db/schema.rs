//! Schema creation with version-gated migrations.
//!
//! Each migration checks the recorded version, runs inside a transaction and
//! records its own version in `db_version`, so it runs exactly once.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};

/// Current schema version. Increment this when adding a migration.
pub const DB_VERSION: i32 = 3;

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Bootstrap: ensure db_version table exists (needed to check version)
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS db_version (
      version INTEGER PRIMARY KEY,
      applied_at TEXT NOT NULL,
      description TEXT
    );
    "#,
  )?;

  let current_version = get_schema_version(conn)?;
  tracing::debug!("catmath.db schema version: {}", current_version);

  if current_version < 1 {
    migrate_v0_to_v1(conn)?;
  }
  if current_version < 2 {
    migrate_v1_to_v2(conn)?;
  }
  if current_version < 3 {
    migrate_v2_to_v3(conn)?;
  }

  Ok(())
}

/// v0→v1: users and per-subject progress
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v0→v1: Create users and subject_progress");

  let tx = conn.unchecked_transaction()?;

  // Progress columns stay nullable: legacy rows are repaired at load time
  tx.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS users (
      username TEXT PRIMARY KEY,
      password_hash TEXT NOT NULL,
      age INTEGER NOT NULL CHECK (age BETWEEN 1 AND 12),
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS subject_progress (
      username TEXT NOT NULL,
      subject TEXT NOT NULL,
      ledger TEXT,
      recent TEXT,
      level INTEGER,
      PRIMARY KEY (username, subject),
      FOREIGN KEY (username) REFERENCES users(username) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at);
    "#,
  )?;

  record_version(&tx, 1, "Create users and subject_progress")?;
  tx.commit()
}

/// v1→v2: weekly snapshots and archive run log
fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v1→v2: Add weekly_snapshots and archive_runs");

  let tx = conn.unchecked_transaction()?;
  tx.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS weekly_snapshots (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      taken_at TEXT NOT NULL,
      week_key TEXT NOT NULL,
      username TEXT NOT NULL,
      data TEXT NOT NULL,
      UNIQUE (week_key, username)
    );

    CREATE TABLE IF NOT EXISTS archive_runs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      week_key TEXT NOT NULL,
      started_at TEXT NOT NULL,
      finished_at TEXT NOT NULL,
      archived INTEGER NOT NULL DEFAULT 0,
      skipped INTEGER NOT NULL DEFAULT 0,
      failed INTEGER NOT NULL DEFAULT 0,
      status TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_weekly_snapshots_week_key ON weekly_snapshots(week_key);
    CREATE INDEX IF NOT EXISTS idx_weekly_snapshots_username ON weekly_snapshots(username);
    CREATE INDEX IF NOT EXISTS idx_archive_runs_week_key ON archive_runs(week_key);
    "#,
  )?;

  record_version(&tx, 2, "Add weekly_snapshots and archive_runs")?;
  tx.commit()
}

/// v2→v3: record users deferred by the archive budget
fn migrate_v2_to_v3(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v2→v3: Add archive_runs.deferred");

  let tx = conn.unchecked_transaction()?;
  tx.execute_batch("ALTER TABLE archive_runs ADD COLUMN deferred INTEGER NOT NULL DEFAULT 0;")?;

  record_version(&tx, 3, "Add archive_runs.deferred")?;
  tx.commit()
}

/// Highest applied schema version (0 for a fresh database)
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
  let version: Option<i32> = conn
    .query_row("SELECT MAX(version) FROM db_version", [], |row| row.get(0))
    .optional()?
    .flatten();
  Ok(version.unwrap_or(0))
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
    params![version, super::timestamp(Utc::now()), description],
  )?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_migrations_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();

    assert_eq!(get_schema_version(&conn).unwrap(), DB_VERSION);
    let rows: i64 = conn
      .query_row("SELECT COUNT(*) FROM db_version", [], |row| row.get(0))
      .unwrap();
    assert_eq!(rows, DB_VERSION as i64);
  }

  #[test]
  fn test_tables_exist() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();

    for table in ["users", "subject_progress", "weekly_snapshots", "archive_runs"] {
      let count: i64 = conn
        .query_row(
          "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
          params![table],
          |row| row.get(0),
        )
        .unwrap();
      assert_eq!(count, 1, "missing table {}", table);
    }
  }

  #[test]
  fn test_v2_database_gains_deferred_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn
      .execute_batch(
        "CREATE TABLE db_version (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL, description TEXT);",
      )
      .unwrap();
    migrate_v0_to_v1(&conn).unwrap();
    migrate_v1_to_v2(&conn).unwrap();
    conn
      .execute(
        "INSERT INTO archive_runs (week_key, started_at, finished_at, status) VALUES ('2026-10-04', 'a', 'b', 'ok')",
        [],
      )
      .unwrap();

    run_migrations(&conn).unwrap();

    assert_eq!(get_schema_version(&conn).unwrap(), 3);
    let deferred: i64 = conn
      .query_row("SELECT deferred FROM archive_runs", [], |row| row.get(0))
      .unwrap();
    assert_eq!(deferred, 0);
  }
}
