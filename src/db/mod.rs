pub mod progress;
pub mod schema;
pub mod snapshots;
pub mod users;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

// Re-export all public items from submodules
pub use progress::*;
pub use schema::run_migrations;
pub use snapshots::*;
pub use users::*;

pub type DbPool = Arc<Mutex<Connection>>;

/// How long a writer waits for another connection's transaction to finish
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
  /// Log the error at warn level and return None
  fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
  fn log_warn(self, context: &str) -> Option<T> {
    match self {
      Ok(v) => Some(v),
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        None
      }
    }
  }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug, thiserror::Error)]
#[error("Database unavailable")]
pub struct DbLockError;

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

/// Open a connection with the pragmas every connection needs
pub fn open_connection(path: &Path) -> Result<Connection> {
  let conn = Connection::open(path)?;
  conn.busy_timeout(BUSY_TIMEOUT)?;
  conn.execute_batch("PRAGMA foreign_keys = ON;")?;
  Ok(conn)
}

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).log_warn("Could not create database directory");
  }

  // Create backup before migrations if database exists
  if path.exists() {
    let backup_path = path.with_extension("db.backup");
    if let Err(e) = std::fs::copy(path, &backup_path) {
      tracing::warn!("Could not create database backup: {}", e);
    }
  }

  let conn = open_connection(path)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Timestamp format used for every stored instant (UTC, second precision).
/// Fixed width, so stored values compare correctly as strings.
pub fn timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
