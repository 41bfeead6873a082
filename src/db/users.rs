//! User accounts

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{Ledger, Subject, Tier};

/// Create a user with zeroed ledgers, empty windows and the easiest tier for
/// every subject. Returns false when the username is already taken.
pub fn create_user(
  conn: &Connection,
  username: &str,
  password_hash: &str,
  age: u8,
  created_at: DateTime<Utc>,
) -> Result<bool> {
  let tx = conn.unchecked_transaction()?;

  let inserted = tx.execute(
    "INSERT OR IGNORE INTO users (username, password_hash, age, created_at) VALUES (?1, ?2, ?3, ?4)",
    params![username, password_hash, age, super::timestamp(created_at)],
  )?;
  if inserted == 0 {
    return Ok(false);
  }

  {
    let mut stmt = tx.prepare(
      "INSERT INTO subject_progress (username, subject, ledger, recent, level) VALUES (?1, ?2, ?3, '[]', ?4)",
    )?;
    for subject in Subject::ALL {
      stmt.execute(params![
        username,
        subject.as_str(),
        Ledger::ZERO_JSON,
        Tier::Easy.factor(),
      ])?;
    }
  }

  tx.commit()?;
  Ok(true)
}

pub fn get_password_hash(conn: &Connection, username: &str) -> Result<Option<String>> {
  conn
    .query_row(
      "SELECT password_hash FROM users WHERE username = ?1",
      params![username],
      |row| row.get(0),
    )
    .optional()
}

/// Usernames registered strictly before `before` (stored timestamp format)
pub fn list_usernames_created_before(conn: &Connection, before: &str) -> Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT username FROM users WHERE COALESCE(created_at, '') < ?1 ORDER BY username",
  )?;
  let names = stmt
    .query_map(params![before], |row| row.get(0))?
    .collect::<Result<Vec<String>>>()?;
  Ok(names)
}

pub fn count_users(conn: &Connection) -> Result<i64> {
  conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}
