//! Per-user progress documents (ledger, recent window, level per subject)

use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{self, Ledger, StoredSubject, UserProgress};

/// Load and normalize a user's full progress document.
///
/// Missing or malformed subject rows come back repaired; nothing is written.
pub fn load_progress(conn: &Connection, username: &str) -> Result<Option<UserProgress>> {
  let account: Option<(String, i64)> = conn
    .query_row(
      "SELECT password_hash, age FROM users WHERE username = ?1",
      params![username],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;

  let Some((credential, age)) = account else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(
    r#"
    SELECT subject, ledger, recent, level
    FROM subject_progress
    WHERE username = ?1
    "#,
  )?;
  let rows = stmt
    .query_map(params![username], |row| {
      // Wrong column types read as absent, not as an error
      Ok((
        row.get::<_, String>(0)?,
        StoredSubject {
          ledger: row.get::<_, Option<String>>(1).ok().flatten(),
          recent: row.get::<_, Option<String>>(2).ok().flatten(),
          level: row.get::<_, Option<i64>>(3).ok().flatten(),
        },
      ))
    })?
    .collect::<Result<Vec<_>>>()?;

  Ok(Some(domain::normalize(username, &credential, age, rows)))
}

/// Write every subject row of the document (upsert). Rewriting all rows also
/// repairs any legacy row that was normalized at load.
pub fn save_progress(conn: &Connection, progress: &UserProgress) -> Result<()> {
  let mut stmt = conn.prepare(
    r#"
    INSERT INTO subject_progress (username, subject, ledger, recent, level)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(username, subject) DO UPDATE SET
      ledger = excluded.ledger,
      recent = excluded.recent,
      level = excluded.level
    "#,
  )?;

  for (subject, state) in &progress.subjects {
    stmt.execute(params![
      progress.username,
      subject.as_str(),
      state.ledger.to_json(),
      state.recent_json(),
      state.level.factor(),
    ])?;
  }
  Ok(())
}

/// Zero all ledgers of one user. Windows and levels are left untouched.
pub fn reset_ledgers(conn: &Connection, username: &str) -> Result<usize> {
  conn.execute(
    "UPDATE subject_progress SET ledger = ?1 WHERE username = ?2",
    params![Ledger::ZERO_JSON, username],
  )
}
