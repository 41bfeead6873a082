//! Scoring: one answered question end to end, plus the read-side queries.
//!
//! Every scoring event is a single read-modify-write of the user's document
//! inside an IMMEDIATE transaction. SQLite takes the write lock before the
//! read, so two submissions for the same user (from this process or another
//! one sharing the file) are applied one after the other.

use rusqlite::{Connection, TransactionBehavior};
use std::collections::BTreeMap;

use crate::config::LEDGER_DAYS;
use crate::db;
use crate::domain::{DayIndex, Subject, Tier, Transition, UserProgress};
use crate::error::ApiError;

/// Result of one scoring call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub subject: Subject,
    /// Today's ledger value for the subject after the update
    pub today: u32,
    pub day: DayIndex,
    pub level: Tier,
    pub transition: Transition,
}

/// Trimmed username, or `MissingUsername` when blank
pub fn require_username(raw: Option<&str>) -> Result<&str, ApiError> {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ApiError::MissingUsername),
    }
}

/// Apply one answer for `username`/`subject`.
///
/// `outcome == None` means the answer must not count (hint shown, story
/// read, ...): nothing is written and today's value is returned as is.
pub fn record_answer(
    conn: &mut Connection,
    username: &str,
    subject: Subject,
    outcome: Option<bool>,
    day: DayIndex,
) -> Result<ScoreOutcome, ApiError> {
    let username = require_username(Some(username))?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut progress = db::load_progress(&tx, username)?.ok_or(ApiError::UserNotFound)?;

    let transition = match outcome {
        Some(correct) => {
            let transition = progress.subject_mut(subject).record_outcome(correct, day);
            db::save_progress(&tx, &progress)?;
            transition
        }
        None => Transition::Unchanged,
    };
    tx.commit()?;

    match transition {
        Transition::Promoted { from, to } => tracing::info!(
            user = username,
            subject = subject.as_str(),
            "Promoted {} → {}",
            from.as_str(),
            to.as_str()
        ),
        Transition::Demoted { from, to } => tracing::info!(
            user = username,
            subject = subject.as_str(),
            "Demoted {} → {}",
            from.as_str(),
            to.as_str()
        ),
        Transition::Unchanged => {}
    }

    let state = progress.subject(subject);
    Ok(ScoreOutcome {
        subject,
        today: state.ledger.read_today(day),
        day,
        level: state.level,
        transition,
    })
}

/// Load a user's normalized document or fail with `UserNotFound`
pub fn load_user(conn: &Connection, username: &str) -> Result<UserProgress, ApiError> {
    let username = require_username(Some(username))?;
    db::load_progress(conn, username)?.ok_or(ApiError::UserNotFound)
}

/// Today's count per subject
pub fn today_counts(
    conn: &Connection,
    username: &str,
    day: DayIndex,
) -> Result<BTreeMap<Subject, u32>, ApiError> {
    let progress = load_user(conn, username)?;
    Ok(progress
        .subjects
        .iter()
        .map(|(subject, state)| (*subject, state.ledger.read_today(day)))
        .collect())
}

/// The full 7-day ledger per subject (reporting only)
pub fn weekly_counts(
    conn: &Connection,
    username: &str,
) -> Result<BTreeMap<Subject, [u32; LEDGER_DAYS]>, ApiError> {
    let progress = load_user(conn, username)?;
    Ok(progress
        .subjects
        .iter()
        .map(|(subject, state)| (*subject, *state.ledger.days()))
        .collect())
}

pub fn subject_level(conn: &Connection, username: &str, subject: Subject) -> Result<Tier, ApiError> {
    Ok(load_user(conn, username)?.subject(subject).level)
}
