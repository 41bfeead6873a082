//! Per-user learning state and the normalisation applied right after load.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ledger::{DayIndex, Ledger};
use super::level::{self, Transition};
use super::subject::Subject;
use super::tier::Tier;
use super::window::RecentWindow;

/// Raw columns of a stored subject row, possibly missing or malformed
#[derive(Debug, Clone, Default)]
pub struct StoredSubject {
  pub ledger: Option<String>,
  pub recent: Option<String>,
  pub level: Option<i64>,
}

/// Ledger, recent-answer window and level for one subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProgress {
  pub ledger: Ledger,
  pub recent: RecentWindow,
  pub level: Tier,
}

impl SubjectProgress {
  /// Repair a stored row: bad ledger → 7 zeros, bad window → empty,
  /// unknown level → easiest tier.
  pub fn normalize(stored: StoredSubject) -> Self {
    let recent = stored
      .recent
      .as_deref()
      .and_then(|raw| serde_json::from_str::<Vec<bool>>(raw).ok())
      .map(RecentWindow::from_outcomes)
      .unwrap_or_default();

    Self {
      ledger: Ledger::from_json(stored.ledger.as_deref()),
      recent,
      level: stored.level.and_then(Tier::from_factor).unwrap_or_default(),
    }
  }

  pub fn recent_json(&self) -> String {
    serde_json::to_string(&self.recent).unwrap_or_else(|_| "[]".to_string())
  }

  /// Apply one graded answer: push into the window, move the level if the
  /// window says so (clearing the window on any move), and count it for
  /// today when correct.
  pub fn record_outcome(&mut self, correct: bool, day: DayIndex) -> Transition {
    self.recent.push(correct);

    let transition = level::evaluate(self.level, &self.recent);
    if transition.is_change() {
      self.level = transition.resulting_tier(self.level);
      self.recent.clear();
    }

    if correct {
      self.ledger.increment_today(day);
    }

    transition
  }
}

/// Full per-user document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
  pub username: String,
  pub credential: String,
  pub age: u8,
  pub subjects: BTreeMap<Subject, SubjectProgress>,
}

impl UserProgress {
  /// Fresh learner: zero ledgers, empty windows, easiest tier everywhere
  pub fn new(username: &str, credential: &str, age: u8) -> Self {
    Self {
      username: username.to_string(),
      credential: credential.to_string(),
      age,
      subjects: Subject::ALL
        .iter()
        .map(|&s| (s, SubjectProgress::default()))
        .collect(),
    }
  }

  pub fn subject(&self, subject: Subject) -> &SubjectProgress {
    // normalize() guarantees every subject is present
    &self.subjects[&subject]
  }

  pub fn subject_mut(&mut self, subject: Subject) -> &mut SubjectProgress {
    self.subjects.entry(subject).or_default()
  }
}

/// Build a complete `UserProgress` from stored rows. Unknown subject keys are
/// dropped and missing subjects are filled with defaults, so business logic
/// never sees a partial record.
pub fn normalize(
  username: &str,
  credential: &str,
  age: i64,
  rows: impl IntoIterator<Item = (String, StoredSubject)>,
) -> UserProgress {
  let mut progress = UserProgress::new(username, credential, age.clamp(0, u8::MAX as i64) as u8);
  for (key, stored) in rows {
    match Subject::from_str(&key) {
      Some(subject) => {
        progress.subjects.insert(subject, SubjectProgress::normalize(stored));
      }
      None => tracing::warn!("Ignoring unknown subject '{}' for user {}", key, username),
    }
  }
  progress
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::WINDOW_CAPACITY;

  fn day(i: u8) -> DayIndex {
    DayIndex::new(i).unwrap()
  }

  #[test]
  fn test_new_user_defaults() {
    let p = UserProgress::new("mia", "hash", 8);
    assert_eq!(p.subjects.len(), 5);
    for subject in Subject::ALL {
      let s = p.subject(subject);
      assert!(s.ledger.is_zero());
      assert!(s.recent.is_empty());
      assert_eq!(s.level, Tier::Easy);
    }
  }

  #[test]
  fn test_normalize_repairs_malformed_row() {
    let stored = StoredSubject {
      ledger: None,
      recent: Some("{\"nope\":1}".to_string()),
      level: Some(42),
    };
    let s = SubjectProgress::normalize(stored);
    assert!(s.ledger.is_zero());
    assert!(s.recent.is_empty());
    assert_eq!(s.level, Tier::Easy);
  }

  #[test]
  fn test_normalize_keeps_valid_row() {
    let stored = StoredSubject {
      ledger: Some("[0,1,0,0,0,0,2]".to_string()),
      recent: Some("[true,false,true]".to_string()),
      level: Some(3),
    };
    let s = SubjectProgress::normalize(stored);
    assert_eq!(s.ledger.days(), &[0, 1, 0, 0, 0, 0, 2]);
    assert_eq!(s.recent.len(), 3);
    assert_eq!(s.level, Tier::Hard);
  }

  #[test]
  fn test_normalize_truncates_oversized_window() {
    let stored = StoredSubject {
      recent: Some(serde_json::to_string(&vec![true; 14]).unwrap()),
      ..Default::default()
    };
    assert_eq!(SubjectProgress::normalize(stored).recent.len(), WINDOW_CAPACITY);
  }

  #[test]
  fn test_normalize_fills_missing_subjects() {
    let rows = vec![
      (
        "division".to_string(),
        StoredSubject { level: Some(2), ..Default::default() },
      ),
      ("geometry".to_string(), StoredSubject::default()),
    ];
    let p = normalize("mia", "hash", 9, rows);
    assert_eq!(p.subjects.len(), 5);
    assert_eq!(p.subject(Subject::Division).level, Tier::Medium);
    assert_eq!(p.subject(Subject::Addition).level, Tier::Easy);
  }

  #[test]
  fn test_record_outcome_scores_every_correct_answer() {
    let mut s = SubjectProgress::default();
    s.record_outcome(true, day(2));
    s.record_outcome(false, day(2));
    s.record_outcome(true, day(2));
    assert_eq!(s.ledger.read_today(day(2)), 2);
    assert_eq!(s.recent.len(), 3);
  }

  #[test]
  fn test_record_outcome_promotes_and_clears_window() {
    let mut s = SubjectProgress::default();
    let outcomes = [true, true, false, true, true, true, true, true, true, true];
    let mut last = Transition::Unchanged;
    for correct in outcomes {
      last = s.record_outcome(correct, day(1));
    }
    assert_eq!(last, Transition::Promoted { from: Tier::Easy, to: Tier::Medium });
    assert_eq!(s.level, Tier::Medium);
    assert!(s.recent.is_empty());
    assert_eq!(s.ledger.read_today(day(1)), 9);
  }

  #[test]
  fn test_record_outcome_demotes_and_clears_window() {
    let mut s = SubjectProgress { level: Tier::Hard, ..Default::default() };
    for i in 0..10 {
      s.record_outcome(i < 4, day(0));
    }
    assert_eq!(s.level, Tier::Medium);
    assert!(s.recent.is_empty());
  }

  #[test]
  fn test_record_outcome_middle_band_keeps_window() {
    let mut s = SubjectProgress::default();
    for i in 0..10 {
      s.record_outcome(i >= 2, day(0)); // 8 correct, 2 wrong
    }
    assert_eq!(s.level, Tier::Easy);
    assert_eq!(s.recent.len(), WINDOW_CAPACITY);

    // Next push evicts the oldest wrong answer; still 8/2, so nothing moves
    s.record_outcome(false, day(0));
    assert_eq!(s.level, Tier::Easy);
    let mut expected = vec![false];
    expected.extend(vec![true; 8]);
    expected.push(false);
    assert_eq!(s.recent.iter().collect::<Vec<_>>(), expected);
  }

  #[test]
  fn test_snapshot_document_shape() {
    let p = UserProgress::new("mia", "hash", 7);
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["username"], "mia");
    assert_eq!(json["subjects"]["percent"]["ledger"], serde_json::json!([0, 0, 0, 0, 0, 0, 0]));
    assert_eq!(json["subjects"]["percent"]["level"], "easy");
  }
}
