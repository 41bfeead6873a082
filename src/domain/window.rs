//! Bounded queue of the most recent answer outcomes for one subject.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::WINDOW_CAPACITY;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentWindow {
  outcomes: VecDeque<bool>,
}

impl RecentWindow {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build from stored outcomes, keeping only the most recent `WINDOW_CAPACITY`
  pub fn from_outcomes(outcomes: impl IntoIterator<Item = bool>) -> Self {
    let mut window = Self::new();
    for outcome in outcomes {
      window.push(outcome);
    }
    window
  }

  /// Append an outcome, evicting the oldest one once capacity is exceeded
  pub fn push(&mut self, outcome: bool) -> &VecDeque<bool> {
    self.outcomes.push_back(outcome);
    if self.outcomes.len() > WINDOW_CAPACITY {
      self.outcomes.pop_front();
    }
    &self.outcomes
  }

  pub fn clear(&mut self) {
    self.outcomes.clear();
  }

  pub fn len(&self) -> usize {
    self.outcomes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outcomes.is_empty()
  }

  pub fn is_full(&self) -> bool {
    self.outcomes.len() >= WINDOW_CAPACITY
  }

  pub fn correct_count(&self) -> usize {
    self.outcomes.iter().filter(|&&o| o).count()
  }

  pub fn wrong_count(&self) -> usize {
    self.outcomes.len() - self.correct_count()
  }

  pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
    self.outcomes.iter().copied()
  }
}
