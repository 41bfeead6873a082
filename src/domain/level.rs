//! Level transitions driven by the recent-answer window.
//!
//! Rules, evaluated only once the window is full:
//! - at least `PROMOTE_CORRECT` correct → one tier up (if not already hardest)
//! - otherwise at least `DEMOTE_WRONG` wrong → one tier down (if not already easiest)
//!
//! Promotion needs 9/10 while demotion needs only 6/10 wrong. The asymmetry is
//! a business rule and must stay as is.

use super::tier::Tier;
use super::window::RecentWindow;
use crate::config::{DEMOTE_WRONG, PROMOTE_CORRECT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Promoted { from: Tier, to: Tier },
  Demoted { from: Tier, to: Tier },
  Unchanged,
}

impl Transition {
  /// The tier after applying this transition to `current`
  pub fn resulting_tier(&self, current: Tier) -> Tier {
    match self {
      Self::Promoted { to, .. } | Self::Demoted { to, .. } => *to,
      Self::Unchanged => current,
    }
  }

  pub fn is_change(&self) -> bool {
    !matches!(self, Self::Unchanged)
  }
}

/// Decide whether `current` should move given the window contents.
pub fn evaluate(current: Tier, window: &RecentWindow) -> Transition {
  if !window.is_full() {
    return Transition::Unchanged;
  }

  if window.correct_count() >= PROMOTE_CORRECT {
    if let Some(to) = current.promoted() {
      return Transition::Promoted { from: current, to };
    }
  } else if window.wrong_count() >= DEMOTE_WRONG {
    if let Some(to) = current.demoted() {
      return Transition::Demoted { from: current, to };
    }
  }

  Transition::Unchanged
}
