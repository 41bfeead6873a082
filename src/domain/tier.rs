use serde::{Deserialize, Serialize};

/// Difficulty tier for a subject, ordered easiest to hardest.
///
/// The numeric factor (1/2/3) only exists at the storage and HTTP boundaries;
/// everything else compares tiers directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  #[default]
  Easy,
  Medium,
  Hard,
}

impl Tier {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Easy => "easy",
      Self::Medium => "medium",
      Self::Hard => "hard",
    }
  }

  pub fn factor(&self) -> u8 {
    match self {
      Self::Easy => 1,
      Self::Medium => 2,
      Self::Hard => 3,
    }
  }

  pub fn from_factor(factor: i64) -> Option<Self> {
    match factor {
      1 => Some(Self::Easy),
      2 => Some(Self::Medium),
      3 => Some(Self::Hard),
      _ => None,
    }
  }

  /// Next tier up, or None when already hardest
  pub fn promoted(&self) -> Option<Self> {
    match self {
      Self::Easy => Some(Self::Medium),
      Self::Medium => Some(Self::Hard),
      Self::Hard => None,
    }
  }

  /// Next tier down, or None when already easiest
  pub fn demoted(&self) -> Option<Self> {
    match self {
      Self::Easy => None,
      Self::Medium => Some(Self::Easy),
      Self::Hard => Some(Self::Medium),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tier_order() {
    assert!(Tier::Easy < Tier::Medium);
    assert!(Tier::Medium < Tier::Hard);
    assert_eq!(Tier::default(), Tier::Easy);
  }

  #[test]
  fn test_factor_roundtrip() {
    for tier in [Tier::Easy, Tier::Medium, Tier::Hard] {
      assert_eq!(Tier::from_factor(tier.factor() as i64), Some(tier));
    }
    assert_eq!(Tier::from_factor(0), None);
    assert_eq!(Tier::from_factor(4), None);
    assert_eq!(Tier::from_factor(-1), None);
  }

  #[test]
  fn test_adjacent_moves_only() {
    assert_eq!(Tier::Easy.promoted(), Some(Tier::Medium));
    assert_eq!(Tier::Medium.promoted(), Some(Tier::Hard));
    assert_eq!(Tier::Hard.promoted(), None);

    assert_eq!(Tier::Hard.demoted(), Some(Tier::Medium));
    assert_eq!(Tier::Medium.demoted(), Some(Tier::Easy));
    assert_eq!(Tier::Easy.demoted(), None);
  }
}
