use serde::{Deserialize, Serialize};

/// Arithmetic practice domain. Each subject keeps its own ledger, window and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
  Addition,
  Subtraction,
  Multiplication,
  Division,
  Percent,
}

impl Subject {
  pub const ALL: [Subject; 5] = [
    Self::Addition,
    Self::Subtraction,
    Self::Multiplication,
    Self::Division,
    Self::Percent,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Addition => "addition",
      Self::Subtraction => "subtraction",
      Self::Multiplication => "multiplication",
      Self::Division => "division",
      Self::Percent => "percent",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "addition" => Some(Self::Addition),
      "subtraction" => Some(Self::Subtraction),
      "multiplication" => Some(Self::Multiplication),
      "division" => Some(Self::Division),
      "percent" => Some(Self::Percent),
      _ => None,
    }
  }

  /// JSON field carrying the level factor for this subject (e.g. `addition_f`)
  pub fn factor_field(&self) -> &'static str {
    match self {
      Self::Addition => "addition_f",
      Self::Subtraction => "subtraction_f",
      Self::Multiplication => "multiplication_f",
      Self::Division => "division_f",
      Self::Percent => "percent_f",
    }
  }
}
