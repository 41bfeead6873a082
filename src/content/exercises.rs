//! Arithmetic exercise generation.
//!
//! Operand ranges grow with the learner's tier. Every generated exercise
//! has a whole, non-negative answer: subtraction never goes below zero,
//! division is always exact, and percent bases are picked so the result is
//! an integer.

use rand::Rng;
use serde::Serialize;

use crate::domain::{Subject, Tier};

/// Percentages offered per tier
const EASY_PERCENTS: &[u32] = &[10, 25, 50];
const MEDIUM_PERCENTS: &[u32] = &[5, 10, 15, 20, 25, 50];
const HARD_PERCENTS: &[u32] = &[1, 2, 4, 5, 10, 15, 20, 25, 50];

/// Smallest base a percent question is asked about
const PERCENT_MIN_BASE: u32 = 10;

/// One generated question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exercise {
    pub subject: Subject,
    pub level: Tier,
    /// Left operand (the percentage for percent questions)
    pub left: u32,
    /// Right operand (the base for percent questions)
    pub right: u32,
    pub answer: u32,
    /// Human-readable question, e.g. "7 × 8"
    pub prompt: String,
}

/// Largest addition/subtraction operand
fn sum_max(tier: Tier) -> u32 {
    match tier {
        Tier::Easy => 10,
        Tier::Medium => 50,
        Tier::Hard => 200,
    }
}

fn factor_max(tier: Tier) -> u32 {
    match tier {
        Tier::Easy => 5,
        Tier::Medium => 10,
        Tier::Hard => 12,
    }
}

fn divisor_max(tier: Tier) -> u32 {
    match tier {
        Tier::Easy => 5,
        Tier::Medium => 10,
        Tier::Hard => 12,
    }
}

fn quotient_max(tier: Tier) -> u32 {
    match tier {
        Tier::Easy => 10,
        Tier::Medium => 12,
        Tier::Hard => 15,
    }
}

fn percent_options(tier: Tier) -> (&'static [u32], u32) {
    match tier {
        Tier::Easy => (EASY_PERCENTS, 200),
        Tier::Medium => (MEDIUM_PERCENTS, 400),
        Tier::Hard => (HARD_PERCENTS, 600),
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Generate an exercise for `subject` at `tier`. Pure apart from the RNG.
pub fn generate<R: Rng + ?Sized>(subject: Subject, tier: Tier, rng: &mut R) -> Exercise {
    let (left, right, answer, prompt) = match subject {
        Subject::Addition => {
            let max = sum_max(tier);
            let (a, b) = (rng.random_range(0..=max), rng.random_range(0..=max));
            (a, b, a + b, format!("{} + {}", a, b))
        }
        Subject::Subtraction => {
            let max = sum_max(tier);
            let (x, y) = (rng.random_range(0..=max), rng.random_range(0..=max));
            let (a, b) = (x.max(y), x.min(y));
            (a, b, a - b, format!("{} − {}", a, b))
        }
        Subject::Multiplication => {
            let max = factor_max(tier);
            let (a, b) = (rng.random_range(0..=max), rng.random_range(0..=max));
            (a, b, a * b, format!("{} × {}", a, b))
        }
        Subject::Division => {
            let divisor = rng.random_range(2..=divisor_max(tier));
            let quotient = rng.random_range(1..=quotient_max(tier));
            let dividend = divisor * quotient;
            (dividend, divisor, quotient, format!("{} ÷ {}", dividend, divisor))
        }
        Subject::Percent => {
            let (percents, max_base) = percent_options(tier);
            let percent = percents[rng.random_range(0..percents.len())];
            // Smallest base for which percent * base / 100 is whole
            let step = 100 / gcd(percent, 100);
            let lowest = PERCENT_MIN_BASE.div_ceil(step).max(1);
            let highest = (max_base / step).max(lowest);
            let base = step * rng.random_range(lowest..=highest);
            (percent, base, percent * base / 100, format!("{}% of {}", percent, base))
        }
    };

    Exercise {
        subject,
        level: tier,
        left,
        right,
        answer,
        prompt,
    }
}
