//! Practice content served to learners.

pub mod exercises;

pub use exercises::{generate, Exercise};
