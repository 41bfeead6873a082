//! Accounts: registration and credential checks.

pub mod handlers;
pub mod password;

pub use handlers::*;
