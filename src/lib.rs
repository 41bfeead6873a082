pub mod auth;
pub mod clock;
pub mod config;
pub mod content;
pub mod db;
pub mod domain;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod paths;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;
