//! Application services.
//!
//! Operations that span the domain model and the database: scoring an
//! answer and the periodic archive & reset job.

pub mod archive;
pub mod scoring;
