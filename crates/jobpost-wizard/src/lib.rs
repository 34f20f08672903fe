//! Job posting creation wizard: step validation, visa eligibility matching, draft autosave
//! and two-phase submission.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
