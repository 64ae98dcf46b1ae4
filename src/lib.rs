//! rehab-coach - self-guided musculoskeletal rehab coach
//!
//! Check-in triage, red-flag screening, calibration ranking and an
//! adaptive drill session that backs off on bad feedback.

pub mod coach;
pub mod config;
pub mod db;
pub mod drills;
pub mod error;
pub mod tui;

pub use coach::{CoachState, Mode};
pub use db::Database;
pub use error::{CoachError, CoachResult};
