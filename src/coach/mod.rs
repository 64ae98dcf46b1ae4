//! Coaching core - triage, red flags, calibration ranking and session control
//!
//! Every operation here is a plain function over explicit values.
//! Persistence and rendering live outside this module.

pub mod calibration;
pub mod red_flags;
pub mod session;
pub mod triage;

pub use calibration::{rank, rank_all, CalibrationProfile, ProblemZone, ProblemZoneSummary};
pub use red_flags::{screen, SafetyFlag, Sensation};
pub use session::{advance, next_position, DrillFeedback, SessionProgress, SessionThresholds};
pub use triage::{assign_mode, start_session, CheckIn, ModeThresholds, SessionStart, Triage};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::drills::{BodyPart, DrillId};

/// Session intensity tier.
///
/// Variants are declared from least to most conservative, so `Ord`
/// compares conservativeness: `max` of two modes is the safer one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Full plan
    Normal,
    /// Reduced-intensity plan
    Regressed,
    /// Minimal safety plan
    Reset,
    /// Red flag detected, escalate instead of training
    Blocked,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Regressed => "REGRESSED",
            Mode::Reset => "RESET",
            Mode::Blocked => "BLOCKED",
        }
    }

    /// Pick the more conservative of two modes
    pub fn most_conservative(self, other: Mode) -> Mode {
        self.max(other)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable core of one session: current mode and the ordered drill plan.
///
/// The position inside `plan` is kept by the caller (see [`SessionProgress`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachState {
    pub body_part: BodyPart,
    pub mode: Mode,
    pub plan: Vec<DrillId>,
}

impl CoachState {
    pub fn new(body_part: BodyPart, mode: Mode, plan: Vec<DrillId>) -> Self {
        Self { body_part, mode, plan }
    }

    pub fn is_blocked(&self) -> bool {
        self.mode == Mode::Blocked
    }
}
