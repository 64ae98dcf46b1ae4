//! Error types for the coaching core

use thiserror::Error;

use crate::drills::BodyPart;

/// Result alias for coaching operations
pub type CoachResult<T> = Result<T, CoachError>;

/// Typed failures of the coaching core.
///
/// Every variant means "must not proceed" for the input that caused it.
/// Nothing here is recoverable by substituting a default value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoachError {
    /// Calibration data points at a ROM zone that does not exist
    #[error("zone index {zone_index} is out of range for {body_part} ({zone_count} zones); recalibrate")]
    InvalidZoneIndex {
        body_part: BodyPart,
        zone_index: usize,
        zone_count: usize,
    },

    /// Severity is negative or not a finite number
    #[error("severity {severity} for zone {zone_index} must be a finite number >= 0")]
    InvalidSeverity { zone_index: usize, severity: f64 },

    #[error("invalid check-in: {0}")]
    InvalidCheckIn(String),

    #[error("invalid drill feedback: {0}")]
    InvalidFeedback(String),

    #[error("unknown drill id: {0}")]
    UnknownDrillId(String),

    #[error("unknown body part: {0}")]
    UnknownBodyPart(String),

    /// The session was blocked by a red flag and cannot be driven
    #[error("session is blocked by a red flag; escalate instead of training")]
    SessionBlocked,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoachError {
    pub fn invalid_check_in(details: impl Into<String>) -> Self {
        Self::InvalidCheckIn(details.into())
    }

    pub fn invalid_feedback(details: impl Into<String>) -> Self {
        Self::InvalidFeedback(details.into())
    }

    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig(details.into())
    }

    /// True when the error means the stored calibration profile is unusable
    /// and the user should run calibration again.
    pub fn requires_recalibration(&self) -> bool {
        matches!(
            self,
            CoachError::InvalidZoneIndex { .. } | CoachError::InvalidSeverity { .. }
        )
    }
}
