//! Mode assignment from check-in data

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::calibration::{rank, CalibrationProfile, ProblemZoneSummary};
use super::red_flags::{screen, SafetyFlag, Sensation};
use super::{CoachState, Mode};
use crate::drills::{BodyPart, Catalog};
use crate::error::{CoachError, CoachResult};

/// Upper bound of the pain and confidence scales
pub const SCALE_MAX: u8 = 10;

/// Session-start input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub body_part: BodyPart,
    /// 0-10
    pub pain_level: u8,
    /// 0-10
    pub confidence_level: u8,
    #[serde(default)]
    pub sensations: BTreeSet<Sensation>,
    #[serde(default)]
    pub free_text: Option<String>,
}

impl CheckIn {
    pub fn new(body_part: BodyPart, pain_level: u8, confidence_level: u8) -> Self {
        Self {
            body_part,
            pain_level,
            confidence_level,
            sensations: BTreeSet::new(),
            free_text: None,
        }
    }

    pub fn with_sensations(mut self, sensations: impl IntoIterator<Item = Sensation>) -> Self {
        self.sensations.extend(sensations);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.free_text = Some(note.into());
        self
    }

    /// Out-of-range values are rejected, never clamped
    pub fn validate(&self) -> CoachResult<()> {
        if self.pain_level > SCALE_MAX {
            return Err(CoachError::invalid_check_in(format!(
                "pain level {} is outside 0-{}",
                self.pain_level, SCALE_MAX
            )));
        }
        if self.confidence_level > SCALE_MAX {
            return Err(CoachError::invalid_check_in(format!(
                "confidence level {} is outside 0-{}",
                self.confidence_level, SCALE_MAX
            )));
        }
        Ok(())
    }
}

/// Named cut points for mode selection.
///
/// Pain rules fire at or above their cut; confidence rules fire at or
/// below theirs. Each field can be overridden on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeThresholds {
    pub pain_regressed_at: u8,
    pub pain_reset_at: u8,
    pub confidence_regressed_at: u8,
    /// Disabled when `None`
    pub confidence_reset_at: Option<u8>,
}

impl Default for ModeThresholds {
    fn default() -> Self {
        Self {
            pain_regressed_at: 7,
            pain_reset_at: 9,
            confidence_regressed_at: 2,
            confidence_reset_at: None,
        }
    }
}

impl ModeThresholds {
    pub fn validate(&self) -> CoachResult<()> {
        let cuts = [
            ("pain_regressed_at", Some(self.pain_regressed_at)),
            ("pain_reset_at", Some(self.pain_reset_at)),
            ("confidence_regressed_at", Some(self.confidence_regressed_at)),
            ("confidence_reset_at", self.confidence_reset_at),
        ];
        for (name, cut) in cuts {
            if let Some(value) = cut
                && value > SCALE_MAX
            {
                return Err(CoachError::invalid_config(format!(
                    "{} = {} is outside 0-{}",
                    name, value, SCALE_MAX
                )));
            }
        }
        if self.pain_reset_at < self.pain_regressed_at {
            return Err(CoachError::invalid_config(
                "pain_reset_at must be >= pain_regressed_at",
            ));
        }
        if let Some(reset) = self.confidence_reset_at
            && reset > self.confidence_regressed_at
        {
            return Err(CoachError::invalid_config(
                "confidence_reset_at must be <= confidence_regressed_at",
            ));
        }
        Ok(())
    }

    /// Pain rules, evaluated top-down
    fn pain_rules(&self) -> [(u8, Mode); 2] {
        [(self.pain_reset_at, Mode::Reset), (self.pain_regressed_at, Mode::Regressed)]
    }

    /// Confidence rules, evaluated top-down
    fn confidence_rules(&self) -> Vec<(u8, Mode)> {
        let mut rules = Vec::with_capacity(2);
        if let Some(cut) = self.confidence_reset_at {
            rules.push((cut, Mode::Reset));
        }
        rules.push((self.confidence_regressed_at, Mode::Regressed));
        rules
    }

    pub fn mode_for_pain(&self, pain: u8) -> Mode {
        self.pain_rules()
            .into_iter()
            .find(|(cut, _)| pain >= *cut)
            .map_or(Mode::Normal, |(_, mode)| mode)
    }

    pub fn mode_for_confidence(&self, confidence: u8) -> Mode {
        self.confidence_rules()
            .into_iter()
            .find(|(cut, _)| confidence <= *cut)
            .map_or(Mode::Normal, |(_, mode)| mode)
    }
}

/// Outcome of mode assignment.
///
/// `mode` is always computed, but whenever `flag` is set the caller must
/// escalate instead of training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triage {
    pub mode: Mode,
    pub flag: Option<SafetyFlag>,
}

impl Triage {
    pub fn requires_escalation(&self) -> bool {
        self.flag.is_some()
    }

    /// Mode the session actually runs in
    pub fn session_mode(&self) -> Mode {
        if self.requires_escalation() { Mode::Blocked } else { self.mode }
    }
}

/// Screen for red flags, then pick the more conservative of the pain and
/// confidence suggestions.
pub fn assign_mode(check_in: &CheckIn, thresholds: &ModeThresholds) -> CoachResult<Triage> {
    check_in.validate()?;

    let flag = screen(&check_in.sensations, check_in.free_text.as_deref());
    if let Some(flag) = &flag {
        warn!(
            body_part = %check_in.body_part,
            rule = %flag.rule_id,
            "Red flag detected at check-in"
        );
    }

    let by_pain = thresholds.mode_for_pain(check_in.pain_level);
    let by_confidence = thresholds.mode_for_confidence(check_in.confidence_level);
    let mode = by_pain.most_conservative(by_confidence);

    debug!(
        pain = check_in.pain_level,
        confidence = check_in.confidence_level,
        %by_pain,
        %by_confidence,
        %mode,
        "Assigned mode"
    );

    Ok(Triage { mode, flag })
}

/// Everything the caller needs to begin a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStart {
    pub triage: Triage,
    pub state: CoachState,
    /// Calibrated zone to emphasize, if any
    pub focus: Option<ProblemZoneSummary>,
    /// Set when the stored profile is corrupt and should be recalibrated
    pub calibration_issue: Option<CoachError>,
}

/// Seed a session from a check-in.
///
/// A flagged check-in yields a BLOCKED state with an empty plan. A corrupt
/// calibration profile does not stop the session; it is reported in
/// `calibration_issue` and the session starts without a focus zone.
pub fn start_session(
    check_in: &CheckIn,
    profile: Option<&CalibrationProfile>,
    catalog: &Catalog,
    thresholds: &ModeThresholds,
) -> CoachResult<SessionStart> {
    let triage = assign_mode(check_in, thresholds)?;

    let (focus, calibration_issue) = match profile {
        Some(profile) if profile.body_part != check_in.body_part => {
            return Err(CoachError::invalid_check_in(format!(
                "calibration profile is for {}, check-in is for {}",
                profile.body_part, check_in.body_part
            )));
        }
        Some(profile) => match rank(profile, catalog) {
            Ok(focus) => (focus, None),
            Err(e) => {
                warn!(body_part = %profile.body_part, error = %e, "Ignoring unusable calibration profile");
                (None, Some(e))
            }
        },
        None => (None, None),
    };

    let mode = triage.session_mode();
    let plan = catalog.plan_for(check_in.body_part, mode)?;
    let state = CoachState::new(check_in.body_part, mode, plan);

    Ok(SessionStart { triage, state, focus, calibration_issue })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::calibration::ProblemZone;

    fn assign(pain: u8, confidence: u8) -> Triage {
        assign_mode(&CheckIn::new(BodyPart::Knee, pain, confidence), &ModeThresholds::default()).unwrap()
    }

    #[test]
    fn test_low_pain_high_confidence_is_normal() {
        let triage = assign(2, 8);
        assert_eq!(triage.mode, Mode::Normal);
        assert!(triage.flag.is_none());
    }

    #[test]
    fn test_pain_cutoffs() {
        assert_eq!(assign(6, 10).mode, Mode::Normal);
        assert_eq!(assign(7, 10).mode, Mode::Regressed);
        assert_eq!(assign(8, 10).mode, Mode::Regressed);
        assert_eq!(assign(9, 10).mode, Mode::Reset);
        assert_eq!(assign(10, 10).mode, Mode::Reset);
    }

    #[test]
    fn test_high_pain_dominates_confidence() {
        let triage = assign(9, 5);
        assert_eq!(triage.mode, Mode::Reset);
        assert!(triage.flag.is_none());
    }

    #[test]
    fn test_low_confidence_regresses() {
        assert_eq!(assign(0, 2).mode, Mode::Regressed);
        assert_eq!(assign(0, 3).mode, Mode::Normal);
        // confidence never makes pain-driven RESET milder
        assert_eq!(assign(9, 0).mode, Mode::Reset);
    }

    #[test]
    fn test_monotone_in_pain() {
        let thresholds = ModeThresholds {
            confidence_reset_at: Some(1),
            ..ModeThresholds::default()
        };
        for confidence in 0..=SCALE_MAX {
            let mut previous = Mode::Normal;
            for pain in 0..=SCALE_MAX {
                let check_in = CheckIn::new(BodyPart::Achilles, pain, confidence);
                let mode = assign_mode(&check_in, &thresholds).unwrap().mode;
                assert!(mode >= previous, "pain {} conf {}: {} < {}", pain, confidence, mode, previous);
                previous = mode;
            }
        }
    }

    #[test]
    fn test_monotone_in_confidence() {
        let thresholds = ModeThresholds::default();
        for pain in 0..=SCALE_MAX {
            let mut previous = Mode::Blocked;
            for confidence in 0..=SCALE_MAX {
                let check_in = CheckIn::new(BodyPart::Shoulder, pain, confidence);
                let mode = assign_mode(&check_in, &thresholds).unwrap().mode;
                assert!(mode <= previous);
                previous = mode;
            }
        }
    }

    #[test]
    fn test_flag_independent_of_mild_mode() {
        let check_in = CheckIn::new(BodyPart::Knee, 0, 10).with_sensations([Sensation::Trauma]);
        let triage = assign_mode(&check_in, &ModeThresholds::default()).unwrap();
        assert_eq!(triage.mode, Mode::Normal);
        assert!(triage.requires_escalation());
        assert_eq!(triage.session_mode(), Mode::Blocked);
        assert_eq!(triage.flag.unwrap().rule_id, "acute_trauma");
    }

    #[test]
    fn test_flag_from_free_text() {
        let check_in = CheckIn::new(BodyPart::Knee, 3, 6).with_note("it gives way on stairs");
        let triage = assign_mode(&check_in, &ModeThresholds::default()).unwrap();
        assert_eq!(triage.flag.unwrap().rule_id, "mechanical_locking");
        assert_eq!(triage.mode, Mode::Normal);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = assign_mode(&CheckIn::new(BodyPart::Foot, 11, 5), &ModeThresholds::default()).unwrap_err();
        assert!(matches!(err, CoachError::InvalidCheckIn(_)));
        let err = assign_mode(&CheckIn::new(BodyPart::Foot, 5, 12), &ModeThresholds::default()).unwrap_err();
        assert!(matches!(err, CoachError::InvalidCheckIn(_)));
    }

    #[test]
    fn test_deterministic() {
        let check_in = CheckIn::new(BodyPart::Knee, 7, 1)
            .with_sensations([Sensation::Ache, Sensation::Stiffness])
            .with_note("sore");
        let first = assign_mode(&check_in, &ModeThresholds::default()).unwrap();
        for _ in 0..5 {
            assert_eq!(assign_mode(&check_in, &ModeThresholds::default()).unwrap(), first);
        }
    }

    #[test]
    fn test_overridden_thresholds() {
        let strict = ModeThresholds {
            pain_regressed_at: 4,
            pain_reset_at: 6,
            ..ModeThresholds::default()
        };
        let check_in = CheckIn::new(BodyPart::Knee, 6, 9);
        assert_eq!(assign_mode(&check_in, &strict).unwrap().mode, Mode::Reset);
        assert_eq!(assign_mode(&check_in, &ModeThresholds::default()).unwrap().mode, Mode::Normal);
    }

    #[test]
    fn test_thresholds_validate() {
        assert!(ModeThresholds::default().validate().is_ok());
        let bad = ModeThresholds { pain_reset_at: 5, pain_regressed_at: 7, ..ModeThresholds::default() };
        assert!(bad.validate().is_err());
        let bad = ModeThresholds { pain_reset_at: 11, ..ModeThresholds::default() };
        assert!(bad.validate().is_err());
        let bad = ModeThresholds { confidence_reset_at: Some(4), ..ModeThresholds::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_start_session_normal_plan() {
        let catalog = Catalog::builtin();
        let start = start_session(
            &CheckIn::new(BodyPart::Knee, 1, 9),
            None,
            &catalog,
            &ModeThresholds::default(),
        )
        .unwrap();
        assert_eq!(start.state.mode, Mode::Normal);
        assert_eq!(start.state.plan, catalog.plan_for(BodyPart::Knee, Mode::Normal).unwrap());
        assert!(start.focus.is_none());
    }

    #[test]
    fn test_start_session_blocked_on_flag() {
        let check_in = CheckIn::new(BodyPart::Knee, 1, 9)
            .with_sensations([Sensation::NightPain, Sensation::Swelling]);
        let start = start_session(&check_in, None, &Catalog::builtin(), &ModeThresholds::default()).unwrap();
        assert!(start.state.is_blocked());
        assert!(start.state.plan.is_empty());
        assert_eq!(start.triage.mode, Mode::Normal);
    }

    #[test]
    fn test_start_session_with_focus() {
        let profile = CalibrationProfile::new(
            BodyPart::Knee,
            vec![ProblemZone { zone_index: 2, severity: 5.0 }, ProblemZone { zone_index: 0, severity: 5.0 }],
        );
        let start = start_session(
            &CheckIn::new(BodyPart::Knee, 8, 5),
            Some(&profile),
            &Catalog::builtin(),
            &ModeThresholds::default(),
        )
        .unwrap();
        assert_eq!(start.state.mode, Mode::Regressed);
        assert_eq!(start.focus.unwrap().zone_index, 0);
        assert!(start.calibration_issue.is_none());
    }

    #[test]
    fn test_start_session_corrupt_profile() {
        let profile = CalibrationProfile::new(
            BodyPart::Foot,
            vec![ProblemZone { zone_index: 17, severity: 5.0 }],
        );
        let start = start_session(
            &CheckIn::new(BodyPart::Foot, 2, 8),
            Some(&profile),
            &Catalog::builtin(),
            &ModeThresholds::default(),
        )
        .unwrap();
        assert!(start.focus.is_none());
        assert!(start.calibration_issue.unwrap().requires_recalibration());
        assert_eq!(start.state.mode, Mode::Normal);
    }

    #[test]
    fn test_start_session_profile_mismatch() {
        let profile = CalibrationProfile::empty(BodyPart::Shoulder);
        let result = start_session(
            &CheckIn::new(BodyPart::Knee, 2, 8),
            Some(&profile),
            &Catalog::builtin(),
            &ModeThresholds::default(),
        );
        assert!(matches!(result, Err(CoachError::InvalidCheckIn(_))));
    }

    #[test]
    fn test_check_in_deserialize_defaults() {
        let check_in: CheckIn =
            serde_json::from_str(r#"{"body_part":"knee","pain_level":9,"confidence_level":5}"#).unwrap();
        assert!(check_in.sensations.is_empty());
        assert!(check_in.free_text.is_none());
        let triage = assign_mode(&check_in, &ModeThresholds::default()).unwrap();
        assert_eq!(triage.mode, Mode::Reset);
        assert!(triage.flag.is_none());
    }
}
