//! Session plan control - adjusts the plan from per-drill feedback

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::triage::SCALE_MAX;
use super::{CoachState, Mode};
use crate::drills::{Catalog, DrillId};
use crate::error::{CoachError, CoachResult};

/// Feedback collected after one drill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillFeedback {
    pub drill_id: DrillId,
    /// 0-10
    pub pain: u8,
    pub felt_stable: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DrillFeedback {
    pub fn new(drill_id: impl Into<DrillId>, pain: u8, felt_stable: bool) -> Self {
        Self { drill_id: drill_id.into(), pain, felt_stable, notes: None }
    }

    pub fn validate(&self) -> CoachResult<()> {
        if self.pain > SCALE_MAX {
            return Err(CoachError::invalid_feedback(format!(
                "pain {} is outside 0-{}",
                self.pain, SCALE_MAX
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionThresholds {
    /// Drill pain at or above this regresses the session to RESET
    pub feedback_pain_cutoff: u8,
}

impl Default for SessionThresholds {
    fn default() -> Self {
        Self { feedback_pain_cutoff: 7 }
    }
}

impl SessionThresholds {
    pub fn validate(&self) -> CoachResult<()> {
        if self.feedback_pain_cutoff > SCALE_MAX {
            return Err(CoachError::invalid_config(format!(
                "feedback_pain_cutoff = {} is outside 0-{}",
                self.feedback_pain_cutoff, SCALE_MAX
            )));
        }
        Ok(())
    }

    pub fn is_regression_trigger(&self, feedback: &DrillFeedback) -> bool {
        feedback.pain >= self.feedback_pain_cutoff || !feedback.felt_stable
    }
}

/// Next session state after one piece of feedback.
///
/// A regression trigger (pain at or above the cutoff, or an unstable drill)
/// moves the session to RESET and replaces the plan with the body part's
/// RESET plan, also when the session is already in RESET. Otherwise the
/// state comes back unchanged.
///
/// Post-condition for callers: rewind the drill position to 0 only when
/// `next.mode == RESET` and `state.mode != RESET` (see [`next_position`]).
pub fn advance(
    state: &CoachState,
    feedback: &DrillFeedback,
    catalog: &Catalog,
    thresholds: &SessionThresholds,
) -> CoachResult<CoachState> {
    if state.is_blocked() {
        return Err(CoachError::SessionBlocked);
    }
    feedback.validate()?;

    if !thresholds.is_regression_trigger(feedback) {
        debug!(drill = %feedback.drill_id, pain = feedback.pain, "Feedback within limits");
        return Ok(state.clone());
    }

    warn!(
        body_part = %state.body_part,
        drill = %feedback.drill_id,
        pain = feedback.pain,
        stable = feedback.felt_stable,
        from = %state.mode,
        "Regressing session to RESET"
    );

    let plan = catalog.plan_for(state.body_part, Mode::Reset)?;
    Ok(CoachState::new(state.body_part, Mode::Reset, plan))
}

/// Drill position to use after `advance` returned `next` for `previous`
pub fn next_position(previous: &CoachState, next: &CoachState, position: usize) -> usize {
    if next.mode == Mode::Reset && previous.mode != Mode::Reset {
        0
    } else {
        position + 1
    }
}

/// Caller-side cursor over a session: the state plus the current drill position.
///
/// The session is complete once the position runs past the end of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub state: CoachState,
    pub position: usize,
}

impl SessionProgress {
    pub fn new(state: CoachState) -> Self {
        Self { state, position: 0 }
    }

    pub fn current_drill_id(&self) -> Option<&str> {
        self.state.plan.get(self.position).map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        !self.state.is_blocked() && self.position >= self.state.plan.len()
    }

    pub fn remaining(&self) -> &[DrillId] {
        self.state.plan.get(self.position..).unwrap_or(&[])
    }

    /// Apply feedback for the current drill and move the cursor
    pub fn record(
        &self,
        feedback: &DrillFeedback,
        catalog: &Catalog,
        thresholds: &SessionThresholds,
    ) -> CoachResult<SessionProgress> {
        if self.state.is_blocked() {
            return Err(CoachError::SessionBlocked);
        }
        let current = self
            .current_drill_id()
            .ok_or_else(|| CoachError::invalid_feedback("session is already complete"))?;
        if current != feedback.drill_id {
            return Err(CoachError::invalid_feedback(format!(
                "feedback is for {}, current drill is {}",
                feedback.drill_id, current
            )));
        }

        let next = advance(&self.state, feedback, catalog, thresholds)?;
        let position = next_position(&self.state, &next, self.position);
        Ok(SessionProgress { state: next, position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drills::BodyPart;

    fn plan(ids: &[&str]) -> Vec<DrillId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn knee_state(mode: Mode) -> CoachState {
        CoachState::new(BodyPart::Knee, mode, plan(&["A", "B", "C"]))
    }

    fn reset_plan() -> Vec<DrillId> {
        Catalog::builtin().plan_for(BodyPart::Knee, Mode::Reset).unwrap()
    }

    fn run(state: &CoachState, feedback: &DrillFeedback) -> CoachResult<CoachState> {
        advance(state, feedback, &Catalog::builtin(), &SessionThresholds::default())
    }

    #[test]
    fn test_high_pain_regresses_to_reset() {
        let next = run(&knee_state(Mode::Normal), &DrillFeedback::new("A", 8, true)).unwrap();
        assert_eq!(next.mode, Mode::Reset);
        assert_eq!(next.plan, reset_plan());
    }

    #[test]
    fn test_pain_at_cutoff_triggers() {
        let next = run(&knee_state(Mode::Regressed), &DrillFeedback::new("A", 7, true)).unwrap();
        assert_eq!(next.mode, Mode::Reset);
    }

    #[test]
    fn test_unstable_triggers_even_without_pain() {
        let next = run(&knee_state(Mode::Normal), &DrillFeedback::new("B", 0, false)).unwrap();
        assert_eq!(next.mode, Mode::Reset);
        assert_eq!(next.plan, reset_plan());
    }

    #[test]
    fn test_no_trigger_keeps_state() {
        for mode in [Mode::Normal, Mode::Regressed, Mode::Reset] {
            let state = knee_state(mode);
            let next = run(&state, &DrillFeedback::new("A", 0, true)).unwrap();
            assert_eq!(next, state);
        }
        let state = knee_state(Mode::Normal);
        assert_eq!(run(&state, &DrillFeedback::new("A", 6, true)).unwrap(), state);
    }

    #[test]
    fn test_regression_idempotent_in_reset() {
        let mut state = run(&knee_state(Mode::Normal), &DrillFeedback::new("A", 9, false)).unwrap();
        for _ in 0..3 {
            state = run(&state, &DrillFeedback::new("knee_quad_set", 8, false)).unwrap();
            assert_eq!(state.mode, Mode::Reset);
            assert_eq!(state.plan, reset_plan());
        }
    }

    #[test]
    fn test_reset_replaces_drifted_plan() {
        let drifted = CoachState::new(BodyPart::Knee, Mode::Reset, plan(&["knee_heel_slide"]));
        let next = run(&drifted, &DrillFeedback::new("knee_heel_slide", 10, true)).unwrap();
        assert_eq!(next.plan, reset_plan());
    }

    #[test]
    fn test_advance_does_not_mutate_input() {
        let state = knee_state(Mode::Normal);
        let copy = state.clone();
        let _ = run(&state, &DrillFeedback::new("A", 9, true)).unwrap();
        assert_eq!(state, copy);
    }

    #[test]
    fn test_advance_rejects_bad_pain() {
        let err = run(&knee_state(Mode::Normal), &DrillFeedback::new("A", 11, true)).unwrap_err();
        assert!(matches!(err, CoachError::InvalidFeedback(_)));
    }

    #[test]
    fn test_advance_rejects_blocked() {
        let blocked = CoachState::new(BodyPart::Knee, Mode::Blocked, Vec::new());
        let err = run(&blocked, &DrillFeedback::new("A", 0, true)).unwrap_err();
        assert_eq!(err, CoachError::SessionBlocked);
    }

    #[test]
    fn test_advance_does_not_resolve_drills() {
        // unknown ids in the plan are a rendering problem, not a transition failure
        let state = CoachState::new(BodyPart::Foot, Mode::Normal, plan(&["ghost"]));
        assert!(run(&state, &DrillFeedback::new("ghost", 1, true)).is_ok());
        assert!(run(&state, &DrillFeedback::new("ghost", 9, true)).is_ok());
    }

    #[test]
    fn test_custom_cutoff() {
        let lenient = SessionThresholds { feedback_pain_cutoff: 9 };
        let state = knee_state(Mode::Normal);
        let next = advance(&state, &DrillFeedback::new("A", 8, true), &Catalog::builtin(), &lenient).unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn test_thresholds_validate() {
        assert!(SessionThresholds::default().validate().is_ok());
        assert!(SessionThresholds { feedback_pain_cutoff: 11 }.validate().is_err());
    }

    #[test]
    fn test_next_position_rewinds_only_on_fresh_reset() {
        let normal = knee_state(Mode::Normal);
        let reset = knee_state(Mode::Reset);
        assert_eq!(next_position(&normal, &reset, 2), 0);
        assert_eq!(next_position(&reset, &reset, 1), 2);
        assert_eq!(next_position(&normal, &normal, 1), 2);
    }

    #[test]
    fn test_progress_walks_plan_to_completion() {
        let catalog = Catalog::builtin();
        let thresholds = SessionThresholds::default();
        let state = CoachState::new(
            BodyPart::Knee,
            Mode::Normal,
            catalog.plan_for(BodyPart::Knee, Mode::Normal).unwrap(),
        );
        let mut progress = SessionProgress::new(state);
        while let Some(id) = progress.current_drill_id() {
            let feedback = DrillFeedback::new(id, 2, true);
            progress = progress.record(&feedback, &catalog, &thresholds).unwrap();
        }
        assert!(progress.is_complete());
        assert_eq!(progress.state.mode, Mode::Normal);
        assert!(progress.remaining().is_empty());
    }

    #[test]
    fn test_progress_rewinds_on_fresh_reset() {
        let catalog = Catalog::builtin();
        let thresholds = SessionThresholds::default();
        let state = CoachState::new(
            BodyPart::Knee,
            Mode::Normal,
            catalog.plan_for(BodyPart::Knee, Mode::Normal).unwrap(),
        );
        let progress = SessionProgress { state, position: 1 };
        let feedback = DrillFeedback::new("knee_step_down", 8, true);
        let next = progress.record(&feedback, &catalog, &thresholds).unwrap();
        assert_eq!(next.state.mode, Mode::Reset);
        assert_eq!(next.position, 0);
        assert_eq!(next.current_drill_id(), Some("knee_quad_set"));

        // already in RESET: no rewind, drill is not repeated
        let again = next
            .record(&DrillFeedback::new("knee_quad_set", 9, false), &catalog, &thresholds)
            .unwrap();
        assert_eq!(again.state.mode, Mode::Reset);
        assert_eq!(again.position, 1);
        assert_eq!(again.current_drill_id(), Some("knee_heel_slide"));
    }

    #[test]
    fn test_progress_rejects_wrong_drill() {
        let progress = SessionProgress::new(knee_state(Mode::Normal));
        let err = progress
            .record(&DrillFeedback::new("B", 1, true), &Catalog::builtin(), &SessionThresholds::default())
            .unwrap_err();
        assert!(matches!(err, CoachError::InvalidFeedback(_)));
    }

    #[test]
    fn test_progress_rejects_after_completion() {
        let progress = SessionProgress { state: knee_state(Mode::Normal), position: 3 };
        assert!(progress.is_complete());
        let result = progress.record(&DrillFeedback::new("C", 1, true), &Catalog::builtin(), &SessionThresholds::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_blocked_session_is_never_complete() {
        let progress = SessionProgress::new(CoachState::new(BodyPart::Knee, Mode::Blocked, Vec::new()));
        assert!(!progress.is_complete());
        assert!(progress.current_drill_id().is_none());
    }
}
