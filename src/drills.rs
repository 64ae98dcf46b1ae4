//! Drill catalog - reference data for drills, ROM zones and tier plans

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::coach::Mode;
use crate::error::{CoachError, CoachResult};

/// Drill identifier as stored in a session plan
pub type DrillId = String;

/// Rehabilitation targets. Closed set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BodyPart {
    Knee,
    Achilles,
    Shoulder,
    Foot,
}

impl BodyPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyPart::Knee => "knee",
            BodyPart::Achilles => "achilles",
            BodyPart::Shoulder => "shoulder",
            BodyPart::Foot => "foot",
        }
    }

    /// All body parts for iteration
    pub fn all() -> &'static [BodyPart] {
        &[BodyPart::Knee, BodyPart::Achilles, BodyPart::Shoulder, BodyPart::Foot]
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BodyPart {
    type Err = CoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BodyPart::all()
            .iter()
            .copied()
            .find(|bp| bp.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoachError::UnknownBodyPart(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DosageKind {
    Reps,
    Time,
}

/// Prescribed volume for a drill
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dosage {
    pub sets: u32,
    pub kind: DosageKind,
    /// Reps per set, or seconds per set for timed drills
    pub value: u32,
    pub hold_seconds: Option<u32>,
}

impl Dosage {
    pub fn format(&self) -> String {
        let base = match self.kind {
            DosageKind::Reps => format!("{} x {} reps", self.sets, self.value),
            DosageKind::Time => format!("{} x {}s", self.sets, self.value),
        };
        match self.hold_seconds {
            Some(hold) => format!("{} (hold {}s)", base, hold),
            None => base,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Drill {
    pub id: &'static str,
    pub body_part: BodyPart,
    pub title: &'static str,
    /// Why the drill is prescribed
    pub intent: &'static str,
    pub cues: &'static [&'static str],
    pub dosage: Dosage,
    /// Tag used by the UI to locate illustrative media
    pub visual_key: &'static str,
}

/// Labeled sub-range of a joint's range of motion, in degrees
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RomZone {
    pub label: &'static str,
    pub start_deg: i32,
    pub end_deg: i32,
}

/// Per body part reference data: ROM zone table and the drill plan of each tier
#[derive(Debug, Clone)]
pub struct BodyProfile {
    pub body_part: BodyPart,
    pub zones: &'static [RomZone],
    pub normal_plan: &'static [&'static str],
    pub regressed_plan: &'static [&'static str],
    pub reset_plan: &'static [&'static str],
}

/// Read-only reference data injected into the coaching core.
///
/// The algorithms never reach for [`DRILLS`] or [`BODY_PROFILES`] directly;
/// they receive a `Catalog`, so another set of tables can be swapped in
/// without touching them.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    drills: &'static [Drill],
    profiles: &'static [BodyProfile],
}

impl Catalog {
    pub const fn new(drills: &'static [Drill], profiles: &'static [BodyProfile]) -> Self {
        Self { drills, profiles }
    }

    /// Catalog shipped with the crate
    pub const fn builtin() -> Self {
        Self::new(DRILLS, BODY_PROFILES)
    }

    pub fn drill(&self, id: &str) -> CoachResult<&'static Drill> {
        self.drills
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| CoachError::UnknownDrillId(id.to_string()))
    }

    pub fn drills_for(&self, body_part: BodyPart) -> Vec<&'static Drill> {
        self.drills.iter().filter(|d| d.body_part == body_part).collect()
    }

    pub fn profile(&self, body_part: BodyPart) -> CoachResult<&'static BodyProfile> {
        self.profiles
            .iter()
            .find(|p| p.body_part == body_part)
            .ok_or_else(|| CoachError::UnknownBodyPart(body_part.to_string()))
    }

    pub fn zones(&self, body_part: BodyPart) -> CoachResult<&'static [RomZone]> {
        Ok(self.profile(body_part)?.zones)
    }

    /// Drill plan for a mode. A blocked session gets no drills.
    pub fn plan_for(&self, body_part: BodyPart, mode: Mode) -> CoachResult<Vec<DrillId>> {
        let profile = self.profile(body_part)?;
        let ids = match mode {
            Mode::Normal => profile.normal_plan,
            Mode::Regressed => profile.regressed_plan,
            Mode::Reset => profile.reset_plan,
            Mode::Blocked => &[],
        };
        Ok(ids.iter().map(|id| id.to_string()).collect())
    }

    /// Check that every tier plan resolves to drills of the right body part
    /// and that every profile has a zone table.
    pub fn validate(&self) -> CoachResult<()> {
        for profile in self.profiles {
            if profile.zones.is_empty() {
                return Err(CoachError::invalid_config(format!(
                    "{} has an empty ROM zone table",
                    profile.body_part
                )));
            }
            let tiers = [profile.normal_plan, profile.regressed_plan, profile.reset_plan];
            for id in tiers.iter().flat_map(|plan| plan.iter()) {
                let drill = self.drill(id)?;
                if drill.body_part != profile.body_part {
                    return Err(CoachError::invalid_config(format!(
                        "drill {} belongs to {}, not {}",
                        id, drill.body_part, profile.body_part
                    )));
                }
            }
            if profile.reset_plan.is_empty() {
                return Err(CoachError::invalid_config(format!(
                    "{} has an empty RESET plan",
                    profile.body_part
                )));
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

const fn reps(sets: u32, value: u32) -> Dosage {
    Dosage { sets, kind: DosageKind::Reps, value, hold_seconds: None }
}

const fn reps_hold(sets: u32, value: u32, hold: u32) -> Dosage {
    Dosage { sets, kind: DosageKind::Reps, value, hold_seconds: Some(hold) }
}

const fn timed(sets: u32, seconds: u32) -> Dosage {
    Dosage { sets, kind: DosageKind::Time, value: seconds, hold_seconds: None }
}

// Knee flexion zones
const KNEE_ZONES: &[RomZone] = &[
    RomZone { label: "0-30° early bend", start_deg: 0, end_deg: 30 },
    RomZone { label: "30-60° quarter squat", start_deg: 30, end_deg: 60 },
    RomZone { label: "60-90° half squat", start_deg: 60, end_deg: 90 },
    RomZone { label: "90-120° deep squat", start_deg: 90, end_deg: 120 },
    RomZone { label: "120°+ full flexion", start_deg: 120, end_deg: 150 },
];

// Ankle dorsiflexion (negative = plantarflexion)
const ACHILLES_ZONES: &[RomZone] = &[
    RomZone { label: "full plantarflexion (tiptoe)", start_deg: -40, end_deg: -20 },
    RomZone { label: "mid plantarflexion", start_deg: -20, end_deg: 0 },
    RomZone { label: "neutral to 10° dorsiflexion", start_deg: 0, end_deg: 10 },
    RomZone { label: "10°+ dorsiflexion (heel drop)", start_deg: 10, end_deg: 25 },
];

// Shoulder elevation
const SHOULDER_ZONES: &[RomZone] = &[
    RomZone { label: "0-60° low reach", start_deg: 0, end_deg: 60 },
    RomZone { label: "60-120° painful arc", start_deg: 60, end_deg: 120 },
    RomZone { label: "120-150° overhead", start_deg: 120, end_deg: 150 },
    RomZone { label: "150-180° end range", start_deg: 150, end_deg: 180 },
];

// Big toe extension
const FOOT_ZONES: &[RomZone] = &[
    RomZone { label: "0-20° stance", start_deg: 0, end_deg: 20 },
    RomZone { label: "20-45° walking push-off", start_deg: 20, end_deg: 45 },
    RomZone { label: "45-65° running push-off", start_deg: 45, end_deg: 65 },
    RomZone { label: "65°+ toe extension", start_deg: 65, end_deg: 90 },
];

pub const BODY_PROFILES: &[BodyProfile] = &[
    BodyProfile {
        body_part: BodyPart::Knee,
        zones: KNEE_ZONES,
        normal_plan: &["knee_split_squat", "knee_step_down", "knee_spanish_squat"],
        regressed_plan: &["knee_box_squat", "knee_spanish_squat_iso", "knee_straight_leg_raise"],
        reset_plan: &["knee_quad_set", "knee_heel_slide"],
    },
    BodyProfile {
        body_part: BodyPart::Achilles,
        zones: ACHILLES_ZONES,
        normal_plan: &["achilles_single_leg_raise", "achilles_bent_knee_raise", "achilles_pogo"],
        regressed_plan: &["achilles_double_leg_raise", "achilles_seated_raise"],
        reset_plan: &["achilles_isometric_hold", "achilles_ankle_circles"],
    },
    BodyProfile {
        body_part: BodyPart::Shoulder,
        zones: SHOULDER_ZONES,
        normal_plan: &["shoulder_side_lying_er", "shoulder_scaption", "shoulder_wall_slide"],
        regressed_plan: &["shoulder_er_isometric", "shoulder_scaption_partial"],
        reset_plan: &["shoulder_pendulum", "shoulder_table_slide"],
    },
    BodyProfile {
        body_part: BodyPart::Foot,
        zones: FOOT_ZONES,
        normal_plan: &["foot_short_foot_standing", "foot_single_leg_balance", "foot_towel_curl"],
        regressed_plan: &["foot_short_foot_seated", "foot_towel_curl"],
        reset_plan: &["foot_ball_roll", "foot_toe_spread"],
    },
];

pub const DRILLS: &[Drill] = &[
    // === KNEE ===
    Drill {
        id: "knee_split_squat",
        body_part: BodyPart::Knee,
        title: "Split squat",
        intent: "Load the knee through mid range with control on one leg at a time",
        cues: &["Long stance, torso tall", "Lower until the back knee hovers", "Front knee tracks over the toes"],
        dosage: reps(3, 8),
        visual_key: "knee-split-squat",
    },
    Drill {
        id: "knee_step_down",
        body_part: BodyPart::Knee,
        title: "Lateral step-down",
        intent: "Train eccentric quad control and knee alignment",
        cues: &["Stand on a low step", "Slowly tap the heel of the free leg to the floor", "Keep the hips level"],
        dosage: reps(3, 10),
        visual_key: "knee-step-down",
    },
    Drill {
        id: "knee_spanish_squat",
        body_part: BodyPart::Knee,
        title: "Spanish squat",
        intent: "Heavy quad loading with low shear on the joint",
        cues: &["Band behind both knees", "Sit back with shins vertical", "Drive up through the whole foot"],
        dosage: reps(3, 12),
        visual_key: "knee-spanish-squat",
    },
    Drill {
        id: "knee_box_squat",
        body_part: BodyPart::Knee,
        title: "Box squat",
        intent: "Squat pattern with a depth limit you trust",
        cues: &["Box at a height that feels easy", "Touch, don't sit", "Stand up slowly"],
        dosage: reps(3, 8),
        visual_key: "knee-box-squat",
    },
    Drill {
        id: "knee_spanish_squat_iso",
        body_part: BodyPart::Knee,
        title: "Spanish squat hold",
        intent: "Isometric quad load, often calms an irritable tendon",
        cues: &["Band behind both knees", "Sink to a comfortable depth", "Breathe and hold steady"],
        dosage: timed(5, 30),
        visual_key: "knee-spanish-squat",
    },
    Drill {
        id: "knee_straight_leg_raise",
        body_part: BodyPart::Knee,
        title: "Straight leg raise",
        intent: "Wake up the quad without bending the knee",
        cues: &["Lie on your back, other knee bent", "Lock the knee straight", "Lift to the height of the other knee"],
        dosage: reps_hold(3, 10, 2),
        visual_key: "knee-slr",
    },
    Drill {
        id: "knee_quad_set",
        body_part: BodyPart::Knee,
        title: "Quad set",
        intent: "Gentle quad activation with the knee fully supported",
        cues: &["Sit with the leg straight", "Press the back of the knee into the floor", "Relax fully between reps"],
        dosage: reps_hold(2, 10, 5),
        visual_key: "knee-quad-set",
    },
    Drill {
        id: "knee_heel_slide",
        body_part: BodyPart::Knee,
        title: "Heel slide",
        intent: "Restore easy bend without load",
        cues: &["Lie on your back", "Slide the heel toward you", "Stop before pain, slide back"],
        dosage: reps(2, 10),
        visual_key: "knee-heel-slide",
    },
    // === ACHILLES ===
    Drill {
        id: "achilles_single_leg_raise",
        body_part: BodyPart::Achilles,
        title: "Single-leg calf raise",
        intent: "Full tendon load through the whole range",
        cues: &["Hands on a wall for balance", "Rise as high as you can", "Lower over three seconds"],
        dosage: reps(3, 12),
        visual_key: "achilles-single-raise",
    },
    Drill {
        id: "achilles_bent_knee_raise",
        body_part: BodyPart::Achilles,
        title: "Bent-knee calf raise",
        intent: "Bias the soleus, the deep calf muscle",
        cues: &["Knees softly bent", "Keep the bend as you rise", "Slow on the way down"],
        dosage: reps(3, 12),
        visual_key: "achilles-bent-knee-raise",
    },
    Drill {
        id: "achilles_pogo",
        body_part: BodyPart::Achilles,
        title: "Pogo hops",
        intent: "Reintroduce spring-like loading",
        cues: &["Small quick hops", "Stay on the balls of the feet", "Stop if the landing gets heavy"],
        dosage: timed(3, 20),
        visual_key: "achilles-pogo",
    },
    Drill {
        id: "achilles_double_leg_raise",
        body_part: BodyPart::Achilles,
        title: "Double-leg calf raise",
        intent: "Share the load between both sides",
        cues: &["Feet hip width", "Rise evenly", "Lower slowly"],
        dosage: reps(3, 15),
        visual_key: "achilles-double-raise",
    },
    Drill {
        id: "achilles_seated_raise",
        body_part: BodyPart::Achilles,
        title: "Seated calf raise",
        intent: "Load the calf without body weight",
        cues: &["Sit with a weight on the knees", "Lift the heels", "Pause at the top"],
        dosage: reps_hold(3, 15, 1),
        visual_key: "achilles-seated-raise",
    },
    Drill {
        id: "achilles_isometric_hold",
        body_part: BodyPart::Achilles,
        title: "Isometric calf hold",
        intent: "Pain-calming static load",
        cues: &["Rise halfway on both feet", "Hold still", "Effort stays comfortable"],
        dosage: timed(4, 30),
        visual_key: "achilles-iso-hold",
    },
    Drill {
        id: "achilles_ankle_circles",
        body_part: BodyPart::Achilles,
        title: "Ankle circles",
        intent: "Keep the ankle moving without load",
        cues: &["Seated, foot off the floor", "Draw slow circles", "Switch direction halfway"],
        dosage: reps(2, 10),
        visual_key: "achilles-ankle-circles",
    },
    // === SHOULDER ===
    Drill {
        id: "shoulder_side_lying_er",
        body_part: BodyPart::Shoulder,
        title: "Side-lying external rotation",
        intent: "Strengthen the rotator cuff",
        cues: &["Towel under the elbow", "Rotate the forearm up", "Keep the elbow glued to your side"],
        dosage: reps(3, 12),
        visual_key: "shoulder-side-lying-er",
    },
    Drill {
        id: "shoulder_scaption",
        body_part: BodyPart::Shoulder,
        title: "Scaption raise",
        intent: "Load elevation through the painful arc",
        cues: &["Thumbs up", "Raise at 30° in front of the body", "Stop at shoulder height"],
        dosage: reps(3, 10),
        visual_key: "shoulder-scaption",
    },
    Drill {
        id: "shoulder_wall_slide",
        body_part: BodyPart::Shoulder,
        title: "Wall slide",
        intent: "Overhead reach with scapular control",
        cues: &["Forearms on the wall", "Slide up, shoulders away from ears", "Lower with control"],
        dosage: reps(3, 10),
        visual_key: "shoulder-wall-slide",
    },
    Drill {
        id: "shoulder_er_isometric",
        body_part: BodyPart::Shoulder,
        title: "External rotation isometric",
        intent: "Cuff activation without movement",
        cues: &["Stand in a doorway", "Press the back of the wrist into the frame", "Moderate effort only"],
        dosage: reps_hold(3, 5, 10),
        visual_key: "shoulder-er-iso",
    },
    Drill {
        id: "shoulder_scaption_partial",
        body_part: BodyPart::Shoulder,
        title: "Partial scaption",
        intent: "Elevation kept below the painful arc",
        cues: &["No weight", "Raise to 60° only", "Slow down and up"],
        dosage: reps(3, 10),
        visual_key: "shoulder-scaption",
    },
    Drill {
        id: "shoulder_pendulum",
        body_part: BodyPart::Shoulder,
        title: "Pendulum",
        intent: "Gentle passive motion",
        cues: &["Lean on a table", "Let the arm hang", "Sway the body so the arm swings"],
        dosage: timed(2, 30),
        visual_key: "shoulder-pendulum",
    },
    Drill {
        id: "shoulder_table_slide",
        body_part: BodyPart::Shoulder,
        title: "Table slide",
        intent: "Supported forward reach",
        cues: &["Hand on a towel on the table", "Slide forward as you lean", "Return slowly"],
        dosage: reps(2, 10),
        visual_key: "shoulder-table-slide",
    },
    // === FOOT ===
    Drill {
        id: "foot_short_foot_standing",
        body_part: BodyPart::Foot,
        title: "Short foot (standing)",
        intent: "Arch control under body weight",
        cues: &["Toes long and relaxed", "Draw the ball of the foot toward the heel", "Arch lifts, toes stay down"],
        dosage: reps_hold(3, 10, 5),
        visual_key: "foot-short-foot",
    },
    Drill {
        id: "foot_single_leg_balance",
        body_part: BodyPart::Foot,
        title: "Single-leg balance",
        intent: "Foot and ankle stability",
        cues: &["Soft knee", "Keep the arch up", "Eyes on a fixed point"],
        dosage: timed(3, 30),
        visual_key: "foot-balance",
    },
    Drill {
        id: "foot_towel_curl",
        body_part: BodyPart::Foot,
        title: "Towel curl",
        intent: "Intrinsic foot strength",
        cues: &["Towel flat under the foot", "Scrunch it toward you with the toes", "Heel stays down"],
        dosage: reps(3, 10),
        visual_key: "foot-towel-curl",
    },
    Drill {
        id: "foot_short_foot_seated",
        body_part: BodyPart::Foot,
        title: "Short foot (seated)",
        intent: "Arch control without body weight",
        cues: &["Sit with the foot flat", "Draw the ball of the foot toward the heel", "Hold, then relax"],
        dosage: reps_hold(3, 10, 5),
        visual_key: "foot-short-foot",
    },
    Drill {
        id: "foot_ball_roll",
        body_part: BodyPart::Foot,
        title: "Ball roll",
        intent: "Calm the sole of the foot",
        cues: &["Seated", "Roll a ball from heel to toes", "Light pressure only"],
        dosage: timed(2, 60),
        visual_key: "foot-ball-roll",
    },
    Drill {
        id: "foot_toe_spread",
        body_part: BodyPart::Foot,
        title: "Toe spread",
        intent: "Gentle toe mobility",
        cues: &["Foot flat", "Spread the toes apart", "Relax and repeat"],
        dosage: reps(2, 10),
        visual_key: "foot-toe-spread",
    },
];
