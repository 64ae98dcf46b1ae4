//! Red-flag screening - symptom patterns that override normal training

use std::collections::BTreeSet;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Symptom tags reported at check-in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Sensation {
    Sharp,
    Dull,
    Ache,
    Burning,
    Tingling,
    Stiffness,
    Clicking,
    Numbness,
    Weakness,
    Swelling,
    Warmth,
    Redness,
    Fever,
    NightPain,
    Locking,
    GivingWay,
    Trauma,
    Deformity,
    CannotBearWeight,
}

/// Escalation produced by a matching rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlag {
    pub rule_id: String,
    pub title: String,
    pub description: String,
    pub recommended_action: String,
}

/// One entry of the screening table.
///
/// Tag condition: every tag in `all_of` is present and, if `any_of` is
/// non-empty, at least one of those is too. A rule with no tags at all
/// can only match by keyword.
#[derive(Debug, Clone, Copy)]
pub struct RedFlagRule {
    pub id: &'static str,
    pub all_of: &'static [Sensation],
    pub any_of: &'static [Sensation],
    /// Lowercase fragments matched against the free-text note
    pub keywords: &'static [&'static str],
    pub title: &'static str,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl RedFlagRule {
    fn tags_match(&self, symptoms: &BTreeSet<Sensation>) -> bool {
        if self.all_of.is_empty() && self.any_of.is_empty() {
            return false;
        }
        self.all_of.iter().all(|s| symptoms.contains(s))
            && (self.any_of.is_empty() || self.any_of.iter().any(|s| symptoms.contains(s)))
    }

    fn text_matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }

    /// `text` must already be lowercase
    pub fn matches(&self, symptoms: &BTreeSet<Sensation>, text: &str) -> bool {
        self.tags_match(symptoms) || self.text_matches(text)
    }

    pub fn to_flag(&self) -> SafetyFlag {
        SafetyFlag {
            rule_id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            recommended_action: self.recommended_action.to_string(),
        }
    }
}

/// Screening rules, most urgent first
pub const RED_FLAG_RULES: &[RedFlagRule] = &[
    RedFlagRule {
        id: "acute_trauma",
        all_of: &[],
        any_of: &[Sensation::Trauma, Sensation::Deformity, Sensation::CannotBearWeight],
        keywords: &[
            "fell over",
            "fell off",
            "fell down",
            "bad fall",
            "car accident",
            "heard a pop",
            "heard a snap",
            "can't bear weight",
            "cannot bear weight",
            "can't put weight",
            "looks deformed",
        ],
        title: "Possible acute injury",
        description: "A recent impact, deformity or inability to take weight can mean a fracture, rupture or dislocation.",
        recommended_action: "Stop. Get a same-day medical assessment (urgent care or emergency department) before any further training.",
    },
    RedFlagRule {
        id: "neurological_deficit",
        all_of: &[Sensation::Numbness, Sensation::Weakness],
        any_of: &[],
        keywords: &["foot drop", "saddle numbness", "lost bladder control", "lost bowel control"],
        title: "Numbness with weakness",
        description: "Numbness together with loss of strength can signal nerve compression.",
        recommended_action: "Seek urgent medical assessment today and do not train until you are cleared.",
    },
    RedFlagRule {
        id: "possible_infection",
        all_of: &[Sensation::Fever],
        any_of: &[Sensation::Swelling, Sensation::Warmth, Sensation::Redness],
        keywords: &["hot and swollen", "red and swollen"],
        title: "Hot, swollen joint",
        description: "Fever with a warm, red or swollen joint can mean infection or inflammatory disease.",
        recommended_action: "Contact a doctor today; a hot swollen joint with fever needs prompt review.",
    },
    RedFlagRule {
        id: "night_pain_swelling",
        all_of: &[Sensation::NightPain, Sensation::Swelling],
        any_of: &[],
        keywords: &["constant night pain", "unexplained weight loss"],
        title: "Night pain with swelling",
        description: "Pain that wakes you at night together with swelling is not typical of a simple overload.",
        recommended_action: "Book a doctor or physiotherapist visit within the next few days and pause training until then.",
    },
    RedFlagRule {
        id: "mechanical_locking",
        all_of: &[],
        any_of: &[Sensation::Locking, Sensation::GivingWay],
        keywords: &["locks up", "got stuck", "gives way", "giving way", "buckles"],
        title: "Locking or giving way",
        description: "A joint that locks or gives way may have a mechanical block such as a torn meniscus or loose body.",
        recommended_action: "Have the joint examined by a physiotherapist or sports doctor before loading it again.",
    },
];

/// Rule that fires for the given input, if any, using an explicit table
pub fn screen_with<'a>(
    rules: &'a [RedFlagRule],
    symptoms: &BTreeSet<Sensation>,
    free_text: Option<&str>,
) -> Option<&'a RedFlagRule> {
    let text = free_text.map(|t| t.to_lowercase()).unwrap_or_default();
    rules.iter().find(|rule| rule.matches(symptoms, &text))
}

/// Screen a check-in against [`RED_FLAG_RULES`].
///
/// Returns the first matching rule's flag, so the most urgent guidance
/// always wins when several rules match.
pub fn screen(symptoms: &BTreeSet<Sensation>, free_text: Option<&str>) -> Option<SafetyFlag> {
    screen_with(RED_FLAG_RULES, symptoms, free_text).map(RedFlagRule::to_flag)
}
