//! Calibration analysis - ranks problem zones by severity

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::drills::{BodyPart, Catalog, RomZone};
use crate::error::{CoachError, CoachResult};

/// A ROM zone the user marked as symptomatic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProblemZone {
    /// Index into the body part's ROM zone table
    pub zone_index: usize,
    pub severity: f64,
}

/// Parses `index:severity`, e.g. `2:5.5`
impl FromStr for ProblemZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, severity) = s
            .split_once(':')
            .ok_or_else(|| format!("expected index:severity, got '{}'", s))?;
        let zone_index = index
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("bad zone index '{}': {}", index, e))?;
        let severity = severity
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("bad severity '{}': {}", severity, e))?;
        Ok(Self { zone_index, severity })
    }
}

/// Calibration result for one body part. Recalibration replaces it whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub body_part: BodyPart,
    pub problem_zones: Vec<ProblemZone>,
}

impl CalibrationProfile {
    pub fn new(body_part: BodyPart, problem_zones: Vec<ProblemZone>) -> Self {
        Self { body_part, problem_zones }
    }

    /// Profile with no calibrated problem zones
    pub fn empty(body_part: BodyPart) -> Self {
        Self::new(body_part, Vec::new())
    }
}

/// A problem zone resolved against the ROM zone table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemZoneSummary {
    pub zone_index: usize,
    pub label: String,
    pub severity: f64,
}

fn resolve(body_part: BodyPart, zones: &[RomZone], zone: &ProblemZone) -> CoachResult<ProblemZoneSummary> {
    if !zone.severity.is_finite() || zone.severity < 0.0 {
        return Err(CoachError::InvalidSeverity {
            zone_index: zone.zone_index,
            severity: zone.severity,
        });
    }
    let rom = zones.get(zone.zone_index).ok_or(CoachError::InvalidZoneIndex {
        body_part,
        zone_index: zone.zone_index,
        zone_count: zones.len(),
    })?;
    Ok(ProblemZoneSummary {
        zone_index: zone.zone_index,
        label: rom.label.to_string(),
        severity: zone.severity,
    })
}

/// Highest severity first; equal severities go to the lower zone index
fn by_priority(a: &ProblemZoneSummary, b: &ProblemZoneSummary) -> Ordering {
    b.severity
        .total_cmp(&a.severity)
        .then_with(|| a.zone_index.cmp(&b.zone_index))
}

/// All problem zones of a profile, most severe first.
///
/// Fails on the first zone that does not resolve; a profile with a bad
/// entry must not be used at all.
pub fn rank_all(profile: &CalibrationProfile, catalog: &Catalog) -> CoachResult<Vec<ProblemZoneSummary>> {
    let zones = catalog.zones(profile.body_part)?;
    let mut ranked = profile
        .problem_zones
        .iter()
        .map(|zone| resolve(profile.body_part, zones, zone))
        .collect::<CoachResult<Vec<_>>>()?;
    ranked.sort_by(by_priority);
    Ok(ranked)
}

/// The focus zone of a profile, or `None` when nothing was calibrated
pub fn rank(profile: &CalibrationProfile, catalog: &Catalog) -> CoachResult<Option<ProblemZoneSummary>> {
    Ok(rank_all(profile, catalog)?.into_iter().next())
}
