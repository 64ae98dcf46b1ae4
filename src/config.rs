//! Coach configuration - overridable thresholds loaded from JSON

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coach::{ModeThresholds, SessionThresholds};
use crate::error::{CoachError, CoachResult};

/// All tunable cut points. Missing fields keep their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub triage: ModeThresholds,
    pub session: SessionThresholds,
}

impl CoachConfig {
    pub fn validate(&self) -> CoachResult<()> {
        self.triage.validate()?;
        self.session.validate()
    }

    pub fn from_json(json: &str) -> CoachResult<Self> {
        let config: CoachConfig =
            serde_json::from_str(json).map_err(|e| CoachError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "Loaded coach config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(CoachConfig::default().validate().is_ok());
        assert_eq!(CoachConfig::default().session.feedback_pain_cutoff, 7);
        assert_eq!(CoachConfig::default().triage.pain_reset_at, 9);
    }

    #[test]
    fn test_partial_override() {
        let config = CoachConfig::from_json(r#"{"triage": {"pain_regressed_at": 5}}"#).unwrap();
        assert_eq!(config.triage.pain_regressed_at, 5);
        assert_eq!(config.triage.pain_reset_at, 9);
        assert_eq!(config.session, SessionThresholds::default());
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(CoachConfig::from_json("{}").unwrap(), CoachConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = CoachConfig::from_json(r#"{"session": {"feedback_pain_cutoff": 12}}"#).unwrap_err();
        assert!(matches!(err, CoachError::InvalidConfig(_)));
        let err = CoachConfig::from_json(r#"{"triage": {"pain_reset_at": 3}}"#).unwrap_err();
        assert!(matches!(err, CoachError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(CoachConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_load_without_path() {
        assert_eq!(CoachConfig::load(None).unwrap(), CoachConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(CoachConfig::load(Some(Path::new("/nonexistent/rehab.json"))).is_err());
    }
}
