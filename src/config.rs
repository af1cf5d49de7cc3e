//! Scorer configuration
//!
//! All knobs that are not per-request evidence: integration thresholds, GOF
//! gate thresholds, the conservation window and cache sizes. Loaded from
//! JSON; every field is optional and falls back to the built-in default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ScoringError, ScoringResult};
use crate::integrator::IntegratorThresholds;
use crate::mechanisms::gof_gates::{GofGateController, GATE1_THRESHOLD, GATE2_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheCapacities {
    pub conservation: u64,
    pub stoichiometry: u64,
    pub domain_context: u64,
}

impl Default for CacheCapacities {
    fn default() -> Self {
        Self { conservation: 100_000, stoichiometry: 10_000, domain_context: 10_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScorerConfig {
    pub lof_threshold: f64,
    pub dn_threshold: f64,
    pub gate1_threshold: f64,
    pub gate2_threshold: f64,
    /// Radius (bp) for the peak/valley conservation context
    pub conservation_window: u64,
    pub cache: CacheCapacities,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        let thresholds = IntegratorThresholds::default();
        Self {
            lof_threshold: thresholds.lof,
            dn_threshold: thresholds.dn,
            gate1_threshold: GATE1_THRESHOLD,
            gate2_threshold: GATE2_THRESHOLD,
            conservation_window: 10,
            cache: CacheCapacities::default(),
        }
    }
}

impl ScorerConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> ScoringResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScoringError::Configuration(format!("failed to read config {:?}: {}", path, e)))?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> ScoringResult<Self> {
        let config: ScorerConfig = serde_json::from_str(json)
            .map_err(|e| ScoringError::Configuration(format!("failed to parse config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScoringResult<()> {
        let unit = [
            ("lof_threshold", self.lof_threshold),
            ("dn_threshold", self.dn_threshold),
            ("gate1_threshold", self.gate1_threshold),
            ("gate2_threshold", self.gate2_threshold),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScoringError::Configuration(format!("{} must lie in [0, 1], got {}", name, value)));
            }
        }
        if self.cache.conservation == 0 || self.cache.stoichiometry == 0 || self.cache.domain_context == 0 {
            return Err(ScoringError::Configuration("cache capacities must be positive".into()));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> IntegratorThresholds {
        IntegratorThresholds { lof: self.lof_threshold, dn: self.dn_threshold }
    }

    pub fn gate_controller(&self) -> GofGateController {
        GofGateController::new(self.gate1_threshold, self.gate2_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ScorerConfig::from_json(r#"{"lof_threshold": 0.5, "cache": {"conservation": 10}}"#).unwrap();
        assert_eq!(config.lof_threshold, 0.5);
        assert_eq!(config.dn_threshold, 0.4);
        assert_eq!(config.cache.conservation, 10);
        assert_eq!(config.cache.stoichiometry, 10_000);
    }

    #[test]
    fn test_bad_values_are_configuration_errors() {
        for json in [
            r#"{"gate1_threshold": 1.5}"#,
            r#"{"cache": {"stoichiometry": 0}}"#,
            r#"{"lof_treshold": 0.4}"#,
            "not json",
        ] {
            let err = ScorerConfig::from_json(json).unwrap_err();
            assert!(err.is_fatal(), "{}", json);
        }
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(ScorerConfig::load(Path::new("/definitely/not/here.json")).is_err());
    }
}
