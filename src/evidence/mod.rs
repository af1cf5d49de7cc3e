//! Immutable, typed evidence for one scoring request
//!
//! An [`EvidenceContext`] is built once per request, validated at build time
//! and then shared by reference across the LOF, DN and GOF scorers. Nothing
//! in the engine mutates it.
//!
//! Upstream evidence that a collaborator could not fetch is represented as
//! [`Evidence::Unknown`] with a reason, never as a guessed number. Scorers
//! treat unknown evidence as neutral for the score and as a confidence
//! penalty.

pub mod structure;
pub mod weights;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ScoringError, ScoringResult};
use crate::utils::ConservationTier;

pub use structure::{Neighbourhood, ResidueCoord, StructureModel};
pub use weights::{WeightOverrides, WEIGHT_REGISTRY};

/// Evidence value or an explicit "unknown" marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Evidence<T> {
    Unknown { unknown: String },
    Known(T),
}

impl<T> Default for Evidence<T> {
    fn default() -> Self {
        Evidence::Unknown { unknown: "not supplied".to_string() }
    }
}

impl<T> Evidence<T> {
    pub fn unknown(reason: impl Into<String>) -> Self {
        Evidence::Unknown { unknown: reason.into() }
    }

    pub fn known(&self) -> Option<&T> {
        match self {
            Evidence::Known(value) => Some(value),
            Evidence::Unknown { .. } => None,
        }
    }

    pub fn unknown_reason(&self) -> Option<&str> {
        match self {
            Evidence::Known(_) => None,
            Evidence::Unknown { unknown } => Some(unknown),
        }
    }
}

/// phyloP / phastCons at the variant position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConservationScores {
    pub phylop: Option<f64>,
    pub phastcons: Option<f64>,
}

impl ConservationScores {
    pub fn is_empty(&self) -> bool {
        self.phylop.is_none() && self.phastcons.is_none()
    }
}

/// Allele frequency from a population database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRecord {
    pub global_af: f64,
    /// Per-population AF keyed by gnomAD population code (AFR, NFE, ...)
    #[serde(default)]
    pub population_af: FxHashMap<String, f64>,
    /// Database that produced the record
    #[serde(default)]
    pub source: Option<String>,
}

impl FrequencyRecord {
    pub fn new(global_af: f64) -> Self {
        Self { global_af, ..Default::default() }
    }

    /// Highest per-population frequency, if any were reported
    pub fn max_population(&self) -> Option<(&str, f64)> {
        self.population_af
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(pop, af)| (pop.as_str(), *af))
    }
}

/// Hints about how many subunits share the protein's functional complex
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoichiometryHints {
    /// Curated subunit count; always wins over votes
    pub explicit_k: Option<u32>,
    /// Observed biological-assembly sizes (e.g. from PDB)
    pub assembly_sizes: Vec<u32>,
    /// Caller saw a coiled-coil near the variant
    pub coiled_coil_near: bool,
    pub tm_count: Option<u32>,
    /// Curated "acts as a monomer" hint; damps amplification
    pub monomeric: bool,
}

impl StoichiometryHints {
    pub fn is_empty(&self) -> bool {
        self.explicit_k.is_none()
            && self.assembly_sizes.is_empty()
            && !self.coiled_coil_near
            && self.tm_count.is_none()
            && !self.monomeric
    }
}

/// Coarse structural annotations at the variant position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralHints {
    /// Likelihood the residue sits in a protein-protein interface, [0, 1]
    pub interface_likelihood: Option<f64>,
    pub flexible_loop: bool,
    /// Residue is one half of a disulfide bond
    pub in_disulfide: bool,
    /// Closeness to an annotated active site, [0, 1]
    pub active_site_proximity: Option<f64>,
    /// Secreted or membrane protein whose folding depends on the ER
    pub secretory: bool,
    /// Overrides the residue-type conservation tier for the LOF axis
    pub conservation_tier: Option<ConservationTier>,
}

/// Read-only evidence for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceContext {
    protein_id: Option<String>,
    conservation: Evidence<ConservationScores>,
    frequency: Evidence<FrequencyRecord>,
    go_terms: Vec<String>,
    stoichiometry: StoichiometryHints,
    structural: StructuralHints,
    #[serde(skip)]
    structure: Option<Arc<StructureModel>>,
    weights: WeightOverrides,
}

impl EvidenceContext {
    pub fn builder() -> EvidenceContextBuilder {
        EvidenceContextBuilder::default()
    }

    /// Build from a JSON document with the builder's field names
    pub fn from_json(json: &str) -> ScoringResult<Self> {
        let builder: EvidenceContextBuilder = serde_json::from_str(json)
            .map_err(|e| ScoringError::Configuration(format!("invalid evidence document: {}", e)))?;
        builder.build()
    }

    pub fn protein_id(&self) -> Option<&str> {
        self.protein_id.as_deref()
    }

    pub fn conservation(&self) -> &Evidence<ConservationScores> {
        &self.conservation
    }

    pub fn frequency(&self) -> &Evidence<FrequencyRecord> {
        &self.frequency
    }

    pub fn go_terms(&self) -> &[String] {
        &self.go_terms
    }

    pub fn stoichiometry(&self) -> &StoichiometryHints {
        &self.stoichiometry
    }

    pub fn structural(&self) -> &StructuralHints {
        &self.structural
    }

    pub fn structure(&self) -> Option<&StructureModel> {
        self.structure.as_deref()
    }

    pub fn weights(&self) -> &WeightOverrides {
        &self.weights
    }

    /// Weight for `group.feature` honouring overrides
    pub fn weight(&self, group: &str, feature: &str, default: f64) -> f64 {
        self.weights.get(group, feature, default)
    }

    /// Copy with conservation resolved by the scorer's lookup
    pub(crate) fn with_conservation(&self, conservation: Evidence<ConservationScores>) -> Self {
        Self { conservation, ..self.clone() }
    }

    /// Copy with frequency resolved by the scorer's fallback chain
    pub(crate) fn with_frequency(&self, frequency: Evidence<FrequencyRecord>) -> Self {
        Self { frequency, ..self.clone() }
    }
}

/// Builder; validation happens in [`EvidenceContextBuilder::build`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EvidenceContextBuilder {
    protein_id: Option<String>,
    conservation: Evidence<ConservationScores>,
    frequency: Evidence<FrequencyRecord>,
    go_terms: Vec<String>,
    stoichiometry: StoichiometryHints,
    structural: StructuralHints,
    structure: Option<StructureModel>,
    weights: FxHashMap<String, f64>,
}

impl EvidenceContextBuilder {
    pub fn protein_id(mut self, id: impl Into<String>) -> Self {
        self.protein_id = Some(id.into());
        self
    }

    pub fn conservation(mut self, phylop: Option<f64>, phastcons: Option<f64>) -> Self {
        self.conservation = Evidence::Known(ConservationScores { phylop, phastcons });
        self
    }

    pub fn conservation_unknown(mut self, reason: impl Into<String>) -> Self {
        self.conservation = Evidence::unknown(reason);
        self
    }

    pub fn frequency(mut self, record: FrequencyRecord) -> Self {
        self.frequency = Evidence::Known(record);
        self
    }

    pub fn allele_frequency(self, af: f64) -> Self {
        self.frequency(FrequencyRecord::new(af))
    }

    pub fn frequency_unknown(mut self, reason: impl Into<String>) -> Self {
        self.frequency = Evidence::unknown(reason);
        self
    }

    pub fn go_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.go_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn stoichiometry(mut self, hints: StoichiometryHints) -> Self {
        self.stoichiometry = hints;
        self
    }

    pub fn subunits(mut self, k: u32) -> Self {
        self.stoichiometry.explicit_k = Some(k);
        self
    }

    pub fn structural(mut self, hints: StructuralHints) -> Self {
        self.structural = hints;
        self
    }

    pub fn structure(mut self, model: StructureModel) -> Self {
        self.structure = Some(model);
        self
    }

    pub fn weight(mut self, key: impl Into<String>, value: f64) -> Self {
        self.weights.insert(key.into(), value);
        self
    }

    pub fn build(self) -> ScoringResult<EvidenceContext> {
        let weights = WeightOverrides::from_map(self.weights)?;

        let unit = |name: &str, value: Option<f64>| -> ScoringResult<()> {
            match value {
                Some(v) if !(0.0..=1.0).contains(&v) => Err(ScoringError::Configuration(format!(
                    "{} must lie in [0, 1], got {}",
                    name, v
                ))),
                _ => Ok(()),
            }
        };
        unit("interface_likelihood", self.structural.interface_likelihood)?;
        unit("active_site_proximity", self.structural.active_site_proximity)?;
        if let Evidence::Known(record) = &self.frequency {
            unit("global_af", Some(record.global_af))?;
            for (pop, af) in &record.population_af {
                unit(&format!("population_af.{}", pop), Some(*af))?;
            }
        }
        if let Evidence::Known(scores) = &self.conservation {
            for (name, value) in [("phylop", scores.phylop), ("phastcons", scores.phastcons)] {
                if value.is_some_and(|v| !v.is_finite()) {
                    return Err(ScoringError::Configuration(format!("{} must be finite", name)));
                }
            }
        }
        if self.stoichiometry.explicit_k == Some(0) {
            return Err(ScoringError::Configuration("explicit subunit count must be ≥ 1".into()));
        }

        // Empty conservation scores carry no information
        let conservation = match self.conservation {
            Evidence::Known(scores) if scores.is_empty() => Evidence::unknown("no conservation scores"),
            other => other,
        };

        Ok(EvidenceContext {
            protein_id: self.protein_id,
            conservation,
            frequency: self.frequency,
            go_terms: self.go_terms,
            stoichiometry: self.stoichiometry,
            structural: self.structural,
            structure: self.structure.map(Arc::new),
            weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_marks_evidence_unknown() {
        let ctx = EvidenceContext::builder().build().unwrap();
        assert_eq!(ctx.conservation().unknown_reason(), Some("not supplied"));
        assert!(ctx.frequency().known().is_none());
        assert!(ctx.weights().is_empty());
    }

    #[test]
    fn test_bad_override_fails_at_build() {
        let err = EvidenceContext::builder()
            .weight("lof.made_up", 1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ScoringError::Configuration(_)));
    }

    #[test]
    fn test_out_of_range_hint_fails_at_build() {
        let hints = StructuralHints { interface_likelihood: Some(1.5), ..Default::default() };
        assert!(EvidenceContext::builder().structural(hints).build().is_err());
        assert!(EvidenceContext::builder().allele_frequency(2.0).build().is_err());
        assert!(EvidenceContext::builder().subunits(0).build().is_err());
    }

    #[test]
    fn test_non_finite_conservation_fails_at_build() {
        assert!(EvidenceContext::builder().conservation(Some(f64::NAN), None).build().is_err());
        assert!(EvidenceContext::builder().conservation(Some(2.0), Some(f64::INFINITY)).build().is_err());
        assert!(EvidenceContext::builder().conservation(Some(-3.5), Some(0.0)).build().is_ok());
    }

    #[test]
    fn test_from_json_document() {
        let json = r#"{
            "protein_id": "P04637",
            "conservation": {"phylop": 7.2, "phastcons": 1.0},
            "frequency": {"unknown": "gnomAD timeout"},
            "go_terms": ["protein homotetramerization"],
            "stoichiometry": {"coiled_coil_near": true},
            "weights": {"dn.interference": 0.25}
        }"#;
        let ctx = EvidenceContext::from_json(json).unwrap();
        assert_eq!(ctx.protein_id(), Some("P04637"));
        assert_eq!(ctx.conservation().known().and_then(|c| c.phylop), Some(7.2));
        assert_eq!(ctx.frequency().unknown_reason(), Some("gnomAD timeout"));
        assert!(ctx.stoichiometry().coiled_coil_near);
        assert_eq!(ctx.weight("dn", "interference", 0.3), 0.25);
    }

    #[test]
    fn test_from_json_rejects_bad_weights() {
        let json = r#"{"weights": {"bogus": 1.0}}"#;
        assert!(matches!(EvidenceContext::from_json(json), Err(ScoringError::Configuration(_))));
    }

    #[test]
    fn test_empty_conservation_becomes_unknown() {
        let ctx = EvidenceContext::builder().conservation(None, None).build().unwrap();
        assert!(ctx.conservation().known().is_none());
    }
}
