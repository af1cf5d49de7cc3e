use crate::error::ScoringError;
use crate::explanation::fragments::generate_evidence_warnings;
use crate::explanation::types::*;
use crate::amplifiers::FrequencyAssessment;
use crate::integrator::Integration;
use crate::types::{Mechanism, MechanismScore};

/// Main rationale generator
pub struct RationaleGenerator;

impl RationaleGenerator {
    /// Assemble the rationale from the integration and per-mechanism fragments
    ///
    /// Fragments are produced alongside each mechanism score (in parallel);
    /// this only merges them, adds evidence warnings and writes the summary.
    pub fn generate(
        variant: &str,
        integration: &Integration,
        scores: [&MechanismScore; 3],
        fragments: Vec<MechanismFragment>,
        issues: &[ScoringError],
        frequency: &FrequencyAssessment,
    ) -> Rationale {
        let mut evidence = Vec::new();
        let mut warnings = Vec::new();
        let mut notes = Vec::new();
        for fragment in fragments {
            evidence.extend(fragment.evidence);
            warnings.extend(fragment.warning);
            notes.extend(fragment.note);
        }
        warnings.extend(generate_evidence_warnings(issues, frequency));

        if let Some(before) = integration.bucket_before_veto {
            notes.push(format!(
                "Frequency veto demoted {} to {}",
                before.as_str(),
                integration.bucket.as_str()
            ));
        }
        if evidence.is_empty() {
            notes.push("No mechanism reached the reporting threshold".to_string());
        }

        Rationale {
            summary: Self::generate_summary(variant, integration),
            evidence,
            warnings,
            mechanisms: scores.iter().map(|s| Self::mechanism_card(s)).collect(),
            notes,
        }
    }

    /// Rationale for a request that could not be scored
    pub fn malformed(variant: &str, integration: &Integration, error: &ScoringError) -> Rationale {
        let mut summary = Self::generate_summary(variant, integration);
        summary.message = format!("Not scored: {}", error);
        Rationale {
            summary,
            evidence: Vec::new(),
            warnings: generate_evidence_warnings(std::slice::from_ref(error), &crate::amplifiers::assess(None)),
            mechanisms: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn generate_summary(variant: &str, integration: &Integration) -> SummaryExplanation {
        let message = format!(
            "{}: {} via {} (pathogenicity {:.2}, confidence {:.2}); inheritance {}",
            variant,
            integration.bucket.as_str(),
            integration.classification.as_str(),
            integration.pathogenicity,
            integration.confidence,
            integration.inheritance.as_str()
        );
        SummaryExplanation {
            variant: variant.to_string(),
            classification: integration.classification.as_str().to_string(),
            bucket: integration.bucket.as_str().to_string(),
            pathogenicity: integration.pathogenicity,
            confidence: integration.confidence,
            inheritance: integration.inheritance.as_str().to_string(),
            message,
        }
    }

    fn mechanism_card(score: &MechanismScore) -> MechanismCard {
        let name = match score.mechanism {
            Mechanism::Lof => "Loss of function",
            Mechanism::Dn => "Dominant negative",
            Mechanism::Gof => "Gain of function",
        };
        let interpretation = match score.normalized_score {
            s if s >= 0.7 => "Strong",
            s if s >= 0.4 => "Moderate",
            s if s >= 0.2 => "Weak",
            _ => "Minimal",
        };
        MechanismCard {
            code: score.mechanism.to_string(),
            name: name.to_string(),
            raw: score.raw_score,
            normalized: score.normalized_score,
            confidence: score.confidence,
            interpretation: interpretation.to_string(),
        }
    }
}
