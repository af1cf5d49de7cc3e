//! MECHANISM: LOSS OF FUNCTION
//!
//! Scores how likely a substitution is to leave the protein non-functional.
//!
//! **Axes** (default weights 0.3 / 0.3 / 0.2 / 0.2):
//!   1. stability_impact - Grantham severity tier plus flat bonuses when
//!      proline, glycine or cysteine is involved
//!   2. conservation_class - how critical the reference residue type is
//!   3. structural_impact - change in backbone rigidity, weighted by how
//!      central the position sits in the chain
//!   4. functional_impact - loss of Cys / Pro / Gly
//!
//! **Final score** = base × domain context × conservation × population
//! frequency. It is deliberately uncapped: severe evidence compounds past 1.0.

use serde::Serialize;

use crate::amplifiers::{conservation_amplifier, DomainContext, FrequencyAssessment};
use crate::evidence::EvidenceContext;
use crate::types::{Feature, Mechanism, MechanismScore, Variant};
use crate::utils::{delta, grantham, grantham_severity, properties, ConservationTier};

const PROLINE_BONUS: f64 = 0.2;
const GLYCINE_BONUS: f64 = 0.15;
const CYSTEINE_BONUS: f64 = 0.2;

/// Dominant way the substitution breaks the protein
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LofMechanism {
    ProteinInstability,
    CriticalResidueLoss,
    StructuralDisruption,
    MildFunctionalImpact,
}

impl LofMechanism {
    pub fn as_str(self) -> &'static str {
        match self {
            LofMechanism::ProteinInstability => "protein_instability",
            LofMechanism::CriticalResidueLoss => "critical_residue_loss",
            LofMechanism::StructuralDisruption => "structural_disruption",
            LofMechanism::MildFunctionalImpact => "mild_functional_impact",
        }
    }
}

/// Result of the LOF calculation
#[derive(Debug, Clone, Serialize)]
pub struct LofResult {
    pub score: MechanismScore,
    pub stability_impact: f64,
    pub conservation_class: f64,
    pub structural_impact: f64,
    pub functional_impact: f64,
    pub grantham: u16,
    pub lof_mechanism: LofMechanism,
}

/// Grantham tier plus Pro/Gly/Cys involvement, capped at 1
pub fn stability_impact(reference: char, alternate: char) -> f64 {
    let mut impact = grantham_severity(grantham(reference, alternate));
    let involved = |aa: char| reference == aa || alternate == aa;
    if involved('P') {
        impact += PROLINE_BONUS;
    }
    if involved('G') {
        impact += GLYCINE_BONUS;
    }
    if involved('C') {
        impact += CYSTEINE_BONUS;
    }
    f64::min(impact, 1.0)
}

pub fn conservation_class(reference: char, tier_override: Option<ConservationTier>) -> (ConservationTier, f64) {
    let tier = tier_override
        .or_else(|| properties(reference).map(|p| p.conservation))
        .unwrap_or(ConservationTier::Medium);
    (tier, tier.score())
}

/// 1 at the centre of the chain, 0 at either terminus
pub fn centrality(position: usize, sequence_len: usize) -> f64 {
    if sequence_len == 0 {
        return 0.5;
    }
    let half = sequence_len as f64 / 2.0;
    (1.0 - (position as f64 - half).abs() / half).clamp(0.0, 1.0)
}

pub fn structural_impact(reference: char, alternate: char, position: usize, sequence_len: usize) -> f64 {
    let change = delta(reference, alternate).abs_flexibility_change;
    let raw = match change {
        c if c > 2 => 0.3,
        c if c > 1 => 0.1,
        _ => 0.0,
    };
    raw * (0.5 + 0.5 * centrality(position, sequence_len))
}

pub fn functional_impact(reference: char, alternate: char) -> f64 {
    let d = delta(reference, alternate);
    let mut impact = 0.0;
    if d.cysteine_lost {
        impact += 0.5;
    }
    if d.proline_lost {
        impact += 0.3;
    }
    if d.glycine_lost {
        impact += 0.4;
    }
    f64::min(impact, 1.0)
}

fn classify(stability: f64, conservation: f64, structural: f64) -> LofMechanism {
    if stability > 0.5 {
        LofMechanism::ProteinInstability
    } else if conservation > 0.7 {
        LofMechanism::CriticalResidueLoss
    } else if structural > 0.5 {
        LofMechanism::StructuralDisruption
    } else {
        LofMechanism::MildFunctionalImpact
    }
}

/// Calculate the LOF mechanism score
pub fn calculate_lof(
    variant: &Variant,
    sequence: &str,
    ctx: &EvidenceContext,
    domain: &DomainContext,
    frequency: &FrequencyAssessment,
) -> LofResult {
    let (r, a) = (variant.reference, variant.alternate);
    let g = grantham(r, a);

    let stability = stability_impact(r, a);
    let (tier, conservation) = conservation_class(r, ctx.structural().conservation_tier);
    let structural = structural_impact(r, a, variant.position, sequence.len());
    let functional = functional_impact(r, a);

    let key = Mechanism::Lof.key();
    let conservation_amp = conservation_amplifier(ctx.conservation());
    let frequency_amp = frequency.amplifier();

    let mut features = vec![
        Feature::term("stability_impact", stability, ctx.weight(key, "stability_impact", 0.3)),
        Feature::term("conservation_class", conservation, ctx.weight(key, "conservation_class", 0.3)),
        Feature::term("structural_impact", structural, ctx.weight(key, "structural_impact", 0.2)),
        Feature::term("functional_impact", functional, ctx.weight(key, "functional_impact", 0.2)),
        domain.amplifier.as_feature("domain_context"),
        conservation_amp.as_feature("conservation"),
        frequency_amp.as_feature("population_frequency"),
        Feature::note("grantham_distance", g as f64),
    ];
    for amp in [&domain.amplifier, &conservation_amp, &frequency_amp] {
        features.extend(amp.features.iter().cloned());
    }

    let mut confidence = 0.6;
    if tier.is_high_or_critical() {
        confidence += 0.2;
    }
    if matches!(r, 'C' | 'P' | 'G') {
        confidence += 0.1;
    }
    confidence += domain.confidence_boost;
    confidence -= conservation_amp.confidence_penalty() + frequency_amp.confidence_penalty();

    let lof_mechanism = classify(stability, conservation, structural);
    let mut score = MechanismScore::from_features(Mechanism::Lof, features, String::new(), confidence);
    score.explanation = format!(
        "LOF {:.2}: {} ({}{}{}, Grantham {}; {})",
        score.raw_score,
        lof_mechanism.as_str(),
        r,
        variant.position,
        a,
        g,
        domain.amplifier.note
    );

    LofResult {
        score,
        stability_impact: stability,
        conservation_class: conservation,
        structural_impact: structural,
        functional_impact: functional,
        grantham: g,
        lof_mechanism,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplifiers::{assess, domain_context};
    use crate::evidence::StructuralHints;
    use approx::assert_relative_eq;

    fn neutral_domain() -> DomainContext {
        domain_context::evaluate(&[], 1, &[])
    }

    fn seq(len: usize) -> String {
        "A".repeat(len)
    }

    #[test]
    fn test_stability_impact_tiers_and_bonuses() {
        // C-W: 215 -> 0.6 + cysteine 0.2
        assert_relative_eq!(stability_impact('C', 'W'), 0.8, epsilon = 1e-9);
        // V-I: 29 -> 0.1
        assert_relative_eq!(stability_impact('V', 'I'), 0.1, epsilon = 1e-9);
        // G-P: 42 -> 0.1 + 0.2 + 0.15
        assert_relative_eq!(stability_impact('G', 'P'), 0.45, epsilon = 1e-9);
    }

    #[test]
    fn test_centrality() {
        assert_relative_eq!(centrality(50, 100), 1.0);
        assert_relative_eq!(centrality(100, 100), 0.0);
        assert_relative_eq!(centrality(25, 100), 0.5);
    }

    #[test]
    fn test_functional_impact() {
        assert_relative_eq!(functional_impact('C', 'S'), 0.5);
        assert_relative_eq!(functional_impact('G', 'R'), 0.4);
        assert_relative_eq!(functional_impact('A', 'V'), 0.0);
    }

    #[test]
    fn test_cysteine_loss_outscores_conservative_change() {
        let hints = StructuralHints { conservation_tier: Some(ConservationTier::Critical), ..Default::default() };
        let ctx = EvidenceContext::builder().structural(hints).build().unwrap();
        let freq = assess(None);
        let s = seq(200);

        let severe = Variant::new("G1", 100, 'C', 'Y').unwrap();
        let mild = Variant::new("G1", 100, 'V', 'I').unwrap();
        let severe = calculate_lof(&severe, &s, &ctx, &neutral_domain(), &freq);
        let mild = calculate_lof(&mild, &s, &ctx, &neutral_domain(), &freq);
        assert!(severe.score.raw_score > mild.score.raw_score);
    }

    #[test]
    fn test_base_reconstructs_from_features() {
        let ctx = EvidenceContext::builder()
            .conservation(Some(6.0), Some(0.95))
            .allele_frequency(0.00001)
            .weight("lof.structural_impact", 0.35)
            .build()
            .unwrap();
        let v = Variant::new("G1", 40, 'G', 'R').unwrap();
        let r = calculate_lof(&v, &seq(80), &ctx, &neutral_domain(), &assess(Some(0.00001)));

        let expected_base = 0.3 * r.stability_impact
            + 0.3 * r.conservation_class
            + 0.35 * r.structural_impact
            + 0.2 * r.functional_impact;
        assert_relative_eq!(r.score.base_score, expected_base, epsilon = 1e-12);
        assert_relative_eq!(r.score.reconstruct_base(), r.score.base_score, epsilon = 1e-12);
        assert_relative_eq!(r.score.reconstruct_raw(), r.score.raw_score, epsilon = 1e-12);
        // conservation 1.5 (combined 0.74), ultra rare 1.5
        assert_relative_eq!(r.score.raw_score, expected_base * 1.5 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_evidence_lowers_confidence() {
        let v = Variant::new("G1", 10, 'C', 'Y').unwrap();
        let known = EvidenceContext::builder().conservation(Some(3.0), None).build().unwrap();
        let unknown = EvidenceContext::builder().build().unwrap();
        let with = calculate_lof(&v, &seq(20), &known, &neutral_domain(), &assess(Some(0.001)));
        let without = calculate_lof(&v, &seq(20), &unknown, &neutral_domain(), &assess(None));
        assert!(without.score.confidence < with.score.confidence);
        assert!(without.score.feature("conservation_unavailable").is_some());
        assert!(without.score.feature("population_frequency_unavailable").is_some());
        assert_relative_eq!(with.score.confidence, 0.9);
    }

    #[test]
    fn test_score_is_uncapped() {
        let hints = StructuralHints { conservation_tier: Some(ConservationTier::Critical), ..Default::default() };
        let ctx = EvidenceContext::builder()
            .structural(hints)
            .conservation(Some(20.0), Some(1.0))
            .build()
            .unwrap();
        let hits = vec![crate::utils::motifs::MotifHit { name: "dfg_motif", weight: 1.6, start: 48, end: 50 }];
        let domain = domain_context::evaluate(&hits, 50, &[]);
        let v = Variant::new("G1", 50, 'C', 'W').unwrap();
        let r = calculate_lof(&v, &seq(100), &ctx, &domain, &assess(Some(0.00001)));
        assert!(r.score.raw_score > 1.0);
        assert_relative_eq!(r.score.normalized_score, 1.0);
        assert_eq!(r.lof_mechanism, LofMechanism::ProteinInstability);
    }
}
