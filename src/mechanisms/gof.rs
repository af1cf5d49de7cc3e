//! MECHANISM: GAIN OF FUNCTION
//!
//! Thin wrapper that prepares the gate input (signals, phyloP multiplier,
//! weights), runs the [`GofGateController`] and turns the outcome into a
//! feature-backed [`MechanismScore`].
//!
//! A Gate-1 exit carries notes only, so its score is exactly zero. Later
//! exits carry one term per named mechanism plus the regulatory boost as a
//! multiplier; the normalized score equals the controller's capped score.

use serde::Serialize;

use crate::amplifiers::gof_amplifier;
use crate::evidence::EvidenceContext;
use crate::mechanisms::gof_gates::{
    regulatory_boost, GateInput, GofGate, GofGateController, GofOutcome, Refinement, RegulatorySignals,
    MECHANISM_WEIGHTS,
};
use crate::types::{Feature, Mechanism, MechanismScore, Variant};

const MECHANISM_NAMES: [&str; 4] = [
    "constitutive_activation",
    "increased_binding_affinity",
    "autoinhibition_loss",
    "degradation_resistance",
];

#[derive(Debug, Clone, Serialize)]
pub struct GofResult {
    pub score: MechanismScore,
    pub signals: RegulatorySignals,
    pub outcome: GofOutcome,
}

pub fn calculate_gof(
    variant: &Variant,
    sequence: &str,
    ctx: &EvidenceContext,
    controller: &GofGateController,
    sequence_mismatch: bool,
) -> GofResult {
    let key = Mechanism::Gof.key();
    let mut weights = MECHANISM_WEIGHTS;
    for (w, name) in weights.iter_mut().zip(MECHANISM_NAMES) {
        *w = ctx.weight(key, name, *w);
    }

    let conservation = gof_amplifier(ctx.conservation());
    let signals = RegulatorySignals::detect(variant, sequence);
    let input = GateInput {
        reference: variant.reference,
        signals,
        conservation_multiplier: conservation.multiplier,
        relative_position: variant.relative_position(sequence.len()),
        sequence_mismatch,
        weights,
    };
    let outcome = controller.run(&input);

    let mut features = Vec::new();
    if let Some(mechanisms) = &outcome.mechanisms {
        for ((name, value), weight) in MECHANISM_NAMES.iter().zip(mechanisms.as_array()).zip(weights) {
            features.push(Feature::term(*name, value, weight));
        }
        features.push(Feature::multiplier("regulatory_boost", regulatory_boost(outcome.gate1_score)));
    }
    let exit = match outcome.exit_gate {
        GofGate::Gate1 => "exit_gate1",
        GofGate::Gate2 => "exit_gate2",
        GofGate::Gate3 => "exit_gate3",
    };
    features.push(Feature::note(exit, outcome.trace.len() as f64));
    features.push(Feature::note("regulatory_disruption", outcome.disruption));
    features.push(Feature::note("gof_conservation_multiplier", conservation.multiplier));
    match outcome.refinement {
        Some(Refinement::EnhancedRegulatory { multiplier }) => {
            features.push(Feature::note("enhanced_regulatory", multiplier))
        }
        Some(Refinement::Structural { multiplier }) => features.push(Feature::note("structural_context", multiplier)),
        None => {}
    }
    features.extend(conservation.features.iter().cloned());
    if sequence_mismatch {
        features.push(Feature::note("sequence_mismatch", 1.0));
    }

    let mut confidence = match outcome.exit_gate {
        GofGate::Gate2 => 0.8,
        GofGate::Gate1 | GofGate::Gate3 => 0.9,
    };
    confidence -= conservation.confidence_penalty();
    if sequence_mismatch {
        confidence -= 0.1;
    }

    let mut score = MechanismScore::from_features(Mechanism::Gof, features, String::new(), confidence)
        .with_sequence_mismatch(sequence_mismatch);
    score.explanation = format!(
        "GOF {:.2}: {} at {:?} ({})",
        score.normalized_score,
        outcome.verdict.as_str(),
        outcome.exit_gate,
        outcome.reason
    );

    GofResult { score, signals, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanisms::gof_gates::GofVerdict;
    use approx::assert_relative_eq;

    #[test]
    fn test_gate1_exit_scores_zero() {
        let ctx = EvidenceContext::builder().conservation(Some(0.1), None).build().unwrap();
        let v = Variant::new("G", 10, 'V', 'I').unwrap();
        let r = calculate_gof(&v, &"A".repeat(20), &ctx, &GofGateController::default(), false);
        assert_eq!(r.outcome.exit_gate, GofGate::Gate1);
        assert_relative_eq!(r.score.raw_score, 0.0);
        assert!(r.score.feature("exit_gate1").is_some());
        assert_relative_eq!(r.score.confidence, 0.9);
    }

    #[test]
    fn test_normalized_score_matches_controller() {
        let ctx = EvidenceContext::builder().conservation(Some(3.0), None).build().unwrap();
        let seq = "AAAAARRASPAAAAAAAAAA";
        let v = Variant::new("G", 9, 'S', 'A').unwrap();
        let r = calculate_gof(&v, seq, &ctx, &GofGateController::default(), false);
        assert_eq!(r.outcome.exit_gate, GofGate::Gate3);
        assert_eq!(r.outcome.verdict, GofVerdict::Likely);
        assert_relative_eq!(r.score.normalized_score, r.outcome.score, epsilon = 1e-12);
        assert_relative_eq!(r.score.reconstruct_raw(), r.score.raw_score, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_conservation_is_neutral_with_penalty() {
        let ctx = EvidenceContext::builder().build().unwrap();
        let v = Variant::new("G", 10, 'A', 'F').unwrap();
        let r = calculate_gof(&v, &"A".repeat(20), &ctx, &GofGateController::default(), false);
        assert_relative_eq!(r.outcome.gate1_score, 0.3);
        assert!(r.score.feature("conservation_unavailable").is_some());
        assert_relative_eq!(r.score.confidence, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_weight_override_reaches_controller() {
        let seq = "AAAAARRASPAAAAAAAAAA";
        let v = Variant::new("G", 9, 'S', 'A').unwrap();
        let ctx = EvidenceContext::builder()
            .conservation(Some(0.0), None)
            .weight("gof.autoinhibition_loss", 0.0)
            .weight("gof.constitutive_activation", 0.1)
            .build()
            .unwrap();
        let r = calculate_gof(&v, seq, &ctx, &GofGateController::default(), false);
        // 0.1 × 0.81 × 1.45 < 0.2
        assert_eq!(r.outcome.exit_gate, GofGate::Gate2);
        assert_relative_eq!(r.score.feature("autoinhibition_loss").map_or(-1.0, |f| f.weight), 0.0);
    }
}
