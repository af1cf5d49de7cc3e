//! MECHANISM: DOMINANT NEGATIVE
//!
//! Scores how likely the mutant protein is to actively interfere with the
//! wild-type copy, typically by entering and poisoning its complex.
//!
//! **Sub-scores** (default weights 0.3 / 0.2 / 0.3 / 0.2):
//!   1. complex_poisoning - structural neighbourhood when a model is
//!      available (exposure, interface clustering, pLDDT, Grantham severity);
//!      sequence-only heuristics otherwise
//!   2. competitive_binding - charge/size change, stronger near the termini
//!   3. interference - historically disruptive substitution pairs plus
//!      proline/cysteine bonuses
//!   4. known_hotspot - literal match against published DN substitutions
//!
//! **Final score** = base × stoichiometry poison factor × conservation ×
//! population frequency. The poison factor is what lets complex multiplicity amplify
//! interface damage without naming any gene.

use serde::Serialize;

use crate::amplifiers::{dn_conservation_amplifier, FrequencyAssessment};
use crate::evidence::EvidenceContext;
use crate::mechanisms::dn_pathways::{profile_pathways, DnPathwayProfile};
use crate::types::{AmplifierResult, Feature, Mechanism, MechanismScore, Variant};
use crate::utils::motifs::{in_collagen_repeat, in_internal_repeat};
use crate::utils::{delta, grantham, grantham_severity};

/// Substitution pairs with a track record of dominant interference
pub const INTERFERENCE_PAIRS: [((char, char), f64); 6] = [
    (('R', 'H'), 0.6),
    (('R', 'W'), 0.7),
    (('G', 'S'), 0.5),
    (('G', 'R'), 0.8),
    (('I', 'R'), 0.6),
    (('H', 'Y'), 0.4),
];

/// Published dominant-negative substitutions
pub const KNOWN_DN_HOTSPOTS: [(&str, f64); 6] = [
    ("R175H", 0.9),
    ("R248W", 0.9),
    ("R273H", 0.9),
    ("R282W", 0.8),
    ("G349S", 0.8),
    ("G415S", 0.8),
];

/// Result of the DN calculation
#[derive(Debug, Clone, Serialize)]
pub struct DnResult {
    pub score: MechanismScore,
    pub complex_poisoning: f64,
    pub competitive_binding: f64,
    pub interference: f64,
    pub known_hotspot: f64,
    pub structure_path: bool,
    pub collagen_like: bool,
    pub poison_factor: f64,
    pub pathways: DnPathwayProfile,
    pub dn_mechanism: &'static str,
}

/// Complex poisoning from the structure model; `None` when unusable
fn structural_poisoning(variant: &Variant, ctx: &EvidenceContext) -> Option<(f64, Vec<Feature>)> {
    let model = ctx.structure()?;
    let neighbourhood = model.neighbourhood(variant.position)?;
    let plddt = model.plddt(variant.position)?;

    let exposure = match neighbourhood.within_8a {
        n if n < 15 => 0.3,
        n if n < 25 => 0.2,
        _ => 0.1,
    };
    let (charged, hydrophobic) = (neighbourhood.charged_within_12a, neighbourhood.hydrophobic_within_12a);
    let interface = if charged > 3 || hydrophobic > 4 {
        0.4
    } else if charged > 1 || hydrophobic > 2 {
        0.2
    } else {
        0.0
    };
    let confidence_gate = match plddt {
        p if p > 90.0 => 0.3,
        p if p > 70.0 => 0.2,
        p if p > 50.0 => 0.1,
        _ => 0.0,
    };
    let severity = grantham_severity(grantham(variant.reference, variant.alternate));

    let notes = vec![
        Feature::note("surface_exposure", exposure),
        Feature::note("interface_clustering", interface),
        Feature::note("plddt", plddt),
        Feature::note("grantham_severity", severity),
    ];
    Some((f64::min(exposure + interface + confidence_gate + severity, 1.0), notes))
}

/// Sequence-only complex poisoning
fn sequence_poisoning(variant: &Variant, sequence: &str, ctx: &EvidenceContext) -> (f64, bool, Vec<Feature>) {
    let d = delta(variant.reference, variant.alternate);
    let mut notes = Vec::new();
    let mut score = if d.charge_class_flip { 0.2 } else { 0.1 };

    let collagen = variant.reference == 'G' && in_collagen_repeat(sequence, variant.position);
    if collagen {
        score += 0.8;
        notes.push(Feature::note("collagen_gly_xy", 1.0));
    }
    if in_internal_repeat(sequence, variant.position) {
        score += 0.3;
        notes.push(Feature::note("internal_repeat", 1.0));
    }
    let hints = ctx.structural();
    if let Some(likelihood) = hints.interface_likelihood {
        score += 0.4 * likelihood;
        notes.push(Feature::note("interface_likelihood", likelihood));
    }
    if hints.flexible_loop {
        score -= 0.1;
        notes.push(Feature::note("flexible_loop", 1.0));
    }
    (score.clamp(0.0, 1.0), collagen, notes)
}

pub fn competitive_binding(variant: &Variant, sequence_len: usize) -> f64 {
    let d = delta(variant.reference, variant.alternate);
    let mut score = 0.0;
    if d.abs_charge_change > 0.5 {
        score += 0.4;
    }
    if d.abs_size_change > 2.0 {
        score += 0.3;
    }
    let third = sequence_len as f64 / 3.0;
    let pos = variant.position as f64;
    if sequence_len > 0 && (pos <= third || pos > 2.0 * third) {
        score *= 1.2;
    }
    f64::min(score, 1.0)
}

pub fn interference(reference: char, alternate: char) -> f64 {
    let mut score = INTERFERENCE_PAIRS
        .iter()
        .find(|((r, a), _)| *r == reference && *a == alternate)
        .map_or(0.0, |&(_, s)| s);
    let d = delta(reference, alternate);
    if d.proline_introduced {
        score += 0.3;
    }
    if d.involves_cysteine() {
        score += 0.4;
    }
    f64::min(score, 1.0)
}

pub fn known_hotspot(variant: &Variant) -> f64 {
    let substitution = variant.substitution();
    KNOWN_DN_HOTSPOTS
        .iter()
        .find(|(s, _)| *s == substitution)
        .map_or(0.0, |&(_, score)| score)
}

fn classify(sub_scores: [(&'static str, f64); 4]) -> &'static str {
    sub_scores
        .iter()
        .filter(|(_, s)| *s > 0.5)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map_or("weak_dn_potential", |(name, _)| *name)
}

/// Calculate the DN mechanism score
///
/// `sequence_mismatch` forces the sequence-only poisoning path: a structure
/// model built for a different isoform cannot be trusted at this position.
pub fn calculate_dn(
    variant: &Variant,
    sequence: &str,
    ctx: &EvidenceContext,
    poison: &AmplifierResult,
    frequency: &FrequencyAssessment,
    sequence_mismatch: bool,
) -> DnResult {
    let structural = if sequence_mismatch { None } else { structural_poisoning(variant, ctx) };
    let structure_path = structural.is_some();
    let (complex, collagen_like, poisoning_notes) = match structural {
        Some((score, notes)) => (score, false, notes),
        None => sequence_poisoning(variant, sequence, ctx),
    };
    // Collagen Gly-X-Y is flagged whichever path scored the poisoning
    let collagen_like =
        collagen_like || (variant.reference == 'G' && in_collagen_repeat(sequence, variant.position));

    let competitive = competitive_binding(variant, sequence.len());
    let interfering = interference(variant.reference, variant.alternate);
    let hotspot = known_hotspot(variant);

    let key = Mechanism::Dn.key();
    let conservation_amp = dn_conservation_amplifier(ctx.conservation());
    let frequency_amp = frequency.amplifier();

    let mut features = vec![
        Feature::term("complex_poisoning", complex, ctx.weight(key, "complex_poisoning", 0.3)),
        Feature::term("competitive_binding", competitive, ctx.weight(key, "competitive_binding", 0.2)),
        Feature::term("interference", interfering, ctx.weight(key, "interference", 0.3)),
        Feature::term("known_hotspot", hotspot, ctx.weight(key, "known_hotspot", 0.2)),
        poison.as_feature("stoichiometry_poison"),
        conservation_amp.as_feature("conservation_boost"),
        frequency_amp.as_feature("population_frequency"),
        Feature::note(if structure_path { "structure_path" } else { "sequence_path" }, 1.0),
    ];
    features.extend(poisoning_notes);
    for amp in [poison, &conservation_amp, &frequency_amp] {
        features.extend(amp.features.iter().cloned());
    }
    if sequence_mismatch {
        features.push(Feature::note("sequence_mismatch", 1.0));
    }

    let mut confidence = 0.5;
    if hotspot > 0.0 {
        confidence += 0.3;
    }
    if collagen_like {
        confidence += 0.2;
    }
    confidence -= conservation_amp.confidence_penalty() + frequency_amp.confidence_penalty();
    if sequence_mismatch {
        confidence -= 0.1;
    }

    let pathways = profile_pathways(variant, sequence, ctx, poison.multiplier);
    let dn_mechanism = classify([
        ("complex_poisoning", complex),
        ("competitive_binding", competitive),
        ("dominant_interference", interfering),
        ("known_dn_hotspot", hotspot),
    ]);

    let mut score = MechanismScore::from_features(Mechanism::Dn, features, String::new(), confidence)
        .with_sequence_mismatch(sequence_mismatch);
    score.explanation = format!(
        "DN {:.2}: {} via {} (poison ×{:.2}, {})",
        score.raw_score,
        dn_mechanism,
        pathways.top_pathway().unwrap_or("no dominant pathway"),
        poison.multiplier,
        poison.note
    );

    DnResult {
        score,
        complex_poisoning: complex,
        competitive_binding: competitive,
        interference: interfering,
        known_hotspot: hotspot,
        structure_path,
        collagen_like,
        poison_factor: poison.multiplier,
        pathways,
        dn_mechanism,
    }
}
