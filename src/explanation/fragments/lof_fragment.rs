use crate::explanation::fragments::top_drivers;
use crate::explanation::types::{EvidenceCard, MechanismFragment};
use crate::mechanisms::{LofMechanism, LofResult};

/// Scores below this carry no LOF card
const REPORT_THRESHOLD: f64 = 0.4;

/// Generate rationale fragment for the LOF mechanism
///
/// Only a score at or above the integration threshold earns an evidence
/// card; weaker LOF signals stay in the mechanism table.
pub fn generate_lof_fragment(lof: &LofResult) -> MechanismFragment {
    let score = &lof.score;
    if score.normalized_score < REPORT_THRESHOLD {
        return MechanismFragment::empty();
    }

    let (title, detail) = match lof.lof_mechanism {
        LofMechanism::ProteinInstability => (
            "Protein destabilization",
            "The substitution swaps residues with very different size, charge or hydropathy. Folding energy is likely reduced, lowering the amount of functional protein.",
        ),
        LofMechanism::CriticalResidueLoss => (
            "Loss of a critical residue",
            "The reference residue belongs to a class that is rarely tolerated at functional sites (glycine, proline, cysteine or tryptophan).",
        ),
        LofMechanism::StructuralDisruption => (
            "Structural disruption",
            "The change in backbone flexibility near the core of the protein is likely to distort the local fold.",
        ),
        LofMechanism::MildFunctionalImpact => (
            "Functional impairment",
            "No single dominant structural effect, but the combined physicochemical change is large enough to impair function.",
        ),
    };

    MechanismFragment::with_evidence(EvidenceCard {
        evidence_type: lof.lof_mechanism.as_str().to_string(),
        mechanism: "LOF".to_string(),
        title: title.to_string(),
        message: format!(
            "LOF {:.2} (Grantham {}, stability impact {:.2})",
            score.normalized_score, lof.grantham, lof.stability_impact
        ),
        detail: detail.to_string(),
        drivers: top_drivers(score, 3),
    })
}
