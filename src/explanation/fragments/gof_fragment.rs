use crate::explanation::fragments::top_drivers;
use crate::explanation::types::{EvidenceCard, MechanismFragment, Severity, WarningCard};
use crate::mechanisms::{GofResult, GofVerdict};

/// Generate rationale fragment for the GOF screen
///
/// GOF never changes the LOF/DN classification. A likely verdict adds an
/// evidence card plus a dominant-GOF note; a possible verdict is a warning.
pub fn generate_gof_fragment(gof: &GofResult) -> MechanismFragment {
    let outcome = &gof.outcome;
    let gates = outcome
        .trace
        .iter()
        .map(|g| format!("{:?}", g))
        .collect::<Vec<_>>()
        .join(" → ");

    match outcome.verdict {
        GofVerdict::Likely => MechanismFragment::with_evidence(EvidenceCard {
            evidence_type: "regulatory_gain".to_string(),
            mechanism: "GOF".to_string(),
            title: "Gain of function".to_string(),
            message: format!("GOF {:.2} ({}; gates {})", outcome.score, outcome.verdict.as_str(), gates),
            detail: format!(
                "The substitution disrupts regulatory context ({:.2}) strongly enough to suggest constitutive or enhanced activity: {}.",
                outcome.disruption, outcome.reason
            ),
            drivers: top_drivers(&gof.score, 2),
        })
        .with_note(format!(
            "Dominant gain-of-function suspected (GOF {:.2}); consider autosomal dominant inheritance independent of the LOF/DN classification",
            outcome.score
        )),
        GofVerdict::Possible => MechanismFragment::with_warning(WarningCard {
            warning_type: "possible_gof".to_string(),
            severity: Severity::from_score(outcome.score),
            message: format!("Possible gain of function (GOF {:.2})", outcome.score),
            detail: format!("Passed gates {} but the refined score stayed below 0.6: {}", gates, outcome.reason),
        }),
        GofVerdict::Unlikely => MechanismFragment::empty(),
    }
}
