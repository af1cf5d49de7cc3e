use crate::explanation::fragments::top_drivers;
use crate::explanation::types::{EvidenceCard, MechanismFragment};
use crate::mechanisms::DnResult;

const REPORT_THRESHOLD: f64 = 0.4;

/// Generate rationale fragment for the DN mechanism
pub fn generate_dn_fragment(dn: &DnResult) -> MechanismFragment {
    let score = &dn.score;
    if score.normalized_score < REPORT_THRESHOLD {
        return MechanismFragment::empty();
    }

    let (title, detail) = match dn.dn_mechanism {
        "complex_poisoning" => (
            "Complex poisoning",
            "The mutant subunit can still assemble with wild-type partners but is likely to disable the complex it joins.",
        ),
        "competitive_binding" => (
            "Competitive binding",
            "A charge or size change in a terminal binding region may let the mutant occupy partner sites without productive function.",
        ),
        "dominant_interference" => (
            "Dominant interference",
            "This substitution class has a track record of interfering with the wild-type protein.",
        ),
        "known_dn_hotspot" => (
            "Known dominant-negative substitution",
            "The exact substitution is a published dominant-negative variant.",
        ),
        _ => (
            "Dominant-negative potential",
            "Several weak signals combine into a dominant-negative profile.",
        ),
    };

    let pathway = dn.pathways.top_pathway().unwrap_or("none");
    let mut detail = detail.to_string();
    if dn.poison_factor > 1.0 {
        detail.push_str(&format!(
            " Expected subunit stoichiometry amplifies the effect ×{:.2}.",
            dn.poison_factor
        ));
    }
    if dn.collagen_like {
        detail.push_str(" The position lies in a Gly-X-Y collagen repeat.");
    }

    MechanismFragment::with_evidence(EvidenceCard {
        evidence_type: dn.dn_mechanism.to_string(),
        mechanism: "DN".to_string(),
        title: title.to_string(),
        message: format!(
            "DN {:.2} via {} ({} path, leading pathway: {})",
            score.normalized_score,
            dn.dn_mechanism,
            if dn.structure_path { "structure" } else { "sequence" },
            pathway
        ),
        detail,
        drivers: top_drivers(score, 3),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplifiers::{assess, StoichiometryEvidenceFuser};
    use crate::evidence::EvidenceContext;
    use crate::mechanisms::calculate_dn;
    use crate::types::Variant;

    #[test]
    fn test_hotspot_in_tetramer_gets_card() {
        let seq = format!("{}R{}", "A".repeat(174), "A".repeat(218));
        let ctx = EvidenceContext::builder().subunits(4).build().unwrap();
        let variant = Variant::new("TP53", 175, 'R', 'H').unwrap();
        let poison = StoichiometryEvidenceFuser::default().poison_factor(&seq, &ctx);
        let dn = calculate_dn(&variant, &seq, &ctx, &poison, &assess(Some(0.00001)), false);

        let card = generate_dn_fragment(&dn).evidence.unwrap();
        assert_eq!(card.mechanism, "DN");
        assert!(card.detail.contains("×"));
    }

    #[test]
    fn test_weak_dn_no_card() {
        let seq = "A".repeat(100);
        let ctx = EvidenceContext::builder().build().unwrap();
        let variant = Variant::new("G", 50, 'A', 'S').unwrap();
        let poison = StoichiometryEvidenceFuser::default().poison_factor(&seq, &ctx);
        let dn = calculate_dn(&variant, &seq, &ctx, &poison, &assess(None), false);
        assert!(generate_dn_fragment(&dn).evidence.is_none());
    }
}
