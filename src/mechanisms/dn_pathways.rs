//! Dominant-negative pathway profile
//!
//! Breaks the DN picture into four named routes so the rationale can say
//! *how* a mutant might poison its partners. Each pathway is a weighted sum
//! of binary or [0, 1] features floored at zero; only interface poisoning is
//! amplified by the stoichiometry poison factor.
//!
//! The profile is explanatory. It does not feed the DN mechanism score.

use serde::Serialize;

use crate::evidence::EvidenceContext;
use crate::types::{Feature, Variant};
use crate::utils::delta;
use crate::utils::motifs::{
    coiled_coil_near, in_collagen_repeat, motifs_near, scan_catalytic_motifs, sequon_change, SequonChange,
};

const POLAR: &str = "STNQDEKRH";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathwayScore {
    pub pathway: &'static str,
    pub score: f64,
    pub features: Vec<Feature>,
}

impl PathwayScore {
    fn from_features(pathway: &'static str, features: Vec<Feature>, amplifier: f64) -> Self {
        let base: f64 = features.iter().map(Feature::contribution).sum();
        Self { pathway, score: (base * amplifier).max(0.0), features }
    }

    /// Names of the two heaviest features
    pub fn drivers(&self) -> Vec<&str> {
        let mut sorted: Vec<&Feature> = self.features.iter().collect();
        sorted.sort_by(|a, b| b.weight.abs().partial_cmp(&a.weight.abs()).unwrap_or(std::cmp::Ordering::Equal));
        sorted.iter().take(2).map(|f| f.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DnPathwayProfile {
    pub interface_poisoning: PathwayScore,
    pub active_site_jamming: PathwayScore,
    pub lattice_disruption: PathwayScore,
    pub trafficking_maturation: PathwayScore,
}

impl DnPathwayProfile {
    pub fn all(&self) -> [&PathwayScore; 4] {
        [
            &self.interface_poisoning,
            &self.active_site_jamming,
            &self.lattice_disruption,
            &self.trafficking_maturation,
        ]
    }

    /// Highest-scoring pathway with a non-zero score
    pub fn top_pathway(&self) -> Option<&'static str> {
        self.all()
            .into_iter()
            .filter(|p| p.score > 0.0)
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
            .map(|p| p.pathway)
    }
}

fn interface_poisoning(variant: &Variant, ctx: &EvidenceContext, poison: f64) -> PathwayScore {
    const G: &str = "interface_poisoning";
    let d = delta(variant.reference, variant.alternate);
    let hints = ctx.structural();
    let mut f = Vec::new();

    if let Some(likelihood) = hints.interface_likelihood.filter(|l| *l > 0.0) {
        f.push(Feature::term("interface_likelihood", likelihood, ctx.weight(G, "interface_likelihood", 0.4)));
    }
    f.push(Feature::term("charge_change", d.abs_charge_change, ctx.weight(G, "charge_change", 0.25)));
    f.push(Feature::term("hydropathy_change", d.abs_hydropathy_change, ctx.weight(G, "hydropathy_change", 0.2)));
    if d.proline_introduced {
        f.push(Feature::term("proline_introduced", 1.0, ctx.weight(G, "proline_introduced", 0.25)));
    }
    if d.involves_cysteine() {
        f.push(Feature::term("cysteine_change", 1.0, ctx.weight(G, "cysteine_change", 0.2)));
    }
    if hints.flexible_loop {
        f.push(Feature::term("flexible_loop", 1.0, ctx.weight(G, "flexible_loop", -0.1)));
    }
    PathwayScore::from_features(G, f, poison)
}

fn active_site_jamming(variant: &Variant, sequence: &str, ctx: &EvidenceContext) -> PathwayScore {
    const G: &str = "active_site_jamming";
    let d = delta(variant.reference, variant.alternate);
    let hints = ctx.structural();
    let mut f = Vec::new();

    if let Some(proximity) = hints.active_site_proximity.filter(|p| *p > 0.0) {
        f.push(Feature::term("active_site_proximity", proximity, ctx.weight(G, "active_site_proximity", 0.4)));
    }
    let hits = scan_catalytic_motifs(&sequence.to_ascii_uppercase());
    if !motifs_near(&hits, variant.position).is_empty() {
        f.push(Feature::term("catalytic_motif", 1.0, ctx.weight(G, "catalytic_motif", 0.3)));
    }
    f.push(Feature::term("volume_change", d.abs_volume_change, ctx.weight(G, "volume_change", 0.2)));
    if d.aromatic_change() {
        f.push(Feature::term("aromatic_swap", 1.0, ctx.weight(G, "aromatic_swap", 0.15)));
    }
    if d.proline_introduced {
        f.push(Feature::term("proline_introduced", 1.0, ctx.weight(G, "proline_introduced", 0.25)));
    }
    // Solvent-exposed or disulfide-rich secretory context favours other routes
    if hints.flexible_loop {
        f.push(Feature::term("flexible_loop", 1.0, ctx.weight(G, "flexible_loop", -0.1)));
    }
    if hints.in_disulfide {
        f.push(Feature::term("in_disulfide", 1.0, ctx.weight(G, "in_disulfide", -0.25)));
    }
    if hints.secretory {
        f.push(Feature::term("secretory", 1.0, ctx.weight(G, "secretory", -0.05)));
    }
    PathwayScore::from_features(G, f, 1.0)
}

fn lattice_disruption(variant: &Variant, sequence: &str, ctx: &EvidenceContext) -> PathwayScore {
    const G: &str = "lattice_disruption";
    let mut f = Vec::new();

    if variant.reference == 'G' && in_collagen_repeat(sequence, variant.position) {
        f.push(Feature::term("collagen_glycine", 1.0, ctx.weight(G, "collagen_glycine", 0.6)));
    }
    if coiled_coil_near(sequence, variant.position) || ctx.stoichiometry().coiled_coil_near {
        f.push(Feature::term("coiled_coil", 1.0, ctx.weight(G, "coiled_coil", 0.25)));
    }
    if delta(variant.reference, variant.alternate).proline_introduced {
        f.push(Feature::term("proline_introduced", 1.0, ctx.weight(G, "proline_introduced", 0.25)));
    }
    PathwayScore::from_features(G, f, 1.0)
}

fn trafficking_maturation(variant: &Variant, sequence: &str, ctx: &EvidenceContext) -> PathwayScore {
    const G: &str = "trafficking_maturation";
    let d = delta(variant.reference, variant.alternate);
    let mut f = Vec::new();

    if d.involves_cysteine() {
        f.push(Feature::term("disulfide_cysteine", 1.0, ctx.weight(G, "disulfide_cysteine", 0.5)));
    }
    match sequon_change(sequence, variant.position, variant.alternate) {
        SequonChange::Gained => f.push(Feature::term("sequon_gained", 1.0, ctx.weight(G, "sequon_gained", 0.3))),
        SequonChange::Lost => f.push(Feature::term("sequon_lost", 1.0, ctx.weight(G, "sequon_lost", 0.25))),
        SequonChange::Unchanged => {}
    }
    if ctx.structural().in_disulfide {
        f.push(Feature::term("in_disulfide", 1.0, ctx.weight(G, "in_disulfide", 0.2)));
        if matches!(variant.reference, 'F' | 'W' | 'Y') && POLAR.contains(variant.alternate) {
            f.push(Feature::term("aromatic_to_polar", 1.0, ctx.weight(G, "aromatic_to_polar", 0.25)));
        }
    }
    PathwayScore::from_features(G, f, 1.0)
}

pub fn profile_pathways(variant: &Variant, sequence: &str, ctx: &EvidenceContext, poison: f64) -> DnPathwayProfile {
    DnPathwayProfile {
        interface_poisoning: interface_poisoning(variant, ctx, poison),
        active_site_jamming: active_site_jamming(variant, sequence, ctx),
        lattice_disruption: lattice_disruption(variant, sequence, ctx),
        trafficking_maturation: trafficking_maturation(variant, sequence, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::StructuralHints;
    use approx::assert_relative_eq;

    fn ctx() -> EvidenceContext {
        EvidenceContext::builder().build().unwrap()
    }

    #[test]
    fn test_collagen_glycine_prefers_lattice() {
        let seq = "GPPGPPGPPGPPGPPGPPGPPGPP";
        let v = Variant::new("COL1A1", 10, 'G', 'S').unwrap();
        let profile = profile_pathways(&v, seq, &ctx(), 1.0);
        assert_relative_eq!(profile.lattice_disruption.score, 0.6);
        assert_eq!(profile.top_pathway(), Some("lattice_disruption"));
    }

    #[test]
    fn test_interface_poisoning_scales_with_poison() {
        let v = Variant::new("G", 20, 'E', 'K').unwrap();
        let seq = "A".repeat(40);
        let one = profile_pathways(&v, &seq, &ctx(), 1.0);
        let four = profile_pathways(&v, &seq, &ctx(), 6.0);
        // charge 2.0 × 0.25 + hydropathy 0.4/9 × 0.2
        assert_relative_eq!(one.interface_poisoning.score, 0.5 + 0.4 / 9.0 * 0.2, epsilon = 1e-9);
        assert_relative_eq!(four.interface_poisoning.score, one.interface_poisoning.score * 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_disulfide_context_routes_to_trafficking() {
        let hints = StructuralHints { in_disulfide: true, secretory: true, ..Default::default() };
        let ctx = EvidenceContext::builder().structural(hints).build().unwrap();
        let v = Variant::new("FBN1", 10, 'C', 'Y').unwrap();
        let seq = "A".repeat(20);
        let profile = profile_pathways(&v, &seq, &ctx, 1.0);
        assert_relative_eq!(profile.trafficking_maturation.score, 0.7, epsilon = 1e-9);
        assert_eq!(profile.top_pathway(), Some("trafficking_maturation"));
        assert_eq!(profile.trafficking_maturation.drivers()[0], "disulfide_cysteine");
    }

    #[test]
    fn test_pathways_never_negative() {
        let hints = StructuralHints { in_disulfide: true, flexible_loop: true, ..Default::default() };
        let ctx = EvidenceContext::builder().structural(hints).build().unwrap();
        let v = Variant::new("G", 5, 'V', 'I').unwrap();
        let profile = profile_pathways(&v, &"A".repeat(10), &ctx, 1.0);
        assert!(profile.all().iter().all(|p| p.score >= 0.0));
    }
}
