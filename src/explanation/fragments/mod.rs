pub mod dn_fragment;
pub mod evidence_fragment;
pub mod gof_fragment;
pub mod lof_fragment;

pub use dn_fragment::generate_dn_fragment;
pub use evidence_fragment::generate_evidence_warnings;
pub use gof_fragment::generate_gof_fragment;
pub use lof_fragment::generate_lof_fragment;

use crate::types::{FeatureKind, MechanismScore};

/// Largest positive term contributions, formatted "name (+0.21)"
pub(crate) fn top_drivers(score: &MechanismScore, n: usize) -> Vec<String> {
    let mut terms: Vec<_> = score
        .features
        .iter()
        .filter(|f| f.kind == FeatureKind::Term && f.contribution() > 0.0)
        .collect();
    terms.sort_by(|a, b| b.contribution().total_cmp(&a.contribution()));
    terms
        .into_iter()
        .take(n)
        .map(|f| format!("{} (+{:.2})", f.name, f.contribution()))
        .collect()
}
