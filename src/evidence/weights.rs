//! Weight overrides keyed `"<mechanism>.<feature>"`
//!
//! Every key is checked against [`WEIGHT_REGISTRY`] when the evidence context
//! is built. An unknown mechanism, an unknown feature or a non-finite weight
//! is a configuration error; nothing is silently ignored.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{ScoringError, ScoringResult};

/// Known tunable weights, grouped by mechanism (or DN pathway)
pub const WEIGHT_REGISTRY: &[(&str, &[&str])] = &[
    ("lof", &["stability_impact", "conservation_class", "structural_impact", "functional_impact"]),
    ("dn", &["complex_poisoning", "competitive_binding", "interference", "known_hotspot"]),
    (
        "gof",
        &[
            "constitutive_activation",
            "increased_binding_affinity",
            "autoinhibition_loss",
            "degradation_resistance",
        ],
    ),
    (
        "interface_poisoning",
        &[
            "interface_likelihood",
            "charge_change",
            "hydropathy_change",
            "proline_introduced",
            "cysteine_change",
            "flexible_loop",
        ],
    ),
    (
        "active_site_jamming",
        &[
            "active_site_proximity",
            "catalytic_motif",
            "volume_change",
            "aromatic_swap",
            "proline_introduced",
            "flexible_loop",
            "in_disulfide",
            "secretory",
        ],
    ),
    ("lattice_disruption", &["collagen_glycine", "coiled_coil", "proline_introduced"]),
    (
        "trafficking_maturation",
        &["disulfide_cysteine", "sequon_gained", "sequon_lost", "in_disulfide", "aromatic_to_polar"],
    ),
];

fn is_registered(group: &str, feature: &str) -> ScoringResult<()> {
    let Some((_, features)) = WEIGHT_REGISTRY.iter().find(|(g, _)| *g == group) else {
        return Err(ScoringError::Configuration(format!(
            "unknown mechanism '{}' in weight override",
            group
        )));
    };
    if !features.contains(&feature) {
        return Err(ScoringError::Configuration(format!(
            "unknown feature '{}' for mechanism '{}'",
            feature, group
        )));
    }
    Ok(())
}

/// Validated weight-override table; only [`WeightOverrides::from_map`] builds one
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightOverrides {
    weights: FxHashMap<String, f64>,
}

impl WeightOverrides {
    /// Validate raw `"<mechanism>.<feature>" -> weight` pairs
    pub fn from_map<I, K>(entries: I) -> ScoringResult<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut weights = FxHashMap::default();
        for (key, weight) in entries {
            let key: String = key.into();
            let (group, feature) = key.split_once('.').ok_or_else(|| {
                ScoringError::Configuration(format!("weight key '{}' is not <mechanism>.<feature>", key))
            })?;
            is_registered(group, feature)?;
            if !weight.is_finite() {
                return Err(ScoringError::Configuration(format!("weight '{}' is not finite", key)));
            }
            weights.insert(key, weight);
        }
        Ok(Self { weights })
    }

    /// Weight for `group.feature`, or the built-in default
    pub fn get(&self, group: &str, feature: &str, default: f64) -> f64 {
        self.weights
            .get(&format!("{}.{}", group, feature))
            .copied()
            .unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }
}
