//! Conservation lookup and multipliers
//!
//! Maps a genomic position to phyloP/phastCons, a combined [0, 1] score and a
//! multiplicative amplifier. Backing data comes from a [`ConservationSource`]
//! (an in-memory table in practice); lookups are cached by position.
//!
//! Missing data never raises and never invents a score: the combined score is
//! absent, the multiplier is the neutral 1.0 and the result is flagged so the
//! scorers can lower their confidence.

use moka::sync::Cache;
use serde::Serialize;
use std::sync::Arc;

use crate::evidence::{ConservationScores, Evidence};
use crate::types::{AmplifierResult, Feature};
use crate::utils::{clamp_unit, tier_above};

/// Combined-score breakpoints for the LOF conservation multiplier
pub const COMBINED_MULTIPLIERS: [(f64, f64); 3] = [(0.8, 2.0), (0.6, 1.5), (0.4, 1.2)];

/// phyloP breakpoints for the GOF Gate-1 multiplier
pub const GOF_PHYLOP_MULTIPLIERS: [(f64, f64); 4] = [(5.0, 3.0), (2.0, 2.0), (1.0, 1.5), (0.5, 1.2)];

/// phyloP above which a position counts as highly conserved
pub const HIGHLY_CONSERVED_PHYLOP: f64 = 2.0;

/// Backing store for per-position conservation
pub trait ConservationSource: Send + Sync {
    fn conservation(&self, chrom: &str, pos: u64) -> Option<ConservationScores>;
}

/// Combined view of one position's conservation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ConservationScore {
    pub phylop: Option<f64>,
    pub phastcons: Option<f64>,
    pub combined: Option<f64>,
    pub confidence: f64,
}

/// Combine phyloP (normalized as (p + 20) / 40) and phastCons 0.7 / 0.3
pub fn combine(scores: &ConservationScores) -> ConservationScore {
    let phylop_norm = scores.phylop.map(|p| clamp_unit((p + 20.0) / 40.0));
    let phastcons = scores.phastcons.map(clamp_unit);

    let combined = match (phylop_norm, phastcons) {
        (Some(p), Some(c)) => Some(0.7 * p + 0.3 * c),
        (Some(p), None) => Some(p),
        (None, Some(c)) => Some(c),
        (None, None) => None,
    };

    let mut confidence = 0.3;
    if scores.phylop.is_some() {
        confidence += 0.4;
    }
    if scores.phastcons.is_some() {
        confidence += 0.3;
    }
    if combined.is_none() {
        confidence = 0.0;
    }

    ConservationScore {
        phylop: scores.phylop,
        phastcons: scores.phastcons,
        combined,
        confidence: f64::min(confidence, 0.9),
    }
}

/// Narrative tier for a phyloP value
pub fn conservation_level(phylop: f64) -> &'static str {
    match phylop {
        p if p > 5.0 => "extremely_conserved",
        p if p > HIGHLY_CONSERVED_PHYLOP => "highly_conserved",
        p if p > 0.5 => "moderately_conserved",
        p if p > -0.5 => "neutral",
        _ => "fast_evolving",
    }
}

pub fn is_highly_conserved(evidence: &Evidence<ConservationScores>) -> bool {
    evidence
        .known()
        .and_then(|s| s.phylop)
        .is_some_and(|p| p > HIGHLY_CONSERVED_PHYLOP)
}

/// LOF conservation multiplier {1.0, 1.2, 1.5, 2.0}
pub fn conservation_amplifier(evidence: &Evidence<ConservationScores>) -> AmplifierResult {
    let scores = match evidence {
        Evidence::Known(scores) => scores,
        Evidence::Unknown { unknown } => return AmplifierResult::unavailable("conservation", unknown),
    };
    let score = combine(scores);
    let Some(combined) = score.combined else {
        return AmplifierResult::unavailable("conservation", "no scores at position");
    };

    let multiplier = tier_above(combined, &COMBINED_MULTIPLIERS, 1.0);
    let mut features = vec![Feature::note("conservation_combined", combined)];
    if let Some(p) = scores.phylop {
        features.push(Feature::note("phylop", p));
    }
    if let Some(c) = scores.phastcons {
        features.push(Feature::note("phastcons", c));
    }
    let note = match scores.phylop {
        Some(p) => format!("{} (phyloP {:.2})", conservation_level(p), p),
        None => format!("combined conservation {:.2}", combined),
    };
    AmplifierResult::new(multiplier, features, note)
}

/// DN conservation multiplier {0.8, 1.2, 1.4, 1.8}
///
/// Requires phyloP; the two top tiers also require phastCons. Poorly
/// conserved positions damp DN below neutral, unknown phyloP stays neutral.
pub fn dn_conservation_amplifier(evidence: &Evidence<ConservationScores>) -> AmplifierResult {
    let Some(scores) = evidence.known() else {
        return AmplifierResult::unavailable(
            "conservation",
            evidence.unknown_reason().unwrap_or("no conservation at position"),
        );
    };
    let Some(phylop) = scores.phylop else {
        return AmplifierResult::unavailable("conservation", "no phyloP at position");
    };
    let phastcons = scores.phastcons.unwrap_or(0.0);

    let (multiplier, note) = if phylop > 5.0 && phastcons > 0.8 {
        (1.8, "extremely conserved structural position")
    } else if phylop > HIGHLY_CONSERVED_PHYLOP && phastcons > 0.5 {
        (1.4, "highly conserved structural position")
    } else if phylop > 1.0 {
        (1.2, "moderately conserved position")
    } else {
        (0.8, "poorly conserved position, DN damped")
    };
    let mut features = vec![Feature::note("phylop", phylop)];
    if let Some(c) = scores.phastcons {
        features.push(Feature::note("phastcons", c));
    }
    AmplifierResult::new(multiplier, features, note)
}

/// GOF Gate-1 multiplier from phyloP alone
pub fn gof_amplifier(evidence: &Evidence<ConservationScores>) -> AmplifierResult {
    match evidence.known().and_then(|s| s.phylop) {
        Some(p) => AmplifierResult::new(
            tier_above(p, &GOF_PHYLOP_MULTIPLIERS, 1.0),
            vec![Feature::note("phylop", p)],
            conservation_level(p),
        ),
        None => AmplifierResult::unavailable(
            "conservation",
            evidence.unknown_reason().unwrap_or("no phyloP at position"),
        ),
    }
}

/// Position relative to its neighbourhood; narrative only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowContext {
    Peak,
    Valley,
    Typical,
    Unknown,
}

/// Caching front end over a [`ConservationSource`]
pub struct ConservationLookup {
    source: Arc<dyn ConservationSource>,
    cache: Cache<(String, u64), Option<ConservationScores>>,
}

impl ConservationLookup {
    pub fn new(source: Arc<dyn ConservationSource>, capacity: u64) -> Self {
        Self { source, cache: Cache::new(capacity) }
    }

    fn raw(&self, chrom: &str, pos: u64) -> Option<ConservationScores> {
        let key = (chrom.to_string(), pos);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }
        let value = self.source.conservation(chrom, pos).filter(|s| !s.is_empty());
        self.cache.insert(key, value);
        value
    }

    /// Evidence value for a position; missing rows become `Unknown`
    pub fn evidence(&self, chrom: &str, pos: u64) -> Evidence<ConservationScores> {
        match self.raw(chrom, pos) {
            Some(scores) => Evidence::Known(scores),
            None => Evidence::unknown(format!("no conservation data at {}:{}", chrom, pos)),
        }
    }

    pub fn score(&self, chrom: &str, pos: u64) -> ConservationScore {
        self.raw(chrom, pos).map(|s| combine(&s)).unwrap_or_default()
    }

    /// Classify against the mean of the ±`radius` neighbourhood
    pub fn window_context(&self, chrom: &str, pos: u64, radius: u64) -> WindowContext {
        let Some(centre) = self.score(chrom, pos).combined else {
            return WindowContext::Unknown;
        };
        let neighbours: Vec<f64> = (pos.saturating_sub(radius).max(1)..=pos + radius)
            .filter(|&p| p != pos)
            .filter_map(|p| self.score(chrom, p).combined)
            .collect();
        if neighbours.is_empty() {
            return WindowContext::Unknown;
        }
        let mean = neighbours.iter().sum::<f64>() / neighbours.len() as f64;
        if centre > mean + 0.2 {
            WindowContext::Peak
        } else if centre < mean - 0.2 {
            WindowContext::Valley
        } else {
            WindowContext::Typical
        }
    }
}
