//! Stoichiometry evidence fusion
//!
//! Breaking one subunit of an n-meric complex poisons a growing fraction of
//! assembled complexes as n increases. This module turns whatever oligomer
//! evidence is available into a multiplicative "poison factor" for the DN
//! score, without any per-protein tables.
//!
//! **Order of precedence**:
//!   1. explicit subunit count with a known poison ratio (always wins)
//!   2. votes from GO-term text, observed assembly sizes and sequence
//!      heuristics, fused into the expected poison ratio
//!   3. no evidence at all: exactly 1.0
//!
//! Results are cached per protein and sequence (plus a fingerprint of the
//! hints), since the heptad scan over the full sequence is the only
//! non-trivial cost.

use moka::sync::Cache;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::amplifiers::protein_cache_key;
use crate::evidence::{EvidenceContext, StoichiometryHints};
use crate::types::{AmplifierResult, Feature};
use crate::utils::motifs::has_heptad_repeat;

/// Poison ratio by subunit count
pub const POISON_BY_K: [(u32, f64); 6] = [(1, 0.8), (2, 2.0), (3, 3.5), (4, 6.0), (6, 12.0), (8, 20.0)];

pub const MAX_POISON: f64 = 32.0;

/// Light damping applied when a monomer vote is present
pub const MONOMER_DAMP: f64 = 0.9;

pub fn poison_ratio(k: u32) -> Option<f64> {
    POISON_BY_K.iter().find(|(kk, _)| *kk == k).map(|&(_, r)| r)
}

/// One vote for a candidate subunit count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vote {
    pub k: u32,
    pub weight: f64,
    pub source: &'static str,
}

type Votes = SmallVec<[Vote; 8]>;

fn go_votes(go_terms: &[String], votes: &mut Votes) {
    let mut add = |k, weight| votes.push(Vote { k, weight, source: "go_term" });
    for term in go_terms {
        let t = term.to_lowercase();
        if t.contains("homodimer") || t.contains("heterodimer") || t.contains("dimerization") {
            add(2, 1.5);
        }
        if t.contains("trimer") {
            add(3, 1.5);
        }
        if t.contains("tetramer") {
            add(4, 1.5);
        }
        if t.contains("hexamer") || t.contains("6-mer") {
            add(6, 1.5);
        }
        if t.contains("oligomer") {
            for k in [2, 3, 4] {
                add(k, 0.5);
            }
        }
        if t.contains("monomer") {
            add(1, 1.0);
        }
    }
}

fn sequence_votes(sequence: &str, hints: &StoichiometryHints, votes: &mut Votes) {
    if has_heptad_repeat(&sequence.to_ascii_uppercase()) {
        votes.push(Vote { k: 2, weight: 1.0, source: "heptad_repeat" });
        votes.push(Vote { k: 3, weight: 0.5, source: "heptad_repeat" });
    }
    if hints.coiled_coil_near {
        votes.push(Vote { k: 2, weight: 0.5, source: "coiled_coil" });
        votes.push(Vote { k: 3, weight: 0.5, source: "coiled_coil" });
    }
    match hints.tm_count {
        Some(n) if n >= 10 => votes.push(Vote { k: 4, weight: 0.5, source: "tm_segments" }),
        Some(n) if n >= 6 => votes.push(Vote { k: 2, weight: 0.3, source: "tm_segments" }),
        _ => {}
    }
}

/// Gather every vote the evidence supports
pub fn collect_votes(sequence: &str, go_terms: &[String], hints: &StoichiometryHints) -> Votes {
    let mut votes = Votes::new();
    go_votes(go_terms, &mut votes);
    for &size in &hints.assembly_sizes {
        votes.push(Vote { k: size, weight: 2.0, source: "assembly" });
    }
    sequence_votes(sequence, hints, &mut votes);
    if hints.monomeric {
        votes.push(Vote { k: 1, weight: 1.0, source: "monomeric_hint" });
    }
    votes
}

/// Fuse stoichiometry evidence into a poison factor (uncached)
pub fn fuse(sequence: &str, go_terms: &[String], hints: &StoichiometryHints) -> AmplifierResult {
    if let Some(k) = hints.explicit_k {
        if let Some(ratio) = poison_ratio(k) {
            return AmplifierResult::new(
                ratio.min(MAX_POISON),
                vec![Feature::note(format!("stoichiometry_{}x", k), ratio)],
                format!("explicit k={}", k),
            );
        }
    }

    let votes = collect_votes(sequence, go_terms, hints);
    let mut by_k: FxHashMap<u32, f64> = FxHashMap::default();
    for vote in &votes {
        *by_k.entry(vote.k).or_insert(0.0) += vote.weight.max(0.0);
    }

    let mut features = Vec::new();
    if let Some(k) = hints.explicit_k {
        features.push(Feature::note(format!("explicit_k{}_unmapped", k), k as f64));
    }

    let known_total: f64 = by_k
        .iter()
        .filter(|(k, _)| poison_ratio(**k).is_some())
        .map(|(_, w)| *w)
        .sum();
    if known_total <= 0.0 {
        return AmplifierResult::new(1.0, features, "no_evidence");
    }

    let mut mix: Vec<(u32, f64)> = by_k
        .iter()
        .filter_map(|(&k, &w)| poison_ratio(k).map(|_| (k, w / known_total)))
        .collect();
    mix.sort_by_key(|(k, _)| *k);

    let mut amp: f64 = mix
        .iter()
        .filter_map(|&(k, p)| poison_ratio(k).map(|r| p * r))
        .sum();
    amp = amp.min(MAX_POISON);

    if by_k.get(&1).copied().unwrap_or(0.0) > 0.0 && amp >= 1.0 {
        amp *= MONOMER_DAMP;
    }

    let mut ranked: Vec<(u32, f64)> = by_k.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
    for (k, w) in ranked.into_iter().take(3) {
        features.push(Feature::note(format!("vote_k{}", k), w));
    }

    let note = format!(
        "evidence mix: {}",
        mix.iter()
            .map(|(k, p)| format!("k{}:{:.2}", k, p))
            .collect::<Vec<_>>()
            .join(", ")
    );
    AmplifierResult::new(amp, features, note)
}

/// Cached front end over [`fuse`]
pub struct StoichiometryEvidenceFuser {
    cache: Cache<String, AmplifierResult>,
}

impl StoichiometryEvidenceFuser {
    pub fn new(capacity: u64) -> Self {
        Self { cache: Cache::new(capacity) }
    }

    pub fn poison_factor(&self, sequence: &str, ctx: &EvidenceContext) -> AmplifierResult {
        let Some(protein) = ctx.protein_id() else {
            return fuse(sequence, ctx.go_terms(), ctx.stoichiometry());
        };
        let key = format!(
            "{}|{:?}|{:?}",
            protein_cache_key(protein, sequence),
            ctx.stoichiometry(),
            ctx.go_terms()
        );
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }
        tracing::debug!(protein, "stoichiometry cache miss");
        let result = fuse(sequence, ctx.go_terms(), ctx.stoichiometry());
        self.cache.insert(key, result.clone());
        result
    }
}

impl Default for StoichiometryEvidenceFuser {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn terms(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_explicit_k_wins_over_votes() {
        let hints = StoichiometryHints {
            explicit_k: Some(4),
            assembly_sizes: vec![2, 2, 2],
            coiled_coil_near: true,
            ..Default::default()
        };
        let amp = fuse("MALKKELAALKKELAALKK", &terms(&["protein homodimerization"]), &hints);
        assert_relative_eq!(amp.multiplier, 6.0);
        assert_eq!(amp.note, "explicit k=4");
    }

    #[test]
    fn test_no_evidence_is_exactly_neutral() {
        let amp = fuse("MAAAAAAAAAAAAAAA", &[], &StoichiometryHints::default());
        assert_eq!(amp.multiplier, 1.0);
        assert_eq!(amp.note, "no_evidence");
    }

    #[test]
    fn test_single_go_vote_gives_its_ratio() {
        let amp = fuse("MAAAA", &terms(&["protein homotetramerization"]), &StoichiometryHints::default());
        assert_relative_eq!(amp.multiplier, 6.0);
    }

    #[test]
    fn test_vote_mixture_expectation() {
        // tetramer 1.5 + assembly of 2 (2.0): p4 = 1.5/3.5, p2 = 2/3.5
        let hints = StoichiometryHints { assembly_sizes: vec![2], ..Default::default() };
        let amp = fuse("MAAAA", &terms(&["homotetramer"]), &hints);
        let expected = (1.5 / 3.5) * 6.0 + (2.0 / 3.5) * 2.0;
        assert_relative_eq!(amp.multiplier, expected, epsilon = 1e-9);
        assert!(amp.features.iter().any(|f| f.name == "vote_k2"));
    }

    #[test]
    fn test_monomer_vote_damps() {
        let amp = fuse("MAAAA", &terms(&["homodimer", "monomer"]), &StoichiometryHints::default());
        let expected = ((1.5 / 2.5) * 2.0 + (1.0 / 2.5) * 0.8) * MONOMER_DAMP;
        assert_relative_eq!(amp.multiplier, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_unmapped_assembly_sizes_ignored() {
        let hints = StoichiometryHints { assembly_sizes: vec![5], ..Default::default() };
        let amp = fuse("MAAAA", &[], &hints);
        assert_eq!(amp.multiplier, 1.0);
    }

    #[test]
    fn test_cached_fuser_matches_direct() {
        let fuser = StoichiometryEvidenceFuser::new(16);
        let ctx = EvidenceContext::builder()
            .protein_id("P1")
            .go_terms(["homotrimer"])
            .build()
            .unwrap();
        let first = fuser.poison_factor("MAAAA", &ctx);
        let second = fuser.poison_factor("MAAAA", &ctx);
        assert_relative_eq!(first.multiplier, 3.5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_isoforms_do_not_share_cache_entry() {
        let fuser = StoichiometryEvidenceFuser::new(16);
        let ctx = EvidenceContext::builder().protein_id("P1").build().unwrap();
        // heptad votes: k2 1.0, k3 0.5
        let zipper = fuser.poison_factor("MALKKELAALKKELAALKKEAA", &ctx);
        let plain = fuser.poison_factor("MAAAAAAAAAAAAAAAAAAAAA", &ctx);
        assert_relative_eq!(zipper.multiplier, (1.0 / 1.5) * 2.0 + (0.5 / 1.5) * 3.5, epsilon = 1e-9);
        assert_eq!(plain.multiplier, 1.0);
        assert_eq!(plain.note, "no_evidence");
    }
}
