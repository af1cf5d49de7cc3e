//! Sequence motif detectors
//!
//! Stateless predicates over `(sequence, position)` with 1-based positions.
//! Windows are clipped at the sequence ends, so every detector degrades to
//! "no signal" near a terminus instead of failing.
//!
//! **Detectors**:
//!   - catalytic motifs (Walker A/B, DFG, zinc finger, collagen, hydrophobic core)
//!   - collagen Gly-X-Y membership
//!   - leucine-zipper heptads (coiled-coil likelihood)
//!   - N-X-S/T glycosylation sequon gain/loss
//!   - kinase consensus (PKA, CK2, proline-directed)
//!   - hinge, charge-density and hydrophobic-context windows
//!   - short internal repeats

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// A catalytic or structural sequence motif and its context weight
#[derive(Debug, Clone, Copy)]
pub struct MotifPattern {
    pub name: &'static str,
    pub pattern: &'static str,
    pub weight: f64,
}

pub const CATALYTIC_MOTIFS: [MotifPattern; 6] = [
    MotifPattern { name: "walker_a", pattern: r"[LIVMFY].{0,3}G.{1,3}[ST]", weight: 1.4 },
    MotifPattern { name: "walker_b", pattern: r"[RK].{2,3}[LIVMFY].{3}[LIVMFY].{3}D", weight: 1.4 },
    MotifPattern { name: "dfg_motif", pattern: r"DFG", weight: 1.6 },
    MotifPattern { name: "hydrophobic_core", pattern: r"[LIVMFY]G[LIVMFY]", weight: 1.1 },
    MotifPattern { name: "zinc_finger", pattern: r"C.{2,4}C.{3}[FY].{5,8}C.{2}C", weight: 1.3 },
    MotifPattern { name: "collagen_repeat", pattern: r"G.{2}G.{2}G", weight: 1.5 },
];

/// Residues on either side within which a motif counts as "near"
pub const MOTIF_PROXIMITY: usize = 10;

const HEPTAD_PATTERN: &str = r"L.{6}L.{6}L";
const SEQUON_PATTERN: &str = r"N[^P][ST]";

fn catalytic_regexes() -> &'static [(MotifPattern, Regex)] {
    static COMPILED: OnceLock<Vec<(MotifPattern, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        CATALYTIC_MOTIFS
            .iter()
            .filter_map(|m| Regex::new(m.pattern).ok().map(|re| (*m, re)))
            .collect()
    })
}

fn heptad_regex() -> Option<&'static Regex> {
    static COMPILED: OnceLock<Option<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| Regex::new(HEPTAD_PATTERN).ok()).as_ref()
}

fn sequon_regex() -> Option<&'static Regex> {
    static COMPILED: OnceLock<Option<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| Regex::new(SEQUON_PATTERN).ok()).as_ref()
}

/// One motif occurrence, 1-based inclusive span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotifHit {
    pub name: &'static str,
    pub weight: f64,
    pub start: usize,
    pub end: usize,
}

impl MotifHit {
    /// Does the hit lie within `window` residues of `position`?
    pub fn is_near(&self, position: usize, window: usize) -> bool {
        self.start <= position + window && self.end + window >= position
    }
}

/// Scan a whole sequence for catalytic motifs (done once per protein)
pub fn scan_catalytic_motifs(sequence: &str) -> Vec<MotifHit> {
    let mut hits = Vec::new();
    for (motif, re) in catalytic_regexes() {
        for m in re.find_iter(sequence) {
            hits.push(MotifHit {
                name: motif.name,
                weight: motif.weight,
                start: m.start() + 1,
                end: m.end(),
            });
        }
    }
    hits
}

/// Motif hits within [`MOTIF_PROXIMITY`] of a position
pub fn motifs_near(hits: &[MotifHit], position: usize) -> Vec<&MotifHit> {
    hits.iter().filter(|h| h.is_near(position, MOTIF_PROXIMITY)).collect()
}

fn residue_at(sequence: &[u8], position: usize) -> Option<u8> {
    if position == 0 {
        return None;
    }
    sequence.get(position - 1).map(|b| b.to_ascii_uppercase())
}

/// Residue window [position - before, position + after], clipped, 1-based
fn window(sequence: &[u8], position: usize, before: usize, after: usize) -> &[u8] {
    if sequence.is_empty() || position == 0 {
        return &[];
    }
    let idx = (position - 1).min(sequence.len() - 1);
    let start = idx.saturating_sub(before);
    let end = (idx + after + 1).min(sequence.len());
    &sequence[start..end]
}

/// Is `position` a glycine in a G-X-Y-G-X-Y-G collagen stretch?
pub fn in_collagen_repeat(sequence: &str, position: usize) -> bool {
    let seq = sequence.as_bytes();
    if residue_at(seq, position) != Some(b'G') {
        return false;
    }
    let is_gly = |p: Option<usize>| p.and_then(|p| residue_at(seq, p)) == Some(b'G');
    let back = |n: usize| position.checked_sub(n);
    let fwd = |n: usize| Some(position + n);

    (is_gly(back(3)) && is_gly(fwd(3)))
        || (is_gly(fwd(3)) && is_gly(fwd(6)))
        || (is_gly(back(3)) && is_gly(back(6)))
}

/// Any leucine-zipper heptad anywhere in the sequence
pub fn has_heptad_repeat(sequence: &str) -> bool {
    heptad_regex().is_some_and(|re| re.is_match(sequence))
}

/// Coiled-coil likelihood around a position: heptad match within ±14
pub fn coiled_coil_near(sequence: &str, position: usize) -> bool {
    let local = window(sequence.as_bytes(), position, 14, 14);
    let Ok(local) = std::str::from_utf8(local) else {
        return false;
    };
    heptad_regex().is_some_and(|re| re.is_match(local))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequonChange {
    Gained,
    Lost,
    Unchanged,
}

fn count_sequons(local: &[u8]) -> usize {
    let Ok(text) = std::str::from_utf8(local) else {
        return 0;
    };
    sequon_regex().map_or(0, |re| re.find_iter(text).count())
}

/// N-X-S/T sequon gain or loss caused by placing `alternate` at `position`
pub fn sequon_change(sequence: &str, position: usize, alternate: char) -> SequonChange {
    let seq = sequence.as_bytes();
    if position == 0 || position > seq.len() {
        return SequonChange::Unchanged;
    }
    // A sequon touching the substituted residue starts at most two residues upstream
    let before = window(seq, position, 2, 2).to_ascii_uppercase();
    let offset = (position - 1).min(2);
    let mut after = before.clone();
    after[offset] = alternate.to_ascii_uppercase() as u8;

    let (was, now) = (count_sequons(&before), count_sequons(&after));
    match now.cmp(&was) {
        std::cmp::Ordering::Greater => SequonChange::Gained,
        std::cmp::Ordering::Less => SequonChange::Lost,
        std::cmp::Ordering::Equal => SequonChange::Unchanged,
    }
}

/// Kinase consensus strength for a phospho-acceptor at `position`, [0, 1]
///
/// Looks at the window `[position - 6, position + 5)`:
///   - PKA: basic residues at -2/-1 (+0.4 for one, +0.3 more for two)
///   - CK2: acidic residue downstream (+0.3) and upstream (+0.3)
///   - proline-directed: S/T followed by P (+0.4)
pub fn kinase_consensus(sequence: &str, position: usize) -> f64 {
    let seq = sequence.as_bytes();
    if position == 0 || position > seq.len() {
        return 0.0;
    }
    let idx = position - 1;
    let lo = idx.saturating_sub(6);
    let hi = (idx + 5).min(seq.len());
    let upper = |r: std::ops::Range<usize>| -> Vec<u8> {
        let r = r.start.max(lo)..r.end.min(hi);
        if r.start >= r.end {
            Vec::new()
        } else {
            seq[r].to_ascii_uppercase()
        }
    };

    let mut score = 0.0;

    let basic = upper(idx.saturating_sub(2)..idx)
        .iter()
        .filter(|&&b| b == b'R' || b == b'K')
        .count();
    if basic >= 1 {
        score += 0.4;
    }
    if basic >= 2 {
        score += 0.3;
    }

    let acidic = |b: &u8| *b == b'D' || *b == b'E';
    if upper(idx + 1..idx + 4).iter().any(acidic) {
        score += 0.3;
    }
    if upper(idx.saturating_sub(3)..idx).iter().any(acidic) {
        score += 0.3;
    }

    let acceptor = seq[idx].to_ascii_uppercase();
    if matches!(acceptor, b'S' | b'T') && upper(idx + 1..idx + 2).first() == Some(&b'P') {
        score += 0.4;
    }

    f64::min(score, 1.0)
}

fn fraction(local: &[u8], pred: impl Fn(u8) -> bool) -> f64 {
    if local.is_empty() {
        return 0.0;
    }
    local.iter().filter(|&&b| pred(b.to_ascii_uppercase())).count() as f64 / local.len() as f64
}

fn is_hydrophobic(b: u8) -> bool {
    crate::utils::amino_acids::properties(b as char).is_some_and(|p| p.hydrophobic)
}

/// Flexible-hinge likelihood: glycine density × 0.7 + polarity × 0.3 over ±5
pub fn hinge_score(sequence: &str, position: usize) -> f64 {
    let local = window(sequence.as_bytes(), position, 5, 5);
    if local.is_empty() {
        return 0.0;
    }
    let gly = fraction(local, |b| b == b'G');
    let hydrophobic = fraction(local, is_hydrophobic);
    gly * 0.7 + (1.0 - hydrophobic) * 0.3
}

/// Fraction of charged residues (D/E/K/R) within ±`radius`
pub fn charge_density(sequence: &str, position: usize, radius: usize) -> f64 {
    let local = window(sequence.as_bytes(), position, radius, radius);
    fraction(local, |b| matches!(b, b'D' | b'E' | b'K' | b'R'))
}

/// Fraction of hydrophobic residues within ±`radius`
pub fn hydrophobic_context(sequence: &str, position: usize, radius: usize) -> f64 {
    let local = window(sequence.as_bytes(), position, radius, radius);
    fraction(local, is_hydrophobic)
}

/// Does the 6-mer centred on `position` occur elsewhere in the sequence?
pub fn in_internal_repeat(sequence: &str, position: usize) -> bool {
    let seq = sequence.as_bytes();
    if position < 4 || position + 2 > seq.len() {
        return false;
    }
    let start = position - 4;
    let kmer = &seq[start..start + 6];
    seq.windows(6)
        .enumerate()
        .any(|(i, w)| i != start && w.eq_ignore_ascii_case(kmer))
}
