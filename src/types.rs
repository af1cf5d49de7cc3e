//! Core data model: variants, features, mechanism scores, amplifier results
//!
//! A [`MechanismScore`] is always assembled from its [`Feature`] list so the
//! reported numbers can be re-derived term by term:
//!
//!   base = Σ value × weight over `Term` features
//!   raw  = base × Π value over `Multiplier` features
//!
//! `Note` features carry flags (missing evidence, gate traces) and never count.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ScoringError, ScoringResult};
use crate::utils::amino_acids::{self, from_three_letter};
use crate::utils::clamp_unit;

/// Upper bound for every confidence value the engine reports
pub const MAX_CONFIDENCE: f64 = 0.9;

/// Confidence removed for each piece of evidence that was unavailable
pub const EVIDENCE_PENALTY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mechanism {
    #[serde(rename = "LOF")]
    Lof,
    #[serde(rename = "DN")]
    Dn,
    #[serde(rename = "GOF")]
    Gof,
}

impl Mechanism {
    /// Prefix used in weight-override keys
    pub fn key(self) -> &'static str {
        match self {
            Mechanism::Lof => "lof",
            Mechanism::Dn => "dn",
            Mechanism::Gof => "gof",
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mechanism::Lof => "LOF",
            Mechanism::Dn => "DN",
            Mechanism::Gof => "GOF",
        };
        f.write_str(label)
    }
}

/// Genomic position, "chr"-prefixed, 1-based, with optional nucleotide alleles
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomicCoordinate {
    pub chrom: String,
    pub pos: u64,
    #[serde(default)]
    pub ref_allele: Option<String>,
    #[serde(default)]
    pub alt_allele: Option<String>,
}

impl GenomicCoordinate {
    pub fn new(chrom: &str, pos: u64) -> Self {
        let chrom = chrom.trim();
        let chrom = if chrom.to_ascii_lowercase().starts_with("chr") {
            format!("chr{}", &chrom[3..])
        } else {
            format!("chr{}", chrom)
        };
        Self { chrom, pos, ref_allele: None, alt_allele: None }
    }

    pub fn with_alleles(mut self, reference: &str, alternate: &str) -> Self {
        self.ref_allele = Some(reference.to_ascii_uppercase());
        self.alt_allele = Some(alternate.to_ascii_uppercase());
        self
    }

    /// Same site, and the same alleles wherever both sides carry them
    pub fn matches(&self, other: &GenomicCoordinate) -> bool {
        let same = |a: &Option<String>, b: &Option<String>| match (a, b) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => true,
        };
        self.chrom == other.chrom
            && self.pos == other.pos
            && same(&self.ref_allele, &other.ref_allele)
            && same(&self.alt_allele, &other.alt_allele)
    }

    /// Parse "17:7674220" or "chr17:7674220"
    pub fn parse(text: &str) -> ScoringResult<Self> {
        let (chrom, pos) = text
            .split_once(':')
            .ok_or_else(|| ScoringError::malformed(text, "expected <chrom>:<pos>"))?;
        let pos: u64 = pos
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| ScoringError::malformed(text, "position is not an integer"))?;
        if chrom.trim().is_empty() || pos == 0 {
            return Err(ScoringError::malformed(text, "empty chromosome or zero position"));
        }
        Ok(Self::new(chrom, pos))
    }
}

impl fmt::Display for GenomicCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chrom, self.pos)?;
        if let (Some(r), Some(a)) = (&self.ref_allele, &self.alt_allele) {
            write!(f, ":{}>{}", r, a)?;
        }
        Ok(())
    }
}

/// A single amino-acid substitution. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub gene: String,
    pub transcript: Option<String>,
    pub coordinate: Option<GenomicCoordinate>,
    /// 1-based protein position
    pub position: usize,
    pub reference: char,
    pub alternate: char,
    pub hgvs: Vec<String>,
}

impl Variant {
    pub fn new(gene: &str, position: usize, reference: char, alternate: char) -> ScoringResult<Self> {
        let reference = reference.to_ascii_uppercase();
        let alternate = alternate.to_ascii_uppercase();
        let input = format!("{}{}{}", reference, position, alternate);

        if position == 0 {
            return Err(ScoringError::malformed(input, "positions are 1-based"));
        }
        if !amino_acids::is_standard(reference) || !amino_acids::is_standard(alternate) {
            return Err(ScoringError::malformed(input, "residues must be standard amino acids"));
        }
        if reference == alternate {
            return Err(ScoringError::malformed(input, "synonymous substitution"));
        }

        Ok(Self {
            gene: gene.to_string(),
            transcript: None,
            coordinate: None,
            position,
            reference,
            alternate,
            hgvs: Vec::new(),
        })
    }

    /// Parse a protein change: `R175H`, `p.R175H`, `p.Arg175His`, `p.(Arg175His)`
    pub fn parse(gene: &str, change: &str) -> ScoringResult<Self> {
        let trimmed = change.trim();
        let body = trimmed.strip_prefix("p.").unwrap_or(trimmed);
        let body = body.trim_start_matches('(').trim_end_matches(')');

        let digits_start = body
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ScoringError::malformed(change, "no position"))?;
        let digits_len = body[digits_start..]
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ScoringError::malformed(change, "no alternate residue"))?;
        let (ref_part, rest) = body.split_at(digits_start);
        let (pos_part, alt_part) = rest.split_at(digits_len);

        let residue = |part: &str| -> Option<char> {
            match part.len() {
                1 => part.chars().next(),
                3 => from_three_letter(part),
                _ => None,
            }
        };
        let reference = residue(ref_part)
            .ok_or_else(|| ScoringError::malformed(change, format!("unknown reference '{}'", ref_part)))?;
        let alternate = residue(alt_part)
            .ok_or_else(|| ScoringError::malformed(change, format!("not a missense alternate '{}'", alt_part)))?;
        let position: usize = pos_part
            .parse()
            .map_err(|_| ScoringError::malformed(change, "position out of range"))?;

        let mut variant = Self::new(gene, position, reference, alternate)
            .map_err(|err| match err {
                ScoringError::MalformedVariant { reason, .. } => ScoringError::malformed(change, reason),
                other => other,
            })?;
        variant.hgvs.push(trimmed.to_string());
        Ok(variant)
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn with_coordinate(mut self, coordinate: GenomicCoordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    pub fn with_hgvs(mut self, hgvs: impl Into<String>) -> Self {
        self.hgvs.push(hgvs.into());
        self
    }

    /// One-letter substitution, e.g. "R175H"
    pub fn substitution(&self) -> String {
        format!("{}{}{}", self.reference, self.position, self.alternate)
    }

    pub fn label(&self) -> String {
        format!("{} p.{}", self.gene, self.substitution())
    }

    /// Position within [1, len]? Out of range is a malformed request.
    pub fn check_position(&self, sequence: &str) -> ScoringResult<()> {
        if self.position > sequence.len() {
            return Err(ScoringError::malformed(
                self.substitution(),
                format!("position beyond sequence length {}", sequence.len()),
            ));
        }
        Ok(())
    }

    /// Reference residue agrees with the sequence at the stated position?
    pub fn check_reference(&self, sequence: &str) -> ScoringResult<()> {
        let found = sequence
            .as_bytes()
            .get(self.position.saturating_sub(1))
            .map(|b| b.to_ascii_uppercase() as char);
        match found {
            Some(found) if found == self.reference => Ok(()),
            Some(found) => Err(ScoringError::SequenceMismatch {
                position: self.position,
                expected: self.reference,
                found,
            }),
            None => self.check_position(sequence),
        }
    }

    /// Position relative to sequence length, (0, 1]
    pub fn relative_position(&self, sequence_len: usize) -> f64 {
        if sequence_len == 0 {
            return 0.5;
        }
        self.position as f64 / sequence_len as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Term,
    Multiplier,
    Note,
}

/// One explanatory term of a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub value: f64,
    pub weight: f64,
    pub kind: FeatureKind,
}

impl Feature {
    pub fn term(name: impl Into<String>, value: f64, weight: f64) -> Self {
        Self { name: name.into(), value, weight, kind: FeatureKind::Term }
    }

    pub fn multiplier(name: impl Into<String>, factor: f64) -> Self {
        Self { name: name.into(), value: factor, weight: 1.0, kind: FeatureKind::Multiplier }
    }

    pub fn note(name: impl Into<String>, value: f64) -> Self {
        Self { name: name.into(), value, weight: 0.0, kind: FeatureKind::Note }
    }

    /// Additive contribution (terms only)
    pub fn contribution(&self) -> f64 {
        match self.kind {
            FeatureKind::Term => self.value * self.weight,
            _ => 0.0,
        }
    }
}

/// Score of one disease mechanism
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MechanismScore {
    pub mechanism: Mechanism,
    /// Uncapped: severity may compound past 1.0
    pub raw_score: f64,
    /// `raw_score` clamped to [0, 1]; used for integration and buckets
    pub normalized_score: f64,
    pub base_score: f64,
    pub features: Vec<Feature>,
    pub explanation: String,
    pub confidence: f64,
    pub sequence_mismatch: bool,
}

impl MechanismScore {
    pub fn from_features(
        mechanism: Mechanism,
        features: Vec<Feature>,
        explanation: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let base_score: f64 = features.iter().map(Feature::contribution).sum();
        let factor: f64 = features
            .iter()
            .filter(|f| f.kind == FeatureKind::Multiplier)
            .map(|f| f.value)
            .product();
        let raw_score = base_score * factor;

        Self {
            mechanism,
            raw_score,
            normalized_score: clamp_unit(raw_score),
            base_score,
            features,
            explanation: explanation.into(),
            confidence: confidence.clamp(0.0, MAX_CONFIDENCE),
            sequence_mismatch: false,
        }
    }

    /// Zero-confidence placeholder for a request that could not be scored
    pub fn empty(mechanism: Mechanism, explanation: impl Into<String>) -> Self {
        Self::from_features(mechanism, Vec::new(), explanation, 0.0)
    }

    pub fn with_sequence_mismatch(mut self, mismatch: bool) -> Self {
        self.sequence_mismatch = mismatch;
        self
    }

    pub fn reconstruct_base(&self) -> f64 {
        self.features.iter().map(Feature::contribution).sum()
    }

    pub fn reconstruct_raw(&self) -> f64 {
        self.reconstruct_base()
            * self
                .features
                .iter()
                .filter(|f| f.kind == FeatureKind::Multiplier)
                .map(|f| f.value)
                .product::<f64>()
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }
}

/// Output of an amplifier subsystem (conservation, frequency, stoichiometry)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmplifierResult {
    pub multiplier: f64,
    pub features: Vec<Feature>,
    pub note: String,
    /// Evidence behind this amplifier was missing; multiplier is neutral
    pub evidence_missing: bool,
}

impl AmplifierResult {
    pub fn new(multiplier: f64, features: Vec<Feature>, note: impl Into<String>) -> Self {
        Self {
            multiplier: multiplier.max(0.0),
            features,
            note: note.into(),
            evidence_missing: false,
        }
    }

    /// Neutral 1.0 with a flag feature naming the missing evidence
    pub fn unavailable(evidence: &str, reason: &str) -> Self {
        Self {
            multiplier: 1.0,
            features: vec![Feature::note(format!("{}_unavailable", evidence), 1.0)],
            note: format!("{} unavailable: {}", evidence, reason),
            evidence_missing: true,
        }
    }

    pub fn as_feature(&self, name: &str) -> Feature {
        Feature::multiplier(name, self.multiplier)
    }

    pub fn confidence_penalty(&self) -> f64 {
        if self.evidence_missing {
            EVIDENCE_PENALTY
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_one_letter_and_three_letter() {
        let v = Variant::parse("TP53", "R175H").unwrap();
        assert_eq!((v.position, v.reference, v.alternate), (175, 'R', 'H'));

        let v = Variant::parse("COL1A1", "p.Gly811Ser").unwrap();
        assert_eq!(v.substitution(), "G811S");
        assert_eq!(v.hgvs, vec!["p.Gly811Ser".to_string()]);

        let v = Variant::parse("FBN1", "p.(Cys1039Tyr)").unwrap();
        assert_eq!(v.label(), "FBN1 p.C1039Y");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "R175", "175H", "Arg175Ter", "X175H", "R0H", "R175R", "p.R175*"] {
            let err = Variant::parse("TP53", bad).unwrap_err();
            assert!(matches!(err, ScoringError::MalformedVariant { .. }), "{}", bad);
        }
    }

    #[test]
    fn test_reference_check() {
        let v = Variant::parse("X", "A2V").unwrap();
        assert!(v.check_reference("MAK").is_ok());
        assert!(matches!(
            v.check_reference("MKK"),
            Err(ScoringError::SequenceMismatch { position: 2, expected: 'A', found: 'K' })
        ));
        let far = Variant::parse("X", "A20V").unwrap();
        assert!(matches!(far.check_reference("MAK"), Err(ScoringError::MalformedVariant { .. })));
    }

    #[test]
    fn test_coordinate_normalisation() {
        assert_eq!(GenomicCoordinate::parse("17:7674220").unwrap().to_string(), "chr17:7674220");
        assert_eq!(GenomicCoordinate::parse("chrX:1,000").unwrap().pos, 1000);
        assert!(GenomicCoordinate::parse("chr1").is_err());

        let site = GenomicCoordinate::new("chr17", 7674220).with_alleles("c", "t");
        assert_eq!(site.to_string(), "chr17:7674220:C>T");
        assert!(site.matches(&GenomicCoordinate::new("17", 7674220)));
        assert!(!site.matches(&GenomicCoordinate::new("17", 7674220).with_alleles("C", "A")));
    }

    #[test]
    fn test_score_reconstructs_from_features() {
        let features = vec![
            Feature::term("a", 0.5, 0.3),
            Feature::term("b", 1.0, 0.2),
            Feature::multiplier("m", 2.0),
            Feature::note("flag", 1.0),
        ];
        let score = MechanismScore::from_features(Mechanism::Lof, features, "x", 1.2);
        assert_relative_eq!(score.base_score, 0.35, epsilon = 1e-12);
        assert_relative_eq!(score.raw_score, 0.7, epsilon = 1e-12);
        assert_relative_eq!(score.reconstruct_raw(), score.raw_score, epsilon = 1e-12);
        assert_relative_eq!(score.confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn test_normalized_score_is_clamped() {
        let score = MechanismScore::from_features(
            Mechanism::Dn,
            vec![Feature::term("a", 1.0, 1.0), Feature::multiplier("m", 6.0)],
            "x",
            0.5,
        );
        assert_relative_eq!(score.raw_score, 6.0);
        assert_relative_eq!(score.normalized_score, 1.0);
    }

    #[test]
    fn test_unavailable_amplifier_is_neutral_and_flagged() {
        let amp = AmplifierResult::unavailable("conservation", "no coordinate");
        assert_relative_eq!(amp.multiplier, 1.0);
        assert!(amp.evidence_missing);
        assert_eq!(amp.features[0].name, "conservation_unavailable");
        assert_relative_eq!(amp.confidence_penalty(), EVIDENCE_PENALTY);
    }
}
