//! Mechanism integration
//!
//! Fuses the normalized LOF and DN scores into one pathogenicity value, a
//! mechanism class, an inheritance hint and a five-tier clinical bucket.
//!
//! **Classes** (independent thresholds, default 0.4 / 0.4):
//! - `LOF_plus_DN`: min(LOF + 0.5 × DN, 1)
//! - `pure_DN`: DN
//! - `pure_LOF`: LOF × 0.7 (one allele rarely suffices)
//! - `benign_or_mild`: max(LOF, DN)
//!
//! A common-variant veto demotes the bucket by at least one tier and never
//! leaves it above `likely_benign`. GOF is reported next to the class but
//! does not change it.

use serde::{Deserialize, Serialize};

use crate::types::{MechanismScore, MAX_CONFIDENCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    #[serde(rename = "LOF_plus_DN")]
    LofPlusDn,
    #[serde(rename = "pure_DN")]
    PureDn,
    #[serde(rename = "pure_LOF")]
    PureLof,
    #[serde(rename = "benign_or_mild")]
    BenignOrMild,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::LofPlusDn => "LOF_plus_DN",
            Classification::PureDn => "pure_DN",
            Classification::PureLof => "pure_LOF",
            Classification::BenignOrMild => "benign_or_mild",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Inheritance {
    AutosomalDominant,
    PossiblyDominant,
    AutosomalRecessive,
    PossiblyRecessive,
    LikelyBenign,
}

impl Inheritance {
    pub fn as_str(self) -> &'static str {
        match self {
            Inheritance::AutosomalDominant => "autosomal_dominant",
            Inheritance::PossiblyDominant => "possibly_dominant",
            Inheritance::AutosomalRecessive => "autosomal_recessive",
            Inheritance::PossiblyRecessive => "possibly_recessive",
            Inheritance::LikelyBenign => "likely_benign",
        }
    }
}

/// Five-tier clinical bucket, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalBucket {
    Pathogenic,
    LikelyPathogenic,
    #[serde(rename = "VUS")]
    Vus,
    LikelyBenign,
    Benign,
}

impl ClinicalBucket {
    pub fn from_score(pathogenicity: f64) -> Self {
        match pathogenicity {
            p if p > 0.7 => ClinicalBucket::Pathogenic,
            p if p > 0.5 => ClinicalBucket::LikelyPathogenic,
            p if p > 0.3 => ClinicalBucket::Vus,
            p if p > 0.1 => ClinicalBucket::LikelyBenign,
            _ => ClinicalBucket::Benign,
        }
    }

    /// One tier less severe
    pub fn demote(self) -> Self {
        match self {
            ClinicalBucket::Pathogenic => ClinicalBucket::LikelyPathogenic,
            ClinicalBucket::LikelyPathogenic => ClinicalBucket::Vus,
            ClinicalBucket::Vus => ClinicalBucket::LikelyBenign,
            ClinicalBucket::LikelyBenign | ClinicalBucket::Benign => ClinicalBucket::Benign,
        }
    }

    /// Demote at least once, then cap at likely benign
    pub fn vetoed(self) -> Self {
        self.demote().max(ClinicalBucket::LikelyBenign)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClinicalBucket::Pathogenic => "pathogenic",
            ClinicalBucket::LikelyPathogenic => "likely_pathogenic",
            ClinicalBucket::Vus => "VUS",
            ClinicalBucket::LikelyBenign => "likely_benign",
            ClinicalBucket::Benign => "benign",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratorThresholds {
    pub lof: f64,
    pub dn: f64,
}

impl Default for IntegratorThresholds {
    fn default() -> Self {
        Self { lof: 0.4, dn: 0.4 }
    }
}

/// How much of the pathogenicity each mechanism accounts for
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contributions {
    pub lof: f64,
    pub dn: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Integration {
    pub classification: Classification,
    pub pathogenicity: f64,
    pub confidence: f64,
    pub inheritance: Inheritance,
    pub contributions: Contributions,
    pub bucket: ClinicalBucket,
    pub veto_applied: bool,
    /// Bucket the scores alone would have produced, when a veto changed it
    pub bucket_before_veto: Option<ClinicalBucket>,
}

pub fn classify(lof: f64, dn: f64, thresholds: &IntegratorThresholds) -> Classification {
    match (lof >= thresholds.lof, dn >= thresholds.dn) {
        (true, true) => Classification::LofPlusDn,
        (false, true) => Classification::PureDn,
        (true, false) => Classification::PureLof,
        (false, false) => Classification::BenignOrMild,
    }
}

pub fn pathogenicity(classification: Classification, lof: f64, dn: f64) -> f64 {
    match classification {
        Classification::LofPlusDn => f64::min(lof + 0.5 * dn, 1.0),
        Classification::PureDn => dn,
        Classification::PureLof => lof * 0.7,
        Classification::BenignOrMild => lof.max(dn),
    }
}

pub fn inheritance(classification: Classification, lof: f64, dn: f64) -> Inheritance {
    match classification {
        Classification::LofPlusDn | Classification::PureDn => {
            if dn > 0.6 {
                Inheritance::AutosomalDominant
            } else {
                Inheritance::PossiblyDominant
            }
        }
        Classification::PureLof => {
            if lof > 0.7 {
                Inheritance::AutosomalRecessive
            } else {
                Inheritance::PossiblyRecessive
            }
        }
        Classification::BenignOrMild => Inheritance::LikelyBenign,
    }
}

fn confidence(classification: Classification, lof: f64, dn: f64) -> f64 {
    let mean = (lof + dn) / 2.0;
    match classification {
        Classification::LofPlusDn => f64::min(mean + 0.1, MAX_CONFIDENCE),
        Classification::PureDn | Classification::PureLof => lof.max(dn),
        Classification::BenignOrMild => mean * 0.8,
    }
}

fn contributions(classification: Classification, pathogenicity: f64, highly_conserved: bool) -> Contributions {
    let (lof_share, dn_share) = match classification {
        Classification::LofPlusDn if highly_conserved => (0.6, 0.4),
        Classification::LofPlusDn => (0.7, 0.3),
        Classification::PureDn => (0.0, 1.0),
        Classification::PureLof => (1.0, 0.0),
        Classification::BenignOrMild => (0.5, 0.5),
    };
    Contributions { lof: lof_share * pathogenicity, dn: dn_share * pathogenicity }
}

/// Fuse LOF and DN into the final classification
pub fn integrate(
    lof: &MechanismScore,
    dn: &MechanismScore,
    highly_conserved: bool,
    frequency_veto: bool,
    thresholds: &IntegratorThresholds,
) -> Integration {
    let (l, d) = (lof.normalized_score, dn.normalized_score);
    let classification = classify(l, d, thresholds);
    let pathogenicity = pathogenicity(classification, l, d);

    let scored_bucket = ClinicalBucket::from_score(pathogenicity);
    let bucket = if frequency_veto { scored_bucket.vetoed() } else { scored_bucket };

    Integration {
        classification,
        pathogenicity,
        confidence: confidence(classification, lof.confidence, dn.confidence).clamp(0.0, MAX_CONFIDENCE),
        inheritance: inheritance(classification, l, d),
        contributions: contributions(classification, pathogenicity, highly_conserved),
        bucket,
        veto_applied: frequency_veto,
        bucket_before_veto: (bucket != scored_bucket).then_some(scored_bucket),
    }
}
