//! Population frequency assessment
//!
//! Maps an allele frequency to a rarity tier, a pathogenicity boost/damp
//! factor and a common-variant veto. Frequencies come either from the
//! evidence context or from a fixed-priority chain of [`FrequencySource`]s
//! (gnomAD, then Ensembl, then ClinVar, then a local VCF).
//!
//! A variant no database knows about is `Unknown`: boost 1.0, no veto, and a
//! confidence penalty. It is never treated as ultra-rare.

use serde::Serialize;
use std::sync::Arc;

use crate::evidence::{Evidence, FrequencyRecord};
use crate::types::{AmplifierResult, Feature, GenomicCoordinate};

/// Population codes carried through from gnomAD
pub const POPULATIONS: [&str; 8] = ["AFR", "AMR", "ASJ", "EAS", "FIN", "NFE", "SAS", "OTH"];

/// Fallback order for frequency databases
pub const SOURCE_PRIORITY: [&str; 4] = ["gnomad", "ensembl", "clinvar", "local_vcf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyTier {
    VeryCommon,
    Common,
    Uncommon,
    Rare,
    VeryRare,
    UltraRare,
    Unknown,
}

impl FrequencyTier {
    pub fn from_af(af: f64) -> Self {
        match af {
            af if af >= 0.12 => FrequencyTier::VeryCommon,
            af if af >= 0.05 => FrequencyTier::Common,
            af if af >= 0.01 => FrequencyTier::Uncommon,
            af if af >= 0.001 => FrequencyTier::Rare,
            af if af >= 0.0001 => FrequencyTier::VeryRare,
            af if af >= 0.0 => FrequencyTier::UltraRare,
            _ => FrequencyTier::Unknown,
        }
    }

    pub fn boost(self) -> f64 {
        match self {
            FrequencyTier::VeryCommon => 0.2,
            FrequencyTier::Common => 0.5,
            FrequencyTier::Uncommon => 0.8,
            FrequencyTier::Rare => 1.0,
            FrequencyTier::VeryRare => 1.3,
            FrequencyTier::UltraRare => 1.5,
            FrequencyTier::Unknown => 1.0,
        }
    }

    /// Too common for the rare disease under study
    pub fn veto(self) -> bool {
        self == FrequencyTier::VeryCommon
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FrequencyTier::VeryCommon => "very_common",
            FrequencyTier::Common => "common",
            FrequencyTier::Uncommon => "uncommon",
            FrequencyTier::Rare => "rare",
            FrequencyTier::VeryRare => "very_rare",
            FrequencyTier::UltraRare => "ultra_rare",
            FrequencyTier::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyAssessment {
    pub tier: FrequencyTier,
    pub allele_frequency: Option<f64>,
    pub pathogenicity_boost: f64,
    pub veto: bool,
    pub source: Option<String>,
    pub max_population: Option<(String, f64)>,
    pub note: String,
}

/// Assess a bare allele frequency; `None` or a non-finite value is unknown
pub fn assess(af: Option<f64>) -> FrequencyAssessment {
    let tier = match af {
        Some(af) if af.is_finite() => FrequencyTier::from_af(af),
        _ => FrequencyTier::Unknown,
    };
    let note = match (tier, af) {
        (FrequencyTier::Unknown, _) => "allele frequency unknown".to_string(),
        (_, Some(af)) => format!("{} (AF {:.2e})", tier.as_str(), af),
        (_, None) => tier.as_str().to_string(),
    };
    FrequencyAssessment {
        tier,
        allele_frequency: af.filter(|_| tier != FrequencyTier::Unknown),
        pathogenicity_boost: tier.boost(),
        veto: tier.veto(),
        source: None,
        max_population: None,
        note,
    }
}

pub fn assess_evidence(evidence: &Evidence<FrequencyRecord>) -> FrequencyAssessment {
    match evidence {
        Evidence::Known(record) => {
            let mut assessment = assess(Some(record.global_af));
            assessment.source = record.source.clone();
            assessment.max_population = record.max_population().map(|(p, af)| (p.to_string(), af));
            assessment
        }
        Evidence::Unknown { unknown } => {
            let mut assessment = assess(None);
            assessment.note = format!("allele frequency unknown: {}", unknown);
            assessment
        }
    }
}

impl FrequencyAssessment {
    pub fn is_unknown(&self) -> bool {
        self.tier == FrequencyTier::Unknown
    }

    /// Multiplier applied to LOF and DN scores
    pub fn amplifier(&self) -> AmplifierResult {
        if self.is_unknown() {
            return AmplifierResult::unavailable("population_frequency", &self.note);
        }
        let mut features = vec![Feature::note(
            format!("frequency_{}", self.tier.as_str()),
            self.allele_frequency.unwrap_or_default(),
        )];
        if self.veto {
            features.push(Feature::note("common_variant_veto", 1.0));
        }
        AmplifierResult::new(self.pathogenicity_boost, features, self.note.clone())
    }
}

/// A population-frequency database
pub trait FrequencySource: Send + Sync {
    /// Lower-case database name, e.g. "gnomad"
    fn name(&self) -> &str;

    fn frequency(&self, site: &GenomicCoordinate) -> Option<FrequencyRecord>;
}

fn priority(name: &str) -> usize {
    SOURCE_PRIORITY
        .iter()
        .position(|p| p.eq_ignore_ascii_case(name))
        .unwrap_or(SOURCE_PRIORITY.len())
}

/// Frequency sources tried in fixed priority order; first hit wins
#[derive(Default, Clone)]
pub struct PopulationFrequencyAssessor {
    sources: Vec<Arc<dyn FrequencySource>>,
}

impl PopulationFrequencyAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Arc<dyn FrequencySource>) -> Self {
        self.sources.push(source);
        // stable sort keeps insertion order among unlisted databases
        self.sources.sort_by_key(|s| priority(s.name()));
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Walk the chain; every miss falls through, exhaustion is `Unknown`
    pub fn lookup(&self, site: &GenomicCoordinate) -> Evidence<FrequencyRecord> {
        for source in &self.sources {
            if let Some(mut record) = source.frequency(site) {
                if record.source.is_none() {
                    record.source = Some(source.name().to_string());
                }
                tracing::debug!(site = %site, source = source.name(), af = record.global_af, "frequency hit");
                return Evidence::Known(record);
            }
        }
        Evidence::unknown(format!("no frequency for {} in {} source(s)", site, self.sources.len()))
    }
}
