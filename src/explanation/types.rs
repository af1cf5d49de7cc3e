use serde::{Deserialize, Serialize};

/// Complete rationale for one scored variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rationale {
    pub summary: SummaryExplanation,
    pub evidence: Vec<EvidenceCard>,
    pub warnings: Vec<WarningCard>,
    pub mechanisms: Vec<MechanismCard>,
    pub notes: Vec<String>,
}

/// Headline classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryExplanation {
    pub variant: String,
    pub classification: String, // "LOF_plus_DN", "pure_DN", ...
    pub bucket: String,         // "likely_pathogenic"
    pub pathogenicity: f64,
    pub confidence: f64,
    pub inheritance: String,
    pub message: String,
}

/// Supporting evidence behind a mechanism
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceCard {
    pub evidence_type: String, // "protein_destabilization", "complex_poisoning"
    pub mechanism: String,     // "LOF", "DN", "GOF"
    pub title: String,
    pub message: String,
    pub detail: String,
    /// Largest feature contributions, formatted "name (+0.21)"
    pub drivers: Vec<String>,
}

/// Caveat on the evidence or the result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningCard {
    pub warning_type: String, // "evidence_unavailable", "sequence_mismatch", "common_variant"
    pub severity: Severity,
    pub message: String,
    pub detail: String,
}

/// Severity level for warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Derive severity from a normalized mechanism score (0-1)
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.7 => Severity::High,
            s if s >= 0.5 => Severity::Medium,
            s if s >= 0.3 => Severity::Low,
            _ => Severity::Info,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Low => "⚠️",
            Severity::Medium => "⚡",
            Severity::High => "🚨",
        }
    }
}

/// One row of the mechanism table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MechanismCard {
    pub code: String, // "LOF"
    pub name: String, // "Loss of function"
    pub raw: f64,
    pub normalized: f64,
    pub confidence: f64,
    pub interpretation: String,
}

/// Fragment of the rationale from a single mechanism
#[derive(Debug, Clone, Default)]
pub struct MechanismFragment {
    pub evidence: Option<EvidenceCard>,
    pub warning: Option<WarningCard>,
    pub note: Option<String>,
}

impl MechanismFragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_evidence(evidence: EvidenceCard) -> Self {
        Self { evidence: Some(evidence), ..Self::default() }
    }

    pub fn with_warning(warning: WarningCard) -> Self {
        Self { warning: Some(warning), ..Self::default() }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_score() {
        assert_eq!(Severity::from_score(0.9), Severity::High);
        assert_eq!(Severity::from_score(0.5), Severity::Medium);
        assert_eq!(Severity::from_score(0.35), Severity::Low);
        assert_eq!(Severity::from_score(0.0), Severity::Info);
    }
}
