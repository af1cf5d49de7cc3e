use crate::amplifiers::FrequencyAssessment;
use crate::error::ScoringError;
use crate::explanation::types::{Severity, WarningCard};

/// Warning cards for recorded issues and the common-variant veto
pub fn generate_evidence_warnings(issues: &[ScoringError], frequency: &FrequencyAssessment) -> Vec<WarningCard> {
    let mut warnings: Vec<WarningCard> = issues
        .iter()
        .filter_map(|issue| match issue {
            ScoringError::EvidenceUnavailable { evidence, reason } => Some(WarningCard {
                warning_type: "evidence_unavailable".to_string(),
                severity: Severity::Low,
                message: format!("No {} evidence", evidence),
                detail: format!("{}; the amplifier stayed neutral and confidence was reduced.", reason),
            }),
            ScoringError::SequenceMismatch { position, expected, found } => Some(WarningCard {
                warning_type: "sequence_mismatch".to_string(),
                severity: Severity::Medium,
                message: format!("Reference mismatch at position {}", position),
                detail: format!(
                    "Variant names {} but the sequence has {}. Structure-based DN/GOF paths were skipped; check the isoform.",
                    expected, found
                ),
            }),
            ScoringError::MalformedVariant { input, reason } => Some(WarningCard {
                warning_type: "malformed_variant".to_string(),
                severity: Severity::High,
                message: format!("Could not score '{}'", input),
                detail: reason.clone(),
            }),
            ScoringError::Configuration(_) => None,
        })
        .collect();

    if frequency.veto {
        warnings.push(WarningCard {
            warning_type: "common_variant".to_string(),
            severity: Severity::High,
            message: "Common in the population".to_string(),
            detail: format!(
                "{}. Too frequent for a penetrant rare-disease allele; the clinical bucket was demoted.",
                frequency.note
            ),
        });
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplifiers::assess;

    #[test]
    fn test_veto_and_issues() {
        let issues = vec![
            ScoringError::unavailable("conservation", "no phyloP"),
            ScoringError::SequenceMismatch { position: 5, expected: 'R', found: 'K' },
        ];
        let warnings = generate_evidence_warnings(&issues, &assess(Some(0.3)));
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].warning_type, "evidence_unavailable");
        assert_eq!(warnings[2].warning_type, "common_variant");
        assert_eq!(warnings[2].severity, Severity::High);
    }

    #[test]
    fn test_rare_variant_without_issues() {
        assert!(generate_evidence_warnings(&[], &assess(Some(0.00001))).is_empty());
    }
}
