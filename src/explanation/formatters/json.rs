use crate::explanation::types::Rationale;
use serde_json;

/// JSON formatter for rationales
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format rationale as pretty-printed JSON
    pub fn format(rationale: &Rationale) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(rationale)
    }

    /// Format rationale as compact JSON (no whitespace)
    pub fn format_compact(rationale: &Rationale) -> Result<String, serde_json::Error> {
        serde_json::to_string(rationale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::types::*;

    fn sample() -> Rationale {
        Rationale {
            summary: SummaryExplanation {
                variant: "TP53 p.R175H".to_string(),
                classification: "LOF_plus_DN".to_string(),
                bucket: "pathogenic".to_string(),
                pathogenicity: 1.0,
                confidence: 0.9,
                inheritance: "autosomal_dominant".to_string(),
                message: "TP53 p.R175H: pathogenic".to_string(),
            },
            evidence: vec![],
            warnings: vec![WarningCard {
                warning_type: "evidence_unavailable".to_string(),
                severity: Severity::Low,
                message: "No conservation evidence".to_string(),
                detail: String::new(),
            }],
            mechanisms: vec![],
            notes: vec![],
        }
    }

    #[test]
    fn test_format_json() {
        let json = JsonFormatter::format(&sample()).unwrap();
        assert!(json.contains("\"classification\": \"LOF_plus_DN\""));
        assert!(json.contains("\"severity\": \"Low\""));
    }

    #[test]
    fn test_format_compact() {
        let json = JsonFormatter::format_compact(&sample()).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"bucket\":\"pathogenic\""));
    }
}
