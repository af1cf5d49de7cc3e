use crate::explanation::types::Rationale;

/// Markdown formatter for rationales
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format rationale as markdown
    pub fn format(rationale: &Rationale) -> String {
        let mut md = String::with_capacity(1024);
        let summary = &rationale.summary;

        md.push_str(&format!("# {} - {}\n\n", summary.variant, summary.bucket));
        md.push_str(&format!(
            "**Classification:** {} | **Pathogenicity:** {:.2} | **Confidence:** {:.2}\n\n",
            summary.classification, summary.pathogenicity, summary.confidence
        ));
        md.push_str(&format!("**Inheritance:** {}\n\n", summary.inheritance));

        if !rationale.evidence.is_empty() {
            md.push_str("## Evidence\n\n");
            for card in &rationale.evidence {
                md.push_str(&format!("### {} [{}]\n\n", card.title, card.mechanism));
                md.push_str(&format!("{}  \n", card.message));
                md.push_str(&format!("{}\n\n", card.detail));
                if !card.drivers.is_empty() {
                    md.push_str(&format!("*Drivers:* {}\n\n", card.drivers.join(", ")));
                }
            }
        }

        if !rationale.warnings.is_empty() {
            md.push_str("## Warnings\n\n");
            for warning in &rationale.warnings {
                md.push_str(&format!("{} **{}**\n\n", warning.severity.icon(), warning.message));
                md.push_str(&format!("{}\n\n", warning.detail));
            }
        }

        if !rationale.mechanisms.is_empty() {
            md.push_str("## Mechanisms\n\n");
            md.push_str("| Mechanism | Raw | Normalized | Confidence | Interpretation |\n");
            md.push_str("|-----------|-----|------------|------------|----------------|\n");
            for m in &rationale.mechanisms {
                md.push_str(&format!(
                    "| {} - {} | {:.3} | {:.3} | {:.2} | {} |\n",
                    m.code, m.name, m.raw, m.normalized, m.confidence, m.interpretation
                ));
            }
            md.push('\n');
        }

        if !rationale.notes.is_empty() {
            md.push_str("## Notes\n\n");
            for note in &rationale.notes {
                md.push_str(&format!("- {}\n", note));
            }
        }

        md
    }
}
