//! Error taxonomy for variant scoring
//!
//! Only [`ScoringError::Configuration`] stops a run. The other variants are
//! per-variant: they are recorded on the result (`issues`) and the scorer
//! carries on with neutral amplifiers or sequence-only paths, so a batch is
//! never aborted by one bad record.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringError {
    /// Substitution could not be parsed or does not fit the sequence
    #[error("malformed variant '{input}': {reason}")]
    MalformedVariant { input: String, reason: String },

    /// A collaborator had no data; the amplifier fell back to neutral
    #[error("{evidence} evidence unavailable: {reason}")]
    EvidenceUnavailable { evidence: String, reason: String },

    /// Reference residue disagrees with the supplied sequence
    #[error("reference {expected} at position {position} but sequence has {found}")]
    SequenceMismatch {
        position: usize,
        expected: char,
        found: char,
    },

    /// Bad weight override or threshold; fatal at construction time
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ScoringError {
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        ScoringError::MalformedVariant {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(evidence: impl Into<String>, reason: impl Into<String>) -> Self {
        ScoringError::EvidenceUnavailable {
            evidence: evidence.into(),
            reason: reason.into(),
        }
    }

    /// True for the one error class that must abort the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScoringError::Configuration(_))
    }
}

pub type ScoringResult<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(ScoringError::Configuration("bad".into()).is_fatal());
        assert!(!ScoringError::malformed("X1Y", "unknown residue").is_fatal());
        assert!(!ScoringError::unavailable("conservation", "no row").is_fatal());
        assert!(!ScoringError::SequenceMismatch { position: 3, expected: 'R', found: 'K' }.is_fatal());
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = ScoringError::SequenceMismatch { position: 175, expected: 'R', found: 'H' };
        assert_eq!(err.to_string(), "reference R at position 175 but sequence has H");
    }
}
