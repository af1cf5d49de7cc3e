//! Multiplicative amplifier subsystems
//!
//! Each amplifier turns one kind of generic evidence into an
//! [`AmplifierResult`](crate::types::AmplifierResult): a multiplier plus the
//! features that justify it. None of them knows about specific genes.

pub mod conservation;
pub mod domain_context;
pub mod frequency;
pub mod stoichiometry;

use rustc_hash::FxHasher;
use std::hash::Hasher;

pub use conservation::{
    combine, conservation_amplifier, dn_conservation_amplifier, gof_amplifier, is_highly_conserved, ConservationLookup,
    ConservationScore, ConservationSource, WindowContext,
};
pub use domain_context::{DomainContext, DomainContextAnalyzer};
pub use frequency::{
    assess, assess_evidence, FrequencyAssessment, FrequencySource, FrequencyTier,
    PopulationFrequencyAssessor,
};
pub use stoichiometry::{poison_ratio, StoichiometryEvidenceFuser};

/// Cache key for per-protein work that also reads the sequence
///
/// Isoforms sharing a protein id get distinct keys; case is ignored.
pub(crate) fn protein_cache_key(protein: &str, sequence: &str) -> String {
    let mut hasher = FxHasher::default();
    for byte in sequence.bytes() {
        hasher.write_u8(byte.to_ascii_uppercase());
    }
    format!("{}|{}|{:016x}", protein, sequence.len(), hasher.finish())
}
