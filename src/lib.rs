//! Variant Mechanism Scorer
//!
//! Mechanism-aware pathogenicity scoring for single amino-acid substitutions.
//! Three independent mechanisms are estimated from generic evidence and fused
//! into one clinical classification with an inheritance hint and rationale.
//!
//! Layout, leaves first:
//! - `utils/`: residue property table, Grantham matrix, sequence motifs
//! - `evidence/`: the immutable per-request [`EvidenceContext`]
//! - `amplifiers/`: conservation, population frequency, stoichiometry and
//!   domain-context multipliers
//! - `mechanisms/`: LOF, DN and the GOF three-gate controller
//! - `integrator`: LOF/DN fusion, clinical bucket, frequency veto
//! - `scorer`: coordinator; concurrent mechanisms and parallel batches
//! - `explanation/`: rationale fragments and formatters
//! - `data`: Polars CSV loaders for evidence tables and batches

pub mod amplifiers;
pub mod config;
pub mod data;
pub mod error;
pub mod evidence;
pub mod explanation;
pub mod integrator;
pub mod mechanisms;
pub mod scorer;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::ScorerConfig;
pub use data::{load_variant_requests, ConservationTable, FrequencyTable};
pub use error::{ScoringError, ScoringResult};
pub use evidence::{ConservationScores, Evidence, EvidenceContext, EvidenceContextBuilder, FrequencyRecord};
pub use integrator::{Classification, ClinicalBucket, Inheritance, Integration, IntegratorThresholds};
pub use mechanisms::{GofGate, GofVerdict};
pub use scorer::{IntegratedResult, VariantRequest, VariantScorer};
pub use types::{Feature, FeatureKind, GenomicCoordinate, Mechanism, MechanismScore, Variant};
