//! Utility modules for variant scoring
//!
//! Contains shared functionality used across multiple mechanisms:
//! - Amino acids: residue property table, substitution deltas, Grantham distances
//! - Motifs: windowed sequence pattern detectors
//! - Normalization: fixed-breakpoint tiering and clamping

pub mod amino_acids;
pub mod motifs;
pub mod normalization;

// Re-export commonly used types
pub use amino_acids::{
    delta, grantham, grantham_severity, properties, ConservationTier, Flexibility,
    ResidueProperties, StabilityClass, SubstitutionDelta,
};
pub use normalization::{clamp_unit, tier_above};
