//! Rationale generation
//!
//! Each mechanism contributes a [`MechanismFragment`] (evidence card,
//! warning, note) computed next to its score; [`RationaleGenerator`] merges
//! them with evidence warnings into a [`Rationale`] that the formatters
//! render as Markdown or JSON.

pub mod types;
pub mod fragments;
pub mod generator;
pub mod formatters;

pub use types::{
    EvidenceCard, MechanismCard, MechanismFragment, Rationale, Severity, SummaryExplanation, WarningCard,
};

pub use fragments::{
    generate_dn_fragment, generate_evidence_warnings, generate_gof_fragment, generate_lof_fragment,
};

pub use generator::RationaleGenerator;
pub use formatters::{JsonFormatter, MarkdownFormatter};
