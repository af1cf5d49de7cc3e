//! Mechanism scorers
//!
//! One module per disease mechanism:
//! - LOF: stability, residue criticality, rigidity, functional residue loss
//! - DN: complex poisoning amplified by subunit count, plus pathway profile
//! - GOF: the three-gate regulatory screen

pub mod dn;
pub mod dn_pathways;
pub mod gof;
pub mod gof_gates;
pub mod lof;

pub use dn::{calculate_dn, DnResult};
pub use dn_pathways::{DnPathwayProfile, PathwayScore};
pub use gof::{calculate_gof, GofResult};
pub use gof_gates::{GateState, GofGate, GofGateController, GofOutcome, GofVerdict, RegulatorySignals};
pub use lof::{calculate_lof, LofMechanism, LofResult};
