//! GOF GATE CONTROLLER
//!
//! Gain-of-function screening runs as an explicit state machine:
//!
//! ```text
//! Gate1 ──(disruption < t1)──────────────────────────► Done(exit Gate1)
//!   │
//!   ▼
//! Gate2 ──(overall < t2)─────────────────────────────► Done(exit Gate2)
//!   │
//!   ▼
//! Gate3 ── mismatch: ×(1 + gate-1 score) per mechanism ─► Done(exit Gate3)
//!          otherwise: ×1.2 positional multiplier
//! ```
//!
//! **Gate 1** takes the strongest of the cheap regulatory-disruption signals
//! (phospho loss, glycine hinge, charge in a charged region, proline,
//! aromatic/cysteine involvement, hydrophobic patch) and scales it by the
//! phyloP multiplier. Grantham distance is deliberately not a gate: small
//! chemical changes at regulatory sites matter.
//!
//! **Gate 2** maps the detailed signals onto the four named GOF mechanisms.
//!
//! **Gate 3** refines. A reference mismatch means coordinates cannot be
//! trusted, so the enhanced regulatory path is taken instead of the
//! positional structural multiplier.
//!
//! Every exit records the gate and the trace of gates visited.

use serde::Serialize;

use crate::types::Variant;
use crate::utils::delta;
use crate::utils::motifs::{charge_density, hinge_score, hydrophobic_context, kinase_consensus};

pub const GATE1_THRESHOLD: f64 = 0.1;
pub const GATE2_THRESHOLD: f64 = 0.2;
pub const STRUCTURAL_ENHANCEMENT: f64 = 1.2;

/// Default weights for constitutive activation, increased binding affinity,
/// autoinhibition loss, degradation resistance
pub const MECHANISM_WEIGHTS: [f64; 4] = [0.35, 0.25, 0.35, 0.05];

const CHARGE_WINDOW: usize = 10;
const HINGE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GofGate {
    Gate1,
    Gate2,
    Gate3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GofVerdict {
    #[serde(rename = "GOF_LIKELY")]
    Likely,
    #[serde(rename = "GOF_POSSIBLE")]
    Possible,
    #[serde(rename = "GOF_UNLIKELY")]
    Unlikely,
}

impl GofVerdict {
    pub fn from_score(score: f64) -> Self {
        if score > 0.6 {
            GofVerdict::Likely
        } else if score > 0.3 {
            GofVerdict::Possible
        } else {
            GofVerdict::Unlikely
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GofVerdict::Likely => "GOF_LIKELY",
            GofVerdict::Possible => "GOF_POSSIBLE",
            GofVerdict::Unlikely => "GOF_UNLIKELY",
        }
    }
}

/// Regulatory-context signals, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RegulatorySignals {
    pub phosphorylation: f64,
    pub charge: f64,
    pub flexibility: f64,
    pub allosteric: f64,
    pub interface: f64,
    pub hinge: f64,
    pub proline_introduced: bool,
    pub aromatic_change: bool,
    pub cysteine_change: bool,
    /// Hydrophobic residue lost inside a hydrophobic patch (context > 0.6)
    pub hydrophobic_patch: bool,
}

fn is_phospho_acceptor(aa: char) -> bool {
    matches!(aa, 'S' | 'T' | 'Y')
}

fn phosphorylation(variant: &Variant, sequence: &str) -> f64 {
    match (is_phospho_acceptor(variant.reference), is_phospho_acceptor(variant.alternate)) {
        (true, false) => match kinase_consensus(sequence, variant.position) {
            k if k > 0.5 => 0.9,
            k if k > 0.2 => 0.6,
            _ => 0.3,
        },
        // A new acceptor adds a brake more often than it removes one
        (false, true) => 0.1,
        _ => 0.0,
    }
}

fn charge_disruption(variant: &Variant, sequence: &str) -> f64 {
    let change = delta(variant.reference, variant.alternate).abs_charge_change;
    if change == 0.0 {
        return 0.0;
    }
    let factor = if charge_density(sequence, variant.position, CHARGE_WINDOW) > 0.3 { 0.7 } else { 0.3 };
    f64::min(change * factor, 1.0)
}

fn flexibility_disruption(variant: &Variant, hinge: f64) -> f64 {
    let loss = delta(variant.reference, variant.alternate).flexibility_loss;
    if loss <= 0 {
        return 0.0;
    }
    let score = if variant.reference == 'G' {
        if hinge > HINGE_THRESHOLD {
            0.8
        } else {
            0.5
        }
    } else if variant.alternate == 'P' {
        loss as f64 * 0.4
    } else {
        loss as f64 * 0.2
    };
    f64::min(score, 1.0)
}

fn allosteric_disruption(variant: &Variant, sequence: &str) -> f64 {
    let d = delta(variant.reference, variant.alternate);
    let mut score = 0.0;
    if d.aromatic_lost {
        score += 0.4;
    } else if d.aromatic_gained {
        score += 0.2;
    }
    if d.hydrophobicity_flip && crate::utils::properties(variant.reference).is_some_and(|p| p.hydrophobic) {
        score += hydrophobic_context(sequence, variant.position, 3) * 0.3;
    }
    f64::min(score, 1.0)
}

fn interface_disruption(variant: &Variant) -> f64 {
    let d = delta(variant.reference, variant.alternate);
    let mut score = d.abs_charge_change * 0.4;
    if d.abs_size_change > 1.0 {
        score += d.abs_size_change / 5.0 * 0.3;
    }
    f64::min(score, 1.0)
}

impl RegulatorySignals {
    pub fn detect(variant: &Variant, sequence: &str) -> Self {
        let d = delta(variant.reference, variant.alternate);
        let hinge = if variant.reference == 'G' { hinge_score(sequence, variant.position) } else { 0.0 };
        let reference_hydrophobic = crate::utils::properties(variant.reference).is_some_and(|p| p.hydrophobic);
        Self {
            phosphorylation: phosphorylation(variant, sequence),
            charge: charge_disruption(variant, sequence),
            flexibility: flexibility_disruption(variant, hinge),
            allosteric: allosteric_disruption(variant, sequence),
            interface: interface_disruption(variant),
            hinge,
            proline_introduced: d.proline_introduced,
            aromatic_change: d.aromatic_change(),
            cysteine_change: d.involves_cysteine(),
            hydrophobic_patch: reference_hydrophobic
                && d.hydrophobicity_flip
                && hydrophobic_context(sequence, variant.position, 3) > 0.6,
        }
    }

    /// Gate-1 disruption potential before conservation scaling
    pub fn disruption(&self, reference: char) -> f64 {
        let mut score: f64 = 0.0;
        if self.phosphorylation > 0.5 {
            score = score.max(0.9);
        } else if self.phosphorylation > 0.2 {
            score = score.max(0.6);
        }
        if reference == 'G' {
            score = score.max(if self.hinge > HINGE_THRESHOLD { 0.8 } else { 0.4 });
        }
        if self.charge > 0.5 {
            score = score.max(0.7);
        } else if self.charge > 0.3 {
            score = score.max(0.4);
        }
        if self.proline_introduced {
            score = score.max(0.5);
        }
        if self.aromatic_change || self.hydrophobic_patch {
            score = score.max(0.3);
        }
        if self.cysteine_change {
            score = score.max(0.4);
        }
        score
    }
}

/// Scores of the four named GOF mechanisms
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GofMechanismScores {
    pub constitutive_activation: f64,
    pub increased_binding_affinity: f64,
    pub autoinhibition_loss: f64,
    pub degradation_resistance: f64,
}

impl GofMechanismScores {
    /// Gate-2 mapping from regulatory signals
    pub fn from_signals(s: &RegulatorySignals) -> Self {
        let allosteric = s.allosteric * 0.4;
        Self {
            constitutive_activation: (s.phosphorylation * 0.9).max(s.flexibility * 0.8).max(allosteric),
            autoinhibition_loss: (s.phosphorylation * 0.95).max(s.charge * 0.6).max(allosteric),
            increased_binding_affinity: (s.charge * 0.7).max(allosteric).max(s.interface * 0.6),
            degradation_resistance: 0.0,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [
            self.constitutive_activation,
            self.increased_binding_affinity,
            self.autoinhibition_loss,
            self.degradation_resistance,
        ]
    }

    /// Multiply every mechanism by `factor`, capping each at 1
    pub fn scaled(&self, factor: f64) -> Self {
        let cap = |v: f64| f64::min(v * factor, 1.0);
        Self {
            constitutive_activation: cap(self.constitutive_activation),
            increased_binding_affinity: cap(self.increased_binding_affinity),
            autoinhibition_loss: cap(self.autoinhibition_loss),
            degradation_resistance: cap(self.degradation_resistance),
        }
    }

    pub fn weighted_sum(&self, weights: &[f64; 4]) -> f64 {
        self.as_array().iter().zip(weights).map(|(s, w)| s * w).sum()
    }

    /// Weighted sum × (1 + 0.5 × gate-1 score), capped at 1
    pub fn overall(&self, weights: &[f64; 4], gate1: f64) -> f64 {
        f64::min(self.weighted_sum(weights) * regulatory_boost(gate1), 1.0)
    }
}

pub fn regulatory_boost(gate1: f64) -> f64 {
    1.0 + 0.5 * gate1
}

/// Everything the controller needs, computed up front
#[derive(Debug, Clone, PartialEq)]
pub struct GateInput {
    pub reference: char,
    pub signals: RegulatorySignals,
    /// phyloP-derived multiplier for the Gate-1 score
    pub conservation_multiplier: f64,
    pub relative_position: f64,
    pub sequence_mismatch: bool,
    pub weights: [f64; 4],
}

/// How Gate 3 refined the mechanism scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum Refinement {
    EnhancedRegulatory { multiplier: f64 },
    Structural { multiplier: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GofOutcome {
    pub verdict: GofVerdict,
    pub score: f64,
    pub exit_gate: GofGate,
    pub trace: Vec<GofGate>,
    /// Gate-1 disruption before conservation scaling
    pub disruption: f64,
    /// Gate-1 score after conservation scaling
    pub gate1_score: f64,
    pub mechanisms: Option<GofMechanismScores>,
    pub refinement: Option<Refinement>,
    pub reason: String,
}

/// Controller state; `Done` is terminal
#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    Gate1,
    Gate2 { gate1: f64 },
    Gate3 { gate1: f64, mechanisms: GofMechanismScores },
    Done(GofOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GofGateController {
    pub gate1_threshold: f64,
    pub gate2_threshold: f64,
}

impl Default for GofGateController {
    fn default() -> Self {
        Self { gate1_threshold: GATE1_THRESHOLD, gate2_threshold: GATE2_THRESHOLD }
    }
}

impl GofGateController {
    pub fn new(gate1_threshold: f64, gate2_threshold: f64) -> Self {
        Self { gate1_threshold, gate2_threshold }
    }

    /// Advance one state. `trace` collects each gate as it is entered.
    pub fn step(&self, state: GateState, input: &GateInput, trace: &mut Vec<GofGate>) -> GateState {
        match state {
            GateState::Gate1 => {
                trace.push(GofGate::Gate1);
                let disruption = input.signals.disruption(input.reference);
                let gate1 = f64::min(disruption * input.conservation_multiplier, 1.0);
                if gate1 < self.gate1_threshold {
                    return GateState::Done(GofOutcome {
                        verdict: GofVerdict::Unlikely,
                        score: 0.0,
                        exit_gate: GofGate::Gate1,
                        trace: trace.clone(),
                        disruption,
                        gate1_score: gate1,
                        mechanisms: None,
                        refinement: None,
                        reason: format!("no regulatory disruption ({:.3})", gate1),
                    });
                }
                GateState::Gate2 { gate1 }
            }
            GateState::Gate2 { gate1 } => {
                trace.push(GofGate::Gate2);
                let mechanisms = GofMechanismScores::from_signals(&input.signals);
                let overall = mechanisms.overall(&input.weights, gate1);
                if overall < self.gate2_threshold {
                    return GateState::Done(GofOutcome {
                        verdict: GofVerdict::Unlikely,
                        score: overall,
                        exit_gate: GofGate::Gate2,
                        trace: trace.clone(),
                        disruption: input.signals.disruption(input.reference),
                        gate1_score: gate1,
                        mechanisms: Some(mechanisms),
                        refinement: None,
                        reason: format!("regulatory mechanism score {:.3} below threshold", overall),
                    });
                }
                GateState::Gate3 { gate1, mechanisms }
            }
            GateState::Gate3 { gate1, mechanisms } => {
                trace.push(GofGate::Gate3);
                let refinement = if input.sequence_mismatch {
                    Refinement::EnhancedRegulatory { multiplier: 1.0 + gate1 }
                } else if input.relative_position > 0.2 && input.relative_position < 0.8 {
                    Refinement::Structural { multiplier: STRUCTURAL_ENHANCEMENT }
                } else {
                    Refinement::Structural { multiplier: 1.0 }
                };
                let factor = match refinement {
                    Refinement::EnhancedRegulatory { multiplier } | Refinement::Structural { multiplier } => multiplier,
                };
                let refined = mechanisms.scaled(factor);
                let score = refined.overall(&input.weights, gate1);
                let verdict = GofVerdict::from_score(score);
                GateState::Done(GofOutcome {
                    verdict,
                    score,
                    exit_gate: GofGate::Gate3,
                    trace: trace.clone(),
                    disruption: input.signals.disruption(input.reference),
                    gate1_score: gate1,
                    mechanisms: Some(refined),
                    refinement: Some(refinement),
                    reason: format!("refined regulatory score {:.3}", score),
                })
            }
            done @ GateState::Done(_) => done,
        }
    }

    pub fn run(&self, input: &GateInput) -> GofOutcome {
        let mut trace = Vec::with_capacity(3);
        let mut state = GateState::Gate1;
        loop {
            state = self.step(state, input, &mut trace);
            if let GateState::Done(outcome) = state {
                tracing::debug!(exit = ?outcome.exit_gate, score = outcome.score, "gof gates finished");
                return outcome;
            }
        }
    }
}
