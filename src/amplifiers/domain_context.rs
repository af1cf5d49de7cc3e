//! Domain-context multiplier for LOF
//!
//! A substitution next to a catalytic or structural motif hurts more than the
//! same chemistry in a disordered tail. The multiplier combines:
//!   - the strongest universal sequence motif within ±10 residues
//!   - the strongest functional class named by the protein's GO terms
//!
//! capped at 2.5. Motif scans run once per protein and are cached.

use moka::sync::Cache;
use std::sync::Arc;

use crate::amplifiers::protein_cache_key;
use crate::evidence::EvidenceContext;
use crate::types::{AmplifierResult, Feature};
use crate::utils::motifs::{motifs_near, scan_catalytic_motifs, MotifHit};

pub const MAX_DOMAIN_MULTIPLIER: f64 = 2.5;

/// GO-text keywords mapped to a functional class and its weight
const FUNCTIONAL_CLASSES: [(&str, &[&str], f64); 5] = [
    ("catalytic", &["kinase activity", "catalytic activity", "atp binding", "hydrolase", "transferase"], 1.3),
    ("structural", &["extracellular matrix", "structural constituent", "collagen"], 1.3),
    ("dna_binding", &["dna binding", "dna-binding", "transcription factor"], 1.2),
    ("transport", &["ion channel", "transmembrane transporter"], 1.2),
    ("signalling", &["receptor activity", "signal transduction"], 1.1),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DomainContext {
    pub amplifier: AmplifierResult,
    pub confidence_boost: f64,
}

fn functional_class(go_terms: &[String]) -> Option<(&'static str, f64)> {
    let lowered: Vec<String> = go_terms.iter().map(|t| t.to_lowercase()).collect();
    FUNCTIONAL_CLASSES
        .iter()
        .filter(|(_, keywords, _)| lowered.iter().any(|t| keywords.iter().any(|k| t.contains(k))))
        .map(|&(name, _, weight)| (name, weight))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// Combine precomputed motif hits with GO classes for one position
pub fn evaluate(hits: &[MotifHit], position: usize, go_terms: &[String]) -> DomainContext {
    let mut features = Vec::new();
    let mut multiplier = 1.0;
    let mut confidence_boost = 0.0;
    let mut parts = Vec::new();

    let near = motifs_near(hits, position);
    if let Some(best) = near
        .iter()
        .max_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap_or(std::cmp::Ordering::Equal))
    {
        multiplier *= best.weight;
        confidence_boost += 0.1;
        parts.push(format!("near {} motif", best.name));
        for hit in &near {
            features.push(Feature::note(format!("motif_{}", hit.name), hit.weight));
        }
    }

    if let Some((class, weight)) = functional_class(go_terms) {
        multiplier *= weight;
        confidence_boost += 0.05;
        parts.push(format!("{} protein", class));
        features.push(Feature::note(format!("go_{}", class), weight));
    }

    let multiplier = f64::min(multiplier, MAX_DOMAIN_MULTIPLIER);
    let note = if parts.is_empty() {
        "no domain context".to_string()
    } else {
        parts.join(", ")
    };
    DomainContext {
        amplifier: AmplifierResult::new(multiplier, features, note),
        confidence_boost,
    }
}

/// Motif cache keyed by protein and sequence in front of [`evaluate`]
pub struct DomainContextAnalyzer {
    motif_cache: Cache<String, Arc<Vec<MotifHit>>>,
}

impl DomainContextAnalyzer {
    pub fn new(capacity: u64) -> Self {
        Self { motif_cache: Cache::new(capacity) }
    }

    fn motif_hits(&self, sequence: &str, ctx: &EvidenceContext) -> Arc<Vec<MotifHit>> {
        let Some(protein) = ctx.protein_id() else {
            return Arc::new(scan_catalytic_motifs(&sequence.to_ascii_uppercase()));
        };
        self.motif_cache.get_with(protein_cache_key(protein, sequence), || {
            tracing::debug!(protein, "scanning catalytic motifs");
            Arc::new(scan_catalytic_motifs(&sequence.to_ascii_uppercase()))
        })
    }

    pub fn context(&self, sequence: &str, position: usize, ctx: &EvidenceContext) -> DomainContext {
        let hits = self.motif_hits(sequence, ctx);
        evaluate(&hits, position, ctx.go_terms())
    }
}

impl Default for DomainContextAnalyzer {
    fn default() -> Self {
        Self::new(10_000)
    }
}
