//! Variant Scorer - Main coordinator for mechanism scoring
//!
//! Resolves amplifier evidence, runs the LOF, DN and GOF scorers concurrently
//! against one shared context, integrates LOF/DN and assembles the rationale.
//! Includes a parallel (Rayon) batch entry point.
//!
//! **Per-variant flow:**
//!   1. position check (malformed → zero-confidence empty result)
//!   2. reference check (mismatch → flag, sequence-only DN/GOF paths)
//!   3. fill `Unknown` conservation/frequency from the configured sources
//!   4. LOF ∥ DN ∥ GOF via `rayon::join`, each with its rationale fragment
//!   5. integration, frequency veto, rationale

use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use crate::amplifiers::{
    assess, assess_evidence, is_highly_conserved, ConservationLookup, ConservationSource, DomainContextAnalyzer,
    FrequencyAssessment, FrequencySource, PopulationFrequencyAssessor, StoichiometryEvidenceFuser, WindowContext,
};
use crate::config::ScorerConfig;
use crate::error::{ScoringError, ScoringResult};
use crate::evidence::{Evidence, EvidenceContext};
use crate::explanation::{
    generate_dn_fragment, generate_gof_fragment, generate_lof_fragment, MechanismFragment, Rationale,
    RationaleGenerator,
};
use crate::integrator::{integrate, Classification, ClinicalBucket, Integration, IntegratorThresholds};
use crate::mechanisms::{
    calculate_dn, calculate_gof, calculate_lof, DnPathwayProfile, DnResult, GofGateController, GofOutcome,
    GofResult, GofVerdict, LofResult,
};
use crate::types::{GenomicCoordinate, Mechanism, MechanismScore, Variant};

/// One row of a batch: raw protein change plus its evidence
#[derive(Debug, Clone)]
pub struct VariantRequest {
    pub id: String,
    pub gene: String,
    pub protein_change: String,
    pub sequence: String,
    pub transcript: Option<String>,
    pub coordinate: Option<GenomicCoordinate>,
    pub context: EvidenceContext,
}

/// Final result for one variant
#[derive(Debug, Clone, Serialize)]
pub struct IntegratedResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub variant: String,
    pub lof: MechanismScore,
    pub dn: MechanismScore,
    pub gof: MechanismScore,
    pub gof_outcome: Option<GofOutcome>,
    pub dn_pathways: Option<DnPathwayProfile>,
    pub integration: Integration,
    pub frequency: FrequencyAssessment,
    pub conservation_context: WindowContext,
    pub rationale: Rationale,
    pub issues: Vec<ScoringError>,
    pub sequence_mismatch: bool,
}

impl IntegratedResult {
    /// Zero-confidence placeholder for a request that could not be scored
    fn malformed(variant: String, error: ScoringError, thresholds: &IntegratorThresholds) -> Self {
        let lof = MechanismScore::empty(Mechanism::Lof, "not scored");
        let dn = MechanismScore::empty(Mechanism::Dn, "not scored");
        let gof = MechanismScore::empty(Mechanism::Gof, "not scored");
        let integration = integrate(&lof, &dn, false, false, thresholds);
        let rationale = RationaleGenerator::malformed(&variant, &integration, &error);
        Self {
            request_id: None,
            variant,
            lof,
            dn,
            gof,
            gof_outcome: None,
            dn_pathways: None,
            integration,
            frequency: assess(None),
            conservation_context: WindowContext::Unknown,
            rationale,
            issues: vec![error],
            sequence_mismatch: false,
        }
    }

    pub fn classification(&self) -> Classification {
        self.integration.classification
    }

    pub fn pathogenicity(&self) -> f64 {
        self.integration.pathogenicity
    }

    pub fn bucket(&self) -> ClinicalBucket {
        self.integration.bucket
    }

    pub fn confidence(&self) -> f64 {
        self.integration.confidence
    }

    pub fn gof_verdict(&self) -> Option<GofVerdict> {
        self.gof_outcome.as_ref().map(|o| o.verdict)
    }

    pub fn is_malformed(&self) -> bool {
        self.issues.iter().any(|i| matches!(i, ScoringError::MalformedVariant { .. }))
    }
}

/// Main variant scorer
pub struct VariantScorer {
    config: ScorerConfig,
    thresholds: IntegratorThresholds,
    gates: GofGateController,
    conservation: Option<ConservationLookup>,
    frequency: PopulationFrequencyAssessor,
    stoichiometry: StoichiometryEvidenceFuser,
    domain: DomainContextAnalyzer,
}

impl VariantScorer {
    /// Build a scorer; an invalid config is the one fatal error
    pub fn new(config: ScorerConfig) -> ScoringResult<Self> {
        config.validate()?;
        tracing::info!(
            lof_threshold = config.lof_threshold,
            dn_threshold = config.dn_threshold,
            gate1 = config.gate1_threshold,
            gate2 = config.gate2_threshold,
            "variant scorer initialized"
        );
        Ok(Self {
            thresholds: config.thresholds(),
            gates: config.gate_controller(),
            conservation: None,
            frequency: PopulationFrequencyAssessor::new(),
            stoichiometry: StoichiometryEvidenceFuser::new(config.cache.stoichiometry),
            domain: DomainContextAnalyzer::new(config.cache.domain_context),
            config,
        })
    }

    pub fn with_conservation_source(mut self, source: Arc<dyn ConservationSource>) -> Self {
        self.conservation = Some(ConservationLookup::new(source, self.config.cache.conservation));
        self
    }

    /// Add a frequency database; sources are consulted in fixed priority order
    pub fn with_frequency_source(mut self, source: Arc<dyn FrequencySource>) -> Self {
        self.frequency = self.frequency.with_source(source);
        tracing::info!(sources = ?self.frequency.source_names(), "frequency source chain");
        self
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Fill `Unknown` conservation/frequency from the configured sources
    ///
    /// Caller-supplied evidence always wins; lookups only run when the
    /// variant carries a genomic coordinate.
    fn resolve_evidence<'a>(&self, variant: &Variant, ctx: &'a EvidenceContext) -> Cow<'a, EvidenceContext> {
        let mut resolved = Cow::Borrowed(ctx);
        let Some(site) = &variant.coordinate else {
            return resolved;
        };
        if let (Evidence::Unknown { .. }, Some(lookup)) = (ctx.conservation(), &self.conservation) {
            let evidence = lookup.evidence(&site.chrom, site.pos);
            resolved = Cow::Owned(resolved.with_conservation(evidence));
        }
        if matches!(ctx.frequency(), Evidence::Unknown { .. }) && !self.frequency.is_empty() {
            let evidence = self.frequency.lookup(site);
            resolved = Cow::Owned(resolved.with_frequency(evidence));
        }
        resolved
    }

    fn unavailable_issues(ctx: &EvidenceContext, issues: &mut Vec<ScoringError>) {
        if let Some(reason) = ctx.conservation().unknown_reason() {
            issues.push(ScoringError::unavailable("conservation", reason));
        }
        if let Some(reason) = ctx.frequency().unknown_reason() {
            issues.push(ScoringError::unavailable("population_frequency", reason));
        }
    }

    fn window_context(&self, variant: &Variant) -> WindowContext {
        match (&self.conservation, &variant.coordinate) {
            (Some(lookup), Some(site)) => lookup.window_context(&site.chrom, site.pos, self.config.conservation_window),
            _ => WindowContext::Unknown,
        }
    }

    fn run_lof(
        &self,
        variant: &Variant,
        sequence: &str,
        ctx: &EvidenceContext,
        frequency: &FrequencyAssessment,
    ) -> LofResult {
        let domain = self.domain.context(sequence, variant.position, ctx);
        calculate_lof(variant, sequence, ctx, &domain, frequency)
    }

    fn run_dn(
        &self,
        variant: &Variant,
        sequence: &str,
        ctx: &EvidenceContext,
        frequency: &FrequencyAssessment,
        sequence_mismatch: bool,
    ) -> DnResult {
        let poison = self.stoichiometry.poison_factor(sequence, ctx);
        calculate_dn(variant, sequence, ctx, &poison, frequency, sequence_mismatch)
    }

    fn run_gof(&self, variant: &Variant, sequence: &str, ctx: &EvidenceContext, sequence_mismatch: bool) -> GofResult {
        calculate_gof(variant, sequence, ctx, &self.gates, sequence_mismatch)
    }

    /// Position fits, and does the reference agree?
    fn check(variant: &Variant, sequence: &str, issues: &mut Vec<ScoringError>) -> ScoringResult<bool> {
        variant.check_position(sequence)?;
        match variant.check_reference(sequence) {
            Ok(()) => Ok(false),
            Err(err @ ScoringError::SequenceMismatch { .. }) => {
                tracing::warn!(variant = %variant.label(), error = %err, "reference mismatch");
                issues.push(err);
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    /// Score one variant against its sequence and evidence
    pub fn score_variant(&self, variant: &Variant, sequence: &str, ctx: &EvidenceContext) -> IntegratedResult {
        let label = variant.label();
        let mut issues = Vec::new();
        let sequence_mismatch = match Self::check(variant, sequence, &mut issues) {
            Ok(mismatch) => mismatch,
            Err(err) => {
                tracing::warn!(variant = %label, error = %err, "variant not scored");
                return IntegratedResult::malformed(label, err, &self.thresholds);
            }
        };

        let resolved = self.resolve_evidence(variant, ctx);
        let ctx = resolved.as_ref();
        Self::unavailable_issues(ctx, &mut issues);
        let frequency = assess_evidence(ctx.frequency());

        // LOF ∥ DN ∥ GOF, each paired with its rationale fragment
        let (((lof, lof_fragment), (dn, dn_fragment)), (gof, gof_fragment)) = rayon::join(
            || {
                rayon::join(
                    || {
                        let lof = self.run_lof(variant, sequence, ctx, &frequency);
                        let fragment = generate_lof_fragment(&lof);
                        (lof, fragment)
                    },
                    || {
                        let dn = self.run_dn(variant, sequence, ctx, &frequency, sequence_mismatch);
                        let fragment = generate_dn_fragment(&dn);
                        (dn, fragment)
                    },
                )
            },
            || {
                let gof = self.run_gof(variant, sequence, ctx, sequence_mismatch);
                let fragment = generate_gof_fragment(&gof);
                (gof, fragment)
            },
        );

        let lof_score = lof.score.with_sequence_mismatch(sequence_mismatch);
        let integration = integrate(
            &lof_score,
            &dn.score,
            is_highly_conserved(ctx.conservation()),
            frequency.veto,
            &self.thresholds,
        );
        let fragments: Vec<MechanismFragment> = vec![lof_fragment, dn_fragment, gof_fragment];
        let rationale = RationaleGenerator::generate(
            &label,
            &integration,
            [&lof_score, &dn.score, &gof.score],
            fragments,
            &issues,
            &frequency,
        );

        tracing::debug!(
            variant = %label,
            lof = lof_score.normalized_score,
            dn = dn.score.normalized_score,
            gof = gof.score.normalized_score,
            classification = integration.classification.as_str(),
            bucket = integration.bucket.as_str(),
            "variant scored"
        );

        IntegratedResult {
            request_id: None,
            conservation_context: self.window_context(variant),
            variant: label,
            lof: lof_score,
            dn: dn.score,
            gof: gof.score,
            gof_outcome: Some(gof.outcome),
            dn_pathways: Some(dn.pathways),
            integration,
            frequency,
            rationale,
            issues,
            sequence_mismatch,
        }
    }

    /// LOF alone, with evidence resolved the same way as [`Self::score_variant`]
    pub fn score_lof(&self, variant: &Variant, sequence: &str, ctx: &EvidenceContext) -> ScoringResult<LofResult> {
        variant.check_position(sequence)?;
        let resolved = self.resolve_evidence(variant, ctx);
        let frequency = assess_evidence(resolved.frequency());
        Ok(self.run_lof(variant, sequence, &resolved, &frequency))
    }

    pub fn score_dn(&self, variant: &Variant, sequence: &str, ctx: &EvidenceContext) -> ScoringResult<DnResult> {
        let mismatch = Self::check(variant, sequence, &mut Vec::new())?;
        let resolved = self.resolve_evidence(variant, ctx);
        let frequency = assess_evidence(resolved.frequency());
        Ok(self.run_dn(variant, sequence, &resolved, &frequency, mismatch))
    }

    pub fn score_gof(&self, variant: &Variant, sequence: &str, ctx: &EvidenceContext) -> ScoringResult<GofResult> {
        let mismatch = Self::check(variant, sequence, &mut Vec::new())?;
        let resolved = self.resolve_evidence(variant, ctx);
        Ok(self.run_gof(variant, sequence, &resolved, mismatch))
    }

    /// Parse a protein change (`R175H`, `p.Arg175His`) and score it
    pub fn score_protein_change(
        &self,
        gene: &str,
        change: &str,
        sequence: &str,
        ctx: &EvidenceContext,
    ) -> IntegratedResult {
        match Variant::parse(gene, change) {
            Ok(variant) => self.score_variant(&variant, sequence, ctx),
            Err(err) => {
                tracing::warn!(gene, change, error = %err, "unparseable protein change");
                IntegratedResult::malformed(format!("{} {}", gene, change), err, &self.thresholds)
            }
        }
    }

    pub fn score_request(&self, request: &VariantRequest) -> IntegratedResult {
        let mut result = match Variant::parse(&request.gene, &request.protein_change) {
            Ok(mut variant) => {
                if let Some(coordinate) = &request.coordinate {
                    variant = variant.with_coordinate(coordinate.clone());
                }
                if let Some(transcript) = &request.transcript {
                    variant = variant.with_transcript(transcript.clone());
                }
                self.score_variant(&variant, &request.sequence, &request.context)
            }
            Err(err) => {
                tracing::warn!(id = %request.id, error = %err, "unparseable protein change");
                IntegratedResult::malformed(
                    format!("{} {}", request.gene, request.protein_change),
                    err,
                    &self.thresholds,
                )
            }
        };
        result.request_id = Some(request.id.clone());
        result
    }

    /// Score a batch IN PARALLEL; results keep input order
    ///
    /// Variants share nothing but the read-mostly caches, so a malformed
    /// request only affects its own result.
    pub fn score_batch(&self, requests: &[VariantRequest]) -> Vec<IntegratedResult> {
        let start = Instant::now();
        let results: Vec<IntegratedResult> = requests.par_iter().map(|r| self.score_request(r)).collect();
        let malformed = results.iter().filter(|r| r.is_malformed()).count();
        tracing::info!(
            variants = results.len(),
            malformed,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "batch scored"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplifiers::FrequencyTier;
    use crate::evidence::{ConservationScores, FrequencyRecord};
    use approx::assert_relative_eq;

    struct FixedConservation(f64);

    impl ConservationSource for FixedConservation {
        fn conservation(&self, _chrom: &str, _pos: u64) -> Option<ConservationScores> {
            Some(ConservationScores { phylop: Some(self.0), phastcons: Some(0.9) })
        }
    }

    struct FixedFrequency(f64);

    impl FrequencySource for FixedFrequency {
        fn name(&self) -> &str {
            "gnomad"
        }

        fn frequency(&self, _site: &GenomicCoordinate) -> Option<FrequencyRecord> {
            Some(FrequencyRecord::new(self.0))
        }
    }

    fn scorer() -> VariantScorer {
        VariantScorer::new(ScorerConfig::default()).unwrap()
    }

    fn tp53_like() -> String {
        format!("{}R{}", "A".repeat(174), "A".repeat(218))
    }

    #[test]
    fn test_position_beyond_sequence_is_malformed() {
        let variant = Variant::new("G", 50, 'A', 'V').unwrap();
        let ctx = EvidenceContext::builder().build().unwrap();
        let result = scorer().score_variant(&variant, "AAAA", &ctx);
        assert!(result.is_malformed());
        assert_relative_eq!(result.confidence(), 0.0);
        assert!(result.gof_outcome.is_none());
        assert_eq!(result.lof.confidence, 0.0);
    }

    #[test]
    fn test_reference_mismatch_sets_flag() {
        let variant = Variant::new("G", 10, 'R', 'H').unwrap();
        let ctx = EvidenceContext::builder().build().unwrap();
        let result = scorer().score_variant(&variant, &"A".repeat(40), &ctx);
        assert!(result.sequence_mismatch);
        assert!(result.lof.sequence_mismatch && result.dn.sequence_mismatch && result.gof.sequence_mismatch);
        assert!(result.issues.iter().any(|i| matches!(i, ScoringError::SequenceMismatch { .. })));
        assert!(!result.is_malformed());
    }

    #[test]
    fn test_sources_fill_unknown_evidence() {
        let scorer = scorer()
            .with_conservation_source(Arc::new(FixedConservation(6.0)))
            .with_frequency_source(Arc::new(FixedFrequency(0.00001)));
        let variant = Variant::new("TP53", 175, 'R', 'H')
            .unwrap()
            .with_coordinate(GenomicCoordinate::new("17", 7674220));
        let ctx = EvidenceContext::builder().subunits(4).build().unwrap();

        let result = scorer.score_variant(&variant, &tp53_like(), &ctx);
        assert_eq!(result.frequency.tier, FrequencyTier::UltraRare);
        assert_eq!(result.frequency.source.as_deref(), Some("gnomad"));
        assert!(result.issues.is_empty());
        assert!(result.lof.feature("phylop").is_some());
        // Uniform phyloP everywhere: no peak or valley
        assert_eq!(result.conservation_context, WindowContext::Typical);
    }

    #[test]
    fn test_caller_evidence_wins_over_sources() {
        let scorer = scorer().with_frequency_source(Arc::new(FixedFrequency(0.3)));
        let variant = Variant::new("G", 50, 'A', 'V')
            .unwrap()
            .with_coordinate(GenomicCoordinate::new("1", 100));
        let ctx = EvidenceContext::builder().allele_frequency(0.00001).build().unwrap();
        let result = scorer.score_variant(&variant, &"A".repeat(100), &ctx);
        assert!(!result.frequency.veto);
    }

    #[test]
    fn test_missing_evidence_recorded_as_issues() {
        let variant = Variant::new("G", 50, 'A', 'V').unwrap();
        let ctx = EvidenceContext::builder().build().unwrap();
        let result = scorer().score_variant(&variant, &"A".repeat(100), &ctx);
        let unavailable = result
            .issues
            .iter()
            .filter(|i| matches!(i, ScoringError::EvidenceUnavailable { .. }))
            .count();
        assert_eq!(unavailable, 2);
        assert!(result.frequency.is_unknown());
    }

    #[test]
    fn test_common_variant_vetoed() {
        let variant = Variant::new("TP53", 175, 'R', 'H').unwrap();
        let ctx = EvidenceContext::builder()
            .subunits(4)
            .conservation(Some(7.0), Some(1.0))
            .allele_frequency(0.25)
            .build()
            .unwrap();
        let result = scorer().score_variant(&variant, &tp53_like(), &ctx);
        assert!(result.integration.veto_applied);
        assert!(result.bucket() >= ClinicalBucket::LikelyBenign);
    }

    #[test]
    fn test_unparseable_change_in_batch() {
        let ctx = EvidenceContext::builder().build().unwrap();
        let request = |id: &str, change: &str| VariantRequest {
            id: id.to_string(),
            gene: "G".to_string(),
            protein_change: change.to_string(),
            sequence: "A".repeat(30),
            transcript: None,
            coordinate: None,
            context: ctx.clone(),
        };
        let results = scorer().score_batch(&[request("a", "A10V"), request("b", "A10*"), request("c", "p.Ala12Gly")]);
        assert_eq!(results.len(), 3);
        assert!(!results[0].is_malformed());
        assert!(results[1].is_malformed());
        assert!(!results[2].is_malformed());
        assert_eq!(results[1].request_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_single_mechanism_entry_points() {
        let scorer = scorer();
        let ctx = EvidenceContext::builder().build().unwrap();
        let variant = Variant::new("G", 50, 'A', 'V').unwrap();
        assert!(scorer.score_lof(&variant, &"A".repeat(100), &ctx).is_ok());
        assert!(scorer.score_dn(&variant, "AAA", &ctx).is_err());
        assert!(scorer.score_gof(&variant, &"A".repeat(100), &ctx).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScorerConfig { dn_threshold: 2.0, ..ScorerConfig::default() };
        assert!(VariantScorer::new(config).is_err());
    }
}
