//! Scoring Integration Tests
//!
//! End-to-end checks through the public API: scorer coordinator, amplifiers,
//! GOF gates and the integrator working together.

use approx::assert_relative_eq;
use std::sync::Arc;
use variant_mechanism_scorer::amplifiers::{assess, poison_ratio, FrequencyTier, StoichiometryEvidenceFuser};
use variant_mechanism_scorer::data::ConservationTable;
use variant_mechanism_scorer::explanation::{JsonFormatter, MarkdownFormatter};
use variant_mechanism_scorer::integrator::{integrate, IntegratorThresholds};
use variant_mechanism_scorer::utils::grantham;
use variant_mechanism_scorer::{
    Classification, ClinicalBucket, EvidenceContext, Feature, GofGate, Mechanism, MechanismScore, ScorerConfig,
    ScoringError, VariantRequest, VariantScorer, Variant,
};

const ALL: &str = "ARNDCQEGHILKMFPSTWYV";

fn scorer() -> VariantScorer {
    VariantScorer::new(ScorerConfig::default()).unwrap()
}

fn tp53_like() -> String {
    format!("{}R{}", "A".repeat(174), "A".repeat(218))
}

fn mechanism_score(mechanism: Mechanism, value: f64, confidence: f64) -> MechanismScore {
    MechanismScore::from_features(mechanism, vec![Feature::term("x", value, 1.0)], "", confidence)
}

#[test]
fn test_grantham_symmetry() {
    for a in ALL.chars() {
        for b in ALL.chars() {
            assert_eq!(grantham(a, b), grantham(b, a), "{}-{}", a, b);
        }
    }
}

#[test]
fn test_tetramer_poison_factor() {
    assert_eq!(poison_ratio(4), Some(6.0));
    let ctx = EvidenceContext::builder().subunits(4).build().unwrap();
    let poison = StoichiometryEvidenceFuser::default().poison_factor(&"A".repeat(50), &ctx);
    assert_relative_eq!(poison.multiplier, 6.0);
}

#[test]
fn test_frequency_tiers() {
    let rare = assess(Some(0.001));
    assert_eq!(rare.tier, FrequencyTier::Rare);
    assert_relative_eq!(rare.pathogenicity_boost, 1.0);
    assert!(!rare.veto);

    let common = assess(Some(0.12));
    assert_eq!(common.tier, FrequencyTier::VeryCommon);
    assert!(common.veto);

    // Unknown frequency is never treated as ultra-rare
    let unknown = assess(None);
    assert_eq!(unknown.tier, FrequencyTier::Unknown);
    assert_relative_eq!(unknown.pathogenicity_boost, 1.0);
}

#[test]
fn test_lof_monotone_in_conservation() {
    let scorer = scorer();
    let variant = Variant::new("G", 50, 'G', 'R').unwrap();
    let seq = format!("{}G{}", "A".repeat(49), "A".repeat(50));
    let mut previous = f64::NEG_INFINITY;
    for phylop in [-10.0, -2.0, 0.0, 2.0, 5.0, 10.0] {
        let ctx = EvidenceContext::builder().conservation(Some(phylop), None).build().unwrap();
        let raw = scorer.score_lof(&variant, &seq, &ctx).unwrap().score.raw_score;
        assert!(raw >= previous, "phyloP {} gave {} < {}", phylop, raw, previous);
        previous = raw;
    }
}

#[test]
fn test_integrator_reference_cases() {
    let thresholds = IntegratorThresholds::default();

    let both = integrate(
        &mechanism_score(Mechanism::Lof, 0.5, 0.6),
        &mechanism_score(Mechanism::Dn, 0.5, 0.6),
        false,
        false,
        &thresholds,
    );
    assert_eq!(both.classification, Classification::LofPlusDn);
    assert_relative_eq!(both.pathogenicity, 0.75);
    assert_eq!(both.bucket, ClinicalBucket::Pathogenic);

    let lof = integrate(
        &mechanism_score(Mechanism::Lof, 0.8, 0.6),
        &mechanism_score(Mechanism::Dn, 0.1, 0.6),
        false,
        false,
        &thresholds,
    );
    assert_eq!(lof.classification, Classification::PureLof);
    assert_relative_eq!(lof.pathogenicity, 0.56, epsilon = 1e-12);

    let benign = integrate(
        &mechanism_score(Mechanism::Lof, 0.1, 0.6),
        &mechanism_score(Mechanism::Dn, 0.05, 0.6),
        false,
        false,
        &thresholds,
    );
    assert_eq!(benign.classification, Classification::BenignOrMild);
    assert_relative_eq!(benign.pathogenicity, 0.1);
}

#[test]
fn test_uncapped_raw_uses_normalized_for_integration() {
    let lof = mechanism_score(Mechanism::Lof, 3.0, 0.6);
    assert_relative_eq!(lof.raw_score, 3.0);
    assert_relative_eq!(lof.normalized_score, 1.0);
    let result = integrate(&lof, &mechanism_score(Mechanism::Dn, 0.0, 0.6), false, false, &IntegratorThresholds::default());
    assert_relative_eq!(result.pathogenicity, 0.7);
}

#[test]
fn test_gof_gate1_short_circuit() {
    let ctx = EvidenceContext::builder().conservation(Some(0.1), None).build().unwrap();
    let variant = Variant::new("G", 10, 'V', 'I').unwrap();
    let gof = scorer().score_gof(&variant, &"A".repeat(20), &ctx).unwrap();
    assert_eq!(gof.outcome.trace, vec![GofGate::Gate1]);
    assert_relative_eq!(gof.score.raw_score, 0.0);
}

#[test]
fn test_gof_gate2_exit_trace() {
    let ctx = EvidenceContext::builder().conservation(Some(0.2), None).build().unwrap();
    let variant = Variant::new("G", 10, 'A', 'F').unwrap();
    let gof = scorer().score_gof(&variant, &"A".repeat(20), &ctx).unwrap();
    assert_eq!(gof.outcome.trace, vec![GofGate::Gate1, GofGate::Gate2]);
    assert_eq!(gof.outcome.exit_gate, GofGate::Gate2);
}

#[test]
fn test_every_score_reconstructs_from_features() {
    let ctx = EvidenceContext::builder()
        .subunits(4)
        .conservation(Some(6.0), Some(0.95))
        .allele_frequency(0.00002)
        .go_terms(["sequence-specific DNA binding", "protein tetramerization"])
        .build()
        .unwrap();
    let result = scorer().score_protein_change("TP53", "p.Arg175His", &tp53_like(), &ctx);
    for score in [&result.lof, &result.dn, &result.gof] {
        assert!(!score.features.is_empty());
        assert_relative_eq!(score.reconstruct_raw(), score.raw_score, epsilon = 1e-9);
        assert!(score.confidence <= 0.9);
    }
    assert!(result.dn.normalized_score > 0.4);
    assert!(!result.rationale.mechanisms.is_empty());
}

#[test]
fn test_malformed_variants_do_not_abort_batch() {
    let ctx = EvidenceContext::builder().build().unwrap();
    let make = |id: &str, change: &str, sequence: &str| VariantRequest {
        id: id.to_string(),
        gene: "G".to_string(),
        protein_change: change.to_string(),
        sequence: sequence.to_string(),
        transcript: None,
        coordinate: None,
        context: ctx.clone(),
    };
    let requests = vec![
        make("ok", "A5V", "AAAAAAAAAA"),
        make("nonsense", "A5*", "AAAAAAAAAA"),
        make("synonymous", "A5A", "AAAAAAAAAA"),
        make("out_of_range", "A50V", "AAAAAAAAAA"),
        make("ok2", "p.Ala3Gly", "AAAAAAAAAA"),
    ];
    let results = scorer().score_batch(&requests);
    let malformed: Vec<bool> = results.iter().map(|r| r.is_malformed()).collect();
    assert_eq!(malformed, vec![false, true, true, true, false]);
    for r in results.iter().filter(|r| r.is_malformed()) {
        assert_relative_eq!(r.confidence(), 0.0);
        assert!(matches!(r.issues[0], ScoringError::MalformedVariant { .. }));
    }
}

#[test]
fn test_common_variant_veto_demotes() {
    let base = EvidenceContext::builder().subunits(4).conservation(Some(7.0), Some(1.0));
    let rare = base.clone().allele_frequency(0.00001).build().unwrap();
    let common = base.allele_frequency(0.3).build().unwrap();
    let variant = Variant::new("TP53", 175, 'R', 'H').unwrap();

    let scorer = scorer();
    let rare_result = scorer.score_variant(&variant, &tp53_like(), &rare);
    let common_result = scorer.score_variant(&variant, &tp53_like(), &common);

    assert!(!rare_result.integration.veto_applied);
    assert!(common_result.integration.veto_applied);
    assert!(rare_result.bucket() < common_result.bucket());
    assert!(common_result.bucket() >= ClinicalBucket::LikelyBenign);
}

#[test]
fn test_bad_overrides_fail_at_build() {
    let err = EvidenceContext::builder().weight("lof.no_such_feature", 0.5).build().unwrap_err();
    assert!(err.is_fatal());
    let err = ScorerConfig::from_json(r#"{"lof_threshold": -0.1}"#).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_conservation_table_feeds_scorer() {
    let path = std::env::temp_dir().join(format!("vms_it_cons_{}.csv", std::process::id()));
    std::fs::write(&path, "chrom,pos,phylop,phastcons\nchr1,1000,8.0,1.0\n").unwrap();
    let table = ConservationTable::load_csv(&path).unwrap();
    let scorer = scorer().with_conservation_source(Arc::new(table));

    let ctx = EvidenceContext::builder().allele_frequency(0.00001).build().unwrap();
    let variant = Variant::parse("G", "G50R")
        .unwrap()
        .with_coordinate(variant_mechanism_scorer::GenomicCoordinate::new("1", 1000));
    let seq = format!("{}G{}", "A".repeat(49), "A".repeat(50));
    let result = scorer.score_variant(&variant, &seq, &ctx);
    assert!(result.issues.is_empty());
    assert!(result.lof.feature("phylop").is_some());
    assert!(result.lof.normalized_score > 0.4);
}

#[test]
fn test_rationale_renders() {
    let ctx = EvidenceContext::builder().subunits(4).allele_frequency(0.00001).build().unwrap();
    let result = scorer().score_protein_change("TP53", "R175H", &tp53_like(), &ctx);
    let md = MarkdownFormatter::format(&result.rationale);
    assert!(md.starts_with("# TP53 p.R175H"));
    assert!(md.contains("## Mechanisms"));
    let json = JsonFormatter::format_compact(&result.rationale).unwrap();
    assert!(json.contains("\"variant\":\"TP53 p.R175H\""));
}
