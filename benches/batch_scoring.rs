use criterion::{black_box, criterion_group, criterion_main, Criterion};
use variant_mechanism_scorer::{EvidenceContext, ScorerConfig, VariantRequest, VariantScorer};

const RESIDUES: &[u8] = b"ARNDCQEGHILKMFPSTWYV";

fn make_sequence(len: usize) -> String {
    (0..len).map(|i| RESIDUES[(i * 7 + i / 3) % RESIDUES.len()] as char).collect()
}

fn make_requests(count: usize) -> Vec<VariantRequest> {
    let sequence = make_sequence(400);
    let bytes = sequence.as_bytes();
    (0..count)
        .map(|i| {
            let position = 1 + (i * 13) % bytes.len();
            let reference = bytes[position - 1] as char;
            let alternate = RESIDUES.iter().map(|&b| b as char).find(|&a| a != reference).unwrap_or('A');
            let context = EvidenceContext::builder()
                .protein_id("BENCH1")
                .subunits([1, 2, 4, 6][i % 4])
                .conservation(Some((i % 10) as f64 - 2.0), Some(0.5))
                .allele_frequency(10f64.powi(-((i % 6) as i32)))
                .build()
                .unwrap();
            VariantRequest {
                id: format!("v{i:05}"),
                gene: "BENCH1".to_string(),
                protein_change: format!("{}{}{}", reference, position, alternate),
                sequence: sequence.clone(),
                transcript: None,
                coordinate: None,
                context,
            }
        })
        .collect()
}

fn scoring_benchmarks(c: &mut Criterion) {
    let scorer = VariantScorer::new(ScorerConfig::default()).unwrap();

    let single = make_requests(1);
    c.bench_function("score_single_variant", |b| b.iter(|| scorer.score_request(black_box(&single[0]))));

    let batch_1k = make_requests(1000);
    c.bench_function("score_batch_1k", |b| b.iter(|| scorer.score_batch(black_box(&batch_1k))));
}

criterion_group!(benches, scoring_benchmarks);
criterion_main!(benches);
