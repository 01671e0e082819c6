//! Fingerprint Benchmarks
//!
//! ## Benchmark Path Types
//!
//! - `build_*`: structure to fingerprint, aromatization included
//! - `score_*`: similarity over prebuilt fingerprints or structures
//!
//! ## Structures
//!
//! - `small`: ethanol, few features
//! - `drug`: paracetamol, typical screening size
//! - `fused`: a fused ring system, the expensive case for subgraph enumeration
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench fingerprint_benchmarks
//! cargo bench --bench fingerprint_benchmarks -- "build_sim"
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sievedb::fingerprint::{
    fingerprint_similarity, similarity, FingerprintBuilder, FingerprintKind, Operand,
    SimilarityMetric, SimilarityMode,
};
use sievedb::model::parse_smiles;
use sievedb::ChemObject;
use std::time::Duration;

// =============================================================================
// Fixtures
// =============================================================================

const STRUCTURES: [(&str, &str); 3] = [
    ("small", "CCO"),
    ("drug", "CC(=O)Nc1ccc(O)cc1"),
    ("fused", "c1ccc2cc3ccccc3cc2c1"),
];

fn objects() -> Vec<(&'static str, ChemObject)> {
    STRUCTURES
        .iter()
        .map(|(name, smiles)| (*name, ChemObject::from(parse_smiles(smiles).unwrap())))
        .collect()
}

// =============================================================================
// Build
// =============================================================================
// Regression: feature enumeration cost, hashing, folding

fn build_sub_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_sub");
    group.throughput(Throughput::Elements(1));
    let builder = FingerprintBuilder::default();

    for (name, object) in objects() {
        for kind in [
            FingerprintKind::Sub,
            FingerprintKind::SubRes,
            FingerprintKind::SubTau,
        ] {
            group.bench_with_input(BenchmarkId::new(kind.as_str(), name), &object, |b, obj| {
                b.iter(|| black_box(builder.build(obj, kind, None).unwrap()));
            });
        }
    }
    group.finish();
}

fn build_sim_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_sim");
    group.throughput(Throughput::Elements(1));
    let builder = FingerprintBuilder::default();

    for (name, object) in objects() {
        for mode in [
            SimilarityMode::Sim,
            SimilarityMode::Chem,
            SimilarityMode::Ecfp4,
            SimilarityMode::Ecfp8,
        ] {
            group.bench_with_input(BenchmarkId::new(mode.as_str(), name), &object, |b, obj| {
                b.iter(|| {
                    black_box(
                        builder
                            .build(obj, FingerprintKind::Sim, Some(mode))
                            .unwrap(),
                    )
                });
            });
        }
    }
    group.finish();
}

// =============================================================================
// Score
// =============================================================================
// Regression: popcount loops, canonical serialization

fn score_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");
    group.throughput(Throughput::Elements(1));
    let builder = FingerprintBuilder::default();
    let objects = objects();
    let a = &objects[1].1;
    let b = &objects[2].1;
    let fa = builder.build(a, FingerprintKind::Full, None).unwrap();
    let fb = builder.build(b, FingerprintKind::Full, None).unwrap();

    for metric in ["tanimoto", "tversky 0.7 0.3", "euclid-sub"] {
        let metric = SimilarityMetric::parse(metric).unwrap();
        group.bench_function(metric.to_string(), |bench| {
            bench.iter(|| black_box(fingerprint_similarity(&fa, &fb, &metric).unwrap()));
        });
    }

    group.bench_function("normalized-edit", |bench| {
        bench.iter(|| {
            black_box(
                similarity(
                    Operand::Object(a),
                    Operand::Object(b),
                    &SimilarityMetric::NormalizedEdit,
                )
                .unwrap(),
            )
        });
    });
    group.finish();
}

criterion_group!(
    name = build;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = build_sub_benchmarks, build_sim_benchmarks
);

criterion_group!(
    name = score;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = score_benchmarks
);

criterion_main!(build, score);
