//! Benchmarks for the scoring hot path (SPEC_FULL.md §10.5): `scoring::score`
//! runs once per candidate bundle per input, so its cost dominates a large
//! batch run far more than the one-off config/canonicalisation work.

use std::collections::HashMap;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use llpg_matcher::config::WeightsConfig;
use llpg_matcher::features::keys;
use llpg_matcher::scoring::score;

fn perfect_match_features() -> HashMap<String, f64> {
    let mut f = HashMap::new();
    f.insert(keys::TRIGRAM_SIM.to_string(), 1.0);
    f.insert(keys::EMBED_COS.to_string(), 1.0);
    f.insert(keys::LOCALITY_OVERLAP.to_string(), 1.0);
    f.insert(keys::STREET_OVERLAP.to_string(), 1.0);
    f.insert(keys::SAME_HOUSE_NUM.to_string(), 1.0);
    f.insert(keys::SAME_HOUSE_ALPHA.to_string(), 1.0);
    f.insert(keys::HOUSE_NUM_MATCH.to_string(), 1.0);
    f.insert(keys::UNIT_MATCH.to_string(), 0.0);
    f.insert(keys::PHONETIC_HITS.to_string(), 2.0);
    f.insert(keys::SPATIAL_BOOST.to_string(), 0.0);
    f.insert(keys::USRN_MATCH.to_string(), 1.0);
    f.insert(keys::STATUS_LIVE.to_string(), 1.0);
    f.insert(keys::DESCRIPTOR_MISMATCH.to_string(), 0.0);
    f.insert(keys::LEGACY_REFERENCE_VALID.to_string(), 0.0);
    f
}

fn house_number_conflict_features() -> HashMap<String, f64> {
    let mut f = perfect_match_features();
    f.insert(keys::HOUSE_NUM_MATCH.to_string(), -1.0);
    f.insert(keys::SAME_HOUSE_NUM.to_string(), 0.0);
    f
}

fn bench_score(c: &mut Criterion) {
    let weights = WeightsConfig::default();
    let mut group = c.benchmark_group("scoring::score");
    for (label, features) in [
        ("perfect_match", perfect_match_features()),
        ("house_number_conflict", house_number_conflict_features()),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &features, |b, features| {
            b.iter(|| black_box(score(black_box(features), black_box(&weights))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_score);
criterion_main!(benches);
