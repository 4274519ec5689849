use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptest_core::model::ResponseRecord;
use adaptest_core::scoring::{EloScorer, HybridScorer, IrtScorer, Scorer};

/// A mixed history climbing through the levels.
fn history(len: usize) -> Vec<ResponseRecord> {
    (0..len)
        .map(|i| {
            let difficulty = (i % 5) as u8 + 1;
            ResponseRecord {
                item_id: format!("bench-{i}"),
                difficulty,
                category: "bench".into(),
                is_correct: i % 3 != 0,
                difficulty_at_time: difficulty,
            }
        })
        .collect()
}

fn bench_irt(c: &mut Criterion) {
    let mut group = c.benchmark_group("irt_estimate_theta");
    let scorer = IrtScorer::default();

    for len in [5, 15, 30] {
        let responses = history(len);
        group.bench_function(format!("responses={len}"), |b| {
            b.iter(|| scorer.estimate_theta(black_box(&responses)))
        });
    }

    group.finish();
}

fn bench_elo(c: &mut Criterion) {
    let mut group = c.benchmark_group("elo_final_rating");
    let scorer = EloScorer::default();

    for len in [5, 15, 30] {
        let responses = history(len);
        group.bench_function(format!("responses={len}"), |b| {
            b.iter(|| scorer.final_rating(black_box(&responses)))
        });
    }

    group.finish();
}

fn bench_hybrid_diagnostics(c: &mut Criterion) {
    let scorer = HybridScorer::default();
    let responses = history(30);
    c.bench_function("hybrid_diagnostics", |b| {
        b.iter(|| scorer.diagnostics(black_box(&responses)))
    });
}

criterion_group!(benches, bench_irt, bench_elo, bench_hybrid_diagnostics);
criterion_main!(benches);
