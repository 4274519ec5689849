use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use adaptest_core::bank::QuestionBank;
use adaptest_core::engine::AdaptiveEngine;
use adaptest_core::model::Item;
use adaptest_core::session::{administer, NoopReporter, SimulatedExaminee};
use adaptest_core::EngineConfig;

fn bank(per_level: usize) -> QuestionBank {
    let items = (1..=5u8)
        .flat_map(|level| {
            (0..per_level).map(move |n| {
                let options: BTreeMap<String, String> = ["a", "b", "c", "d"]
                    .iter()
                    .map(|k| (k.to_string(), format!("option {k} for {level}-{n}")))
                    .collect();
                Item {
                    id: format!("{level}-{n}"),
                    difficulty: level,
                    category: format!("topic-{}", n % 4),
                    prompt: format!("Question {level}-{n}"),
                    options,
                    correct_key: "b".into(),
                    explanation: String::new(),
                }
            })
        })
        .collect();
    QuestionBank::from_items(items).expect("bench bank is valid")
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("bank_select");
    let bank = bank(200);
    let mut rng = StdRng::seed_from_u64(42);

    let none = HashSet::new();
    group.bench_function("fresh", |b| {
        b.iter(|| bank.select(black_box(3), &none, &mut rng).map(|i| i.id.len()))
    });

    // Level 3 fully used, forcing the neighbour probe.
    let used: HashSet<String> = (0..200).map(|n| format!("3-{n}")).collect();
    group.bench_function("level_exhausted", |b| {
        b.iter(|| bank.select(black_box(3), &used, &mut rng).map(|i| i.id.len()))
    });

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let bank = Arc::new(bank(20));
    c.bench_function("simulated_session", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            let mut engine =
                AdaptiveEngine::seeded(EngineConfig::default(), Arc::clone(&bank), seed)
                    .expect("default config is valid");
            let mut examinee = SimulatedExaminee::new(0.5, StdRng::seed_from_u64(seed));
            administer(&mut engine, &mut examinee, &NoopReporter).map(|s| s.final_score)
        })
    });
}

criterion_group!(benches, bench_select, bench_session);
criterion_main!(benches);
