//! Intent Scoring Benchmarks
//!
//! Measures the per-tick cost of scoring a history window and of fanning a
//! tick out to many controllers through the shared sampler.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use intent_prefetch::intent::{IntentScorer, PositionSample, ScoringParams, TargetRect};
use intent_prefetch::sampler::{MotionSampler, SamplerConfig};

/// Straight approach toward x=250 at 16ms intervals
fn generate_history(len: usize) -> Vec<PositionSample> {
    (0..len)
        .map(|i| PositionSample::new(i as f64 * 10.0, 250.0, i as f64 * 16.0))
        .collect()
}

/// Benchmark one score call at various window sizes
fn bench_score_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("intent_score_window");
    let target = TargetRect::new(400.0, 200.0, 500.0, 300.0);

    for history_size in [3usize, 10, 30] {
        let scorer = IntentScorer::new(ScoringParams {
            history_size,
            ..ScoringParams::default()
        });
        let history = generate_history(history_size);

        group.bench_with_input(
            BenchmarkId::new("approach", history_size),
            &history,
            |b, history| b.iter(|| black_box(scorer.score(black_box(&target), black_box(history)))),
        );
    }

    group.finish();
}

/// Benchmark early exits (gates) against the full computation
fn bench_score_gates(c: &mut Criterion) {
    let mut group = c.benchmark_group("intent_score_gates");
    let scorer = IntentScorer::default();
    let history = generate_history(10);

    let cases = [
        ("inside", TargetRect::new(0.0, 200.0, 100.0, 300.0)),
        ("too_far", TargetRect::new(5000.0, 5000.0, 5100.0, 5100.0)),
        ("behind", TargetRect::new(-300.0, 200.0, -200.0, 300.0)),
        ("ahead", TargetRect::new(400.0, 200.0, 500.0, 300.0)),
    ];

    for (name, target) in cases {
        group.bench_function(name, |b| {
            b.iter(|| black_box(scorer.score(black_box(&target), black_box(&history))))
        });
    }

    group.finish();
}

/// Benchmark a sampler tick delivering one snapshot to many scorers
fn bench_sampler_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampler_fanout");

    for listeners in [1usize, 10, 100] {
        let sampler = MotionSampler::new(SamplerConfig::default());
        for sample in generate_history(30) {
            sampler.record(sample);
        }

        let scorer = IntentScorer::default();
        let subscriptions: Vec<_> = (0..listeners)
            .map(|i| {
                let target = TargetRect::from_origin_size(300.0 + i as f64, 200.0, 100.0, 100.0);
                sampler.subscribe(move |history| {
                    black_box(scorer.score(&target, history));
                })
            })
            .collect();

        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_function(BenchmarkId::new("tick", listeners), |b| {
            b.iter(|| black_box(sampler.tick()))
        });

        drop(subscriptions);
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_score_window,
    bench_score_gates,
    bench_sampler_fanout
);
criterion_main!(benches);
