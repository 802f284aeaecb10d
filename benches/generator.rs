//! Benchmarks for generator construction, draws and resets
//!
//! Run with: cargo bench --bench generator

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use prime_shuffle::rng::{Pcg32, SeedableRng};
use prime_shuffle::{ShuffleBuilder, ShuffleGenerator};
use std::hint::black_box;

fn seeded(low: i64, high: i64) -> ShuffleGenerator {
    ShuffleBuilder::new(low, high)
        .with_rng(Pcg32::seed_from_u64(42))
        .build()
        .unwrap_or_else(|err| panic!("bench generator: {err}"))
}

fn bench_construct(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct");

    for span in [100i64, 1_000_000, 1 << 40, 1 << 62] {
        group.bench_with_input(BenchmarkId::from_parameter(span), &span, |b, &span| {
            b.iter(|| seeded(black_box(0), black_box(span)));
        });
    }

    group.finish();
}

fn bench_next_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_value");
    group.throughput(Throughput::Elements(1));

    for span in [1_000i64, 1 << 40] {
        group.bench_with_input(BenchmarkId::from_parameter(span), &span, |b, &span| {
            let mut generator = seeded(0, span);
            b.iter(|| {
                if generator.is_exhausted() {
                    generator
                        .reset()
                        .unwrap_or_else(|err| panic!("bench reset: {err}"));
                }
                black_box(generator.next_value())
            });
        });
    }

    group.finish();
}

fn bench_full_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_cycle");

    for len in [1_000u64, 100_000] {
        group.throughput(Throughput::Elements(len));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let mut generator = seeded(0, len as i64 - 1);
            b.iter(|| {
                generator
                    .reset()
                    .unwrap_or_else(|err| panic!("bench reset: {err}"));
                let sum: i64 = generator.by_ref().sum();
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    c.bench_function("reset", |b| {
        let mut generator = seeded(-1_000_000, 1_000_000);
        b.iter(|| black_box(generator.reset()));
    });
}

criterion_group!(
    benches,
    bench_construct,
    bench_next_value,
    bench_full_cycle,
    bench_reset
);
criterion_main!(benches);
