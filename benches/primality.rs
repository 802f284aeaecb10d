//! Benchmarks for the primality test and next-prime search
//!
//! Run with: cargo bench --bench primality

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use prime_shuffle::primality::{is_probably_prime, next_probable_prime, DEFAULT_CERTAINTY};
use std::hint::black_box;

fn bench_is_probably_prime(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_probably_prime");

    // A prime and a hard composite per magnitude
    let inputs: [(&str, u64); 4] = [
        ("prime_2^31", 2_147_483_647),
        ("prime_2^64", 18_446_744_073_709_551_557),
        ("pseudoprime", 3_825_123_056_546_413_051),
        ("even", 1 << 62),
    ];
    for (name, n) in inputs {
        for certainty in [1u32, 8, DEFAULT_CERTAINTY] {
            group.bench_with_input(
                BenchmarkId::new(name, certainty),
                &(n, certainty),
                |b, &(n, certainty)| {
                    b.iter(|| is_probably_prime(black_box(n), black_box(certainty)));
                },
            );
        }
    }

    group.finish();
}

fn bench_next_probable_prime(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_probable_prime");

    for n in [1_000u64, 1 << 32, 1 << 62] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| next_probable_prime(black_box(n), DEFAULT_CERTAINTY));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_is_probably_prime, bench_next_probable_prime);
criterion_main!(benches);
