//! Integration tests for the generator's public API.
//!
//! These tests verify that:
//! 1. A full cycle emits every value of the range exactly once
//! 2. The draw after a full cycle fails with `Exhausted`
//! 3. `reset()` restores a full, fresh cycle
//! 4. Empty and single-value ranges are rejected
//! 5. The two-value range works
//! 6. Prime-length ranges get no padding

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

#[path = "common/mod.rs"]
mod common;

use common::{assert_permutation, drain_cycle, init_tracing, observed, seeded, WeylRng};
use prime_shuffle::rng::{Pcg32, Rng, SeedableRng};
use prime_shuffle::{
    assert_no_violations, ShuffleBuilder, ShuffleConfig, ShuffleError, ShuffleGenerator,
};

// ============================================================================
// Coverage
// ============================================================================

#[test]
fn test_full_cycle_covers_range() {
    init_tracing();
    for (low, high) in [(0, 9), (1, 52), (-100, 100), (-7, -2), (1_000_000, 1_000_512)] {
        let mut generator = seeded(low, high, 1);
        let values = drain_cycle(&mut generator);
        assert_permutation(&values, low, high);
    }
}

#[test]
fn test_entropy_seeded_generator_covers_range() {
    init_tracing();
    let mut generator = ShuffleGenerator::new(-30, 30).unwrap();
    let values = drain_cycle(&mut generator);
    assert_permutation(&values, -30, 30);
}

#[test]
fn test_large_range_cycle() {
    init_tracing();
    let (mut generator, observer) = observed(-250_000, 250_000, 2);
    let values = drain_cycle(&mut generator);
    assert_permutation(&values, -250_000, 250_000);
    assert_no_violations!(observer);
}

#[test]
fn test_huge_range_draws_distinct_values() {
    init_tracing();
    let low = -(1i64 << 61);
    let high = 1i64 << 61;
    let mut generator = seeded(low, high, 3);
    let mut values: Vec<i64> = (0..10_000).map(|_| generator.next_value().unwrap()).collect();
    assert!(values.iter().all(|v| (low..=high).contains(v)));
    values.sort_unstable();
    values.dedup();
    assert_eq!(values.len(), 10_000);
    assert_eq!(generator.remaining(), generator.len() - 10_000);
}

#[test]
fn test_custom_rng_covers_range() {
    init_tracing();
    let mut generator = ShuffleBuilder::new(-64, 200)
        .with_rng(WeylRng::new(17))
        .build()
        .unwrap();
    let values = drain_cycle(&mut generator);
    assert_permutation(&values, -64, 200);
}

/// PCG32 that panics if asked for a value from an empty range.
///
/// An empty range is reported to the global tracing observer rather than the
/// generator's own, so an observer-based check cannot see it.
struct NonEmptyRangeRng(Pcg32);

impl Rng for NonEmptyRangeRng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn gen_range_u64(&mut self, range: std::ops::Range<u64>) -> u64 {
        assert!(!range.is_empty(), "empty range {range:?} requested");
        self.0.gen_range_u64(range)
    }
}

#[test]
fn test_smallest_ranges_never_request_empty_range() {
    init_tracing();
    for (low, high) in [(0, 1), (0, 2), (-2, 1), (10, 14)] {
        for seed in 0..16 {
            let mut generator = ShuffleBuilder::new(low, high)
                .with_rng(NonEmptyRangeRng(Pcg32::seed_from_u64(seed)))
                .build()
                .unwrap();
            for _ in 0..3 {
                let values = drain_cycle(&mut generator);
                assert_permutation(&values, low, high);
                generator.reset().unwrap();
            }
        }
    }
}

// ============================================================================
// Exhaustion and reset
// ============================================================================

#[test]
fn test_exhausted_after_full_cycle() {
    init_tracing();
    let mut generator = seeded(10, 20, 4);
    drain_cycle(&mut generator);
    assert!(generator.is_exhausted());
    assert_eq!(generator.remaining(), 0);

    let err = generator.next_value().unwrap_err();
    assert_eq!(err, ShuffleError::Exhausted { len: 11 });
    assert!(err.to_string().contains("11"));
}

#[test]
fn test_reset_restores_capacity() {
    init_tracing();
    let (mut generator, observer) = observed(-50, 49, 5);
    let mut cycles = Vec::new();
    for _ in 0..4 {
        let values = drain_cycle(&mut generator);
        assert_permutation(&values, -50, 49);
        assert!(generator.next_value().is_err());
        cycles.push(values);
        generator.reset().unwrap();
    }
    // Fresh randomness per cycle
    assert!(cycles.windows(2).any(|pair| pair[0] != pair[1]));
    assert_no_violations!(observer);
}

#[test]
fn test_reset_before_exhaustion_starts_over() {
    init_tracing();
    let mut generator = seeded(0, 99, 6);
    for _ in 0..40 {
        generator.next_value().unwrap();
    }
    assert_eq!(generator.emitted(), 40);
    generator.reset().unwrap();
    assert_eq!(generator.emitted(), 0);
    let values = drain_cycle(&mut generator);
    assert_permutation(&values, 0, 99);
}

// ============================================================================
// Range validation and boundaries
// ============================================================================

#[test]
fn test_invalid_ranges_rejected() {
    assert_eq!(
        ShuffleGenerator::new(5, 5).unwrap_err(),
        ShuffleError::InvalidRange { low: 5, high: 5 }
    );
    assert_eq!(
        ShuffleGenerator::new(5, 3).unwrap_err(),
        ShuffleError::InvalidRange { low: 5, high: 3 }
    );
    assert_eq!(
        ShuffleBuilder::new(i64::MIN, i64::MAX).build().unwrap_err(),
        ShuffleError::RangeTooLarge {
            low: i64::MIN,
            high: i64::MAX
        }
    );
}

#[test]
fn test_two_value_range() {
    init_tracing();
    for seed in 0..50 {
        let mut generator = seeded(0, 1, seed);
        let values = drain_cycle(&mut generator);
        assert_permutation(&values, 0, 1);
    }
    let mut generator = ShuffleGenerator::new(0, 1).unwrap();
    let values = drain_cycle(&mut generator);
    assert_permutation(&values, 0, 1);
}

#[test]
fn test_prime_length_means_no_padding() {
    for (low, high) in [(0, 1), (0, 2), (10, 22), (-3, 3), (0, 96)] {
        let generator = seeded(low, high, 7);
        assert_eq!(generator.fill_bound(), high, "[{low}, {high}]");
    }
    for (low, high) in [(0, 3), (0, 9), (-50, 49)] {
        let generator = seeded(low, high, 7);
        assert!(generator.fill_bound() > high, "[{low}, {high}]");
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_presets_cover_range() {
    init_tracing();
    for config in [ShuffleConfig::default(), ShuffleConfig::exact(), ShuffleConfig::fast()] {
        let mut generator = ShuffleBuilder::new(0, 999)
            .with_config(config)
            .with_rng(Pcg32::seed_from_u64(8))
            .build()
            .unwrap();
        assert_eq!(generator.certainty(), config.certainty);
        let values = drain_cycle(&mut generator);
        assert_permutation(&values, 0, 999);
    }
}

#[test]
fn test_zero_certainty_builds_and_drains() {
    init_tracing();
    let mut generator = ShuffleGenerator::with_certainty(0, 10, 0).unwrap();
    assert_eq!(generator.certainty(), 0);
    let values = drain_cycle(&mut generator);
    assert_permutation(&values, 0, 10);
    assert!(generator.is_exhausted());

    generator.reset().unwrap();
    let values = drain_cycle(&mut generator);
    assert_permutation(&values, 0, 10);
}

#[test]
fn test_iterator_collects_cycle() {
    init_tracing();
    let generator = seeded(-12, 12, 9);
    let values: Vec<i64> = generator.collect();
    assert_permutation(&values, -12, 12);
}
