//! Property-based stress tests for the generator.
//!
//! Both cursors trace the same additive sequence from phases one step apart, so
//! no interleaving of draws may repeat a value before the cycle completes. These
//! tests run that claim over many random ranges, seeds and reset patterns.
//!
//! # Properties Tested
//!
//! - Uniqueness and coverage over a full cycle
//! - Exhaustion after exactly `len` draws
//! - Every reset yields another full cycle
//! - Identical seeds give identical orders
//! - Prime-length ranges carry no padding

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use crate::common::{assert_permutation, drain_cycle, seeded, WeylRng};
use prime_shuffle::primality::{is_probably_prime, DEFAULT_CERTAINTY};
use prime_shuffle::rng::{Pcg32, SeedableRng};
use prime_shuffle::{ShuffleBuilder, ShuffleError};
use proptest::prelude::*;

/// Ranges small enough to drain, anywhere in the integer width.
fn small_range() -> impl Strategy<Value = (i64, i64)> {
    (i64::MIN / 2..i64::MAX / 2, 1i64..2_000).prop_map(|(low, span)| (low, low + span))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A full cycle emits every value exactly once, then the generator is exhausted.
    #[test]
    fn prop_full_cycle_is_permutation((low, high) in small_range(), seed in any::<u64>()) {
        let mut generator = seeded(low, high, seed);
        let values = drain_cycle(&mut generator);
        assert_permutation(&values, low, high);

        let len = generator.len();
        prop_assert_eq!(generator.next_value(), Err(ShuffleError::Exhausted { len }));
    }

    /// Resets at arbitrary points never break the next full cycle.
    #[test]
    fn prop_reset_yields_full_cycles(
        (low, high) in small_range(),
        seed in any::<u64>(),
        cut_points in prop::collection::vec(0u64..2_000, 1..4),
    ) {
        let mut generator = seeded(low, high, seed);
        let fill_bound = generator.fill_bound();
        for cut in cut_points {
            for _ in 0..cut.min(generator.remaining()) {
                generator.next_value().unwrap();
            }
            generator.reset().unwrap();
            prop_assert_eq!(generator.fill_bound(), fill_bound);
            let values = drain_cycle(&mut generator);
            assert_permutation(&values, low, high);
            prop_assert!(generator.is_exhausted());

            // Start every iteration from a fresh cycle
            generator.reset().unwrap();
            prop_assert_eq!(generator.remaining(), generator.len());
        }
    }

    /// A caller-supplied source gets the same guarantees as the default one.
    #[test]
    fn prop_custom_source_is_permutation((low, high) in small_range(), seed in any::<u64>()) {
        let mut generator = ShuffleBuilder::new(low, high)
            .with_rng(WeylRng::new(seed))
            .build()
            .unwrap();
        let values = drain_cycle(&mut generator);
        assert_permutation(&values, low, high);
    }

    /// The emission order is a pure function of the seed.
    #[test]
    fn prop_same_seed_same_order((low, high) in small_range(), seed in any::<u64>()) {
        let a: Vec<i64> = seeded(low, high, seed).collect();
        let b: Vec<i64> = seeded(low, high, seed).collect();
        prop_assert_eq!(a, b);
    }

    /// The domain is only padded when the range length is composite.
    #[test]
    fn prop_padding_only_for_composite_lengths(low in -1_000_000i64..1_000_000, span in 1i64..100_000) {
        let high = low + span;
        let generator = ShuffleBuilder::new(low, high)
            .with_rng(Pcg32::seed_from_u64(0))
            .build()
            .unwrap();
        let len = generator.len();
        if is_probably_prime(len, DEFAULT_CERTAINTY) {
            prop_assert_eq!(generator.fill_bound(), high);
        } else {
            prop_assert!(generator.fill_bound() > high);
        }
        let size = u64::try_from(generator.fill_bound() - low + 1).unwrap();
        prop_assert!(is_probably_prime(size, DEFAULT_CERTAINTY));
        // Bertrand: some prime lies in (len, 2 * len)
        prop_assert!(size < 2 * len);
    }

    /// Drawn steps stay within half the domain.
    #[test]
    fn prop_step_within_half_domain((low, high) in small_range(), seed in any::<u64>()) {
        let mut generator = seeded(low, high, seed);
        for _ in 0..8 {
            let size = u64::try_from(i128::from(generator.fill_bound()) - i128::from(low) + 1).unwrap();
            let step = generator.step();
            prop_assert!(step >= 1);
            prop_assert!(step <= ((size - 1) / 2).max(1));
            generator.reset().unwrap();
        }
    }
}
