//! Random bit source used to pick the walk step, cursors and mirror state.
//!
//! The generator never reaches for process-wide randomness. It owns a value
//! implementing [`Rng`], so tests can substitute a seeded or scripted source and
//! check exact behavior instead of only statistical properties.
//!
//! # PCG32 Algorithm
//!
//! The default source is PCG32 (PCG-XSH-RR with 64 bits of state):
//! - Period of 2^64
//! - Passes TestU01 statistical tests
//! - Fast and simple to implement
//!
//! Reference: <https://www.pcg-random.org/>
//!
//! # Usage
//!
//! ```rust
//! use prime_shuffle::rng::{Pcg32, Rng, SeedableRng};
//!
//! // Seeded RNG for deterministic behavior
//! let mut rng = Pcg32::seed_from_u64(12345);
//! let value = rng.gen_range_u64(0..100);
//! assert!(value < 100);
//!
//! // Seeded from the wall clock, as the generator does by default
//! let mut rng = Pcg32::from_entropy();
//! let _coin: bool = rng.gen();
//! ```

use crate::{
    report_violation,
    telemetry::{ViolationKind, ViolationSeverity},
};

/// PCG32 random number generator.
///
/// Suitable for picking walk parameters, but NOT cryptographically secure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

/// Default increment for single-stream PCG32.
const PCG_DEFAULT_INCREMENT: u64 = 1442695040888963407;

/// Multiplier constant for the LCG step.
const PCG_MULTIPLIER: u64 = 6364136223846793005;

impl Pcg32 {
    /// Creates a new PCG32 generator with the given state and stream.
    ///
    /// The increment must be odd; it is derived from `stream` as `(stream << 1) | 1`.
    #[must_use]
    pub const fn new(state: u64, stream: u64) -> Self {
        let inc = (stream << 1) | 1;
        // Standard PCG seeding: step from zero, add the initial state, step again
        let mut pcg = Self { state: 0, inc };
        pcg.state = pcg.state.wrapping_mul(PCG_MULTIPLIER).wrapping_add(pcg.inc);
        pcg.state = pcg.state.wrapping_add(state);
        pcg.state = pcg.state.wrapping_mul(PCG_MULTIPLIER).wrapping_add(pcg.inc);
        pcg
    }

    /// Generates the next 32-bit random value.
    #[inline]
    #[must_use]
    pub fn next_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state
            .wrapping_mul(PCG_MULTIPLIER)
            .wrapping_add(self.inc);
        // XSH-RR output permutation
        let xorshifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Generates the next 64-bit random value by combining two 32-bit values.
    #[inline]
    #[must_use]
    pub fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.next_u32());
        let low = u64::from(self.next_u32());
        (high << 32) | low
    }
}

/// Trait for seeding random number generators.
pub trait SeedableRng: Sized {
    /// Creates a new RNG seeded from a 64-bit value.
    ///
    /// Different seeds produce different (statistically independent) sequences.
    #[must_use]
    fn seed_from_u64(seed: u64) -> Self;

    /// Creates a new RNG seeded from the current wall-clock time.
    ///
    /// This is NOT cryptographically secure.
    #[must_use]
    fn from_entropy() -> Self;
}

impl SeedableRng for Pcg32 {
    fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed, PCG_DEFAULT_INCREMENT)
    }

    fn from_entropy() -> Self {
        Self::seed_from_u64(clock_entropy_seed())
    }
}

/// Trait for random number generation.
///
/// Implementors only provide [`next_u32`](Rng::next_u32) and
/// [`next_u64`](Rng::next_u64); everything the generator draws is derived from those.
pub trait Rng {
    /// Returns the next 32-bit random value.
    fn next_u32(&mut self) -> u32;

    /// Returns the next 64-bit random value.
    fn next_u64(&mut self) -> u64;

    /// Generates a random value of type `T`.
    fn gen<T: RandomValue>(&mut self) -> T {
        T::random(self)
    }

    /// Generates a random `u64` value in the given range `[low, high)`.
    ///
    /// # Empty Range Behavior
    /// If `range.is_empty()`, reports a violation via telemetry and returns `range.start`.
    /// An `Rng` carries no observer, so the report goes to the global
    /// [`TracingObserver`](crate::telemetry::TracingObserver) even when the
    /// generator was built with
    /// [`with_violation_observer`](crate::ShuffleBuilder::with_violation_observer).
    /// The generator never asks for an empty range: every domain holds at least
    /// two slots.
    fn gen_range_u64(&mut self, range: std::ops::Range<u64>) -> u64 {
        if range.start >= range.end {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::Configuration,
                "gen_range_u64 called with empty range [{}..{})",
                range.start,
                range.end
            );
            return range.start;
        }

        let span = range.end - range.start;
        // Rejection sampling to avoid modulo bias
        let threshold = span.wrapping_neg() % span;
        loop {
            let random_value = self.next_u64();
            if random_value >= threshold {
                return range.start + random_value % span;
            }
        }
    }

}

impl Rng for Pcg32 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        Self::next_u32(self)
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        Self::next_u64(self)
    }
}

impl<R: Rng + ?Sized> Rng for &mut R {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
}

/// Trait for types that can be randomly generated.
pub trait RandomValue {
    /// Generates a random value of this type.
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

impl RandomValue for bool {
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.next_u32() & 1 == 1
    }
}

/// Derives a seed from the current wall-clock time.
///
/// The nanosecond timestamp is hashed with the standard library's randomly keyed
/// hasher, so two generators created within the same clock tick still diverge.
fn clock_entropy_seed() -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;
    use web_time::{SystemTime, UNIX_EPOCH};

    // A clock before the epoch still yields a usable (if constant) timestamp
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();

    RandomState::new()
        .hash_one(nanos)
        .wrapping_add(0x9e3779b97f4a7c15)
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn test_pcg32_deterministic() {
        let mut rng1 = Pcg32::seed_from_u64(12345);
        let mut rng2 = Pcg32::seed_from_u64(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_pcg32_different_seeds() {
        let mut rng1 = Pcg32::seed_from_u64(12345);
        let mut rng2 = Pcg32::seed_from_u64(54321);

        let mut same_count = 0;
        for _ in 0..100 {
            if rng1.next_u32() == rng2.next_u32() {
                same_count += 1;
            }
        }
        assert!(same_count < 10);
    }

    #[test]
    fn test_pcg32_distribution() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut buckets = [0u32; 16];

        for _ in 0..16000 {
            let val = rng.next_u32();
            let bucket = (val >> 28) as usize; // Use top 4 bits
            buckets[bucket] += 1;
        }

        // Each bucket should have roughly 1000 values (16000/16)
        for &count in &buckets {
            assert!(count > 500, "Bucket too low: {count}");
            assert!(count < 1500, "Bucket too high: {count}");
        }
    }

    // Regression guard for the output permutation
    #[test]
    fn test_pcg32_golden() {
        let mut rng = Pcg32::seed_from_u64(0);

        let expected = [
            0x348a463f_u32,
            0x4f205a1b_u32,
            0x2946c488_u32,
            0x805e36de_u32,
            0x79f994a9_u32,
        ];

        for &exp in &expected {
            assert_eq!(rng.next_u32(), exp, "Golden test failed");
        }
    }

    #[test]
    fn test_gen_range_u64() {
        let mut rng = Pcg32::seed_from_u64(42);

        for _ in 0..1000 {
            let val = rng.gen_range_u64(10..20);
            assert!((10..20).contains(&val));
        }
    }

    #[test]
    fn test_gen_range_u64_large_span() {
        let mut rng = Pcg32::seed_from_u64(42);
        let start = u64::from(u32::MAX) + 1000;
        let end = u64::MAX;

        for _ in 0..100 {
            let val = rng.gen_range_u64(start..end);
            assert!(val >= start);
            assert!(val < end);
        }
    }

    #[test]
    fn test_gen_range_single_value() {
        let mut rng = Pcg32::seed_from_u64(42);

        for _ in 0..100 {
            assert_eq!(rng.gen_range_u64(42..43), 42);
        }
    }

    /// An empty range returns start instead of panicking; a violation is reported via telemetry.
    #[test]
    fn test_gen_range_empty_returns_start() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut untouched = Pcg32::seed_from_u64(42);

        assert_eq!(rng.gen_range_u64(100..100), 100);
        assert_eq!(rng.gen_range_u64(0..0), 0);
        assert_eq!(rng.gen_range_u64(u64::MAX..u64::MAX), u64::MAX);
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = rng.gen_range_u64(9..3);
        assert_eq!(reversed, 9);

        // No state is consumed on the empty-range path
        assert_eq!(rng.next_u64(), untouched.next_u64());
    }

    #[test]
    fn test_coin_flip_is_balanced() {
        let mut rng = Pcg32::seed_from_u64(7);

        let heads = (0..10000).filter(|_| rng.gen::<bool>()).count();
        assert!(heads > 4500, "Too few heads: {heads}");
        assert!(heads < 5500, "Too many heads: {heads}");
    }

    #[test]
    fn test_mut_ref_forwards_to_inner_rng() {
        let mut direct = Pcg32::seed_from_u64(99);
        let mut inner = Pcg32::seed_from_u64(99);
        {
            let mut borrowed = &mut inner;
            assert_eq!(Rng::next_u64(&mut borrowed), direct.next_u64());
        }
        assert_eq!(inner.next_u32(), direct.next_u32());
    }

    #[test]
    fn test_from_entropy_seeds_differ() {
        let mut rng1 = Pcg32::from_entropy();
        let mut rng2 = Pcg32::from_entropy();

        let seq1: Vec<u64> = (0..4).map(|_| rng1.next_u64()).collect();
        let seq2: Vec<u64> = (0..4).map(|_| rng2.next_u64()).collect();
        assert_ne!(seq1, seq2, "Two entropy-seeded RNGs produced the same stream");
    }
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Same seed always produces identical sequence.
        #[test]
        fn prop_determinism_same_seed_same_sequence(seed in any::<u64>()) {
            let mut rng1 = Pcg32::seed_from_u64(seed);
            let mut rng2 = Pcg32::seed_from_u64(seed);

            for _ in 0..100 {
                prop_assert_eq!(rng1.next_u64(), rng2.next_u64());
            }
        }

        /// Property: gen_range_u64 output is always within the specified range.
        #[test]
        fn prop_gen_range_u64_within_bounds(
            seed in any::<u64>(),
            start in 0u64..1_000_000,
            span in 1u64..1_000_000,
        ) {
            let end = start + span;
            let mut rng = Pcg32::seed_from_u64(seed);

            for _ in 0..50 {
                let val = rng.gen_range_u64(start..end);
                prop_assert!(val >= start, "gen_range_u64 output {} below start {}", val, start);
                prop_assert!(val < end, "gen_range_u64 output {} >= end {}", val, end);
            }
        }

        /// Property: Clone produces identical RNG that generates same sequence.
        #[test]
        fn prop_clone_produces_identical_sequence(seed in any::<u64>(), advance in 0usize..100) {
            let mut rng1 = Pcg32::seed_from_u64(seed);
            for _ in 0..advance {
                let _ = rng1.next_u32();
            }

            let mut rng2 = rng1.clone();
            for _ in 0..50 {
                prop_assert_eq!(rng1.next_u32(), rng2.next_u32());
            }
        }
    }
}
