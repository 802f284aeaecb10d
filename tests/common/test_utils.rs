//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use prime_shuffle::rng::{Pcg32, Rng, SeedableRng};
use prime_shuffle::telemetry::CollectingObserver;
use prime_shuffle::{ShuffleBuilder, ShuffleGenerator};

/// Routes library logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A generator over `[low, high]` with a seeded PCG32 source.
pub fn seeded(low: i64, high: i64, seed: u64) -> ShuffleGenerator {
    ShuffleBuilder::new(low, high)
        .with_rng(Pcg32::seed_from_u64(seed))
        .build()
        .unwrap_or_else(|err| panic!("building [{low}, {high}] failed: {err}"))
}

/// A seeded generator reporting to a fresh [`CollectingObserver`].
pub fn observed(low: i64, high: i64, seed: u64) -> (ShuffleGenerator, Arc<CollectingObserver>) {
    let observer = Arc::new(CollectingObserver::new());
    let generator = ShuffleBuilder::new(low, high)
        .with_rng(Pcg32::seed_from_u64(seed))
        .with_violation_observer(observer.clone())
        .build()
        .unwrap_or_else(|err| panic!("building [{low}, {high}] failed: {err}"));
    (generator, observer)
}

/// Draws the remaining values of the current cycle, panicking on any error.
pub fn drain_cycle<R: Rng>(generator: &mut ShuffleGenerator<R>) -> Vec<i64> {
    (0..generator.remaining())
        .map(|i| {
            generator
                .next_value()
                .unwrap_or_else(|err| panic!("draw {i} failed: {err}"))
        })
        .collect()
}

/// Asserts that `values` holds every integer of `[low, high]` exactly once.
pub fn assert_permutation(values: &[i64], low: i64, high: i64) {
    let len = usize::try_from(i128::from(high) - i128::from(low) + 1)
        .unwrap_or_else(|_| panic!("range [{low}, {high}] too large to check"));
    assert_eq!(values.len(), len, "wrong number of values for [{low}, {high}]");

    let mut seen = vec![false; len];
    for &value in values {
        assert!(
            (low..=high).contains(&value),
            "{value} outside [{low}, {high}]"
        );
        let index = usize::try_from(i128::from(value) - i128::from(low)).unwrap_or(usize::MAX);
        assert!(!seen[index], "{value} emitted twice");
        seen[index] = true;
    }
}

/// Additive-sequence source: a fixed odd increment on a 64-bit counter.
///
/// Statistically poor but never stuck, which makes it a useful stand-in for a
/// caller-supplied source.
#[derive(Debug, Clone)]
pub struct WeylRng {
    state: u64,
}

impl WeylRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl Rng for WeylRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        self.state
    }
}
