//! The generator facade: construct, draw, reset.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::ShuffleConfig;
use crate::domain::Domain;
use crate::mirror::Mirror;
use crate::primality::DEFAULT_CERTAINTY;
use crate::rng::{Pcg32, Rng, SeedableRng};
use crate::telemetry::{
    InvariantChecker, InvariantViolation, ViolationKind, ViolationObserver, ViolationSeverity,
};
use crate::walker::{Direction, Walker};
use crate::{debug_check_invariants, report_violation_to, ShuffleError};

/// Which operation is re-randomizing the walk; decides the fill-bound error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Construct,
    Reset,
}

/// Emits every integer of `[low, high]` exactly once, in shuffled order, using
/// O(1) memory.
///
/// Each cycle draws a random step and starting phase for an additive walk over
/// a prime-sized domain covering the range, and a random fold for the output
/// reflection. After `len()` draws the generator is exhausted until
/// [`reset`](Self::reset) starts a new cycle.
///
/// The order is not cryptographically unpredictable: the walk is linear and can
/// be reconstructed from a few outputs.
///
/// # Example
///
/// ```
/// use prime_shuffle::ShuffleGenerator;
///
/// let mut generator = ShuffleGenerator::new(1, 6).unwrap();
/// let mut rolls: Vec<i64> = (0..6).map(|_| generator.next_value().unwrap()).collect();
/// assert!(generator.next_value().is_err());
///
/// rolls.sort_unstable();
/// assert_eq!(rolls, vec![1, 2, 3, 4, 5, 6]);
/// ```
pub struct ShuffleGenerator<R: Rng = Pcg32> {
    domain: Domain,
    walker: Walker,
    mirror: Mirror,
    /// Values emitted since construction or the last reset.
    emitted: u64,
    rng: R,
    violation_observer: Option<Arc<dyn ViolationObserver>>,
}

impl<R: Rng> std::fmt::Debug for ShuffleGenerator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            domain,
            walker,
            mirror,
            emitted,
            rng: _,
            violation_observer,
        } = self;

        f.debug_struct("ShuffleGenerator")
            .field("domain", domain)
            .field("walker", walker)
            .field("mirror", mirror)
            .field("emitted", emitted)
            .field("has_violation_observer", &violation_observer.is_some())
            .finish_non_exhaustive()
    }
}

impl ShuffleGenerator<Pcg32> {
    /// Creates a generator for `[low, high]` with the default certainty, seeded
    /// from the wall clock.
    ///
    /// # Errors
    ///
    /// - [`ShuffleError::InvalidRange`] if `low >= high`.
    /// - [`ShuffleError::RangeTooLarge`] if the range does not fit the integer width.
    /// - [`ShuffleError::NoPrimeInRange`] if no legal domain could be built.
    pub fn new(low: i64, high: i64) -> Result<Self, ShuffleError> {
        Self::with_certainty(low, high, DEFAULT_CERTAINTY)
    }

    /// Like [`new`](Self::new), with an explicit primality certainty. A
    /// certainty of 0 gives exact primality answers.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn with_certainty(low: i64, high: i64, certainty: u32) -> Result<Self, ShuffleError> {
        Self::with_rng(low, high, certainty, Pcg32::from_entropy())
    }
}

impl<R: Rng> ShuffleGenerator<R> {
    /// Creates a generator for `[low, high]` that draws all its randomness from `rng`.
    ///
    /// With a seeded source the emission order is reproducible:
    ///
    /// ```
    /// use prime_shuffle::rng::{Pcg32, SeedableRng};
    /// use prime_shuffle::ShuffleGenerator;
    ///
    /// let mut a = ShuffleGenerator::with_rng(0, 99, 200, Pcg32::seed_from_u64(7)).unwrap();
    /// let mut b = ShuffleGenerator::with_rng(0, 99, 200, Pcg32::seed_from_u64(7)).unwrap();
    /// for _ in 0..100 {
    ///     assert_eq!(a.next_value(), b.next_value());
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// As [`with_certainty`](ShuffleGenerator::with_certainty).
    pub fn with_rng(low: i64, high: i64, certainty: u32, rng: R) -> Result<Self, ShuffleError> {
        Self::from_config(low, high, ShuffleConfig { certainty }, rng, None)
    }

    pub(crate) fn from_config(
        low: i64,
        high: i64,
        config: ShuffleConfig,
        mut rng: R,
        violation_observer: Option<Arc<dyn ViolationObserver>>,
    ) -> Result<Self, ShuffleError> {
        let mut domain = Domain::build(low, high, config.certainty)?;
        let (walker, mirror) =
            Self::randomize(&mut domain, &mut rng, &violation_observer, Phase::Construct)?;

        debug!(
            low,
            high,
            fill_bound = domain.fill_bound(),
            step = walker.step(),
            certainty = config.certainty,
            "created shuffle generator"
        );

        Ok(Self {
            domain,
            walker,
            mirror,
            emitted: 0,
            rng,
            violation_observer,
        })
    }

    /// Draws the walk parameters for a new cycle: step, starting phase, fold.
    #[allow(clippy::ref_option)]
    fn randomize(
        domain: &mut Domain,
        rng: &mut R,
        observer: &Option<Arc<dyn ViolationObserver>>,
        phase: Phase,
    ) -> Result<(Walker, Mirror), ShuffleError> {
        let step = domain.draw_step(rng, observer)?;

        if !domain.has_legal_fill_bound() {
            let (low, fill_bound) = (domain.low(), domain.fill_bound());
            return Err(match phase {
                Phase::Construct => ShuffleError::NoPrimeInRange { low, fill_bound },
                Phase::Reset => ShuffleError::FillBoundIllegal { low, fill_bound },
            });
        }

        let start = rng.gen_range_u64(0..domain.size() - 1);
        let walker = Walker::new(start, step, domain.len(), domain.size())?;

        let midpoint = rng.gen_range_u64(0..domain.len() - 1);
        let mirror = Mirror::new(midpoint, rng.gen::<bool>());

        debug_check_invariants!(domain, "after randomize");
        Ok((walker, mirror))
    }

    /// Returns the next value of the current cycle.
    ///
    /// # Errors
    ///
    /// - [`ShuffleError::Exhausted`] once every value of the range has been emitted.
    /// - [`ShuffleError::InternalError`] if the walk surfaced a position outside the range.
    pub fn next_value(&mut self) -> Result<i64, ShuffleError> {
        let len = self.domain.len();
        if self.emitted >= len {
            return Err(ShuffleError::Exhausted { len });
        }

        let direction = if self.rng.gen::<bool>() {
            Direction::Forward
        } else {
            Direction::Backward
        };
        let raw = self.walker.advance(direction);
        self.emitted += 1;

        if raw >= len {
            report_violation_to!(
                self.violation_observer,
                ViolationSeverity::Critical,
                ViolationKind::Walk,
                "walk surfaced padding offset {} (len={}, size={}, step={})",
                raw,
                len,
                self.domain.size(),
                self.walker.step()
            );
            return Err(ShuffleError::InternalError {
                context: format!("walk surfaced padding offset {raw} of {len}"),
            });
        }

        let offset = self.mirror.apply(raw, len - 1);
        let Some(value) = self.domain.value_at(offset) else {
            report_violation_to!(
                self.violation_observer,
                ViolationSeverity::Critical,
                ViolationKind::InternalError,
                "mirrored offset {} outside range (raw={}, midpoint={}, len={})",
                offset,
                raw,
                self.mirror.midpoint(),
                len
            );
            return Err(ShuffleError::InternalError {
                context: format!("mirrored offset {offset} outside range of {len}"),
            });
        };

        debug_check_invariants!(self);
        Ok(value)
    }

    /// Starts a new cycle with a freshly drawn step, starting phase and fold.
    ///
    /// The domain keeps its size unless the new step turns out degenerate.
    ///
    /// # Errors
    ///
    /// - [`ShuffleError::FillBoundIllegal`] if the domain no longer lies above the lower bound.
    /// - [`ShuffleError::RangeTooLarge`] if the domain had to grow past the integer width.
    pub fn reset(&mut self) -> Result<(), ShuffleError> {
        let (walker, mirror) = Self::randomize(
            &mut self.domain,
            &mut self.rng,
            &self.violation_observer,
            Phase::Reset,
        )?;
        trace!(
            emitted = self.emitted,
            step = walker.step(),
            "reset shuffle generator"
        );

        self.walker = walker;
        self.mirror = mirror;
        self.emitted = 0;

        debug_check_invariants!(self);
        Ok(())
    }

    /// Lower bound of the range (inclusive).
    #[inline]
    #[must_use]
    pub const fn low(&self) -> i64 {
        self.domain.low()
    }

    /// Upper bound of the range (inclusive).
    #[inline]
    #[must_use]
    pub const fn high(&self) -> i64 {
        self.domain.high()
    }

    /// Number of values in one cycle.
    #[inline]
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> u64 {
        self.domain.len()
    }

    /// Values emitted in the current cycle.
    #[inline]
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Values left in the current cycle.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.domain.len().saturating_sub(self.emitted)
    }

    /// Returns `true` once the current cycle has emitted every value.
    #[inline]
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.emitted >= self.domain.len()
    }

    /// Upper bound of the prime-sized domain; `high()` when the range length is prime.
    #[inline]
    #[must_use]
    pub const fn fill_bound(&self) -> i64 {
        self.domain.fill_bound()
    }

    /// Step of the current cycle's walk.
    #[inline]
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.walker.step()
    }

    /// Certainty used for primality decisions.
    #[inline]
    #[must_use]
    pub const fn certainty(&self) -> u32 {
        self.domain.certainty()
    }
}

/// Yields the remaining values of the current cycle.
///
/// Iteration ends at exhaustion or at the first internal error.
impl<R: Rng> Iterator for ShuffleGenerator<R> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        if self.is_exhausted() {
            return None;
        }
        self.next_value().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl<R: Rng> InvariantChecker for ShuffleGenerator<R> {
    /// # Invariants
    ///
    /// 1. `emitted <= len`
    /// 2. the fold point lies inside the range
    /// 3. the walker is well-formed for the current domain
    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let len = self.domain.len();
        if self.emitted > len {
            return Err(
                InvariantViolation::new("ShuffleGenerator", "emitted more than the range holds")
                    .with_details(format!("emitted={}, len={}", self.emitted, len)),
            );
        }

        if self.mirror.midpoint() >= len {
            return Err(
                InvariantViolation::new("ShuffleGenerator", "fold point outside range")
                    .with_details(format!("midpoint={}, len={}", self.mirror.midpoint(), len)),
            );
        }

        if self.walker.step() >= self.domain.size() {
            return Err(
                InvariantViolation::new("ShuffleGenerator", "step outside domain").with_details(
                    format!("step={}, size={}", self.walker.step(), self.domain.size()),
                ),
            );
        }

        self.walker.check_invariants()
    }
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
    use crate::telemetry::CollectingObserver;
    use std::collections::HashSet;

    fn seeded(low: i64, high: i64, seed: u64) -> ShuffleGenerator {
        ShuffleGenerator::with_rng(low, high, DEFAULT_CERTAINTY, Pcg32::seed_from_u64(seed))
            .unwrap()
    }

    fn drain(generator: &mut ShuffleGenerator) -> Vec<i64> {
        (0..generator.len())
            .map(|_| generator.next_value().unwrap())
            .collect()
    }

    #[test]
    fn test_full_cycle_is_permutation() {
        let mut generator = seeded(-20, 29, 1);
        let mut values = drain(&mut generator);
        values.sort_unstable();
        assert_eq!(values, (-20..=29).collect::<Vec<_>>());
        assert!(generator.is_exhausted());
    }

    #[test]
    fn test_exhausted_after_full_cycle() {
        let mut generator = seeded(0, 9, 2);
        drain(&mut generator);
        assert_eq!(
            generator.next_value(),
            Err(ShuffleError::Exhausted { len: 10 })
        );
        // Still exhausted on repeated calls
        assert_eq!(
            generator.next_value(),
            Err(ShuffleError::Exhausted { len: 10 })
        );
        assert_eq!(generator.emitted(), 10);
    }

    #[test]
    fn test_reset_restores_full_cycle() {
        let mut generator = seeded(100, 140, 3);
        drain(&mut generator);
        generator.reset().unwrap();
        assert_eq!(generator.emitted(), 0);
        assert_eq!(generator.remaining(), 41);

        let values: HashSet<i64> = drain(&mut generator).into_iter().collect();
        assert_eq!(values, (100..=140).collect());
    }

    #[test]
    fn test_reset_mid_cycle() {
        let mut generator = seeded(0, 30, 4);
        for _ in 0..7 {
            generator.next_value().unwrap();
        }
        generator.reset().unwrap();
        let values: HashSet<i64> = drain(&mut generator).into_iter().collect();
        assert_eq!(values.len(), 31);
    }

    #[test]
    fn test_reset_keeps_domain() {
        let mut generator = seeded(0, 99, 5);
        let fill_bound = generator.fill_bound();
        for _ in 0..20 {
            generator.reset().unwrap();
            assert_eq!(generator.fill_bound(), fill_bound);
            assert!(generator.step() >= 1);
        }
    }

    #[test]
    fn test_invalid_ranges() {
        assert_eq!(
            ShuffleGenerator::new(5, 5).unwrap_err(),
            ShuffleError::InvalidRange { low: 5, high: 5 }
        );
        assert_eq!(
            ShuffleGenerator::new(5, 3).unwrap_err(),
            ShuffleError::InvalidRange { low: 5, high: 3 }
        );
    }

    #[test]
    fn test_zero_certainty_builds_full_cycle() {
        let mut generator = ShuffleGenerator::with_certainty(0, 10, 0).unwrap();
        assert_eq!(generator.certainty(), 0);
        assert_eq!(generator.fill_bound(), 10);
        let mut values = drain(&mut generator);
        values.sort_unstable();
        assert_eq!(values, (0..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_two_value_range() {
        for seed in 0..32 {
            let mut generator = seeded(0, 1, seed);
            assert_eq!(generator.fill_bound(), 1);
            let mut values = drain(&mut generator);
            values.sort_unstable();
            assert_eq!(values, vec![0, 1]);
        }
    }

    #[test]
    fn test_prime_length_has_no_padding() {
        let generator = seeded(10, 16, 6);
        assert_eq!(generator.len(), 7);
        assert_eq!(generator.fill_bound(), 16);
    }

    #[test]
    fn test_same_seed_same_order() {
        let a: Vec<i64> = seeded(0, 500, 99).collect();
        let b: Vec<i64> = seeded(0, 500, 99).collect();
        assert_eq!(a, b);
        let c: Vec<i64> = seeded(0, 500, 100).collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_iterator_yields_remaining_cycle() {
        let mut generator = seeded(0, 49, 7);
        generator.next_value().unwrap();
        assert_eq!(generator.size_hint(), (49, Some(49)));

        let rest: Vec<i64> = generator.by_ref().collect();
        assert_eq!(rest.len(), 49);
        assert_eq!(generator.size_hint(), (0, Some(0)));
        assert_eq!(generator.next(), None);
    }

    #[test]
    fn test_extreme_bounds() {
        let mut generator = seeded(i64::MIN, i64::MIN + 9, 8);
        let mut values = drain(&mut generator);
        values.sort_unstable();
        assert_eq!(values, (i64::MIN..=i64::MIN + 9).collect::<Vec<_>>());

        // 7 values is prime, so no padding has to fit above i64::MAX
        let mut generator = seeded(i64::MAX - 6, i64::MAX, 9);
        assert_eq!(generator.fill_bound(), i64::MAX);
        let mut values = drain(&mut generator);
        values.sort_unstable();
        assert_eq!(values, (i64::MAX - 6..=i64::MAX).collect::<Vec<_>>());

        // 10 values would need one padding slot past i64::MAX
        assert_eq!(
            ShuffleGenerator::new(i64::MAX - 9, i64::MAX).unwrap_err(),
            ShuffleError::RangeTooLarge {
                low: i64::MAX - 9,
                high: i64::MAX
            }
        );
    }

    #[test]
    fn test_no_violations_over_many_cycles() {
        let observer = Arc::new(CollectingObserver::new());
        let dyn_observer: Option<Arc<dyn ViolationObserver>> = Some(observer.clone());
        let mut generator = ShuffleGenerator::from_config(
            -500,
            500,
            ShuffleConfig::default(),
            Pcg32::seed_from_u64(10),
            dyn_observer,
        )
        .unwrap();
        for _ in 0..5 {
            drain(&mut generator);
            generator.reset().unwrap();
        }
        assert!(observer.is_empty());
        assert!(generator.check_invariants().is_ok());
    }

    #[test]
    fn test_debug_omits_rng() {
        let generator = seeded(0, 9, 11);
        let debug = format!("{generator:?}");
        assert!(debug.contains("ShuffleGenerator"));
        assert!(debug.contains("emitted"));
        assert!(!debug.contains("Pcg32"));
    }
}
