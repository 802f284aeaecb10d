//! Prime-sized domain covering the requested range.
//!
//! An additive walk `x -> x + step (mod P)` only visits every slot when `step`
//! and `P` are coprime. Making `P` prime guarantees that for every step in
//! `[1, P)`, so the domain `[low, fill_bound]` is the range `[low, high]` grown
//! to the next prime size. Slots above `high` form the padding region; the
//! walker never surfaces them.

use std::sync::Arc;

use tracing::debug;

use crate::primality::{is_probably_prime, next_probable_prime};
use crate::rng::Rng;
use crate::telemetry::{
    InvariantChecker, InvariantViolation, ViolationKind, ViolationObserver, ViolationSeverity,
};
use crate::{report_violation_to, ShuffleError};

/// The range `[low, high]` plus the prime-sized domain `[low, fill_bound]` that covers it.
///
/// # Example
///
/// ```
/// use prime_shuffle::domain::Domain;
///
/// // 10 values, grown to the next prime size 11
/// let domain = Domain::build(0, 9, 200).unwrap();
/// assert_eq!(domain.len(), 10);
/// assert_eq!(domain.size(), 11);
/// assert_eq!(domain.fill_bound(), 10);
///
/// // 7 values is already prime: no padding
/// let domain = Domain::build(100, 106, 200).unwrap();
/// assert_eq!(domain.fill_bound(), 106);
/// assert_eq!(domain.padding(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    low: i64,
    high: i64,
    /// Number of values in `[low, high]`.
    len: u64,
    /// Number of slots in `[low, fill_bound]`; prime, at least `len`.
    size: u64,
    fill_bound: i64,
    certainty: u32,
}

impl Domain {
    /// Builds the domain for `[low, high]`.
    ///
    /// # Errors
    ///
    /// - [`ShuffleError::InvalidRange`] if `low >= high`.
    /// - [`ShuffleError::RangeTooLarge`] if the range size, the next prime, or the
    ///   resulting fill bound does not fit the integer width.
    pub fn build(low: i64, high: i64, certainty: u32) -> Result<Self, ShuffleError> {
        if low >= high {
            return Err(ShuffleError::InvalidRange { low, high });
        }

        let len = u64::try_from(i128::from(high) - i128::from(low) + 1)
            .map_err(|_| ShuffleError::RangeTooLarge { low, high })?;

        let size = if is_probably_prime(len, certainty) {
            len
        } else {
            next_probable_prime(len, certainty)
                .ok_or(ShuffleError::RangeTooLarge { low, high })?
        };

        let fill_bound = low
            .checked_add_unsigned(size - 1)
            .ok_or(ShuffleError::RangeTooLarge { low, high })?;

        debug!(low, high, len, size, fill_bound, "built prime domain");

        Ok(Self {
            low,
            high,
            len,
            size,
            fill_bound,
            certainty,
        })
    }

    /// Grows the domain to the next prime size above the current one.
    ///
    /// # Errors
    ///
    /// [`ShuffleError::RangeTooLarge`] if the grown domain leaves the integer width.
    pub fn grow(&mut self) -> Result<(), ShuffleError> {
        let too_large = ShuffleError::RangeTooLarge {
            low: self.low,
            high: self.high,
        };
        let size = next_probable_prime(self.size, self.certainty).ok_or(too_large.clone())?;
        let fill_bound = self.low.checked_add_unsigned(size - 1).ok_or(too_large)?;

        debug!(
            from = self.size,
            to = size,
            fill_bound,
            "grew prime domain"
        );
        self.size = size;
        self.fill_bound = fill_bound;
        Ok(())
    }

    /// Draws a walk step uniformly from `[1, max_step()]`.
    ///
    /// While the step shares a factor with the domain size (only possible when
    /// the size is composite, i.e. a pseudoprime slipped through a low
    /// certainty), the domain grows to the next prime and the event is reported
    /// to `observer`.
    ///
    /// # Errors
    ///
    /// [`ShuffleError::RangeTooLarge`] if growing the domain overflows.
    #[allow(clippy::ref_option)]
    pub fn draw_step<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        observer: &Option<Arc<dyn ViolationObserver>>,
    ) -> Result<u64, ShuffleError> {
        let step = rng.gen_range_u64(1..self.max_step() + 1);
        while self.is_degenerate_step(step) {
            report_violation_to!(
                observer,
                ViolationSeverity::Warning,
                ViolationKind::Domain,
                "step {} shares a factor with domain size {}, growing domain",
                step,
                self.size
            );
            self.grow()?;
        }
        Ok(step)
    }

    /// Returns `true` if a walk with `step` would not cover the whole domain,
    /// i.e. `step` shares a factor with the domain size.
    #[inline]
    #[must_use]
    pub const fn is_degenerate_step(&self, step: u64) -> bool {
        step != 1 && gcd(self.size, step) != 1
    }

    /// Largest step the walk may use: `(size - 1) / 2`, but never below 1.
    #[inline]
    #[must_use]
    pub const fn max_step(&self) -> u64 {
        let half = (self.size - 1) >> 1;
        if half == 0 {
            1
        } else {
            half
        }
    }

    /// Returns `true` if the fill bound lies strictly above the lower bound.
    #[inline]
    #[must_use]
    pub const fn has_legal_fill_bound(&self) -> bool {
        self.fill_bound > self.low
    }

    /// Maps an offset in `[0, len)` back to its value in `[low, high]`.
    #[inline]
    #[must_use]
    pub fn value_at(&self, offset: u64) -> Option<i64> {
        if offset >= self.len {
            return None;
        }
        self.low.checked_add_unsigned(offset)
    }

    /// Lower bound of the range (inclusive).
    #[inline]
    #[must_use]
    pub const fn low(&self) -> i64 {
        self.low
    }

    /// Upper bound of the range (inclusive).
    #[inline]
    #[must_use]
    pub const fn high(&self) -> i64 {
        self.high
    }

    /// Upper bound of the prime-sized domain (inclusive).
    #[inline]
    #[must_use]
    pub const fn fill_bound(&self) -> i64 {
        self.fill_bound
    }

    /// Number of values in the range.
    #[inline]
    #[must_use]
    #[allow(clippy::len_without_is_empty)] // a domain always holds at least two values
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Number of slots in the domain.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Number of padding slots above `high`.
    #[inline]
    #[must_use]
    pub const fn padding(&self) -> u64 {
        self.size - self.len
    }

    /// Certainty used for every primality decision on this domain.
    #[inline]
    #[must_use]
    pub const fn certainty(&self) -> u32 {
        self.certainty
    }
}

const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

impl InvariantChecker for Domain {
    /// # Invariants
    ///
    /// 1. the range holds at least two values
    /// 2. `size >= len`
    /// 3. `fill_bound == low + size - 1`
    /// 4. `size` passes the primality test at the domain's certainty
    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.len < 2 {
            return Err(InvariantViolation::new("Domain", "range holds fewer than two values")
                .with_details(format!("len={}", self.len)));
        }

        if self.size < self.len {
            return Err(
                InvariantViolation::new("Domain", "domain smaller than range")
                    .with_details(format!("size={}, len={}", self.size, self.len)),
            );
        }

        if self.low.checked_add_unsigned(self.size - 1) != Some(self.fill_bound) {
            return Err(
                InvariantViolation::new("Domain", "fill_bound inconsistent with size").with_details(
                    format!(
                        "low={}, size={}, fill_bound={}",
                        self.low, self.size, self.fill_bound
                    ),
                ),
            );
        }

        if !is_probably_prime(self.size, self.certainty) {
            return Err(InvariantViolation::new("Domain", "domain size is not prime")
                .with_details(format!("size={}", self.size)));
        }

        Ok(())
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
    use crate::primality::DEFAULT_CERTAINTY;
    use crate::rng::{Pcg32, SeedableRng};
    use crate::telemetry::CollectingObserver;

    #[test]
    fn test_build_rejects_empty_and_single_value_ranges() {
        assert_eq!(
            Domain::build(5, 5, DEFAULT_CERTAINTY),
            Err(ShuffleError::InvalidRange { low: 5, high: 5 })
        );
        assert_eq!(
            Domain::build(5, 3, DEFAULT_CERTAINTY),
            Err(ShuffleError::InvalidRange { low: 5, high: 3 })
        );
    }

    #[test]
    fn test_prime_length_has_no_padding() {
        let domain = Domain::build(0, 1, DEFAULT_CERTAINTY).unwrap();
        assert_eq!(domain.len(), 2);
        assert_eq!(domain.size(), 2);
        assert_eq!(domain.fill_bound(), 1);
        assert_eq!(domain.padding(), 0);

        let domain = Domain::build(-6, 6, DEFAULT_CERTAINTY).unwrap();
        assert_eq!(domain.len(), 13);
        assert_eq!(domain.fill_bound(), 6);
    }

    #[test]
    fn test_composite_length_grows_to_next_prime() {
        let domain = Domain::build(10, 19, DEFAULT_CERTAINTY).unwrap();
        assert_eq!(domain.len(), 10);
        assert_eq!(domain.size(), 11);
        assert_eq!(domain.fill_bound(), 20);
        assert_eq!(domain.padding(), 1);

        let domain = Domain::build(-100, 13, DEFAULT_CERTAINTY).unwrap();
        assert_eq!(domain.len(), 114);
        assert_eq!(domain.size(), 127);
        assert_eq!(domain.fill_bound(), 26);
    }

    #[test]
    fn test_full_width_range_is_rejected() {
        assert_eq!(
            Domain::build(i64::MIN, i64::MAX, DEFAULT_CERTAINTY),
            Err(ShuffleError::RangeTooLarge {
                low: i64::MIN,
                high: i64::MAX
            })
        );
    }

    #[test]
    fn test_fill_bound_overflow_is_rejected() {
        // 2^62 values is composite; its padding would run past i64::MAX
        let low = i64::MAX - (1 << 62) + 1;
        assert_eq!(
            Domain::build(low, i64::MAX, DEFAULT_CERTAINTY),
            Err(ShuffleError::RangeTooLarge {
                low,
                high: i64::MAX
            })
        );
    }

    #[test]
    fn test_max_step() {
        assert_eq!(Domain::build(0, 1, DEFAULT_CERTAINTY).unwrap().max_step(), 1);
        assert_eq!(Domain::build(0, 2, DEFAULT_CERTAINTY).unwrap().max_step(), 1);
        assert_eq!(Domain::build(0, 3, DEFAULT_CERTAINTY).unwrap().max_step(), 2);
        assert_eq!(Domain::build(0, 9, DEFAULT_CERTAINTY).unwrap().max_step(), 5);
    }

    #[test]
    fn test_prime_size_has_no_degenerate_steps() {
        let domain = Domain::build(0, 10, DEFAULT_CERTAINTY).unwrap();
        assert_eq!(domain.size(), 11);
        assert!(!domain.is_degenerate_step(1));
        for step in 2..11 {
            assert!(!domain.is_degenerate_step(step));
        }
        assert!(domain.is_degenerate_step(11));
    }

    #[test]
    fn test_draw_step_stays_in_bounds_without_violations() {
        let observer = Arc::new(CollectingObserver::new());
        let dyn_observer: Option<Arc<dyn ViolationObserver>> = Some(observer.clone());
        let mut rng = Pcg32::seed_from_u64(3);
        let mut domain = Domain::build(0, 999, DEFAULT_CERTAINTY).unwrap();
        let size = domain.size();

        for _ in 0..1000 {
            let step = domain.draw_step(&mut rng, &dyn_observer).unwrap();
            assert!(step >= 1);
            assert!(step <= domain.max_step());
        }
        assert_eq!(domain.size(), size);
        assert!(observer.is_empty());
    }

    #[test]
    fn test_draw_step_grows_composite_domain() {
        // 8321 = 53 * 157 passes a single base-2 round
        let mut domain = Domain::build(0, 8320, 1).unwrap();
        assert_eq!(domain.size(), 8321);
        assert!(domain.check_invariants().is_ok());

        struct Fixed(u64);
        impl Rng for Fixed {
            fn next_u32(&mut self) -> u32 {
                self.0 as u32
            }
            fn next_u64(&mut self) -> u64 {
                self.0
            }
        }

        let observer = Arc::new(CollectingObserver::new());
        let dyn_observer: Option<Arc<dyn ViolationObserver>> = Some(observer.clone());
        // gen_range_u64(1..4161) accepts 4212 (above the rejection threshold) as step 53
        let step = domain
            .draw_step(&mut Fixed(4212), &dyn_observer)
            .unwrap();
        assert_eq!(step, 53);
        assert!(domain.size() > 8321);
        assert!(!domain.is_degenerate_step(step));
        assert!(observer.has_violation(ViolationKind::Domain));
    }

    #[test]
    fn test_degenerate_step_on_composite_size() {
        // 8321 = 53 * 157 slips through a single round
        let domain = Domain::build(0, 8320, 1).unwrap();
        assert!(domain.is_degenerate_step(53));
        assert!(domain.is_degenerate_step(106));
        assert!(domain.is_degenerate_step(157));
        assert!(!domain.is_degenerate_step(1));
        assert!(!domain.is_degenerate_step(52));
    }

    #[test]
    fn test_value_at() {
        let domain = Domain::build(-3, 3, DEFAULT_CERTAINTY).unwrap();
        assert_eq!(domain.value_at(0), Some(-3));
        assert_eq!(domain.value_at(6), Some(3));
        assert_eq!(domain.value_at(7), None);
    }

    #[test]
    fn test_check_invariants_passes_after_build() {
        for (low, high) in [(0, 1), (0, 9), (-50, 50), (1_000, 1_000_000)] {
            let domain = Domain::build(low, high, DEFAULT_CERTAINTY).unwrap();
            assert!(domain.check_invariants().is_ok(), "[{low}, {high}]");
            assert!(domain.has_legal_fill_bound());
        }
    }
}
