//! Bidirectional additive walk over the prime-sized domain.
//!
//! Positions are offsets from the range's lower bound: `[0, len)` is the range,
//! `[len, size)` the padding region. Both cursors trace the same cyclic sequence
//! `x, x + step, x + 2·step, … (mod size)`: the forward cursor walks it upward
//! from `start`, the backward cursor walks it downward from `start - step`.
//! Together they partition the cycle, so any interleaving of `len` advances
//! yields every in-range offset exactly once.
//!
//! When a cursor sits in the padding region, the rest of its current run
//! (the positions up to the domain edge, reached by whole steps) is padding as
//! well, so the cursor jumps across it and wraps in a single move instead of
//! rejection-sampling its way out.
//!
//! ```
//! use prime_shuffle::walker::Walker;
//!
//! // 10 values in a domain of 11 slots
//! let mut walker = Walker::new(3, 4, 10, 11).unwrap();
//! let mut seen: Vec<u64> = (0..10).map(|i| {
//!     if i % 3 == 0 { walker.advance_backward() } else { walker.advance_forward() }
//! }).collect();
//! seen.sort_unstable();
//! assert_eq!(seen, (0..10).collect::<Vec<_>>());
//! ```

use crate::telemetry::{InvariantChecker, InvariantViolation};
use crate::ShuffleError;

/// Which cursor a draw advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Advance the forward cursor by `+step`.
    Forward,
    /// Advance the backward cursor by `-step`.
    Backward,
}

/// The two cursors of the walk and the constants they move by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walker {
    forward: u64,
    backward: u64,
    step: u64,
    /// Offsets below `len` are in range.
    len: u64,
    /// Prime domain size; positions live in `[0, size)`.
    size: u64,
}

impl Walker {
    /// Creates a walker whose forward cursor starts at `start` and whose backward
    /// cursor starts one step behind it.
    ///
    /// # Errors
    ///
    /// [`ShuffleError::InternalError`] unless `1 <= step < size`, `start < size`
    /// and `2 <= len <= size`.
    pub fn new(start: u64, step: u64, len: u64, size: u64) -> Result<Self, ShuffleError> {
        if step == 0 || step >= size || start >= size || len < 2 || len > size {
            return Err(ShuffleError::InternalError {
                context: format!(
                    "walker parameters out of bounds: start={start}, step={step}, len={len}, size={size}"
                ),
            });
        }

        let mut walker = Self {
            forward: start,
            backward: start,
            step,
            len,
            size,
        };
        walker.backward = walker.step_backward(start);
        Ok(walker)
    }

    /// Advances the cursor picked by `direction` and returns the in-range offset it yields.
    #[inline]
    pub fn advance(&mut self, direction: Direction) -> u64 {
        match direction {
            Direction::Forward => self.advance_forward(),
            Direction::Backward => self.advance_backward(),
        }
    }

    /// Returns the next offset of the upward walk.
    pub fn advance_forward(&mut self) -> u64 {
        if self.forward >= self.len {
            // Jump to the last position of this run below the domain edge, then wrap
            let gap = self.size - 1 - self.forward;
            self.forward += gap - gap % self.step;
            self.forward = self.step_forward(self.forward);
        }
        let raw = self.forward;
        self.forward = self.step_forward(self.forward);
        raw
    }

    /// Returns the next offset of the downward walk.
    pub fn advance_backward(&mut self) -> u64 {
        if self.backward >= self.len {
            // Drop to the lowest padding position of this run, then step out of it
            let gap = self.backward - self.len;
            self.backward -= gap - gap % self.step;
            self.backward = self.step_backward(self.backward);
        }
        let raw = self.backward;
        self.backward = self.step_backward(self.backward);
        raw
    }

    #[inline]
    const fn step_forward(&self, position: u64) -> u64 {
        if position >= self.size - self.step {
            position - (self.size - self.step)
        } else {
            position + self.step
        }
    }

    #[inline]
    const fn step_backward(&self, position: u64) -> u64 {
        if position < self.step {
            position + (self.size - self.step)
        } else {
            position - self.step
        }
    }

    /// Current position of the forward cursor.
    #[inline]
    #[must_use]
    pub const fn forward(&self) -> u64 {
        self.forward
    }

    /// Current position of the backward cursor.
    #[inline]
    #[must_use]
    pub const fn backward(&self) -> u64 {
        self.backward
    }

    /// Distance between consecutive positions of the walk.
    #[inline]
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }
}

impl InvariantChecker for Walker {
    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.step == 0 || self.step >= self.size {
            return Err(InvariantViolation::new("Walker", "step outside [1, size)")
                .with_details(format!("step={}, size={}", self.step, self.size)));
        }

        if self.len > self.size {
            return Err(InvariantViolation::new("Walker", "range longer than domain")
                .with_details(format!("len={}, size={}", self.len, self.size)));
        }

        if self.forward >= self.size || self.backward >= self.size {
            return Err(
                InvariantViolation::new("Walker", "cursor outside domain").with_details(format!(
                    "forward={}, backward={}, size={}",
                    self.forward, self.backward, self.size
                )),
            );
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
    use crate::domain::Domain;
    use crate::primality::DEFAULT_CERTAINTY;
    use crate::rng::{Pcg32, Rng, SeedableRng};

    fn drain(walker: &mut Walker, len: u64, mut pick: impl FnMut(u64) -> Direction) -> Vec<u64> {
        (0..len).map(|i| walker.advance(pick(i))).collect()
    }

    fn assert_covers(mut values: Vec<u64>, len: u64) {
        values.sort_unstable();
        assert_eq!(values, (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn test_new_rejects_bad_parameters() {
        assert!(Walker::new(0, 0, 10, 11).is_err());
        assert!(Walker::new(0, 11, 10, 11).is_err());
        assert!(Walker::new(11, 1, 10, 11).is_err());
        assert!(Walker::new(0, 1, 12, 11).is_err());
        assert!(Walker::new(0, 1, 1, 11).is_err());
    }

    #[test]
    fn test_backward_starts_one_step_behind() {
        let walker = Walker::new(5, 3, 10, 11).unwrap();
        assert_eq!(walker.forward(), 5);
        assert_eq!(walker.backward(), 2);

        // Wraps below zero into the top of the domain
        let walker = Walker::new(1, 3, 10, 11).unwrap();
        assert_eq!(walker.backward(), 9);
    }

    #[test]
    fn test_forward_only_is_additive_sequence() {
        // No padding: plain x + step mod size
        let mut walker = Walker::new(0, 2, 7, 7).unwrap();
        let values = drain(&mut walker, 7, |_| Direction::Forward);
        assert_eq!(values, vec![0, 2, 4, 6, 1, 3, 5]);
    }

    #[test]
    fn test_backward_only_is_reverse_sequence() {
        let mut walker = Walker::new(0, 2, 7, 7).unwrap();
        let values = drain(&mut walker, 7, |_| Direction::Backward);
        assert_eq!(values, vec![5, 3, 1, 6, 4, 2, 0]);
    }

    #[test]
    fn test_forward_skips_padding_run() {
        // 8 values in 11 slots, padding is {8, 9, 10}
        let mut walker = Walker::new(8, 1, 8, 11).unwrap();
        assert_eq!(walker.advance_forward(), 0);
        assert_eq!(walker.advance_forward(), 1);
    }

    #[test]
    fn test_backward_skips_padding_run() {
        // Backward cursor starts at 10, inside the padding
        let mut walker = Walker::new(0, 1, 8, 11).unwrap();
        assert_eq!(walker.backward(), 10);
        assert_eq!(walker.advance_backward(), 7);
        assert_eq!(walker.advance_backward(), 6);
    }

    #[test]
    fn test_two_value_domain() {
        for start_forward in [true, false] {
            let mut walker = Walker::new(0, 1, 2, 2).unwrap();
            let first = if start_forward {
                walker.advance_forward()
            } else {
                walker.advance_backward()
            };
            let second = walker.advance_backward();
            assert_covers(vec![first, second], 2);
        }
    }

    /// Every step, every start, several direction patterns: no duplicates before
    /// the cycle completes, including cursors meeting at the wrap boundary.
    #[test]
    fn test_exhaustive_small_domains_cover_range() {
        let mut rng = Pcg32::seed_from_u64(11);
        for high in 1..48 {
            let domain = Domain::build(0, high, DEFAULT_CERTAINTY).unwrap();
            let (len, size) = (domain.len(), domain.size());
            for step in 1..=domain.max_step() {
                for start in 0..size - 1 {
                    let patterns: [&mut dyn FnMut(u64) -> Direction; 4] = [
                        &mut |_| Direction::Forward,
                        &mut |_| Direction::Backward,
                        &mut |i| {
                            if i % 2 == 0 {
                                Direction::Forward
                            } else {
                                Direction::Backward
                            }
                        },
                        &mut |_| {
                            if rng.gen::<bool>() {
                                Direction::Forward
                            } else {
                                Direction::Backward
                            }
                        },
                    ];
                    for pick in patterns {
                        let mut walker = Walker::new(start, step, len, size).unwrap();
                        let values = drain(&mut walker, len, pick);
                        assert!(walker.check_invariants().is_ok());
                        assert_covers(values, len);
                    }
                }
            }
        }
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
    use crate::domain::Domain;
    use crate::primality::DEFAULT_CERTAINTY;
    use crate::rng::{Pcg32, Rng, SeedableRng};
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        /// Property: a random interleaving of `len` advances never repeats an offset
        /// and never yields a padding offset.
        #[test]
        fn prop_random_interleaving_is_permutation(
            high in 1i64..5_000,
            seed in any::<u64>(),
        ) {
            let domain = Domain::build(0, high, DEFAULT_CERTAINTY).unwrap();
            let mut rng = Pcg32::seed_from_u64(seed);
            let step = rng.gen_range_u64(1..domain.max_step() + 1);
            let start = rng.gen_range_u64(0..domain.size() - 1);
            let mut walker = Walker::new(start, step, domain.len(), domain.size()).unwrap();

            let mut seen = HashSet::new();
            for _ in 0..domain.len() {
                let raw = if rng.gen::<bool>() {
                    walker.advance_forward()
                } else {
                    walker.advance_backward()
                };
                prop_assert!(raw < domain.len(), "padding offset {} surfaced", raw);
                prop_assert!(seen.insert(raw), "offset {} emitted twice", raw);
            }
        }
    }
}
