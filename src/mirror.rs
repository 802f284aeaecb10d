//! Post-walk reflection of emitted offsets.
//!
//! A [`Mirror`] reflects one side of the range around a random midpoint. With
//! `fold_high` set, offsets above the midpoint are reversed in place (the
//! smallest becomes the largest); otherwise offsets up to and including the
//! midpoint are. The map is a bijection on `[0, last]`, so it reorders output
//! without touching uniqueness or coverage.

/// Fold point and fold direction, chosen once per construction or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mirror {
    midpoint: u64,
    fold_high: bool,
}

impl Mirror {
    /// Creates a mirror folding around the offset `midpoint`.
    #[must_use]
    pub const fn new(midpoint: u64, fold_high: bool) -> Self {
        Self {
            midpoint,
            fold_high,
        }
    }

    /// Maps the raw offset `raw` in `[0, last]` to its reflected offset.
    ///
    /// The reflection pivots around the centre of the folded segment; `f`
    /// corrects for segments of odd length, whose centre falls on a slot rather
    /// than between two.
    ///
    /// ```
    /// use prime_shuffle::mirror::Mirror;
    ///
    /// // Upper side [4, 9] reversed, lower side untouched
    /// let mirror = Mirror::new(3, true);
    /// assert_eq!(mirror.apply(2, 9), 2);
    /// assert_eq!(mirror.apply(4, 9), 9);
    /// assert_eq!(mirror.apply(9, 9), 4);
    /// ```
    #[must_use]
    pub const fn apply(&self, raw: u64, last: u64) -> u64 {
        let m = self.midpoint;
        if self.fold_high {
            if raw <= m {
                return raw;
            }
            let span = last - m;
            let f = (span & 1 == 0) as u64;
            let pivot = m + (span >> 1) + 1;
            // 2·pivot may exceed u64 near the top of the width; the result never does
            pivot.wrapping_mul(2).wrapping_sub(raw).wrapping_sub(f)
        } else {
            if raw > m {
                return raw;
            }
            let f = (m & 1) as u64;
            let pivot = (m >> 1) + f;
            (pivot * 2).wrapping_sub(raw).wrapping_sub(f)
        }
    }

    /// The fold point.
    #[inline]
    #[must_use]
    pub const fn midpoint(&self) -> u64 {
        self.midpoint
    }

    /// `true` if the side above the midpoint is the one reversed.
    #[inline]
    #[must_use]
    pub const fn folds_high(&self) -> bool {
        self.fold_high
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

    #[test]
    fn test_fold_high_reverses_upper_side() {
        let mirror = Mirror::new(4, true);
        let mapped: Vec<u64> = (0..=9).map(|v| mirror.apply(v, 9)).collect();
        assert_eq!(mapped, vec![0, 1, 2, 3, 4, 9, 8, 7, 6, 5]);
    }

    #[test]
    fn test_fold_low_reverses_lower_side() {
        let mirror = Mirror::new(4, false);
        let mapped: Vec<u64> = (0..=9).map(|v| mirror.apply(v, 9)).collect();
        assert_eq!(mapped, vec![4, 3, 2, 1, 0, 5, 6, 7, 8, 9]);

        let mirror = Mirror::new(3, false);
        let mapped: Vec<u64> = (0..=9).map(|v| mirror.apply(v, 9)).collect();
        assert_eq!(mapped, vec![3, 2, 1, 0, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_bijection_for_every_midpoint() {
        for last in 1..40u64 {
            for midpoint in 0..last {
                for fold_high in [true, false] {
                    let mirror = Mirror::new(midpoint, fold_high);
                    let mut mapped: Vec<u64> = (0..=last).map(|v| mirror.apply(v, last)).collect();
                    mapped.sort_unstable();
                    assert_eq!(
                        mapped,
                        (0..=last).collect::<Vec<_>>(),
                        "last={last}, midpoint={midpoint}, fold_high={fold_high}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_reflection_is_symmetric_around_segment_centre() {
        // Each folded value and its image sum to the same constant
        let (last, midpoint) = (20u64, 7u64);
        let high = Mirror::new(midpoint, true);
        for v in midpoint + 1..=last {
            assert_eq!(v + high.apply(v, last), midpoint + 1 + last);
            assert_eq!(high.apply(high.apply(v, last), last), v);
        }
        let low = Mirror::new(midpoint, false);
        for v in 0..=midpoint {
            assert_eq!(v + low.apply(v, last), midpoint);
            assert_eq!(low.apply(low.apply(v, last), last), v);
        }
    }

    #[test]
    fn test_top_of_width_does_not_overflow() {
        let last = u64::MAX - 1;
        let mirror = Mirror::new(1, true);
        assert_eq!(mirror.apply(2, last), last);
        assert_eq!(mirror.apply(last, last), 2);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the reflection matches its closed form on both sides.
        #[test]
        fn prop_apply_matches_closed_form(
            last in 1u64..u64::MAX,
            midpoint_seed in any::<u64>(),
            raw_seed in any::<u64>(),
            fold_high in any::<bool>(),
        ) {
            let midpoint = midpoint_seed % last;
            let raw = raw_seed % (last + 1);
            let mirror = Mirror::new(midpoint, fold_high);
            let expected = match (fold_high, raw <= midpoint) {
                (true, true) | (false, false) => raw,
                (true, false) => midpoint + 1 + (last - raw),
                (false, true) => midpoint - raw,
            };
            let mapped = mirror.apply(raw, last);
            prop_assert_eq!(mapped, expected);
            prop_assert!(mapped <= last);
        }
    }
}
