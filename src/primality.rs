//! Probabilistic primality test and next-prime search.
//!
//! Both functions are pure: no state, no randomness. The Miller-Rabin witnesses
//! are the first twelve primes, and `certainty` decides how many of them are
//! tried. Each round bounds the false-positive rate by 1/4, so `certainty`
//! behaves as "error probability at most 2^-certainty". Once all twelve
//! witnesses are in play (`certainty >= 23`) the answer is exact for every
//! `u64`, which includes the default certainty of [`DEFAULT_CERTAINTY`].
//! Certainty 0 is exact as well.
//!
//! ```
//! use prime_shuffle::primality::{is_probably_prime, next_probable_prime, DEFAULT_CERTAINTY};
//!
//! assert!(is_probably_prime(97, DEFAULT_CERTAINTY));
//! assert!(!is_probably_prime(91, DEFAULT_CERTAINTY));
//! assert_eq!(next_probable_prime(90, DEFAULT_CERTAINTY), Some(97));
//! ```

/// Certainty used when the caller does not pick one.
pub const DEFAULT_CERTAINTY: u32 = 200;

/// Miller-Rabin witnesses. Testing all of them is deterministic for `n < 2^64`.
const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Number of Miller-Rabin rounds for a given certainty: `ceil(certainty / 2)`,
/// at most one per witness.
///
/// Certainty 0 asks for the exact answer and runs every witness.
#[inline]
#[must_use]
pub const fn rounds_for(certainty: u32) -> usize {
    let rounds = certainty.div_ceil(2) as usize;
    if rounds == 0 || rounds > WITNESSES.len() {
        WITNESSES.len()
    } else {
        rounds
    }
}

/// Returns `true` if `n` is prime with error probability at most `2^-certainty`.
///
/// Composites are never reported as prime when `certainty` is 0 or at least 23.
#[must_use]
pub fn is_probably_prime(n: u64, certainty: u32) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }

    // n - 1 = d * 2^s with d odd
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;

    WITNESSES
        .iter()
        .take(rounds_for(certainty))
        .all(|&witness| passes_round(n, d, s, witness))
}

/// Returns the smallest odd number greater than `n` that passes
/// [`is_probably_prime`].
///
/// The search starts at `n + 1` when `n` is even and `n + 2` when it is odd, so
/// `2` is never returned. Returns `None` if the search runs past `u64::MAX`.
#[must_use]
pub fn next_probable_prime(n: u64, certainty: u32) -> Option<u64> {
    let mut candidate = if n % 2 == 0 {
        n.checked_add(1)?
    } else {
        n.checked_add(2)?
    };
    loop {
        if is_probably_prime(candidate, certainty) {
            return Some(candidate);
        }
        candidate = candidate.checked_add(2)?;
    }
}

/// One Miller-Rabin round: `true` if `witness` does not prove `n` composite.
fn passes_round(n: u64, d: u64, s: u32, witness: u64) -> bool {
    let mut x = pow_mod(witness % n, d, n);
    if x == 1 || x == n - 1 {
        return true;
    }
    for _ in 1..s {
        x = mul_mod(x, x, n);
        if x == n - 1 {
            return true;
        }
    }
    false
}

#[inline]
fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) % u128::from(m)) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut result = 1 % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
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

    fn trial_division(n: u64) -> bool {
        if n < 2 {
            return false;
        }
        let mut i = 2;
        while i * i <= n {
            if n % i == 0 {
                return false;
            }
            i += 1;
        }
        true
    }

    #[test]
    fn test_small_numbers_match_trial_division() {
        for n in 0..5000 {
            assert_eq!(
                is_probably_prime(n, DEFAULT_CERTAINTY),
                trial_division(n),
                "mismatch at {n}"
            );
        }
    }

    #[test]
    fn test_edge_values() {
        assert!(!is_probably_prime(0, DEFAULT_CERTAINTY));
        assert!(!is_probably_prime(1, DEFAULT_CERTAINTY));
        assert!(is_probably_prime(2, DEFAULT_CERTAINTY));
        assert!(is_probably_prime(3, DEFAULT_CERTAINTY));
        assert!(!is_probably_prime(4, DEFAULT_CERTAINTY));
    }

    #[test]
    fn test_large_primes() {
        // Largest prime below 2^64 and below 2^63
        assert!(is_probably_prime(18_446_744_073_709_551_557, DEFAULT_CERTAINTY));
        assert!(is_probably_prime(9_223_372_036_854_775_783, DEFAULT_CERTAINTY));
        assert!(is_probably_prime(1_000_000_007, DEFAULT_CERTAINTY));
        assert!(!is_probably_prime(u64::MAX, DEFAULT_CERTAINTY));
    }

    #[test]
    fn test_strong_pseudoprimes_rejected_at_full_certainty() {
        // Strong pseudoprimes to base 2, to bases 2..=7, and to bases 2..=19
        for n in [8321u64, 3_215_031_751, 3_825_123_056_546_413_051] {
            assert!(!is_probably_prime(n, DEFAULT_CERTAINTY), "{n} is composite");
        }
    }

    #[test]
    fn test_low_certainty_uses_fewer_rounds() {
        // 8321 = 53 * 157 has no factor among the witnesses and fools a base-2 round
        assert!(is_probably_prime(8321, 1));
        assert!(!is_probably_prime(8321, 4));
    }

    #[test]
    fn test_zero_certainty_is_exact() {
        for n in [8321u64, 3_215_031_751, 3_825_123_056_546_413_051] {
            assert!(!is_probably_prime(n, 0), "{n} is composite");
        }
        assert!(is_probably_prime(18_446_744_073_709_551_557, 0));
        assert_eq!(next_probable_prime(8320, 0), Some(8329));
    }

    #[test]
    fn test_rounds_for() {
        assert_eq!(rounds_for(0), 12);
        assert_eq!(rounds_for(1), 1);
        assert_eq!(rounds_for(2), 1);
        assert_eq!(rounds_for(3), 2);
        assert_eq!(rounds_for(22), 11);
        assert_eq!(rounds_for(23), 12);
        assert_eq!(rounds_for(DEFAULT_CERTAINTY), 12);
        assert_eq!(rounds_for(u32::MAX), 12);
    }

    #[test]
    fn test_next_probable_prime() {
        assert_eq!(next_probable_prime(0, DEFAULT_CERTAINTY), Some(3));
        assert_eq!(next_probable_prime(1, DEFAULT_CERTAINTY), Some(3));
        assert_eq!(next_probable_prime(2, DEFAULT_CERTAINTY), Some(3));
        assert_eq!(next_probable_prime(3, DEFAULT_CERTAINTY), Some(5));
        assert_eq!(next_probable_prime(4, DEFAULT_CERTAINTY), Some(5));
        assert_eq!(next_probable_prime(10, DEFAULT_CERTAINTY), Some(11));
        assert_eq!(next_probable_prime(11, DEFAULT_CERTAINTY), Some(13));
        assert_eq!(next_probable_prime(114, DEFAULT_CERTAINTY), Some(127));
    }

    #[test]
    fn test_next_probable_prime_overflow() {
        assert_eq!(
            next_probable_prime(18_446_744_073_709_551_557, DEFAULT_CERTAINTY),
            None
        );
        assert_eq!(next_probable_prime(u64::MAX, DEFAULT_CERTAINTY), None);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the next prime is strictly greater, odd, prime, and nothing
        /// odd in between is prime.
        #[test]
        fn prop_next_probable_prime_is_smallest(n in 2u64..1_000_000) {
            let next = next_probable_prime(n, DEFAULT_CERTAINTY).unwrap_or(0);
            prop_assert!(next > n);
            prop_assert!(next % 2 == 1);
            prop_assert!(is_probably_prime(next, DEFAULT_CERTAINTY));
            let mut between = n + 1;
            while between < next {
                prop_assert!(!is_probably_prime(between, DEFAULT_CERTAINTY));
                between += 1;
            }
        }

        /// Property: a product of two factors above the trial-division witnesses is composite.
        #[test]
        fn prop_semiprimes_are_composite(a in 41u64..100_000, b in 41u64..100_000) {
            prop_assert!(!is_probably_prime(a * b, DEFAULT_CERTAINTY));
        }
    }
}
