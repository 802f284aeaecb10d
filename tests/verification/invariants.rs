//! Tests for InvariantChecker implementations through the public API.
//!
//! # Invariants Tested
//!
//! ## Domain
//! - range holds at least two values
//! - domain size is at least the range length and prime
//! - fill bound is `low + size - 1`
//!
//! ## Walker
//! - step in `[1, size)`, cursors inside the domain
//!
//! ## ShuffleGenerator
//! - `emitted <= len`, fold point inside the range, walker well-formed

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use std::sync::Arc;

use crate::common::{assert_permutation, drain_cycle, init_tracing, observed};
use prime_shuffle::domain::Domain;
use prime_shuffle::primality::DEFAULT_CERTAINTY;
use prime_shuffle::rng::{Pcg32, SeedableRng};
use prime_shuffle::telemetry::{
    CollectingObserver, InvariantChecker, ViolationKind, ViolationSeverity,
};
use prime_shuffle::walker::Walker;
use prime_shuffle::{assert_no_violations, assert_violation, ShuffleBuilder};

// ============================================================================
// Domain
// ============================================================================

mod domain_invariants {
    use super::*;

    #[test]
    fn test_invariants_hold_after_build() {
        for (low, high) in [
            (0, 1),
            (-1, 1),
            (0, 9),
            (i64::MIN, i64::MIN + 1_000),
            (i64::MAX - 12, i64::MAX),
            (-(1 << 40), 1 << 40),
        ] {
            let domain = Domain::build(low, high, DEFAULT_CERTAINTY).unwrap();
            assert!(
                domain.check_invariants().is_ok(),
                "[{low}, {high}]: {:?}",
                domain.check_invariants()
            );
        }
    }

    #[test]
    fn test_invariants_hold_after_grow() {
        let mut domain = Domain::build(0, 99, DEFAULT_CERTAINTY).unwrap();
        for _ in 0..10 {
            let before = domain.size();
            domain.grow().unwrap();
            assert!(domain.size() > before);
            assert!(domain.check_invariants().is_ok());
        }
    }
}

// ============================================================================
// Walker
// ============================================================================

mod walker_invariants {
    use super::*;

    #[test]
    fn test_invariants_hold_across_advances() {
        let mut walker = Walker::new(5, 7, 96, 97).unwrap();
        assert!(walker.check_invariants().is_ok());
        for i in 0..96 {
            if i % 3 == 0 {
                walker.advance_backward();
            } else {
                walker.advance_forward();
            }
            assert!(walker.check_invariants().is_ok());
        }
    }
}

// ============================================================================
// ShuffleGenerator
// ============================================================================

mod generator_invariants {
    use super::*;

    #[test]
    fn test_invariants_hold_across_draws_and_resets() {
        init_tracing();
        let (mut generator, observer) = observed(-1_000, 1_000, 21);
        assert!(generator.check_invariants().is_ok());
        for cycle in 0..3 {
            for _ in 0..generator.len() {
                generator.next_value().unwrap();
                assert!(generator.check_invariants().is_ok(), "cycle {cycle}");
            }
            generator.reset().unwrap();
            assert!(generator.check_invariants().is_ok());
        }
        assert_no_violations!(observer);
    }

    /// 8321 = 53 * 157 passes a single base-2 round, so at certainty 1 the
    /// domain starts out composite. Any step sharing a factor with it must be
    /// caught, reported, and repaired by growing the domain.
    #[test]
    fn test_composite_domain_is_repaired() {
        init_tracing();
        let observer = Arc::new(CollectingObserver::new());
        let mut generator = ShuffleBuilder::new(0, 8_320)
            .with_certainty(1)
            .with_rng(Pcg32::seed_from_u64(1))
            .with_violation_observer(observer.clone())
            .build()
            .unwrap();

        let mut resets = 0;
        while observer.is_empty() && resets < 5_000 {
            generator.reset().unwrap();
            resets += 1;
        }
        assert_violation!(observer, ViolationKind::Domain);

        let violation = &observer.violations_of_kind(ViolationKind::Domain)[0];
        assert_eq!(violation.severity, ViolationSeverity::Warning);
        assert!(generator.fill_bound() > 8_320);

        // The repaired domain still yields a full cycle
        let values = drain_cycle(&mut generator);
        assert_permutation(&values, 0, 8_320);
        assert!(generator.check_invariants().is_ok());
    }
}
