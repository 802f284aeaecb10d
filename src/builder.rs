use std::sync::Arc;

use crate::config::ShuffleConfig;
use crate::rng::{Pcg32, Rng, SeedableRng};
use crate::telemetry::ViolationObserver;
use crate::{ShuffleError, ShuffleGenerator};

/// The [`ShuffleBuilder`] builds [`ShuffleGenerator`]s.
///
/// After setting all appropriate values, use [`ShuffleBuilder::build`] to consume the builder.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use prime_shuffle::rng::{Pcg32, SeedableRng};
/// use prime_shuffle::telemetry::CollectingObserver;
/// use prime_shuffle::ShuffleBuilder;
///
/// let observer = Arc::new(CollectingObserver::new());
/// let generator = ShuffleBuilder::new(-10, 10)
///     .with_rng(Pcg32::seed_from_u64(42))
///     .with_violation_observer(observer.clone())
///     .build()
///     .unwrap();
///
/// assert_eq!(generator.count(), 21);
/// assert!(observer.is_empty());
/// ```
#[must_use = "ShuffleBuilder must be consumed by calling build()"]
pub struct ShuffleBuilder<R: Rng = Pcg32> {
    low: i64,
    high: i64,
    config: ShuffleConfig,
    rng: R,
    /// Optional observer for violations raised while drawing.
    violation_observer: Option<Arc<dyn ViolationObserver>>,
}

impl<R: Rng> std::fmt::Debug for ShuffleBuilder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            low,
            high,
            config,
            rng: _,
            violation_observer,
        } = self;

        f.debug_struct("ShuffleBuilder")
            .field("low", low)
            .field("high", high)
            .field("config", config)
            .field("has_violation_observer", &violation_observer.is_some())
            .finish_non_exhaustive()
    }
}

impl ShuffleBuilder<Pcg32> {
    /// Starts a builder for the range `[low, high]`, with default config and a
    /// wall-clock seeded random source.
    pub fn new(low: i64, high: i64) -> Self {
        Self {
            low,
            high,
            config: ShuffleConfig::default(),
            rng: Pcg32::from_entropy(),
            violation_observer: None,
        }
    }
}

impl<R: Rng> ShuffleBuilder<R> {
    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: ShuffleConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the primality certainty. See [`ShuffleConfig::certainty`].
    pub fn with_certainty(mut self, certainty: u32) -> Self {
        self.config.certainty = certainty;
        self
    }

    /// Replaces the random source the generator draws from.
    pub fn with_rng<R2: Rng>(self, rng: R2) -> ShuffleBuilder<R2> {
        ShuffleBuilder {
            low: self.low,
            high: self.high,
            config: self.config,
            rng,
            violation_observer: self.violation_observer,
        }
    }

    /// Sets an observer for violations raised while the generator runs.
    ///
    /// Without one, violations are logged through `tracing`.
    pub fn with_violation_observer(mut self, observer: Arc<dyn ViolationObserver>) -> Self {
        self.violation_observer = Some(observer);
        self
    }

    /// Consumes the builder to construct a [`ShuffleGenerator`].
    ///
    /// # Errors
    ///
    /// Any construction error of [`ShuffleGenerator::new`].
    pub fn build(self) -> Result<ShuffleGenerator<R>, ShuffleError> {
        ShuffleGenerator::from_config(
            self.low,
            self.high,
            self.config,
            self.rng,
            self.violation_observer,
        )
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

    #[test]
    fn test_defaults() {
        let generator = ShuffleBuilder::new(0, 9).build().unwrap();
        assert_eq!(generator.low(), 0);
        assert_eq!(generator.high(), 9);
        assert_eq!(generator.certainty(), ShuffleConfig::default().certainty);
    }

    #[test]
    fn test_with_certainty_overrides_config() {
        let generator = ShuffleBuilder::new(0, 9)
            .with_config(ShuffleConfig::fast())
            .with_certainty(40)
            .build()
            .unwrap();
        assert_eq!(generator.certainty(), 40);
    }

    #[test]
    fn test_zero_certainty_accepted() {
        let mut generator = ShuffleBuilder::new(0, 9)
            .with_certainty(0)
            .with_rng(Pcg32::seed_from_u64(3))
            .build()
            .unwrap();
        assert_eq!(generator.certainty(), 0);
        let mut values: Vec<i64> = generator.by_ref().collect();
        values.sort_unstable();
        assert_eq!(values, (0..=9).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_range_rejected() {
        let result = ShuffleBuilder::new(3, 3).build();
        assert_eq!(
            result.unwrap_err(),
            ShuffleError::InvalidRange { low: 3, high: 3 }
        );
    }

    #[test]
    fn test_seeded_builders_agree() {
        let a: Vec<i64> = ShuffleBuilder::new(0, 63)
            .with_rng(Pcg32::seed_from_u64(5))
            .build()
            .unwrap()
            .collect();
        let b: Vec<i64> = ShuffleBuilder::new(0, 63)
            .with_rng(Pcg32::seed_from_u64(5))
            .build()
            .unwrap()
            .collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_observer_reaches_generator() {
        let observer = Arc::new(CollectingObserver::new());
        let generator = ShuffleBuilder::new(0, 9)
            .with_violation_observer(observer.clone())
            .build()
            .unwrap();
        assert!(format!("{generator:?}").contains("has_violation_observer: true"));
        assert!(observer.is_empty());
    }

    #[test]
    fn test_debug_output() {
        let builder = ShuffleBuilder::new(1, 2);
        let debug = format!("{builder:?}");
        assert!(debug.contains("ShuffleBuilder"));
        assert!(debug.contains("certainty"));
    }
}
