//! Configuration for shuffle generators.
//!
//! | Preset | Certainty | Primality answers |
//! |--------|-----------|-------------------|
//! | `ShuffleConfig::default()` | 200 | exact for every `u64` |
//! | `ShuffleConfig::exact()` | 23 | exact for every `u64`, fewest rounds |
//! | `ShuffleConfig::fast()` | 8 | probabilistic, error ≤ 2^-8 per candidate |
//! | `ShuffleConfig { certainty: 0 }` | 0 | exact for every `u64` |
//!
//! # Example
//!
//! ```
//! use prime_shuffle::{ShuffleBuilder, ShuffleConfig};
//!
//! let mut generator = ShuffleBuilder::new(1, 52)
//!     .with_config(ShuffleConfig::exact())
//!     .build()
//!     .unwrap();
//! assert!(generator.next_value().is_ok());
//! ```

use crate::primality::DEFAULT_CERTAINTY;

/// Lowest certainty at which every primality answer on a `u64` is exact.
pub const EXACT_CERTAINTY: u32 = 23;

/// Tunables for building a [`ShuffleGenerator`](crate::ShuffleGenerator).
///
/// # Forward Compatibility
///
/// New fields may be added to this struct in future versions. Construct
/// instances with `..ShuffleConfig::default()` or a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "ShuffleConfig has no effect unless passed to ShuffleBuilder::with_config()"]
pub struct ShuffleConfig {
    /// Certainty level of the primality test used to size the domain: a
    /// composite passes with probability at most `2^-certainty`. Zero asks for
    /// the exact answer, like [`EXACT_CERTAINTY`].
    ///
    /// A composite domain size can leave the walk unable to reach every value,
    /// which the generator detects and repairs by growing the domain, at the
    /// cost of a telemetry warning.
    ///
    /// Default: 200
    pub certainty: u32,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self {
            certainty: DEFAULT_CERTAINTY,
        }
    }
}

impl ShuffleConfig {
    /// Creates a new `ShuffleConfig` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest certainty that still gives exact primality answers.
    pub fn exact() -> Self {
        Self {
            certainty: EXACT_CERTAINTY,
        }
    }

    /// Few Miller-Rabin rounds, for building many generators over large ranges.
    pub fn fast() -> Self {
        Self { certainty: 8 }
    }

    /// Returns `true` if primality answers under this config are exact.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.certainty == 0 || self.certainty >= EXACT_CERTAINTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_exact() {
        let config = ShuffleConfig::default();
        assert_eq!(config.certainty, DEFAULT_CERTAINTY);
        assert!(config.is_exact());
        assert_eq!(ShuffleConfig::new(), config);
    }

    #[test]
    fn test_presets() {
        assert!(ShuffleConfig::exact().is_exact());
        assert!(!ShuffleConfig::fast().is_exact());
    }

    #[test]
    fn test_zero_certainty_is_exact() {
        assert!(ShuffleConfig { certainty: 0 }.is_exact());
        assert!(!ShuffleConfig { certainty: 1 }.is_exact());
        assert!(!ShuffleConfig {
            certainty: EXACT_CERTAINTY - 1
        }
        .is_exact());
    }
}
