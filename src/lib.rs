//! # Prime Shuffle
//!
//! Emits every integer of a range `[low, high]` exactly once, in shuffled order,
//! without storing the range. Memory use is O(1) regardless of the range size.
//!
//! The range is grown to a prime-sized domain. Each cycle walks that domain with
//! a random step from a random starting phase, using two cursors moving in
//! opposite directions and picking one by coin flip per draw. Positions that
//! land in the padding above `high` are skipped arithmetically rather than by
//! rejection, and a random reflection around a midpoint further breaks up the
//! visible ordering.
//!
//! The output is shuffled, not secret: the walk is linear and predictable from
//! a few observed values.
//!
//! # Example
//!
//! ```
//! use prime_shuffle::ShuffleGenerator;
//!
//! let mut generator = ShuffleGenerator::new(-5, 5)?;
//! let mut seen = Vec::new();
//! while let Ok(value) = generator.next_value() {
//!     seen.push(value);
//! }
//! seen.sort_unstable();
//! assert_eq!(seen, (-5..=5).collect::<Vec<_>>());
//!
//! // A new cycle over the same range
//! generator.reset()?;
//! assert_eq!(generator.remaining(), 11);
//! # Ok::<(), prime_shuffle::ShuffleError>(())
//! ```
//!
//! Deterministic generators take an explicit random source through
//! [`ShuffleBuilder::with_rng`] or [`ShuffleGenerator::with_rng`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use builder::ShuffleBuilder;
pub use config::ShuffleConfig;
pub use error::ShuffleError;
pub use generator::ShuffleGenerator;

/// Builder for configured generators.
pub mod builder;
pub mod config;
pub mod domain;
#[doc(hidden)]
pub mod error;
/// The generator facade.
pub mod generator;
pub mod mirror;
pub mod primality;
/// Internal random number generator module based on PCG32.
///
/// Provides the injectable random source every generator draws from.
pub mod rng;
pub mod telemetry;
pub mod walker;
