use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// This enum contains all error messages this library can return. Every fallible API function
/// returns a [`Result<T, ShuffleError>`].
///
/// [`Result<T, ShuffleError>`]: std::result::Result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShuffleError {
    /// The requested range is empty or a single value. The lower bound must be strictly less
    /// than the upper bound.
    InvalidRange {
        /// The requested lower bound.
        low: i64,
        /// The requested upper bound.
        high: i64,
    },
    /// The range, or the prime-sized domain covering it, does not fit the integer width.
    RangeTooLarge {
        /// The requested lower bound.
        low: i64,
        /// The requested upper bound.
        high: i64,
    },
    /// Building the domain produced a fill bound that does not lie above the lower bound.
    NoPrimeInRange {
        /// The lower bound of the domain.
        low: i64,
        /// The fill bound that was computed.
        fill_bound: i64,
    },
    /// Re-randomizing the walk on reset produced a fill bound that does not lie above the
    /// lower bound.
    FillBoundIllegal {
        /// The lower bound of the domain.
        low: i64,
        /// The fill bound that was computed.
        fill_bound: i64,
    },
    /// Every value of the range has already been emitted. Call
    /// [`reset`](crate::ShuffleGenerator::reset) to start a new cycle.
    Exhausted {
        /// The number of values in the range.
        len: u64,
    },
    /// An internal error occurred that should not happen under normal operation.
    /// If you encounter this error, please report it as a bug.
    InternalError {
        /// A description of the internal error.
        context: String,
    },
}

impl Display for ShuffleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShuffleError::InvalidRange { low, high } => {
                write!(
                    f,
                    "Invalid range [{}, {}]: lower bound must be less than upper bound",
                    low, high
                )
            }
            ShuffleError::RangeTooLarge { low, high } => {
                write!(
                    f,
                    "Range [{}, {}] is too large: its prime-sized domain exceeds the integer width",
                    low, high
                )
            }
            ShuffleError::NoPrimeInRange { low, fill_bound } => {
                write!(
                    f,
                    "No prime number in the range: fill bound {} is not above {}",
                    fill_bound, low
                )
            }
            ShuffleError::FillBoundIllegal { low, fill_bound } => {
                write!(
                    f,
                    "Fill bound illegal on reset: {} is not above {}",
                    fill_bound, low
                )
            }
            ShuffleError::Exhausted { len } => {
                write!(f, "Exhausted all {} possible values", len)
            }
            ShuffleError::InternalError { context } => {
                write!(f, "Internal error (please report as bug): {}", context)
            }
        }
    }
}

impl Error for ShuffleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_range() {
        let err = ShuffleError::InvalidRange { low: 5, high: 3 };
        let display = err.to_string();
        assert!(display.contains("[5, 3]"));
        assert!(display.contains("lower bound must be less than upper bound"));
    }

    #[test]
    fn test_display_exhausted() {
        let err = ShuffleError::Exhausted { len: 10 };
        assert_eq!(err.to_string(), "Exhausted all 10 possible values");
    }

    #[test]
    fn test_display_fill_bound_variants() {
        let construct = ShuffleError::NoPrimeInRange {
            low: 4,
            fill_bound: 4,
        };
        let reset = ShuffleError::FillBoundIllegal {
            low: 4,
            fill_bound: 4,
        };
        assert!(construct.to_string().starts_with("No prime number in the range"));
        assert!(reset.to_string().starts_with("Fill bound illegal"));
        assert_ne!(construct, reset);
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: Error + Send + Sync + 'static>(_: &E) {}
        assert_error(&ShuffleError::InternalError {
            context: "test".to_string(),
        });
    }
}
