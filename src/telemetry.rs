//! Structured telemetry for walk anomalies and broken invariants.
//!
//! The walk has a handful of conditions that should never happen for a
//! well-formed domain (a degenerate step, a padding position leaking out of the
//! correction rule, a cursor outside the domain). Instead of just logging with
//! `tracing::warn!`, each one is reported as structured data that can be:
//!
//! - Logged via tracing (default behavior)
//! - Collected programmatically for testing
//! - Sent to custom observers (metrics, alerting, etc.)
//!
//! # Example
//!
//! ```
//! use prime_shuffle::telemetry::CollectingObserver;
//! use prime_shuffle::ShuffleBuilder;
//! use std::sync::Arc;
//!
//! let observer = Arc::new(CollectingObserver::new());
//! let mut generator = ShuffleBuilder::new(0, 99)
//!     .with_violation_observer(observer.clone())
//!     .build()
//!     .unwrap();
//! while generator.next_value().is_ok() {}
//!
//! assert!(observer.violations().is_empty(), "unexpected violations");
//! ```

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Severity of a violation.
///
/// Severities are ordered from least to most severe, allowing filtering
/// and comparison operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    /// Unexpected but recoverable - operation continued with fallback.
    ///
    /// Example: the domain had to grow because the drawn step shared a factor with its size.
    Warning,
    /// Serious issue - operation may have degraded behavior.
    ///
    /// Example: a random range helper was called with an empty range.
    Error,
    /// Critical invariant broken - emitted values may no longer be unique.
    Critical,
}

impl ViolationSeverity {
    /// Returns a string representation suitable for logging/metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories of violations.
///
/// # Forward Compatibility
///
/// This enum is marked `#[non_exhaustive]` because new violation categories
/// may be added in future versions. Always include a wildcard arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ViolationKind {
    /// Configuration constraint violated.
    ///
    /// Examples:
    /// - Empty range handed to a random helper
    Configuration,
    /// Prime domain construction took an unexpected path.
    ///
    /// Examples:
    /// - Step shares a factor with the domain size, forcing the domain to grow
    Domain,
    /// The bidirectional walk produced something it should not have.
    ///
    /// Examples:
    /// - A padding position survived the correction rule
    Walk,
    /// Internal logic error (should never happen).
    ///
    /// Example: a reflected offset fell outside the range.
    InternalError,
    /// Runtime invariant check failed.
    ///
    /// Only checked in debug builds or when `paranoid` feature is enabled.
    Invariant,
}

impl ViolationKind {
    /// Returns a string representation suitable for logging/metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Domain => "domain",
            Self::Walk => "walk",
            Self::InternalError => "internal_error",
            Self::Invariant => "invariant",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded violation.
///
/// # Example
///
/// ```
/// use prime_shuffle::telemetry::{SpecViolation, ViolationSeverity, ViolationKind};
///
/// let violation = SpecViolation::new(
///     ViolationSeverity::Warning,
///     ViolationKind::Domain,
///     "step shares a factor with domain size",
///     "domain.rs:42",
/// )
/// .with_context("step", "7")
/// .with_context("size", "49");
///
/// assert_eq!(violation.context.len(), 2);
/// assert!(violation.to_string().contains("domain"));
/// ```
///
/// Violations serialize with `serde`, with or without the `json` feature:
///
/// ```
/// # use prime_shuffle::telemetry::{SpecViolation, ViolationSeverity, ViolationKind};
/// let violation = SpecViolation::new(
///     ViolationSeverity::Error,
///     ViolationKind::Walk,
///     "cursor surfaced in padding",
///     "generator.rs:210",
/// )
/// .with_context("offset", "12");
///
/// let json = serde_json::to_string(&violation).unwrap();
/// assert!(json.contains(r#""severity":"error""#));
/// assert!(json.contains(r#""context":{"offset":"12"}"#));
/// ```
#[derive(Debug, Clone, serde::Serialize)]
pub struct SpecViolation {
    /// The severity level of this violation.
    pub severity: ViolationSeverity,
    /// The category where the violation occurred.
    pub kind: ViolationKind,
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Source location where the violation was detected (file:line).
    pub location: &'static str,
    /// Additional structured context as key-value pairs.
    pub context: BTreeMap<String, String>,
}

impl SpecViolation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        severity: ViolationSeverity,
        kind: ViolationKind,
        message: impl Into<String>,
        location: &'static str,
    ) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            location,
            context: BTreeMap::new(),
        }
    }

    /// Adds a context key-value pair.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Serializes this violation to a JSON string.
    ///
    /// Returns `None` if serialization fails (which should not happen for
    /// well-formed violations).
    #[cfg(feature = "json")]
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Serializes this violation to a pretty-printed JSON string.
    #[cfg(feature = "json")]
    #[must_use]
    pub fn to_json_pretty(&self) -> Option<String> {
        serde_json::to_string_pretty(self).ok()
    }
}

impl std::fmt::Display for SpecViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}/{}] {} (at {}",
            self.severity, self.kind, self.message, self.location
        )?;
        if !self.context.is_empty() {
            write!(f, ", context={:?}", self.context)?;
        }
        write!(f, ")")
    }
}

/// Trait for observing violations.
///
/// Implement this trait to create custom observers that can react to
/// violations in various ways (logging, metrics, alerting, etc.).
///
/// # Example
///
/// ```
/// use prime_shuffle::telemetry::{ViolationObserver, SpecViolation};
///
/// struct MetricsObserver;
///
/// impl ViolationObserver for MetricsObserver {
///     fn on_violation(&self, violation: &SpecViolation) {
///         println!("Violation: {}", violation);
///     }
/// }
/// ```
pub trait ViolationObserver: Send + Sync {
    /// Called when a violation is detected.
    ///
    /// This method should be quick to execute, as it may be called from
    /// inside a draw.
    fn on_violation(&self, violation: &SpecViolation);
}

/// Built-in observer that logs violations via the `tracing` crate.
///
/// # Log Levels
///
/// - `Warning` severity → `tracing::warn!`
/// - `Error` and `Critical` severity → `tracing::error!`
///
/// All fields are output as structured tracing fields (`severity`, `kind`,
/// `location`, `context`), which works with JSON logging formatters.
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl TracingObserver {
    /// Creates a new tracing observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ViolationObserver for TracingObserver {
    fn on_violation(&self, violation: &SpecViolation) {
        let severity = violation.severity.as_str();
        let kind = violation.kind.as_str();
        let location = violation.location;

        let context_str = if violation.context.is_empty() {
            "{}".to_string()
        } else {
            let pairs: Vec<String> = violation
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        };

        match violation.severity {
            ViolationSeverity::Warning => {
                tracing::warn!(
                    severity,
                    kind,
                    location,
                    context = %context_str,
                    "{}",
                    violation.message
                );
            },
            ViolationSeverity::Error | ViolationSeverity::Critical => {
                tracing::error!(
                    severity,
                    kind,
                    location,
                    context = %context_str,
                    "{}",
                    violation.message
                );
            },
        }
    }
}

/// Built-in observer that collects violations for testing.
///
/// # Example
///
/// ```
/// use prime_shuffle::telemetry::{CollectingObserver, ViolationKind, ViolationObserver, SpecViolation, ViolationSeverity};
///
/// let observer = CollectingObserver::new();
///
/// observer.on_violation(&SpecViolation::new(
///     ViolationSeverity::Warning,
///     ViolationKind::Domain,
///     "test violation",
///     "test.rs:1",
/// ));
///
/// assert_eq!(observer.violations().len(), 1);
/// assert!(observer.has_violation(ViolationKind::Domain));
/// ```
#[derive(Debug, Default)]
pub struct CollectingObserver {
    violations: Mutex<Vec<SpecViolation>>,
}

impl CollectingObserver {
    /// Creates a new collecting observer with an empty violation list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            violations: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of all collected violations.
    #[must_use]
    pub fn violations(&self) -> Vec<SpecViolation> {
        self.violations.lock().clone()
    }

    /// Returns the number of collected violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.lock().len()
    }

    /// Returns true if no violations have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.lock().is_empty()
    }

    /// Checks if any violation of the specified kind has been collected.
    #[must_use]
    pub fn has_violation(&self, kind: ViolationKind) -> bool {
        self.violations.lock().iter().any(|v| v.kind == kind)
    }

    /// Returns all violations matching the specified kind.
    #[must_use]
    pub fn violations_of_kind(&self, kind: ViolationKind) -> Vec<SpecViolation> {
        self.violations
            .lock()
            .iter()
            .filter(|v| v.kind == kind)
            .cloned()
            .collect()
    }

    /// Clears all collected violations.
    pub fn clear(&self) {
        self.violations.lock().clear();
    }
}

impl ViolationObserver for CollectingObserver {
    fn on_violation(&self, violation: &SpecViolation) {
        self.violations.lock().push(violation.clone());
    }
}

/// Macro for reporting violations with location tracking to the default
/// [`TracingObserver`].
///
/// # Syntax
///
/// ```text
/// report_violation!(severity, kind, "message");
/// report_violation!(severity, kind, "message with {}", format_args);
/// ```
#[macro_export]
macro_rules! report_violation {
    ($severity:expr, $kind:expr, $msg:literal) => {{
        use $crate::telemetry::ViolationObserver as _;
        let violation = $crate::telemetry::SpecViolation::new(
            $severity,
            $kind,
            $msg,
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::TracingObserver.on_violation(&violation);
    }};

    ($severity:expr, $kind:expr, $fmt:literal, $($arg:tt)+) => {{
        use $crate::telemetry::ViolationObserver as _;
        let violation = $crate::telemetry::SpecViolation::new(
            $severity,
            $kind,
            format!($fmt, $($arg)+),
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::TracingObserver.on_violation(&violation);
    }};
}

/// Asserts that no violations have been collected.
///
/// # Panics
///
/// Panics if the observer contains any violations, printing them for debugging.
#[macro_export]
macro_rules! assert_no_violations {
    ($observer:expr) => {{
        let violations = $observer.violations();
        assert!(
            violations.is_empty(),
            "Expected no violations, but found {}:\n{:#?}",
            violations.len(),
            violations
        );
    }};
}

/// Asserts that a violation of the specified kind was collected.
///
/// # Panics
///
/// Panics if no violation of the specified kind was found.
#[macro_export]
macro_rules! assert_violation {
    ($observer:expr, $kind:expr) => {{
        assert!(
            $observer.has_violation($kind),
            "Expected violation of kind {:?}, but found: {:#?}",
            $kind,
            $observer.violations()
        );
    }};
}

/// Reports a violation to an optional observer, falling back to [`TracingObserver`] if `None`.
///
/// # Example
///
/// ```
/// use prime_shuffle::telemetry::{
///     report_to_observer, CollectingObserver, SpecViolation, ViolationKind, ViolationSeverity
/// };
/// use std::sync::Arc;
///
/// let observer = Arc::new(CollectingObserver::new());
/// let violation = SpecViolation::new(
///     ViolationSeverity::Warning,
///     ViolationKind::Walk,
///     "test message",
///     "test.rs:1",
/// );
///
/// report_to_observer(Some(&observer), &violation);
/// assert_eq!(observer.len(), 1);
///
/// // With no observer the violation goes to tracing
/// report_to_observer(None::<&Arc<CollectingObserver>>, &violation);
/// ```
pub fn report_to_observer<O: ViolationObserver + ?Sized>(
    observer: Option<&Arc<O>>,
    violation: &SpecViolation,
) {
    match observer {
        Some(obs) => obs.on_violation(violation),
        None => TracingObserver.on_violation(violation),
    }
}

/// Macro for reporting violations through a generator's observer.
///
/// Like [`report_violation!`], but takes an `Option<Arc<dyn ViolationObserver>>`
/// and falls back to [`TracingObserver`] when it is `None`.
///
/// # Syntax
///
/// ```text
/// report_violation_to!(observer, severity, kind, "message");
/// report_violation_to!(observer, severity, kind, "message with {}", format_args);
/// ```
#[macro_export]
macro_rules! report_violation_to {
    ($observer:expr, $severity:expr, $kind:expr, $msg:literal) => {{
        let violation = $crate::telemetry::SpecViolation::new(
            $severity,
            $kind,
            $msg,
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::report_to_observer($observer.as_ref(), &violation);
    }};

    ($observer:expr, $severity:expr, $kind:expr, $fmt:literal, $($arg:tt)+) => {{
        let violation = $crate::telemetry::SpecViolation::new(
            $severity,
            $kind,
            format!($fmt, $($arg)+),
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::report_to_observer($observer.as_ref(), &violation);
    }};
}

// ==========================================
// Runtime Invariant Checking
// ==========================================

/// Result of an invariant check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvariantViolation {
    /// Name of the type whose invariant was violated.
    pub type_name: &'static str,
    /// Description of the violated invariant.
    pub invariant: String,
    /// Additional diagnostic context.
    pub details: Option<String>,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    #[must_use]
    pub fn new(type_name: &'static str, invariant: impl Into<String>) -> Self {
        Self {
            type_name,
            invariant: invariant.into(),
            details: None,
        }
    }

    /// Adds additional details to the violation.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Serializes this violation to a JSON string.
    #[cfg(feature = "json")]
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.type_name, self.invariant)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Trait for types that maintain internal invariants.
///
/// Types implementing this trait can have their invariants checked at runtime
/// during debug builds or when the `paranoid` feature is enabled.
pub trait InvariantChecker {
    /// Checks that all invariants of this type are satisfied.
    ///
    /// Returns `Ok(())` if all invariants hold, or an `InvariantViolation`
    /// describing the first broken invariant.
    fn check_invariants(&self) -> Result<(), InvariantViolation>;
}

/// Macro for conditionally checking invariants in debug builds.
///
/// Expands to an invariant check in debug builds but compiles to nothing in
/// release builds, unless the `paranoid` feature is enabled.
#[macro_export]
#[cfg(any(debug_assertions, feature = "paranoid"))]
macro_rules! debug_check_invariants {
    ($expr:expr) => {{
        use $crate::telemetry::InvariantChecker as _;
        if let Err(violation) = $expr.check_invariants() {
            $crate::report_violation!(
                $crate::telemetry::ViolationSeverity::Critical,
                $crate::telemetry::ViolationKind::Invariant,
                "{}",
                violation
            );
        }
    }};

    ($expr:expr, $context:expr) => {{
        use $crate::telemetry::InvariantChecker as _;
        if let Err(violation) = $expr.check_invariants() {
            $crate::report_violation!(
                $crate::telemetry::ViolationSeverity::Critical,
                $crate::telemetry::ViolationKind::Invariant,
                "{} [context: {}]",
                violation,
                $context
            );
        }
    }};
}

/// No-op version for release builds without `paranoid` feature.
#[macro_export]
#[cfg(not(any(debug_assertions, feature = "paranoid")))]
macro_rules! debug_check_invariants {
    ($expr:expr) => {{}};
    ($expr:expr, $context:expr) => {{}};
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
    fn test_violation_severity_ordering() {
        assert!(ViolationSeverity::Warning < ViolationSeverity::Error);
        assert!(ViolationSeverity::Error < ViolationSeverity::Critical);
    }

    #[test]
    fn test_violation_kind_as_str() {
        assert_eq!(ViolationKind::Configuration.as_str(), "configuration");
        assert_eq!(ViolationKind::Domain.as_str(), "domain");
        assert_eq!(ViolationKind::Walk.as_str(), "walk");
        assert_eq!(ViolationKind::InternalError.as_str(), "internal_error");
        assert_eq!(ViolationKind::Invariant.as_str(), "invariant");
    }

    #[test]
    fn test_spec_violation_display() {
        let violation = SpecViolation::new(
            ViolationSeverity::Error,
            ViolationKind::Walk,
            "padding leaked",
            "test.rs:10",
        )
        .with_context("raw", "12");

        let display = violation.to_string();
        assert!(display.contains("error"));
        assert!(display.contains("walk"));
        assert!(display.contains("padding leaked"));
        assert!(display.contains("test.rs:10"));
        assert!(display.contains("raw"));
    }

    #[test]
    fn test_collecting_observer() {
        let observer = CollectingObserver::new();
        assert!(observer.is_empty());

        observer.on_violation(&SpecViolation::new(
            ViolationSeverity::Warning,
            ViolationKind::Domain,
            "first",
            "test.rs:1",
        ));
        observer.on_violation(&SpecViolation::new(
            ViolationSeverity::Critical,
            ViolationKind::Invariant,
            "second",
            "test.rs:2",
        ));

        assert_eq!(observer.len(), 2);
        assert!(observer.has_violation(ViolationKind::Domain));
        assert!(!observer.has_violation(ViolationKind::Walk));
        assert_eq!(observer.violations_of_kind(ViolationKind::Invariant).len(), 1);

        observer.clear();
        assert_no_violations!(observer);
    }

    #[test]
    fn test_report_violation_to_routes_to_observer() {
        let collecting = Arc::new(CollectingObserver::new());
        let observer: Option<Arc<dyn ViolationObserver>> = Some(collecting.clone());

        report_violation_to!(
            &observer,
            ViolationSeverity::Warning,
            ViolationKind::Domain,
            "step {} shares a factor with size {}",
            3,
            9
        );

        assert_violation!(collecting, ViolationKind::Domain);
        let violation = &collecting.violations()[0];
        assert_eq!(violation.message, "step 3 shares a factor with size 9");
        assert!(violation.location.contains("telemetry.rs"));
    }

    #[test]
    fn test_report_violation_to_none_falls_back_to_tracing() {
        let observer: Option<Arc<dyn ViolationObserver>> = None;
        report_violation_to!(
            &observer,
            ViolationSeverity::Error,
            ViolationKind::Walk,
            "logged only"
        );
    }

    #[test]
    fn test_invariant_violation_display() {
        let violation =
            InvariantViolation::new("Walker", "cursor outside domain").with_details("forward=9");
        assert_eq!(
            violation.to_string(),
            "Walker: cursor outside domain (forward=9)"
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_spec_violation_to_json() {
        let violation = SpecViolation::new(
            ViolationSeverity::Warning,
            ViolationKind::Domain,
            "grow",
            "test.rs:1",
        );
        let json = violation.to_json().unwrap();
        assert!(json.contains(r#""severity":"warning""#));
        assert!(json.contains(r#""kind":"domain""#));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_spec_violation_to_json_pretty() {
        let violation = SpecViolation::new(
            ViolationSeverity::Critical,
            ViolationKind::Invariant,
            "duplicate value",
            "test.rs:2",
        )
        .with_context("value", "7");
        let pretty = violation.to_json_pretty().unwrap();
        assert!(pretty.contains('\n'));
        assert!(pretty.contains(r#""severity": "critical""#));
        assert!(pretty.contains(r#""value": "7""#));

        let compact: serde_json::Value =
            serde_json::from_str(&violation.to_json().unwrap()).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(compact, reparsed);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_invariant_violation_to_json() {
        let violation =
            InvariantViolation::new("Walker", "cursor outside domain").with_details("forward=9");
        let json = violation.to_json().unwrap();
        assert!(json.contains(r#""type_name":"Walker""#));
        assert!(json.contains(r#""invariant":"cursor outside domain""#));
        assert!(json.contains(r#""details":"forward=9""#));

        let bare = InvariantViolation::new("Domain", "size not prime").to_json().unwrap();
        assert!(bare.contains(r#""details":null"#));
    }
}
