//! # Interval growth policy for the backoff timer.
//!
//! [`BackoffPolicy`] controls how the timer interval evolves after every firing.
//! It is parameterized by:
//! - [`BackoffPolicy::initial`] the interval before the first firing;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the ceiling the interval saturates at;
//! - [`BackoffPolicy::jitter`] randomization of the *slept* wait only.
//!
//! Growth is applied step by step: `next = current × factor`, saturated at `max`.
//! Integral factors multiply the [`Duration`] exactly (nanosecond precision);
//! fractional factors go through `f64` seconds. Overflow never wraps and never
//! errors, it clamps.
//!
//! Jitter only ever lengthens the wait derived from `current` and is never fed
//! back, so the sequence of nominal intervals stays `initial × factor^n` and no
//! firing comes before its nominal interval.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use tickguard::{BackoffPolicy, JitterPolicy};
//!
//! let policy = BackoffPolicy {
//!     initial: Duration::from_secs(1),
//!     factor: 2.0,
//!     max: Duration::from_secs(10),
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(policy.grow(Duration::from_secs(1)), Duration::from_secs(2));
//! assert_eq!(policy.nth(3), Duration::from_secs(8));
//! // 1s × 2^4 = 16s → capped at max=10s
//! assert_eq!(policy.nth(4), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::error::Error;
use crate::policies::jitter::JitterPolicy;

/// Interval growth policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Interval before the first firing (and after every reset).
    pub initial: Duration,
    /// Multiplicative growth factor, finite and `>= 1.0`.
    pub factor: f64,
    /// Ceiling for the interval; `Duration::MAX` means "largest representable".
    pub max: Duration,
    /// Randomization applied to each wait.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `initial = 1s`;
    /// - `factor = 2.0` (doubling);
    /// - `max = Duration::MAX` (no ceiling other than representability);
    /// - `jitter = None`.
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::MAX,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy from the two mandatory parameters, other fields defaulted.
    ///
    /// Fails with [`Error::InvalidArgument`] when `initial` is zero or `factor`
    /// is below one or not finite.
    pub fn new(initial: Duration, factor: f64) -> Result<Self, Error> {
        Self {
            initial,
            factor,
            ..Self::default()
        }
        .validate()
    }

    /// Checks the parameters and returns the normalized policy.
    ///
    /// A `max` below `initial` is raised to `initial`, keeping
    /// `initial <= current <= max` satisfiable.
    pub fn validate(mut self) -> Result<Self, Error> {
        if self.initial.is_zero() {
            return Err(Error::invalid("initial", "interval must be positive"));
        }
        if !self.factor.is_finite() {
            return Err(Error::invalid(
                "factor",
                format!("must be finite, got {}", self.factor),
            ));
        }
        if self.factor < 1.0 {
            return Err(Error::invalid(
                "factor",
                format!("must be >= 1, got {}", self.factor),
            ));
        }
        self.max = self.max.max(self.initial);
        Ok(self)
    }

    /// Computes the interval that follows `current`.
    ///
    /// The result is saturated at [`BackoffPolicy::max`] and never drops below
    /// [`BackoffPolicy::initial`].
    pub fn grow(&self, current: Duration) -> Duration {
        let next = if self.factor.fract() == 0.0 && self.factor <= f64::from(u32::MAX) {
            current
                .checked_mul(self.factor as u32)
                .unwrap_or(Duration::MAX)
        } else {
            Duration::try_from_secs_f64(current.as_secs_f64() * self.factor)
                .unwrap_or(Duration::MAX)
        };
        next.min(self.max).max(self.initial)
    }

    /// Nominal interval after `n` firings: `initial × factor^n`, clamped.
    pub fn nth(&self, n: u32) -> Duration {
        let mut current = self.initial.min(self.max);
        for _ in 0..n {
            let next = self.grow(current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Returns the wait actually slept for the nominal interval `current`.
    ///
    /// Never shorter than `current`; extra jitter delay is capped at `max`.
    pub fn wait_for(&self, current: Duration) -> Duration {
        self.jitter.apply(current, self.max)
    }
}
