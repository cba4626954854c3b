//! # Jitter policy for timer waits.
//!
//! [`JitterPolicy`] adds randomness to the wait slept before each firing so that
//! many timers started together do not fire in lockstep.
//!
//! Jitter is strictly **additive**: the wait is never shorter than the nominal
//! interval, so a firing never comes early. The extra delay is capped by the
//! policy ceiling (but never below the nominal interval).
//!
//! - [`JitterPolicy::None`] no randomization, predictable waits
//! - [`JitterPolicy::Full`] wait = interval + random[0, interval]
//! - [`JitterPolicy::Equal`] wait = interval + random[0, interval/2]
//! - [`JitterPolicy::Decorrelated`] wait = interval + random[0, interval × 2]
//!
//! Extra delay is randomized at millisecond granularity.

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of timer waits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: sleep exactly the nominal interval.
    #[default]
    None,

    /// Full jitter: wait in [interval, interval × 2].
    Full,

    /// Equal jitter: wait in [interval, interval × 1.5].
    ///
    /// Adds ~25% of the nominal interval on average.
    Equal,

    /// Decorrelated jitter: wait in [interval, interval × 3].
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to the nominal `wait`, capped at `ceiling`.
    ///
    /// The result is always `>= wait`, whatever the ceiling.
    pub fn apply(&self, wait: Duration, ceiling: Duration) -> Duration {
        let ms = millis(wait);
        let spread = match self {
            JitterPolicy::None => return wait,
            JitterPolicy::Full => ms,
            JitterPolicy::Equal => ms / 2,
            JitterPolicy::Decorrelated => ms.saturating_mul(2),
        };
        if spread == 0 {
            return wait;
        }
        let extra = Duration::from_millis(rand::rng().random_range(0..=spread));
        wait.saturating_add(extra).min(ceiling.max(wait))
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
