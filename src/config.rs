//! # Timer configuration.
//!
//! Provides [`TimerConfig`], the settings a [`BackoffTimer`](crate::BackoffTimer)
//! is built from.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by the bus
//! - `backoff.max = Duration::MAX` → interval grows until it is no longer representable

use std::time::Duration;

use crate::error::Error;
use crate::policies::{BackoffPolicy, JitterPolicy};

/// Configuration for a backoff timer.
///
/// ## Field semantics
/// - `backoff`: interval growth policy (initial / factor / max / jitter)
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimerConfig {
    /// Interval growth policy.
    pub backoff: BackoffPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl TimerConfig {
    /// Config with the two mandatory parameters, everything else defaulted.
    pub fn new(initial: Duration, factor: f64) -> Self {
        Self {
            backoff: BackoffPolicy {
                initial,
                factor,
                ..BackoffPolicy::default()
            },
            ..Self::default()
        }
    }

    /// Sets the interval ceiling.
    pub fn with_max(mut self, max: Duration) -> Self {
        self.backoff.max = max;
        self
    }

    /// Sets the jitter policy.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.backoff.jitter = jitter;
        self
    }

    /// Sets the event bus capacity.
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Validates the configuration, returning the normalized copy.
    pub fn validate(self) -> Result<Self, Error> {
        Ok(Self {
            backoff: self.backoff.validate()?,
            ..self
        })
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for TimerConfig {
    /// Default configuration:
    ///
    /// - `backoff = BackoffPolicy::default()` (1s, doubling, no ceiling, no jitter)
    /// - `bus_capacity = 64`
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            bus_capacity: 64,
        }
    }
}
