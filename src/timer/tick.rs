//! # Tick payload and subscriber contract.
//!
//! [`OnTick`] is the extension point owners implement to react to firings.
//! [`TickFn`] is the closure-backed implementation, mirroring how most owners
//! just want "call this on every tick".
//!
//! ## Contract
//! - Callbacks run **synchronously** on the timer's driver task, in subscription
//!   order, never overlapping each other.
//! - An `Err` or a panic is reported on the event bus and does not affect the
//!   other subscribers nor the schedule.
//! - Callbacks may call `start`/`stop`/`reset` on the timer that fired them.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::error::BoxError;

/// One firing, as seen by subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Wall-clock timestamp of the firing.
    pub at: SystemTime,
    /// Firing ordinal over the timer's lifetime (1-based, never reset).
    pub fired: u64,
    /// Nominal interval that elapsed before this firing.
    pub interval: Duration,
    /// Nominal interval until the next firing.
    pub next: Duration,
}

/// Opaque handle returned by [`BackoffTimer::subscribe`](crate::BackoffTimer::subscribe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

/// Contract for tick subscribers.
pub trait OnTick: Send + Sync + 'static {
    /// Handles one firing.
    fn on_tick(&self, tick: &Tick) -> Result<(), BoxError>;

    /// Human-readable name (for logs and failure events).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Function-backed tick subscriber.
///
/// ## Example
/// ```rust
/// use tickguard::{OnTick, Tick, TickFn};
///
/// let sub = TickFn::arc("poller", |tick: &Tick| {
///     println!("tick #{} after {:?}", tick.fired, tick.interval);
///     Ok(())
/// });
/// assert_eq!(sub.name(), "poller");
/// ```
pub struct TickFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TickFn<F>
where
    F: Fn(&Tick) -> Result<(), BoxError> + Send + Sync + 'static,
{
    /// Creates a new function-backed subscriber.
    ///
    /// Prefer [`TickFn::arc`] when passing it straight to `subscribe`.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the subscriber as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> OnTick for TickFn<F>
where
    F: Fn(&Tick) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn on_tick(&self, tick: &Tick) -> Result<(), BoxError> {
        (self.f)(tick)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
