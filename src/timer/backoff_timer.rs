//! # BackoffTimer: a periodic timer whose interval grows after every firing.
//!
//! The interval starts at [`BackoffPolicy::initial`] and is multiplied by
//! [`BackoffPolicy::factor`] on every natural firing, saturating at
//! [`BackoffPolicy::max`]. Owners call [`reset`](BackoffTimer::reset) after a
//! successful operation to return to fast polling.
//!
//! ## Rules
//! - The first firing happens `initial` after `start()`; growth is applied at
//!   firing time, so the waits are `initial, initial×f, initial×f², …`.
//! - `start`/`stop` are idempotent; `reset` always restarts.
//! - Subscribers run sequentially on the driver task and never overlap an
//!   in-flight `start`/`stop`/`reset` (shared fire lock).
//! - Subscriber failures are published on [`events`](BackoffTimer::events) as
//!   [`Error::SubscriberCallbackFailed`]; the timer keeps running.
//! - After disposal every control method fails with [`Error::ObjectDisposed`].
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tickguard::{BackoffTimer, SafeDisposable, Tick, TickFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), tickguard::Error> {
//!     let timer = BackoffTimer::new(Duration::from_millis(10), 2.0)?;
//!     timer.subscribe(TickFn::arc("retry", |tick: &Tick| {
//!         println!("attempt #{} (next in {:?})", tick.fired, tick.next);
//!         Ok(())
//!     }))?;
//!
//!     timer.start()?;
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     timer.reset()?;
//!     timer.dispose_async().await?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::config::TimerConfig;
use crate::dispose::{Disposal, DisposeState, SafeDisposable};
use crate::error::{BoxError, Error};
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::timer::driver::Shared;
use crate::timer::tick::{OnTick, SubscriptionId};

/// Periodic timer with multiplicative backoff.
///
/// Not `Clone`: dropping the handle disposes the timer. Share it through an `Arc`.
pub struct BackoffTimer {
    shared: Arc<Shared>,
    runtime: Option<Handle>,
    state: DisposeState,
}

impl BackoffTimer {
    /// Creates a stopped timer with the given initial interval and growth factor.
    ///
    /// Fails with [`Error::InvalidArgument`] if `initial` is zero or `factor`
    /// is below 1 (or not finite).
    pub fn new(initial: Duration, factor: f64) -> Result<Self, Error> {
        Self::with_config(TimerConfig::new(initial, factor))
    }

    /// Creates a stopped timer from a full configuration.
    pub fn with_config(cfg: TimerConfig) -> Result<Self, Error> {
        let cfg = cfg.validate()?;
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Ok(Self {
            shared: Arc::new(Shared::new(cfg.backoff, bus)),
            runtime: None,
            state: DisposeState::new(),
        })
    }

    /// Pins the runtime the driver is spawned on.
    ///
    /// Without it, `start` uses the runtime of the calling thread.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Starts firing after the current interval. No-op if already running.
    pub fn start(&self) -> Result<(), Error> {
        self.ensure_not_disposed()?;
        let _fire = self.shared.lock_fire();
        let mut sched = self.shared.schedule();
        self.ensure_not_disposed()?;

        if self.shared.start_locked(&mut sched, self.runtime.as_ref())? {
            let interval = sched.current;
            drop(sched);
            tracing::debug!(?interval, "backoff timer started");
            self.shared
                .bus
                .publish(Event::new(EventKind::Started).with_interval(interval));
        }
        Ok(())
    }

    /// Stops firing. No-op if already stopped.
    ///
    /// The current interval is kept; a later `start` continues from it.
    pub fn stop(&self) -> Result<(), Error> {
        self.ensure_not_disposed()?;
        let _fire = self.shared.lock_fire();
        let mut sched = self.shared.schedule();

        if self.shared.stop_locked(&mut sched) {
            drop(sched);
            tracing::debug!("backoff timer stopped");
            self.shared.bus.publish(Event::new(EventKind::Stopped));
        }
        Ok(())
    }

    /// Stops, rewinds the interval to `initial` and starts again.
    ///
    /// Restarts even if the timer was stopped.
    pub fn reset(&self) -> Result<(), Error> {
        self.ensure_not_disposed()?;
        let _fire = self.shared.lock_fire();
        let mut sched = self.shared.schedule();
        self.ensure_not_disposed()?;

        self.shared.stop_locked(&mut sched);
        sched.current = self.shared.policy.initial;
        self.shared.start_locked(&mut sched, self.runtime.as_ref())?;
        let interval = sched.current;
        drop(sched);

        tracing::debug!(?interval, "backoff timer reset");
        self.shared
            .bus
            .publish(Event::new(EventKind::Reset).with_interval(interval));
        Ok(())
    }

    /// Registers a tick subscriber; it runs after the ones registered before it.
    pub fn subscribe(&self, sub: Arc<dyn OnTick>) -> Result<SubscriptionId, Error> {
        self.ensure_not_disposed()?;
        let id = self.shared.subscribers.add(sub);

        // teardown may have cleared the list between the check and the add
        if let Err(e) = self.ensure_not_disposed() {
            self.shared.subscribers.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Removes a subscriber. Returns `false` if the id is unknown.
    ///
    /// Takes effect from the next firing if one is in progress.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.subscribers.remove(id)
    }

    /// Receiver for timer events, including subscriber failures.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Interval that will elapse before the next firing.
    pub fn current_interval(&self) -> Duration {
        self.shared.schedule().current
    }

    /// Interval the timer starts from and resets to.
    pub fn initial_interval(&self) -> Duration {
        self.shared.policy.initial
    }

    /// Growth factor applied at every firing.
    pub fn factor(&self) -> f64 {
        self.shared.policy.factor
    }

    /// The (validated) growth policy.
    pub fn policy(&self) -> BackoffPolicy {
        self.shared.policy
    }

    /// True while a driver is scheduled.
    pub fn is_running(&self) -> bool {
        self.shared.schedule().is_running()
    }

    /// Number of natural firings since construction.
    pub fn fired(&self) -> u64 {
        self.shared.fired()
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }
}

#[async_trait]
impl SafeDisposable for BackoffTimer {
    fn dispose_state(&self) -> &DisposeState {
        &self.state
    }

    fn object_name(&self) -> &'static str {
        "BackoffTimer"
    }

    /// Cancels the driver and drops every subscriber.
    async fn teardown(&self, disposal: Disposal) -> Result<(), BoxError> {
        {
            let _fire = self.shared.lock_fire();
            let mut sched = self.shared.schedule();
            self.shared.stop_locked(&mut sched);
        }
        self.shared.subscribers.clear();

        tracing::debug!(?disposal, fired = self.shared.fired(), "backoff timer disposed");
        self.shared.bus.publish(Event::new(EventKind::Disposed));
        Ok(())
    }
}

impl Drop for BackoffTimer {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl fmt::Debug for BackoffTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sched = self.shared.schedule();
        f.debug_struct("BackoffTimer")
            .field("policy", &self.shared.policy)
            .field("current", &sched.current)
            .field("running", &sched.is_running())
            .field("disposed", &self.state.is_disposed())
            .finish()
    }
}
