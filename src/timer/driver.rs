//! # Timer driver: the task that sleeps and fires.
//!
//! One driver runs per `start()` and owns a [`CancellationToken`]; `stop()`
//! cancels it. The firing step itself lives in [`Shared::fire`] and runs under
//! the fire lock shared with the control methods.
//!
//! ```text
//! start() ──► spawn run(token, deadline = now + wait_for(current))
//!
//! loop {
//!   ├─► sleep_until(deadline) | token.cancelled() → exit
//!   └─► fire(token)                                   (under fire lock)
//!         ├─ token cancelled meanwhile → exit (stop won the race)
//!         ├─ current = grow(current)
//!         ├─ deadline = now + wait_for(current)       (rescheduled before notify)
//!         ├─ publish Fired
//!         └─ notify subscribers in order
//! }
//! ```

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use tokio::runtime::Handle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::timer::subscribers::TickSubscribers;
use crate::timer::tick::Tick;

/// Stand-in deadline for waits that do not fit in an `Instant` (~30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

thread_local! {
    /// Identity of the timer whose subscribers are running on this thread.
    static FIRING: Cell<usize> = const { Cell::new(0) };
}

/// Marks the current thread as running a timer's callbacks.
struct FiringScope {
    prev: usize,
}

impl FiringScope {
    fn enter(id: usize) -> Self {
        Self {
            prev: FIRING.replace(id),
        }
    }
}

impl Drop for FiringScope {
    fn drop(&mut self) {
        FIRING.set(self.prev);
    }
}

/// Mutable schedule, guarded by `Shared::schedule`.
pub(crate) struct Schedule {
    pub(crate) current: Duration,
    /// Token of the live driver; `Some` means running.
    run: Option<CancellationToken>,
}

impl Schedule {
    pub(crate) fn is_running(&self) -> bool {
        self.run.is_some()
    }
}

/// State shared between the timer handle and its driver.
pub(crate) struct Shared {
    pub(crate) policy: BackoffPolicy,
    pub(crate) subscribers: TickSubscribers,
    pub(crate) bus: Bus,
    schedule: Mutex<Schedule>,
    fire_lock: Mutex<()>,
    fired: AtomicU64,
}

impl Shared {
    pub(crate) fn new(policy: BackoffPolicy, bus: Bus) -> Self {
        Self {
            schedule: Mutex::new(Schedule {
                current: policy.initial,
                run: None,
            }),
            policy,
            subscribers: TickSubscribers::new(),
            bus,
            fire_lock: Mutex::new(()),
            fired: AtomicU64::new(0),
        }
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    pub(crate) fn schedule(&self) -> MutexGuard<'_, Schedule> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serializes control calls against a firing.
    ///
    /// Returns `None` when called from one of this timer's own callbacks: the
    /// firing thread already holds the lock.
    pub(crate) fn lock_fire(&self) -> Option<MutexGuard<'_, ()>> {
        if FIRING.get() == self.id() {
            return None;
        }
        Some(self.fire_lock.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Spawns a driver unless one is already running. Returns `true` if it spawned.
    pub(crate) fn start_locked(
        self: &Arc<Self>,
        sched: &mut Schedule,
        runtime: Option<&Handle>,
    ) -> Result<bool, Error> {
        if sched.is_running() {
            return Ok(false);
        }
        let handle = match runtime {
            Some(h) => h.clone(),
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };
        let token = CancellationToken::new();
        let deadline = deadline_after(self.policy.wait_for(sched.current));
        handle.spawn(run(Arc::clone(self), token.clone(), deadline));
        sched.run = Some(token);
        Ok(true)
    }

    /// Cancels the live driver, if any. Returns `true` if it was running.
    pub(crate) fn stop_locked(&self, sched: &mut Schedule) -> bool {
        match sched.run.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// One firing. Returns the next deadline, or `None` if this driver is done.
    fn fire(&self, token: &CancellationToken) -> Option<Instant> {
        let _fire = self.fire_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let (interval, next) = {
            let mut sched = self.schedule();
            if token.is_cancelled() {
                return None;
            }
            let interval = sched.current;
            sched.current = self.policy.grow(interval);
            (interval, sched.current)
        };
        let deadline = deadline_after(self.policy.wait_for(next));
        let fired = self.fired.fetch_add(1, Ordering::Relaxed) + 1;
        let at = SystemTime::now();

        self.bus.publish(
            Event::new(EventKind::Fired)
                .with_at(at)
                .with_interval(interval)
                .with_next(next)
                .with_fired(fired),
        );

        let tick = Tick {
            at,
            fired,
            interval,
            next,
        };
        {
            let _scope = FiringScope::enter(self.id());
            self.subscribers.notify(&tick, &self.bus);
        }

        if token.is_cancelled() {
            None
        } else {
            Some(deadline)
        }
    }
}

/// Driver loop; exits when `token` is cancelled.
async fn run(shared: Arc<Shared>, token: CancellationToken, mut deadline: Instant) {
    loop {
        tokio::select! {
            _ = time::sleep_until(deadline) => {}
            _ = token.cancelled() => break,
        }
        match shared.fire(&token) {
            Some(next) => deadline = next,
            None => break,
        }
    }
    tracing::trace!(fired = shared.fired(), "backoff timer driver exited");
}

fn deadline_after(wait: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(wait).unwrap_or(now + FAR_FUTURE)
}
