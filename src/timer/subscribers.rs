//! # Ordered tick subscriber list with failure isolation.
//!
//! [`TickSubscribers`] keeps subscribers in registration order and invokes them
//! one after another for each firing.
//!
//! ## Rules
//! - **Snapshot per firing**: `notify` clones the `Arc`s under a read lock and
//!   releases the lock before calling out, so (un)subscribing from inside a
//!   callback is safe and takes effect on the next firing.
//! - **Isolation**: an `Err` or panic from one subscriber is published as a
//!   failure event; later subscribers still run.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock of its own.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::events::{Bus, Event};
use crate::timer::tick::{OnTick, SubscriptionId, Tick};

type Entry = (SubscriptionId, Arc<dyn OnTick>);

pub(crate) struct TickSubscribers {
    next_id: AtomicU64,
    entries: RwLock<Vec<Entry>>,
}

impl TickSubscribers {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, sub: Arc<dyn OnTick>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, sub));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter().position(|(eid, _)| *eid == id) {
            Some(pos) => {
                entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn snapshot(&self) -> Vec<Arc<dyn OnTick>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, sub)| Arc::clone(sub))
            .collect()
    }

    /// Invokes every subscriber in order; returns how many failed.
    pub(crate) fn notify(&self, tick: &Tick, bus: &Bus) -> usize {
        let mut failed = 0;
        for sub in self.snapshot() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| sub.on_tick(tick)));
            let (reason, panicked) = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => (e.to_string(), false),
                Err(payload) => (panic_message(payload.as_ref()), true),
            };
            failed += 1;
            tracing::warn!(
                subscriber = sub.name(),
                fired = tick.fired,
                panicked,
                error = %reason,
                "tick subscriber failed"
            );
            bus.publish(
                Event::subscriber_failed(sub.name().into(), reason, panicked).with_fired(tick.fired),
            );
        }
        failed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
