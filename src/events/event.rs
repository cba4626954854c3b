//! # Timer events published on the bus.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Control events**: the owner started, stopped or reset the timer
//! - **Firing events**: a natural firing and its interval bookkeeping
//! - **Failure/terminal events**: subscriber failures and disposal
//!
//! The [`Event`] struct carries the metadata (timestamps, intervals, subscriber
//! name, typed error) relevant to its kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tickguard::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::Fired)
//!     .with_interval(Duration::from_secs(1))
//!     .with_next(Duration::from_secs(2))
//!     .with_fired(1);
//!
//! assert_eq!(ev.kind, EventKind::Fired);
//! assert_eq!(ev.next, Some(Duration::from_secs(2)));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::Error;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of timer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Control events ===
    /// Timer transitioned from stopped to running.
    ///
    /// Sets:
    /// - `interval`: wait before the first firing of this run
    Started,

    /// Timer transitioned from running to stopped.
    Stopped,

    /// Interval was reset to its initial value (and the timer restarted).
    ///
    /// Sets:
    /// - `interval`: the initial interval
    Reset,

    // === Firing events ===
    /// Natural firing, published before subscribers are invoked.
    ///
    /// Sets:
    /// - `interval`: nominal interval that just elapsed
    /// - `next`: interval scheduled for the following firing
    /// - `fired`: firing ordinal (1-based, lifetime of the timer)
    Fired,

    // === Failure / terminal events ===
    /// A tick subscriber returned an error.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `error`: [`Error::SubscriberCallbackFailed`]
    /// - `fired`: firing ordinal
    SubscriberFailed,

    /// A tick subscriber panicked.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `error`: [`Error::SubscriberCallbackFailed`] with the panic message
    /// - `fired`: firing ordinal
    SubscriberPanicked,

    /// Teardown ran; the timer is permanently disposed.
    Disposed,
}

/// Timer event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Interval that elapsed (or will elapse for `Started`/`Reset`).
    pub interval: Option<Duration>,
    /// Interval scheduled for the next firing.
    pub next: Option<Duration>,
    /// Firing ordinal.
    pub fired: Option<u64>,
    /// Name of the subscriber, if applicable.
    pub subscriber: Option<Arc<str>>,
    /// Typed error for failure events.
    pub error: Option<Error>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            interval: None,
            next: None,
            fired: None,
            subscriber: None,
            error: None,
        }
    }

    /// Overrides the timestamp (firings use the instant the timer woke up).
    #[inline]
    pub fn with_at(mut self, at: SystemTime) -> Self {
        self.at = at;
        self
    }

    /// Attaches the elapsed (or upcoming) interval.
    #[inline]
    pub fn with_interval(mut self, d: Duration) -> Self {
        self.interval = Some(d);
        self
    }

    /// Attaches the next scheduled interval.
    #[inline]
    pub fn with_next(mut self, d: Duration) -> Self {
        self.next = Some(d);
        self
    }

    /// Attaches a firing ordinal.
    #[inline]
    pub fn with_fired(mut self, n: u64) -> Self {
        self.fired = Some(n);
        self
    }

    /// Attaches a subscriber name.
    #[inline]
    pub fn with_subscriber(mut self, name: impl Into<Arc<str>>) -> Self {
        self.subscriber = Some(name.into());
        self
    }

    /// Attaches a typed error.
    #[inline]
    pub fn with_error(mut self, err: Error) -> Self {
        self.error = Some(err);
        self
    }

    /// Creates a subscriber failure event.
    pub fn subscriber_failed(subscriber: Arc<str>, reason: String, panicked: bool) -> Self {
        let kind = if panicked {
            EventKind::SubscriberPanicked
        } else {
            EventKind::SubscriberFailed
        };
        Event::new(kind)
            .with_subscriber(Arc::clone(&subscriber))
            .with_error(Error::SubscriberCallbackFailed { subscriber, reason })
    }

    #[inline]
    pub fn is_subscriber_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberFailed | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::Started);
        let b = Event::new(EventKind::Stopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn subscriber_failure_carries_typed_error() {
        let ev = Event::subscriber_failed("poller".into(), "boom".into(), true);
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert!(ev.is_subscriber_failure());
        assert_eq!(ev.subscriber.as_deref(), Some("poller"));
        assert_eq!(
            ev.error,
            Some(Error::SubscriberCallbackFailed {
                subscriber: "poller".into(),
                reason: "boom".into(),
            })
        );
    }
}
