//! # Simple logging listener for debugging and demos.
//!
//! [`LogWriter`] renders bus events through `tracing` in a terse, human-readable format.
//!
//! ## Output format
//! ```text
//! [started] interval=1s
//! [fired] n=1 interval=1s next=2s
//! [subscriber-failed] subscriber=poller err="connection refused"
//! [reset] interval=1s
//! [stopped]
//! [disposed]
//! ```
//!
//! ## Example
//! ```no_run
//! # use std::time::Duration;
//! # use tickguard::{BackoffTimer, LogWriter};
//! # async fn demo() -> Result<(), tickguard::Error> {
//! let timer = BackoffTimer::new(Duration::from_secs(1), 2.0)?;
//! LogWriter.spawn(timer.events());
//! timer.start()?;
//! # Ok(()) }
//! ```

use tokio::{sync::broadcast, task::JoinHandle};

use crate::events::{Event, EventKind};

/// Logging listener for timer events.
///
/// Enabled via the `logging` feature. Not intended as a production sink;
/// consume [`BackoffTimer::events`](crate::BackoffTimer::events) directly for that.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Writes a single event.
    pub fn write(&self, e: &Event) {
        match e.kind {
            EventKind::Started => tracing::info!("[started] interval={:?}", e.interval),
            EventKind::Stopped => tracing::info!("[stopped]"),
            EventKind::Reset => tracing::info!("[reset] interval={:?}", e.interval),
            EventKind::Fired => tracing::info!(
                "[fired] n={:?} interval={:?} next={:?}",
                e.fired,
                e.interval,
                e.next
            ),
            EventKind::SubscriberFailed | EventKind::SubscriberPanicked => tracing::warn!(
                "[subscriber-failed] subscriber={:?} err={:?}",
                e.subscriber,
                e.error.as_ref().map(|err| err.as_message())
            ),
            EventKind::Disposed => tracing::info!("[disposed]"),
        }
    }

    /// Drains `rx` on a background task until the bus closes.
    pub fn spawn(self, mut rx: broadcast::Receiver<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => self.write(&ev),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("[log-writer] lagged, skipped {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
