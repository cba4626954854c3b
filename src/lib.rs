//! # tickguard
//!
//! **tickguard** provides two small concurrency primitives for tokio services
//! that poll or retry something unreliable:
//!
//! - [`BackoffTimer`] fires on an interval that grows geometrically after every
//!   firing, until it is reset (back to fast polling) or stopped;
//! - [`SafeDisposable`] guarantees a teardown routine runs exactly once, no
//!   matter how many threads dispose concurrently or through which entry point.
//!
//! ## Architecture
//! ```text
//!      owner
//!        │ new(initial, factor) / start / stop / reset / subscribe
//!        ▼
//! ┌──────────────────────────────┐ spawn  ┌────────────────────────────┐
//! │ BackoffTimer                 │───────►│ driver (tokio task)        │
//! │ - Schedule {current, token}  │        │ sleep_until(deadline)      │
//! │ - TickSubscribers (ordered)  │◄───────│ fire(): grow, reschedule,  │
//! │ - Bus (broadcast events)     │  lock  │         notify subscribers │
//! │ - DisposeState (CAS flag)    │        └─────────────┬──────────────┘
//! └──────────────┬───────────────┘                      │
//!                │ dispose / dispose_async / Drop       ▼
//!                ▼                           Event {Fired, SubscriberFailed, ...}
//!        teardown (exactly once)                        │
//!                                                       ▼
//!                                             owner's event receiver
//! ```
//!
//! ## Features
//! | Area              | Description                                           | Key types / traits                        |
//! |-------------------|-------------------------------------------------------|-------------------------------------------|
//! | **Timer**         | Geometric-backoff periodic firing with reset/stop.    | [`BackoffTimer`], [`Tick`]                |
//! | **Subscribers**   | Ordered tick callbacks with failure isolation.        | [`OnTick`], [`TickFn`]                    |
//! | **Policies**      | Growth factor, ceiling and jitter of the interval.    | [`BackoffPolicy`], [`JitterPolicy`]       |
//! | **Disposal**      | Exactly-once teardown, blocking or suspending.        | [`SafeDisposable`], [`DisposeFn`]         |
//! | **Events**        | Broadcast lifecycle events and subscriber failures.   | [`Event`], [`EventKind`]                  |
//! | **Errors**        | Typed errors for every failure the crate surfaces.    | [`Error`]                                 |
//! | **Configuration** | Centralized timer settings.                           | [`TimerConfig`]                           |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], which renders bus events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tickguard::{BackoffTimer, SafeDisposable, Tick, TickFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 10ms, 20ms, 40ms, ...
//!     let timer = BackoffTimer::new(Duration::from_millis(10), 2.0)?;
//!
//!     timer.subscribe(TickFn::arc("reconnect", |tick: &Tick| {
//!         println!("retry #{}; next attempt in {:?}", tick.fired, tick.next);
//!         Ok(())
//!     }))?;
//!
//!     timer.start()?;
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!
//!     // the operation succeeded: poll fast again
//!     timer.reset()?;
//!
//!     timer.dispose_async().await?;
//!     assert!(timer.start().is_err());
//!     Ok(())
//! }
//! ```
mod config;
mod dispose;
mod error;
mod events;
mod policies;
mod timer;

// ---- Public re-exports ----

pub use config::TimerConfig;
pub use dispose::{Disposal, DisposeFn, DisposeState, SafeDisposable};
pub use error::{BoxError, Error};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use timer::{BackoffTimer, OnTick, SubscriptionId, Tick, TickFn};

// Optional: expose a simple built-in logger (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use events::LogWriter;
