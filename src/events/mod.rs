//! Timer events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** the timer uses
//! as its owner-visible reporting channel. Subscriber failures travel here as
//! typed [`Error`](crate::Error)s.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//! - `LogWriter` (feature `logging`) renders events through `tracing`
//!
//! ## Quick reference
//! - **Publishers**: `BackoffTimer` control methods, the timer driver, teardown.
//! - **Consumers**: whoever holds a receiver from `BackoffTimer::events()`.

mod bus;
mod event;
#[cfg(feature = "logging")]
mod log;

pub use bus::Bus;
pub use event::{Event, EventKind};
#[cfg(feature = "logging")]
pub use log::LogWriter;
