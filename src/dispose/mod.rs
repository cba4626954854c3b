//! # Exactly-once disposal.
//!
//! This module provides the teardown contract used by the timer and available to
//! any owner that needs "release once, no matter who asks":
//! - [`DisposeState`] atomic `LIVE → DISPOSED` flag (one compare-and-swap)
//! - [`SafeDisposable`] trait with blocking and suspending entry points
//! - [`Disposal`] whether teardown was explicit or triggered from `Drop`
//! - [`DisposeFn`] closure-backed implementation
//!
//! ## State machine
//! ```text
//!            dispose() / dispose_async() / finalize()
//!  Live ──────────────── CAS winner ──────────────► Disposed (terminal)
//!                            │
//!                            └─► teardown(disposal) runs once, on the winner
//! ```

mod disposable;
mod dispose_fn;
mod state;

pub use disposable::{Disposal, SafeDisposable};
pub use dispose_fn::DisposeFn;
pub use state::DisposeState;
