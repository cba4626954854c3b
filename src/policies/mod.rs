//! Interval policies.
//!
//! This module groups the knobs that control **how long** the timer waits
//! between firings.
//!
//! ## Contents
//! - [`BackoffPolicy`] how the interval evolves (initial / factor / max + jitter)
//! - [`JitterPolicy`]  randomization of each wait to avoid synchronized firings
//!
//! ## Quick wiring
//! ```text
//! TimerConfig { backoff: BackoffPolicy, .. }
//!      └─► timer::driver uses:
//!           - policy.wait_for(current) to compute the sleep
//!           - policy.grow(current) at every firing
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → initial=1s, factor=2.0, max=Duration::MAX, jitter=None.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
