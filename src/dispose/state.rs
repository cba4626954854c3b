//! # Atomic dispose flag.
//!
//! [`DisposeState`] is the only piece of shared state the dispose contract needs:
//! a single byte flipped from `LIVE` to `DISPOSED` with one compare-and-swap.
//! Whoever wins the swap owns the teardown; everybody else observes "disposed".
//!
//! ```text
//! LIVE ──try_begin() (CAS winner)──► DISPOSED   (terminal, no way back)
//!                     (CAS losers) ──► return immediately
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::Error;

const LIVE: u8 = 0;
const DISPOSED: u8 = 1;

/// Exactly-once transition flag.
#[derive(Debug, Default)]
pub struct DisposeState {
    state: AtomicU8,
}

impl DisposeState {
    /// Creates a live flag.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(LIVE),
        }
    }

    /// Attempts the `LIVE → DISPOSED` transition.
    ///
    /// Returns `true` for exactly one caller over the lifetime of the flag.
    #[inline]
    pub fn try_begin(&self) -> bool {
        self.state
            .compare_exchange(LIVE, DISPOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// True once any caller has won [`try_begin`](Self::try_begin).
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.state.load(Ordering::Acquire) == DISPOSED
    }

    /// Fails with [`Error::ObjectDisposed`] after the transition.
    #[inline]
    pub fn ensure_live(&self, object: &'static str) -> Result<(), Error> {
        if self.is_disposed() {
            Err(Error::ObjectDisposed { object })
        } else {
            Ok(())
        }
    }
}
