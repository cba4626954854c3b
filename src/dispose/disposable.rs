//! # Exactly-once teardown contract.
//!
//! [`SafeDisposable`] turns one teardown routine into a thread-safe, at-most-once
//! disposal with two entry points:
//!
//! - [`dispose`](SafeDisposable::dispose) blocks the calling thread while the
//!   winner runs the teardown;
//! - [`dispose_async`](SafeDisposable::dispose_async) suspends instead of blocking.
//!
//! Both race on the same [`DisposeState`]; only the compare-and-swap winner runs
//! the teardown, every other caller (on either entry point) returns at once.
//!
//! ## Rules
//! - The flag flips **before** teardown starts; `is_disposed()` is already true
//!   while the winner is still tearing down.
//! - A failing teardown is reported to the winner only, as [`Error::TeardownFailed`].
//!   The object stays disposed, teardown is never retried.
//! - [`finalize`](SafeDisposable::finalize) is meant for `Drop` impls: it runs the
//!   teardown with [`Disposal::Finalizer`] if nobody disposed explicitly.
//!
//! ## Blocking entry point inside async code
//! `dispose()` drives the teardown future with `futures::executor::block_on`.
//! If the teardown awaits something that only the current runtime thread can make
//! progress on, call `dispose_async()` instead.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use tickguard::{BoxError, Disposal, DisposeState, SafeDisposable};
//!
//! struct Connection {
//!     state: DisposeState,
//! }
//!
//! #[async_trait]
//! impl SafeDisposable for Connection {
//!     fn dispose_state(&self) -> &DisposeState {
//!         &self.state
//!     }
//!
//!     async fn teardown(&self, _disposal: Disposal) -> Result<(), BoxError> {
//!         // close sockets...
//!         Ok(())
//!     }
//! }
//!
//! let conn = Connection { state: DisposeState::new() };
//! conn.ensure_not_disposed().unwrap();
//! conn.dispose().unwrap();
//! assert!(conn.is_disposed());
//! assert!(conn.ensure_not_disposed().is_err());
//! ```

use async_trait::async_trait;

use crate::dispose::DisposeState;
use crate::error::{BoxError, Error};

/// How the teardown was triggered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposal {
    /// An owner called `dispose`/`dispose_async`: release everything.
    Explicit,
    /// The value is being dropped without explicit disposal: only do cleanup
    /// that completes without suspending.
    Finalizer,
}

/// Thread-safe, exactly-once disposal.
#[async_trait]
pub trait SafeDisposable: Send + Sync {
    /// The flag guarding the teardown.
    fn dispose_state(&self) -> &DisposeState;

    /// Releases the object's resources. Invoked at most once.
    async fn teardown(&self, disposal: Disposal) -> Result<(), BoxError>;

    /// Name used in [`Error::ObjectDisposed`] and [`Error::TeardownFailed`].
    fn object_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Disposes the object, blocking the winning caller until teardown completes.
    fn dispose(&self) -> Result<(), Error> {
        if !self.dispose_state().try_begin() {
            return Ok(());
        }
        futures::executor::block_on(self.teardown(Disposal::Explicit))
            .map_err(|e| teardown_failed(self.object_name(), e))
    }

    /// Disposes the object, suspending the winning caller until teardown completes.
    async fn dispose_async(&self) -> Result<(), Error> {
        if !self.dispose_state().try_begin() {
            return Ok(());
        }
        self.teardown(Disposal::Explicit)
            .await
            .map_err(|e| teardown_failed(self.object_name(), e))
    }

    /// Runs the finalizer teardown unless the object was already disposed.
    ///
    /// Failures cannot be propagated from `Drop`; they are logged.
    fn finalize(&self) {
        if !self.dispose_state().try_begin() {
            return;
        }
        if let Err(e) = futures::executor::block_on(self.teardown(Disposal::Finalizer)) {
            tracing::warn!(
                object = self.object_name(),
                error = %e,
                "finalizer teardown failed"
            );
        }
    }

    /// True once disposal has been requested.
    fn is_disposed(&self) -> bool {
        self.dispose_state().is_disposed()
    }

    /// Fails with [`Error::ObjectDisposed`] after disposal.
    fn ensure_not_disposed(&self) -> Result<(), Error> {
        self.dispose_state().ensure_live(self.object_name())
    }
}

fn teardown_failed(object: &'static str, e: BoxError) -> Error {
    Error::TeardownFailed {
        object,
        reason: e.to_string(),
    }
}
