//! # Closure-backed disposable (`DisposeFn`)
//!
//! [`DisposeFn`] wraps a `FnOnce` teardown closure. The closure runs exactly once:
//! on the first `dispose`/`dispose_async`, or on drop if nobody disposed explicitly.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tickguard::{DisposeFn, SafeDisposable};
//!
//! let closed = Arc::new(AtomicUsize::new(0));
//! let c = Arc::clone(&closed);
//! let guard = DisposeFn::new("socket", move |_disposal| {
//!     c.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! guard.dispose().unwrap();
//! guard.dispose().unwrap();
//! drop(guard);
//! assert_eq!(closed.load(Ordering::SeqCst), 1);
//! ```

use std::borrow::Cow;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::dispose::{Disposal, DisposeState, SafeDisposable};
use crate::error::BoxError;

/// Function-backed disposable.
pub struct DisposeFn<F>
where
    F: FnOnce(Disposal) -> Result<(), BoxError> + Send + 'static,
{
    name: Cow<'static, str>,
    state: DisposeState,
    f: Mutex<Option<F>>,
}

impl<F> DisposeFn<F>
where
    F: FnOnce(Disposal) -> Result<(), BoxError> + Send + 'static,
{
    /// Creates a live disposable around `f`.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            state: DisposeState::new(),
            f: Mutex::new(Some(f)),
        }
    }

    /// Human-readable name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<F> SafeDisposable for DisposeFn<F>
where
    F: FnOnce(Disposal) -> Result<(), BoxError> + Send + 'static,
{
    fn dispose_state(&self) -> &DisposeState {
        &self.state
    }

    fn object_name(&self) -> &'static str {
        "DisposeFn"
    }

    async fn teardown(&self, disposal: Disposal) -> Result<(), BoxError> {
        let f = self
            .f
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match f {
            Some(f) => {
                tracing::debug!(name = %self.name, ?disposal, "running teardown");
                f(disposal)
            }
            None => Ok(()),
        }
    }
}

impl<F> Drop for DisposeFn<F>
where
    F: FnOnce(Disposal) -> Result<(), BoxError> + Send + 'static,
{
    fn drop(&mut self) {
        self.finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(
        counter: &Arc<AtomicUsize>,
        seen: &Arc<Mutex<Vec<Disposal>>>,
    ) -> DisposeFn<impl FnOnce(Disposal) -> Result<(), BoxError> + Send + 'static> {
        let c = Arc::clone(counter);
        let s = Arc::clone(seen);
        DisposeFn::new("counter", move |disposal| {
            c.fetch_add(1, Ordering::SeqCst);
            s.lock().unwrap().push(disposal);
            Ok(())
        })
    }

    #[test]
    fn fifty_threads_run_closure_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let guard = counting(&counter, &seen);

        std::thread::scope(|s| {
            for _ in 0..50 {
                s.spawn(|| guard.dispose().unwrap());
            }
        });

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(guard.is_disposed());
        drop(guard);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![Disposal::Explicit]);
    }

    #[test]
    fn drop_without_dispose_finalizes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        drop(counting(&counter, &seen));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![Disposal::Finalizer]);
    }

    #[test]
    fn closure_error_becomes_teardown_failed() {
        let guard = DisposeFn::new("flaky", |_| Err("busy".into()));
        let err = guard.dispose().unwrap_err();
        assert_eq!(err.as_label(), "teardown_failed");
        assert!(err.to_string().contains("busy"));
        assert_eq!(guard.name(), "flaky");
    }

    #[tokio::test]
    async fn dispose_async_then_guard_fails() {
        let guard = DisposeFn::new("conn", |_| Ok(()));
        assert!(guard.ensure_not_disposed().is_ok());
        guard.dispose_async().await.unwrap();
        assert!(guard.ensure_not_disposed().is_err());
    }
}
