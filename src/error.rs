//! Error types used by the backoff timer and the dispose contract.
//!
//! [`Error`] covers every failure the crate can surface:
//!
//! - construction-time parameter violations ([`Error::InvalidArgument`]);
//! - use of an object after its teardown ([`Error::ObjectDisposed`]);
//! - a tick subscriber that failed or panicked ([`Error::SubscriberCallbackFailed`]);
//! - a teardown routine that failed ([`Error::TeardownFailed`]);
//! - no tokio runtime to drive the timer ([`Error::NoRuntime`]).
//!
//! The enum is `Clone` so it can travel inside [`Event`](crate::Event)s on the bus.
//! Like the rest of the crate it offers `as_label`/`as_message` helpers for logs.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by user callbacks (tick subscribers, teardown routines).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by tickguard.
///
/// None of these are retried internally. Retrying is what the
/// [`BackoffTimer`](crate::BackoffTimer) is *for*, not something it does to itself.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A constructor received a parameter outside its valid range.
    #[error("invalid argument `{param}`: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter.
        param: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A guarded operation was invoked after the object was disposed.
    #[error("cannot access a disposed object: {object}")]
    ObjectDisposed {
        /// Type name of the disposed object.
        object: &'static str,
    },

    /// A tick subscriber returned an error or panicked during a firing.
    ///
    /// Reported on the event bus; the timer keeps running.
    #[error("tick subscriber '{subscriber}' failed: {reason}")]
    SubscriberCallbackFailed {
        /// Subscriber name.
        subscriber: Arc<str>,
        /// Error or panic message.
        reason: String,
    },

    /// The teardown routine failed. The object stays disposed.
    #[error("teardown of {object} failed: {reason}")]
    TeardownFailed {
        /// Type name of the object being disposed.
        object: &'static str,
        /// The underlying error message.
        reason: String,
    },

    /// `start` was called outside a tokio runtime and no handle was attached.
    #[error("no tokio runtime available to drive the timer")]
    NoRuntime,
}

impl Error {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickguard::Error;
    ///
    /// let err = Error::ObjectDisposed { object: "BackoffTimer" };
    /// assert_eq!(err.as_label(), "object_disposed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::InvalidArgument { .. } => "invalid_argument",
            Error::ObjectDisposed { .. } => "object_disposed",
            Error::SubscriberCallbackFailed { .. } => "subscriber_callback_failed",
            Error::TeardownFailed { .. } => "teardown_failed",
            Error::NoRuntime => "no_runtime",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            Error::InvalidArgument { param, reason } => format!("{param}: {reason}"),
            Error::ObjectDisposed { object } => format!("disposed: {object}"),
            Error::SubscriberCallbackFailed { subscriber, reason } => {
                format!("subscriber={subscriber} error={reason}")
            }
            Error::TeardownFailed { object, reason } => format!("teardown {object}: {reason}"),
            Error::NoRuntime => "no runtime".to_string(),
        }
    }

    pub(crate) fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            param,
            reason: reason.into(),
        }
    }
}
