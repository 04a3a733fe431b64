// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the diffmerge operator
//!
//! [`MergeError`] covers every way a sorted merge can terminate abnormally:
//! a source breaking the request/deliver protocol, a source failing, a
//! classification callback failing or panicking, and cancellation failures.
//! None of these are retried by the operator; retry belongs to the sources.
//!
//! # Examples
//!
//! ```
//! use diffmerge_core::{MergeError, Result};
//!
//! fn check_demand(n: u64) -> Result<u64> {
//!     if n == 0 {
//!         return Err(MergeError::protocol_violation("request(0) is not allowed"));
//!     }
//!     Ok(n)
//! }
//!
//! assert!(check_demand(0).unwrap_err().is_protocol_violation());
//! ```

/// Root error type for all merge operations
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A source or consumer broke the pull protocol
    ///
    /// Examples: a value delivered without an outstanding request, a second
    /// subscription to a subscribe-once source, or a request for zero items.
    /// Fatal, never retried.
    #[error("Protocol violation: {context}")]
    ProtocolViolation {
        /// What was violated and where
        context: String,
    },

    /// Stream processing encountered an error
    ///
    /// General upstream failure that doesn't fit a more specific variant.
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong during stream processing
        context: String,
    },

    /// Custom error from user code
    ///
    /// Wraps errors returned by fallible classification functions or raised
    /// by a source.
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A user-provided classification function panicked
    ///
    /// The panic is caught at the coordinator and forwarded downstream as this
    /// variant instead of unwinding through the caller's thread.
    #[error("User callback panicked: {context}")]
    CallbackPanic {
        /// Panic payload, when it was a string
        context: String,
    },

    /// Cancelling an upstream subscription failed
    #[error("Cancellation failed: {context}")]
    CancelFailed {
        /// Which subscription failed to cancel, and why
        context: String,
    },
}

impl MergeError {
    /// Create a protocol violation error with the given context
    pub fn protocol_violation(context: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            context: context.into(),
        }
    }

    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Create a cancellation failure with the given context
    pub fn cancel_failed(context: impl Into<String>) -> Self {
        Self::CancelFailed {
            context: context.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Build a [`MergeError::CallbackPanic`] from a caught panic payload.
    ///
    /// `&str` and `String` payloads are kept verbatim; anything else is
    /// reported as an opaque panic.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let context = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::CallbackPanic { context }
    }

    /// `true` if a source or consumer broke the pull protocol
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    /// Check if this error indicates a permanent failure
    ///
    /// Every merge error is terminal for the merge that raised it; this
    /// reports whether retrying the whole merge could plausibly succeed.
    /// Protocol violations and callback panics are programming errors.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::ProtocolViolation { .. } | Self::CallbackPanic { .. }
        )
    }
}

/// Specialized Result type for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;

/// Extension trait for converting errors into `MergeError`
///
/// Implemented for every `std::error::Error + Send + Sync + 'static`.
pub trait IntoMergeError {
    /// Convert this error into a `MergeError` with additional context
    fn into_merge_error(self, context: &str) -> MergeError;

    /// Convert this error into a `MergeError` without additional context
    fn into_merge(self) -> MergeError
    where
        Self: Sized,
    {
        self.into_merge_error("")
    }
}

impl<E: std::error::Error + Send + Sync + 'static> IntoMergeError for E {
    fn into_merge_error(self, context: &str) -> MergeError {
        if context.is_empty() {
            MergeError::user_error(self)
        } else {
            MergeError::stream_error(format!("{context}: {self}"))
        }
    }
}

/// Helper trait for adding context to `Result`s
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// # Errors
    /// Returns `Err(MergeError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// # Errors
    /// Returns `Err(MergeError)` if the underlying result is `Err`.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<MergeError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| attach_context(e.into(), context.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| attach_context(e.into(), f()))
    }
}

fn attach_context(error: MergeError, context: String) -> MergeError {
    match error {
        MergeError::UserError(inner) => MergeError::StreamProcessingError {
            context: format!("{context}: {inner}"),
        },
        MergeError::CancelFailed { context: inner } => MergeError::CancelFailed {
            context: format!("{context}: {inner}"),
        },
        other => other,
    }
}

impl Clone for MergeError {
    fn clone(&self) -> Self {
        match self {
            Self::ProtocolViolation { context } => Self::ProtocolViolation {
                context: context.clone(),
            },
            Self::StreamProcessingError { context } => Self::StreamProcessingError {
                context: context.clone(),
            },
            // Boxed errors can't be cloned, keep the message
            Self::UserError(e) => Self::StreamProcessingError {
                context: format!("User error: {e}"),
            },
            Self::CallbackPanic { context } => Self::CallbackPanic {
                context: context.clone(),
            },
            Self::CancelFailed { context } => Self::CancelFailed {
                context: context.clone(),
            },
        }
    }
}
