//! Error types used by the relay channel, its listeners and the service.
//!
//! This module defines three error enums:
//!
//! - [`ChannelError`] — a fault contained inside the channel (never returned to the producer).
//! - [`ServiceError`] — a rejected run-state transition.
//! - [`WorkError`] — failure reported by the service's background worker.
//!
//! All of them provide `as_label` / `as_message` helpers for logs.

use std::borrow::Cow;

use thiserror::Error;

use crate::service::RunState;

/// # Faults contained by the event channel.
///
/// These never cross the channel boundary: they are logged and, when
/// [`Config::report_faults`](crate::Config::report_faults) is enabled, turned into an
/// `Error` event for the other listeners.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// A listener panicked while handling an event.
    #[error("listener '{listener}' failed: {info}")]
    ListenerFault {
        /// Name of the failing listener.
        listener: &'static str,
        /// Panic payload rendered as text.
        info: String,
    },
}

impl ChannelError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use logrelay::ChannelError;
    ///
    /// let err = ChannelError::ListenerFault { listener: "view", info: "boom".into() };
    /// assert_eq!(err.as_label(), "listener_fault");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ChannelError::ListenerFault { .. } => "listener_fault",
        }
    }

    /// Returns a human-readable message with details about the fault.
    pub fn as_message(&self) -> String {
        match self {
            ChannelError::ListenerFault { listener, info } => {
                format!("listener={listener} panicked: {info}")
            }
        }
    }
}

/// # Errors produced by the service's run-state toggle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    /// Redundant transition (start while running, stop while stopped).
    ///
    /// Only returned when [`Config::strict_transitions`](crate::Config::strict_transitions)
    /// is set; otherwise the call is a no-op.
    #[error("invalid state transition: already {from:?}, requested {to:?}")]
    InvalidStateTransition {
        /// State at the time of the call.
        from: RunState,
        /// State that was requested.
        to: RunState,
    },
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::InvalidStateTransition { .. } => "service_invalid_transition",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServiceError::InvalidStateTransition { from, to } => {
                format!("no effect: {from:?} -> {to:?}")
            }
        }
    }
}

/// # Errors produced by the background worker.
///
/// The service reports a failed worker through
/// [`EventChannel::emit_error`](crate::EventChannel::emit_error), using the error
/// chain as stack frames.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkError {
    /// Worker failed with a plain message.
    #[error("work failed: {error}")]
    Fail {
        /// The underlying error message.
        error: Cow<'static, str>,
    },

    /// Worker failed with an underlying error.
    #[error("work failed")]
    Source {
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl WorkError {
    /// Builds a [`WorkError::Fail`] from a message.
    pub fn fail(error: impl Into<Cow<'static, str>>) -> Self {
        WorkError::Fail {
            error: error.into(),
        }
    }

    /// Wraps any error as [`WorkError::Source`].
    pub fn from_source(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        WorkError::Source {
            source: Box::new(source),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Fail { .. } => "work_failed",
            WorkError::Source { .. } => "work_failed_source",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkError::Fail { error } => format!("error: {error}"),
            WorkError::Source { source } => format!("error: {source}"),
        }
    }
}
