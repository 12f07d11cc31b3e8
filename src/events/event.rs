//! # Events relayed from the producer to its listeners.
//!
//! The [`EventKind`] enum has two variants:
//! - **Message**: a plain log line
//! - **Error**: a failure description with optional stack frames
//!
//! The [`Event`] struct carries the text, the frames and ordering metadata.
//!
//! ## Ordering guarantees
//! The channel stamps every event with a sequence number (`seq`) at emission time.
//! Numbers strictly increase per channel, so each listener observes a strictly
//! increasing `seq`.
//!
//! ## Example
//! ```rust
//! use logrelay::{Event, EventKind};
//!
//! let ev = Event::error("boom").with_frames(["read_config", "main"]);
//!
//! assert_eq!(ev.kind, EventKind::Error);
//! assert_eq!(&*ev.text, "boom");
//! assert_eq!(ev.stack_frames.len(), 2);
//! ```

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::SystemTime;

/// Classification of relayed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Informational log line.
    ///
    /// Sets:
    /// - `text`: the message
    Message,

    /// Failure description.
    ///
    /// Sets:
    /// - `text`: the message
    /// - `stack_frames`: rendered frames of the cause, top to bottom (may be empty)
    Error,
}

/// One relayed event.
///
/// - `seq`: per-channel monotonic sequence (0 until emitted)
/// - `at`: wall-clock timestamp of creation
#[derive(Clone, Debug)]
pub struct Event {
    /// Per-channel, strictly increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Human-readable text.
    pub text: Arc<str>,
    /// Rendered stack frames; empty for messages.
    pub stack_frames: Arc<[String]>,

    fault_report: bool,
}

impl Event {
    fn new(kind: EventKind, text: impl Into<Arc<str>>) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            text: text.into(),
            stack_frames: Arc::from(Vec::new()),
            fault_report: false,
        }
    }

    /// Creates a message event.
    pub fn message(text: impl Into<Arc<str>>) -> Self {
        Self::new(EventKind::Message, text)
    }

    /// Creates an error event without frames.
    pub fn error(text: impl Into<Arc<str>>) -> Self {
        Self::new(EventKind::Error, text)
    }

    /// Attaches stack frames (kept in the given order).
    #[inline]
    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stack_frames = frames.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches the frames of `cause` (see [`frames_of`]).
    #[inline]
    pub fn with_cause(self, cause: &(dyn StdError + 'static)) -> Self {
        self.with_frames(frames_of(cause))
    }

    #[inline]
    pub(crate) fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    #[inline]
    pub(crate) fn as_fault_report(mut self) -> Self {
        self.fault_report = true;
        self
    }

    #[inline]
    pub fn is_message(&self) -> bool {
        matches!(self.kind, EventKind::Message)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self.kind, EventKind::Error)
    }

    /// True if the channel synthesised this event from a listener fault.
    #[inline]
    pub fn is_fault_report(&self) -> bool {
        self.fault_report
    }
}

/// Renders the frames of an error: the error itself followed by its
/// [`source`](StdError::source) chain, outermost first.
///
/// ```text
/// WorkError("work failed") ─source─► io::Error("disk gone")
///   → ["work failed", "disk gone"]
/// ```
pub fn frames_of(cause: &(dyn StdError + 'static)) -> Vec<String> {
    std::iter::successors(Some(cause), |&e| e.source())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("connect failed")]
    struct Outer {
        #[source]
        inner: Inner,
    }

    #[derive(Debug, Error)]
    #[error("host unreachable")]
    struct Inner;

    #[test]
    fn frames_follow_source_chain_top_to_bottom() {
        let err = Outer { inner: Inner };
        assert_eq!(frames_of(&err), vec!["connect failed", "host unreachable"]);
    }

    #[test]
    fn message_has_no_frames() {
        let ev = Event::message("hello");
        assert!(ev.is_message());
        assert!(ev.stack_frames.is_empty());
        assert!(!ev.is_fault_report());
    }

    #[test]
    fn error_with_cause_keeps_text() {
        let ev = Event::error("boom").with_cause(&Outer { inner: Inner });
        assert!(ev.is_error());
        assert_eq!(&*ev.text, "boom");
        assert_eq!(&ev.stack_frames[..], ["connect failed", "host unreachable"]);
    }
}
