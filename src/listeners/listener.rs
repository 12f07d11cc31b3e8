//! # Listener trait.
//!
//! Provides [`Listen`], the capability set a consumer implements to observe a
//! producer: `on_message` and `on_error`.
//!
//! Each attached listener gets:
//! - **Dedicated worker task** on the runtime it was attached with
//! - **Bounded queue** (capacity via [`Listen::queue_capacity`])
//! - **Panic isolation** (a panic is caught and reported as a listener fault)
//!
//! ## Architecture
//! ```text
//! EventChannel ──► [bounded queue] ──► worker task ──► listener.on_event()
//!                                                   └─► on_message() / on_error()
//! ```
//!
//! ## Rules
//! - A slow listener only affects its own queue.
//! - Queue overflow drops the event **for this listener only**.
//! - Events are handled sequentially (FIFO) per listener.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use logrelay::Listen;
//!
//! struct Console;
//!
//! #[async_trait]
//! impl Listen for Console {
//!     async fn on_message(&self, text: &str) {
//!         println!("{text}");
//!     }
//!
//!     async fn on_error(&self, text: &str, stack_frames: &[String]) {
//!         println!("ERROR: {text} ({} frames)", stack_frames.len());
//!     }
//!
//!     fn name(&self) -> &'static str { "console" }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::events::{Event, EventKind};

/// Observer of relayed events.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally. A panic is contained, but the event is lost for
///   this listener.
#[async_trait]
pub trait Listen: Send + Sync + 'static {
    /// Handles a `Message` event.
    async fn on_message(&self, text: &str);

    /// Handles an `Error` event; `stack_frames` is ordered top to bottom and may be empty.
    async fn on_error(&self, text: &str, stack_frames: &[String]);

    /// Dispatches one event to [`on_message`](Self::on_message) or [`on_error`](Self::on_error).
    ///
    /// Called from the listener's worker task, never in the producer context.
    /// Override to inspect `seq`/`at` or the fault-report flag.
    async fn on_event(&self, event: &Event) {
        match event.kind {
            EventKind::Message => self.on_message(&event.text).await,
            EventKind::Error => self.on_error(&event.text, &event.stack_frames).await,
        }
    }

    /// Returns the listener name used in logs and fault reports.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this listener.
    ///
    /// `0` means "use [`Config::queue_capacity`](crate::Config::queue_capacity)".
    ///
    /// Default: 0.
    fn queue_capacity(&self) -> usize {
        0
    }
}

/// Identity of an attached listener.
///
/// Derived from the address of the listener's `Arc` allocation: two clones of
/// the same `Arc` share an id, two separately allocated listeners never do.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    /// Returns the identity of `listener`.
    pub fn of(listener: &Arc<dyn Listen>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({:#x})", self.0)
    }
}
