//! # Background work run by the service, and the handle it emits through.
//!
//! A [`Work`] has a stable name and an async `run` that receives an [`Emitter`]
//! and a [`CancellationToken`]. [`WorkFn`] wraps a closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use logrelay::{Emitter, Work, WorkError, WorkFn};
//!
//! let w = WorkFn::arc("ticker", |log: Emitter, ctx: CancellationToken| async move {
//!     while !ctx.is_cancelled() {
//!         log.message("tick");
//!         tokio::time::sleep(std::time::Duration::from_millis(100)).await;
//!     }
//!     Ok::<_, WorkError>(())
//! });
//! assert_eq!(w.name(), "ticker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkError;
use crate::listeners::EventChannel;

/// Producer-side handle onto an [`EventChannel`].
///
/// Can emit but cannot attach listeners or change the run state.
#[derive(Clone)]
pub struct Emitter {
    channel: EventChannel,
}

impl Emitter {
    pub(crate) fn new(channel: EventChannel) -> Self {
        Self { channel }
    }

    /// Emits a `Message` event.
    pub fn message(&self, text: impl Into<Arc<str>>) {
        self.channel.emit_message(text);
    }

    /// Emits an `Error` event with the frames of `cause`.
    pub fn error(&self, text: impl Into<Arc<str>>, cause: &(dyn std::error::Error + 'static)) {
        self.channel.emit_error(text, cause);
    }

    /// Emits an `Error` event without frames.
    pub fn error_text(&self, text: impl Into<Arc<str>>) {
        self.channel.emit_error_text(text);
    }
}

/// # Cancelable background work.
///
/// Implementations should check `ctx.is_cancelled()` and return promptly once
/// the service is stopped.
#[async_trait]
pub trait Work: Send + Sync + 'static {
    /// Returns a stable, human-readable name.
    fn name(&self) -> &str;

    /// Runs until completion or cancellation.
    async fn run(&self, log: Emitter, ctx: CancellationToken) -> Result<(), WorkError>;
}

/// Function-backed [`Work`].
///
/// Wraps a closure that creates a new future per start.
pub struct WorkFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> WorkFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the work and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Work for WorkFn<F>
where
    F: Fn(Emitter, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, log: Emitter, ctx: CancellationToken) -> Result<(), WorkError> {
        (self.f)(log, ctx).await
    }
}
