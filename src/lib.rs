//! # logrelay
//!
//! **logrelay** relays log and error events from a long-lived background
//! producer to any number of shorter-lived listeners, and publishes the
//! producer's running/stopped state.
//!
//! Listeners attach when they start observing and detach when they stop. The
//! producer never waits for them: every listener has its own bounded queue and
//! worker task, and a misbehaving listener only hurts itself.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌───────────────────────────┐        toggle()
//!  │ Service (producer)        │◄──────────────────────── consumer button
//!  │ - RunState (atomic)       │
//!  │ - background Work         │── emit via Emitter ──┐
//!  └────────────┬──────────────┘                      │
//!               │ emit_message / emit_error           │
//!               ▼                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ EventChannel                                                      │
//! │   lock ─► stamp seq ─► snapshot attached set ─► try_send each     │
//! └──────┬──────────────────────┬──────────────────────┬──────────────┘
//!        ▼                      ▼                      ▼
//!   [queue L1]             [queue L2]             [queue LN]
//!        ▼                      ▼                      ▼
//!   worker L1              worker L2              worker LN     (listener's runtime)
//!        ▼                      ▼                      ▼
//!   on_message /           on_message /           on_message /
//!   on_error               on_error               on_error
//!        └─ panic ─► ListenerFault: logged, optionally re-emitted as Error
//! ```
//!
//! ### Lifecycle
//! ```text
//! surface becomes active   ─► channel.attach(listener)   ─► receives later events
//! surface goes background  ─► channel.detach(&listener)  ─► queued events drain, nothing new
//! button pressed           ─► service.toggle()           ─► start() / stop()
//! ```
//!
//! ## Features
//! | Area              | Description                                            | Key types / traits                        |
//! |-------------------|--------------------------------------------------------|-------------------------------------------|
//! | **Channel**       | Fan-out with attach/detach, ordering, isolation.       | [`EventChannel`], [`ListenerId`]          |
//! | **Listeners**     | `on_message` / `on_error` capability set.              | [`Listen`], [`LogView`]                   |
//! | **Events**        | Message and error events with stack frames.            | [`Event`], [`EventKind`], [`frames_of`]   |
//! | **Producer**      | Run state, start/stop toggle, background work.         | [`Service`], [`RunState`], [`Work`]       |
//! | **Errors**        | Contained faults and transition errors.                | [`ChannelError`], [`ServiceError`]        |
//! | **Configuration** | Queue capacity, fault reporting, transition policy.    | [`Config`]                                |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a listener that forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use logrelay::{Config, LogView, RunState, Service};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let service = Service::new(Config::default());
//!     let view = Arc::new(LogView::new("main"));
//!     service.channel().attach(view.clone());
//!
//!     service.toggle().unwrap();
//!     assert_eq!(service.status(), RunState::Running);
//!     service.emitter().message("hello");
//!
//!     service.shutdown().await;
//!     assert_eq!(view.lines(), vec!["Starting Service", "hello", "Stopping Service"]);
//! }
//! ```
mod config;
mod error;
mod events;
mod listeners;
mod service;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{ChannelError, ServiceError, WorkError};
pub use events::{Event, EventKind, frames_of};
pub use listeners::{ERROR_PREFIX, EventChannel, Listen, ListenerId, LogView};
pub use service::{Emitter, RunState, Service, StateCell, Work, WorkFn};

// Optional: built-in tracing listener.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogWriter;
