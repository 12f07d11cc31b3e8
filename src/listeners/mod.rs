//! # Listeners and the channel they attach to.
//!
//! ## Architecture
//! ```text
//! Service / Emitter ── emit_* ──► EventChannel ──► per-listener queue ──► worker
//!                                                                          │
//!                                                     ┌────────────────────┼──────────┐
//!                                                     ▼                    ▼          ▼
//!                                                  LogView            LogWriter    Custom
//! ```
//!
//! ## Listener types
//! - [`LogView`] keeps rendered lines (the on-screen list)
//! - `LogWriter` forwards to `tracing` (feature `logging`)
//! - anything implementing [`Listen`]

mod channel;
mod listener;
mod log_view;

#[cfg(feature = "logging")]
mod embedded;

pub use channel::EventChannel;
pub use listener::{Listen, ListenerId};
pub use log_view::{ERROR_PREFIX, LogView};

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
