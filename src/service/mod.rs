//! Producer side: run state, background work and the service toggle.
//!
//! - [`RunState`], [`StateCell`] atomic two-value status
//! - [`Work`], [`WorkFn`], [`Emitter`] background work and its emit handle
//! - [`Service`] start / stop / toggle over an [`EventChannel`](crate::EventChannel)

mod producer;
mod state;
mod work;

pub use producer::Service;
pub use state::{RunState, StateCell};
pub use work::{Emitter, Work, WorkFn};
