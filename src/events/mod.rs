//! Relayed events: data model and frame rendering.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload
//! - [`frames_of`] renders an error chain as stack frames
//!
//! ## Quick reference
//! - **Publishers**: [`Service`](crate::Service) and its worker through
//!   [`Emitter`](crate::Emitter), or anyone holding the
//!   [`EventChannel`](crate::EventChannel).
//! - **Consumers**: listeners attached to the channel.

mod event;

pub use event::{Event, EventKind, frames_of};
