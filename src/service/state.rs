//! # Producer run state.
//!
//! [`RunState`] is a two-value flag owned by the producer and readable by anyone.
//! [`StateCell`] stores it in an atomic so concurrent readers never observe a
//! torn or third value.

use std::sync::atomic::{AtomicU8, Ordering};

/// Operational status of the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    /// Not running (initial state).
    #[default]
    Stopped,
    /// Running.
    Running,
}

impl RunState {
    /// The other state.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            RunState::Stopped => RunState::Running,
            RunState::Running => RunState::Stopped,
        }
    }

    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, RunState::Running)
    }

    #[inline]
    fn to_u8(self) -> u8 {
        match self {
            RunState::Stopped => 0,
            RunState::Running => 1,
        }
    }

    #[inline]
    fn from_u8(raw: u8) -> Self {
        if raw == 0 {
            RunState::Stopped
        } else {
            RunState::Running
        }
    }
}

/// Atomic holder of a [`RunState`].
#[derive(Debug, Default)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new(state: RunState) -> Self {
        Self(AtomicU8::new(state.to_u8()))
    }

    #[inline]
    pub fn get(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: RunState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }

    /// Stores `state` and returns the previous value.
    #[inline]
    pub fn replace(&self, state: RunState) -> RunState {
        RunState::from_u8(self.0.swap(state.to_u8(), Ordering::AcqRel))
    }
}
