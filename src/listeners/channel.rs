//! # EventChannel: non-blocking fan-out to attached listeners.
//!
//! [`EventChannel`] delivers each [`Event`] to every currently attached
//! [`Listen`] implementation **without awaiting** their handling, and holds the
//! producer's shared [`RunState`].
//!
//! ## Architecture
//! ```text
//! emit_message / emit_error
//!     │   (lock: stamp seq, snapshot attached set)
//!     ├──► [queue L1] ──► worker L1 ──► l1.on_event()
//!     │    (bounded)          └──────► panic → ListenerFault (logged / reported)
//!     ├──► [queue L2] ──► worker L2 ──► l2.on_event()
//!     └──► [queue LN] ──► worker LN ──► ln.on_event()
//! ```
//!
//! ## Rules
//! - **Snapshot**: the recipients of an emission are the listeners attached when it
//!   takes the registration lock. `attach` and `detach` take the same lock, so a
//!   listener receives every event emitted after `attach` returns and none emitted
//!   after `detach` returns.
//! - **Order**: `seq` is stamped under the lock; every listener sees events in
//!   global emission order.
//! - **Non-blocking**: emission uses `try_send` and returns immediately.
//! - **Overflow**: event dropped for that listener only, a warning is logged.
//! - **Isolation**: a panicking listener affects neither the producer nor other listeners.
//! - **Detach**: events already queued for a detached listener are still handled,
//!   nothing new is queued. Re-attaching the same listener starts its new worker
//!   only after the old one has drained, so its handlers never run concurrently.
//!
//! **Warning**: `AssertUnwindSafe` is used, so a listener that panics while
//! holding a lock of its own may leave that state inconsistent.

use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ChannelError;
use crate::events::Event;
use crate::service::{RunState, StateCell};

use super::listener::{Listen, ListenerId};

/// Per-listener queue and worker.
struct ListenerSlot {
    id: ListenerId,
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
    slots: Vec<ListenerSlot>,
    /// Workers of detached listeners that may still be draining their queue.
    draining: Vec<(ListenerId, JoinHandle<()>)>,
    last_seq: u64,
}

struct Inner {
    cfg: Config,
    handle: Handle,
    registry: Mutex<Registry>,
    state: StateCell,
}

/// Broadcast channel from one producer to any number of listeners.
///
/// Cheap to clone: clones share the same attached set and run state.
#[derive(Clone)]
pub struct EventChannel {
    inner: Arc<Inner>,
}

impl EventChannel {
    /// Creates a channel whose listener workers run on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime, like [`tokio::spawn`].
    /// Use [`with_handle`](Self::with_handle) to pick a runtime explicitly.
    #[must_use]
    pub fn new(cfg: Config) -> Self {
        Self::with_handle(cfg, Handle::current())
    }

    /// Creates a channel whose listener workers run on `handle` by default.
    #[must_use]
    pub fn with_handle(cfg: Config, handle: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                handle,
                registry: Mutex::new(Registry::default()),
                state: StateCell::default(),
            }),
        }
    }

    /// Returns the channel configuration.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// Attaches `listener`; its worker runs on the channel's runtime.
    ///
    /// Idempotent: attaching an attached listener returns its id and changes nothing.
    pub fn attach(&self, listener: Arc<dyn Listen>) -> ListenerId {
        self.attach_on(listener, self.inner.handle.clone())
    }

    /// Attaches `listener` with its worker spawned on `handle`.
    ///
    /// Use this to deliver on the listener's own execution context (for example
    /// a single-threaded runtime owning some view state).
    pub fn attach_on(&self, listener: Arc<dyn Listen>, handle: Handle) -> ListenerId {
        let id = ListenerId::of(&listener);
        let mut reg = self.inner.registry.lock();

        if reg.slots.iter().any(|slot| slot.id == id) {
            debug!(listener = listener.name(), "already attached");
            return id;
        }

        // A re-attached listener waits for its old worker to drain first.
        let previous = reg
            .draining
            .iter()
            .position(|(draining_id, _)| *draining_id == id)
            .map(|pos| reg.draining.swap_remove(pos).1);

        let cap = self.inner.cfg.queue_capacity_for(listener.queue_capacity());
        let name = listener.name();
        let (tx, rx) = mpsc::channel::<Arc<Event>>(cap);
        let worker = handle.spawn(deliver(listener, rx, Arc::downgrade(&self.inner), previous));

        reg.slots.push(ListenerSlot {
            id,
            name,
            sender: tx,
            worker,
        });
        debug!(listener = name, capacity = cap, attached = reg.slots.len(), "listener attached");
        id
    }

    /// Detaches `listener` if attached. Returns whether it was attached.
    pub fn detach(&self, listener: &Arc<dyn Listen>) -> bool {
        self.detach_id(ListenerId::of(listener))
    }

    /// Detaches the listener with `id` if attached. Returns whether it was attached.
    pub fn detach_id(&self, id: ListenerId) -> bool {
        let mut reg = self.inner.registry.lock();
        let Some(pos) = reg.slots.iter().position(|slot| slot.id == id) else {
            return false;
        };

        let slot = reg.slots.swap_remove(pos);
        // Dropping the sender lets the worker finish its queue and exit.
        drop(slot.sender);
        reg.draining.retain(|(_, h)| !h.is_finished());
        reg.draining.push((id, slot.worker));
        debug!(listener = slot.name, attached = reg.slots.len(), "listener detached");
        true
    }

    /// True if the listener with `id` is attached.
    pub fn is_attached(&self, id: ListenerId) -> bool {
        self.inner.registry.lock().slots.iter().any(|slot| slot.id == id)
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.registry.lock().slots.len()
    }

    /// True if no listener is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers a `Message` event to every attached listener.
    pub fn emit_message(&self, text: impl Into<Arc<str>>) {
        self.inner.publish(Event::message(text));
    }

    /// Delivers an `Error` event carrying the frames of `cause`.
    ///
    /// Frames are `cause` followed by its `source()` chain, top to bottom
    /// (see [`frames_of`](crate::frames_of)).
    pub fn emit_error(&self, text: impl Into<Arc<str>>, cause: &(dyn std::error::Error + 'static)) {
        self.inner.publish(Event::error(text).with_cause(cause));
    }

    /// Delivers an `Error` event with explicit frames.
    pub fn emit_error_frames<I, S>(&self, text: impl Into<Arc<str>>, frames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.publish(Event::error(text).with_frames(frames));
    }

    /// Delivers an `Error` event without frames.
    pub fn emit_error_text(&self, text: impl Into<Arc<str>>) {
        self.inner.publish(Event::error(text));
    }

    /// Publishes the shared run state.
    pub fn set_run_state(&self, state: RunState) {
        self.inner.state.set(state);
    }

    /// Reads the shared run state.
    pub fn run_state(&self) -> RunState {
        self.inner.state.get()
    }

    pub(crate) fn state(&self) -> &StateCell {
        &self.inner.state
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    /// Detaches every listener and waits for all workers to drain their queues.
    ///
    /// Listeners can be attached again afterwards.
    pub async fn shutdown(&self) {
        let workers: Vec<JoinHandle<()>> = {
            let mut reg = self.inner.registry.lock();
            let slots = std::mem::take(&mut reg.slots);
            let draining = std::mem::take(&mut reg.draining);
            draining
                .into_iter()
                .map(|(_, h)| h)
                .chain(slots.into_iter().map(|slot| slot.worker))
                .collect()
        };

        for h in workers {
            let _ = h.await;
        }
    }
}

impl Inner {
    fn publish(&self, event: Event) {
        let mut reg = self.registry.lock();
        reg.last_seq += 1;
        let event = Arc::new(event.with_seq(reg.last_seq));
        let is_fault_report = event.is_fault_report();

        for slot in &reg.slots {
            match slot.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !is_fault_report {
                        warn!(listener = slot.name, seq = event.seq, "event dropped: queue full");
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(listener = slot.name, seq = event.seq, "event dropped: worker closed");
                }
            }
        }
    }
}

/// Worker loop: handles queued events one by one until the queue is closed.
///
/// `previous` is the worker of an earlier attachment of the same listener; it
/// must finish before this one handles anything, so per-listener order holds
/// across detach and re-attach.
async fn deliver(
    listener: Arc<dyn Listen>,
    mut rx: mpsc::Receiver<Arc<Event>>,
    channel: Weak<Inner>,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(h) = previous {
        let _ = h.await;
    }

    while let Some(ev) = rx.recv().await {
        let fut = listener.on_event(ev.as_ref());
        let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await else {
            continue;
        };

        let fault = ChannelError::ListenerFault {
            listener: listener.name(),
            info: panic_info(panic_err.as_ref()),
        };
        warn!(
            listener = listener.name(),
            seq = ev.seq,
            label = fault.as_label(),
            "{}",
            fault.as_message()
        );

        // A fault while handling a fault report is only logged.
        if ev.is_fault_report() {
            continue;
        }
        if let Some(inner) = channel.upgrade() {
            if inner.cfg.report_faults {
                inner.publish(Event::error(fault.to_string()).as_fault_report());
            }
        }
    }
}

fn panic_info(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
