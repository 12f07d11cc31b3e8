//! # Service: the producer side of the relay.
//!
//! The [`Service`] owns an [`EventChannel`], publishes its [`RunState`] on it and
//! optionally runs a background [`Work`] while running.
//!
//! ## Lifecycle
//! ```text
//! start()  ─► emit "Starting Service" ─► state = Running ─► spawn work(emitter, token)
//! stop()   ─► emit "Stopping Service" ─► token.cancel()  ─► state = Stopped
//! toggle() ─► start() if Stopped, stop() if Running
//!
//! work returns on its own (not stopped):
//!   Ok  ─► emit "Service finished" ─► state = Stopped
//!   Err ─► emit_error(..)          ─► state = Stopped
//! ```
//!
//! ## Rules
//! - Transitions are serialized; `status()` is a lock-free atomic read.
//! - Redundant transitions are no-ops unless
//!   [`Config::strict_transitions`](crate::Config::strict_transitions) is set, in which
//!   case they return [`ServiceError::InvalidStateTransition`]. State never changes.
//! - A work error is reported through the channel, never propagated.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServiceError;
use crate::listeners::EventChannel;

use super::state::RunState;
use super::work::{Emitter, Work};

/// In-flight run of the background work.
struct Running {
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Control {
    current: Option<Running>,
    /// Cancelled runs that may still be returning.
    stopping: Vec<JoinHandle<()>>,
    generation: u64,
}

impl Control {
    fn cancel_current(&mut self) {
        if let Some(run) = self.current.take() {
            run.token.cancel();
            self.stopping.retain(|h| !h.is_finished());
            self.stopping.push(run.handle);
        }
    }
}

struct Inner {
    channel: EventChannel,
    work: Option<Arc<dyn Work>>,
    control: Mutex<Control>,
}

impl Drop for Inner {
    /// A service dropped while running cancels its work.
    fn drop(&mut self) {
        if let Some(run) = self.control.get_mut().current.take() {
            run.token.cancel();
        }
    }
}

/// Long-lived producer with a start/stop toggle.
///
/// Cheap to clone; clones control the same service.
#[derive(Clone)]
pub struct Service {
    inner: Arc<Inner>,
}

impl Service {
    /// Creates a service without background work.
    ///
    /// # Panics
    /// Panics outside a Tokio runtime (see [`EventChannel::new`]).
    #[must_use]
    pub fn new(cfg: Config) -> Self {
        Self::from_parts(EventChannel::new(cfg), None)
    }

    /// Creates a service that runs `work` while it is running.
    ///
    /// # Panics
    /// Panics outside a Tokio runtime (see [`EventChannel::new`]).
    #[must_use]
    pub fn with_work(cfg: Config, work: Arc<dyn Work>) -> Self {
        Self::from_parts(EventChannel::new(cfg), Some(work))
    }

    /// Creates a service around an existing channel.
    #[must_use]
    pub fn from_parts(channel: EventChannel, work: Option<Arc<dyn Work>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                channel,
                work,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    /// The channel listeners attach to.
    pub fn channel(&self) -> &EventChannel {
        &self.inner.channel
    }

    /// A producer handle for emitting from outside the service.
    pub fn emitter(&self) -> Emitter {
        Emitter::new(self.inner.channel.clone())
    }

    /// Current run state.
    pub fn status(&self) -> RunState {
        self.inner.channel.run_state()
    }

    /// Switches to `Running` and starts the background work.
    pub fn start(&self) -> Result<RunState, ServiceError> {
        self.start_locked(&mut self.inner.control.lock())
    }

    /// Cancels the background work and switches to `Stopped`.
    pub fn stop(&self) -> Result<RunState, ServiceError> {
        self.stop_locked(&mut self.inner.control.lock())
    }

    /// Flips the run state; the consumer's start/stop button.
    ///
    /// The direction is decided under the same lock as the transition, so
    /// concurrent toggles never observe a redundant transition.
    pub fn toggle(&self) -> Result<RunState, ServiceError> {
        let mut control = self.inner.control.lock();
        if self.status().is_running() {
            self.stop_locked(&mut control)
        } else {
            self.start_locked(&mut control)
        }
    }

    fn start_locked(&self, control: &mut Control) -> Result<RunState, ServiceError> {
        let channel = &self.inner.channel;
        if channel.run_state().is_running() {
            return self.redundant(RunState::Running);
        }

        channel.emit_message("Starting Service");
        channel.state().set(RunState::Running);

        if let Some(work) = &self.inner.work {
            control.generation += 1;
            let generation = control.generation;
            let token = CancellationToken::new();
            let handle = self.spawn_work(Arc::clone(work), generation, token.clone());
            control.current = Some(Running {
                generation,
                token,
                handle,
            });
        }
        debug!(generation = control.generation, "service started");
        Ok(RunState::Running)
    }

    fn stop_locked(&self, control: &mut Control) -> Result<RunState, ServiceError> {
        let channel = &self.inner.channel;
        if !channel.run_state().is_running() {
            return self.redundant(RunState::Stopped);
        }

        channel.emit_message("Stopping Service");
        control.cancel_current();
        channel.state().set(RunState::Stopped);
        debug!("service stopped");
        Ok(RunState::Stopped)
    }

    /// Stops the service, waits for its work to return, then drains every listener.
    pub async fn shutdown(&self) {
        let handles = {
            let mut control = self.inner.control.lock();
            let channel = &self.inner.channel;
            if channel.run_state().is_running() {
                channel.emit_message("Stopping Service");
            }
            control.cancel_current();
            channel.state().set(RunState::Stopped);
            std::mem::take(&mut control.stopping)
        };

        for h in handles {
            let _ = h.await;
        }
        self.inner.channel.shutdown().await;
    }

    fn redundant(&self, state: RunState) -> Result<RunState, ServiceError> {
        let err = ServiceError::InvalidStateTransition {
            from: state,
            to: state,
        };
        if self.inner.channel.config().strict_transitions {
            warn!(label = err.as_label(), "{}", err.as_message());
            Err(err)
        } else {
            debug!(label = err.as_label(), "{}", err.as_message());
            Ok(state)
        }
    }

    fn spawn_work(
        &self,
        work: Arc<dyn Work>,
        generation: u64,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let service: Weak<Inner> = Arc::downgrade(&self.inner);
        let channel = self.inner.channel.clone();
        let emitter = self.emitter();

        self.inner.channel.handle().spawn(async move {
            let res = work.run(emitter, token.clone()).await;

            if let Err(err) = &res {
                channel.emit_error(format!("work '{}' failed: {err}", work.name()), err);
            }

            // Service dropped: nothing left to update.
            let Some(inner) = service.upgrade() else {
                return;
            };
            let mut control = inner.control.lock();

            let current = control
                .current
                .as_ref()
                .is_some_and(|run| run.generation == generation);
            if !current || token.is_cancelled() {
                return;
            }

            // Work returned on its own.
            control.current = None;
            if res.is_ok() {
                channel.emit_message("Service finished");
            }
            channel.state().set(RunState::Stopped);
            debug!(work = work.name(), "work returned, service stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::WorkError;
    use crate::events::Event;
    use crate::listeners::Listen;
    use crate::service::WorkFn;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn texts(&self) -> Vec<String> {
            self.seen.lock().iter().map(|e| e.text.to_string()).collect()
        }
    }

    #[async_trait]
    impl Listen for Recorder {
        async fn on_message(&self, _text: &str) {}
        async fn on_error(&self, _text: &str, _stack_frames: &[String]) {}
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.clone());
        }
    }

    async fn wait_until_stopped(svc: &Service) {
        let poll = async {
            while svc.status().is_running() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), poll)
            .await
            .expect("service did not stop");
    }

    #[tokio::test]
    async fn toggle_flips_state() {
        let svc = Service::new(Config::default());
        assert_eq!(svc.status(), RunState::Stopped);
        assert_eq!(svc.toggle(), Ok(RunState::Running));
        assert_eq!(svc.status(), RunState::Running);
        assert_eq!(svc.toggle(), Ok(RunState::Stopped));
        assert_eq!(svc.status(), RunState::Stopped);
    }

    #[tokio::test]
    async fn redundant_transitions_are_noops_by_default() {
        let svc = Service::new(Config::default());
        let rec = Arc::new(Recorder::default());
        svc.channel().attach(rec.clone());

        assert_eq!(svc.stop(), Ok(RunState::Stopped));
        assert_eq!(svc.start(), Ok(RunState::Running));
        assert_eq!(svc.start(), Ok(RunState::Running));
        svc.shutdown().await;

        assert_eq!(rec.texts(), vec!["Starting Service", "Stopping Service"]);
    }

    #[tokio::test]
    async fn strict_transitions_are_rejected() {
        let cfg = Config {
            strict_transitions: true,
            ..Config::default()
        };
        let svc = Service::new(cfg);
        assert_eq!(
            svc.stop(),
            Err(ServiceError::InvalidStateTransition {
                from: RunState::Stopped,
                to: RunState::Stopped,
            })
        );
        svc.start().unwrap();
        assert!(svc.start().is_err());
        assert_eq!(svc.status(), RunState::Running);
    }

    #[tokio::test]
    async fn stop_cancels_work() {
        let work = WorkFn::arc("waiter", |log: Emitter, ctx: CancellationToken| async move {
            log.message("waiting");
            ctx.cancelled().await;
            log.message("cancelled");
            Ok::<_, WorkError>(())
        });
        let svc = Service::with_work(Config::default(), work);
        let rec = Arc::new(Recorder::default());
        svc.channel().attach(rec.clone());

        svc.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        svc.stop().unwrap();
        svc.shutdown().await;

        assert_eq!(
            rec.texts(),
            vec!["Starting Service", "waiting", "Stopping Service", "cancelled"]
        );
        assert_eq!(svc.status(), RunState::Stopped);
    }

    #[tokio::test]
    async fn failing_work_reports_error_and_stops() {
        let work = WorkFn::arc("broken", |_log: Emitter, _ctx: CancellationToken| async move {
            Err::<(), _>(WorkError::from_source(std::io::Error::other("disk gone")))
        });
        let svc = Service::with_work(Config::default(), work);
        let rec = Arc::new(Recorder::default());
        svc.channel().attach(rec.clone());

        svc.start().unwrap();
        wait_until_stopped(&svc).await;
        svc.shutdown().await;

        let seen = rec.seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].is_error());
        assert_eq!(&*seen[1].text, "work 'broken' failed: work failed");
        assert_eq!(&seen[1].stack_frames[..], ["work failed", "disk gone"]);
    }

    #[tokio::test]
    async fn finished_work_returns_to_stopped() {
        let work = WorkFn::arc("once", |log: Emitter, _ctx: CancellationToken| async move {
            log.message("done");
            Ok::<_, WorkError>(())
        });
        let svc = Service::with_work(Config::default(), work);
        svc.start().unwrap();
        wait_until_stopped(&svc).await;

        // Start works again after the work returned on its own.
        assert_eq!(svc.start(), Ok(RunState::Running));
        svc.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_toggles_never_look_redundant() {
        let cfg = Config {
            strict_transitions: true,
            ..Config::default()
        };
        let svc = Service::new(cfg);

        let togglers: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                std::thread::spawn(move || {
                    (0..200).filter(|_| svc.toggle().is_err()).count()
                })
            })
            .collect();

        let failures: usize = togglers.into_iter().map(|t| t.join().unwrap()).sum();
        assert_eq!(failures, 0);
        // 1600 toggles in total: back where we started.
        assert_eq!(svc.status(), RunState::Stopped);
    }

    #[tokio::test]
    async fn dropping_a_running_service_cancels_work() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
        let done_tx = Arc::new(Mutex::new(Some(done_tx)));
        let work = WorkFn::arc("forever", move |_log: Emitter, ctx: CancellationToken| {
            let done_tx = Arc::clone(&done_tx);
            async move {
                ctx.cancelled().await;
                if let Some(tx) = done_tx.lock().take() {
                    let _ = tx.send(());
                }
                Ok::<_, WorkError>(())
            }
        });

        let svc = Service::with_work(Config::default(), work);
        svc.start().unwrap();
        drop(svc);

        tokio::time::timeout(Duration::from_secs(5), done_rx)
            .await
            .expect("work was not cancelled")
            .unwrap();
    }
}
